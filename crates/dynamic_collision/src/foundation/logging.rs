//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging, ignoring a logger that is already installed.
///
/// Tests and embedding hosts may call this more than once.
pub fn try_init() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
