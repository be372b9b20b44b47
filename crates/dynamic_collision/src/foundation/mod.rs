//! Foundation utilities: math types and logging

pub mod math;
pub mod logging;
