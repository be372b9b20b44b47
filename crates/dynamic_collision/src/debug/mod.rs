//! Debug visualization of character collision

pub mod controller_debug;
pub mod draw;

pub use controller_debug::{color_from_rgba, ControllerDebugColors, ControllerDebugVisualizer};
pub use draw::{DebugDrawSystem, DebugShape};
