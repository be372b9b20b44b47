//! # Shape Adjustment
//!
//! Keeps each tracked character controller's collision shapes matched to
//! its actor's current scale and state.
//!
//! ## Overview
//!
//! Two kinds of shapes are adjusted:
//!
//! - **Capsules** are edited in place. Radius, bottom endpoint and forward
//!   offsets follow scale; the top endpoint follows either a head bone
//!   sample or the scaled original height.
//! - **The bumper hull** is immutable once built, so a new hull is built
//!   from adjusted vertices and swapped in for the old one with balanced
//!   reference counts.
//!
//! Every adjustment starts from geometry captured when the controller was
//! first seen, never from live geometry, so adjustments do not compound.
//!
//! ## Usage
//!
//! ```no_run
//! use dynamic_collision::adjustment::AdjustmentHandler;
//! use dynamic_collision::config::AdjustmentSettings;
//! # use dynamic_collision::actor::SimulationHost;
//! # fn run(host: &dyn SimulationHost) {
//! let handler = AdjustmentHandler::new(AdjustmentSettings::default());
//! // forward controller creation and destruction, then once per tick:
//! let report = handler.on_simulation_tick(host);
//! # let _ = report;
//! # }
//! ```

pub mod capsule;
pub mod convex;
pub mod error;
pub mod handler;
pub mod record;
pub mod registry;

#[cfg(test)]
mod tests;

pub use capsule::{adjust_capsule, CapsuleSnapshot, CapsuleTop};
pub use convex::{full_hull, simple_hull, BoneSamples, HullAdjustment, StateMultipliers};
pub use error::{AdjustError, AdjustResult};
pub use handler::{AdjustmentHandler, CapsuleView, ShapeSnapshot, TickReport};
pub use record::{ControllerRecord, UpdatePath};
pub use registry::{ControllerRegistry, SharedRecord};
