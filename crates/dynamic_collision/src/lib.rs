//! # Dynamic Collision
//!
//! Keeps character collision in step with actor scale. Capsules are resized
//! in place and the convex bumper hull is rebuilt and swapped each time an
//! actor grows, shrinks, sneaks or swims.
//!
//! ## Features
//!
//! - **Shape Graph**: Reference-counted shapes and wrappers with deterministic reclaim
//! - **Hull Rebuilds**: Bone-driven hulls for the player and teammates, scale-driven hulls for everyone else
//! - **Capsule Fits**: Head-tracking and scale-tracking capsule variants
//! - **Creature Copies**: Private scaled shape trees for non-humanoid actors
//! - **Stand Check**: Ray cast along the hull height against the world
//! - **Debug Overlay**: Hull edges, capsules and blocked stand rays
//! - **Configuration**: TOML or RON settings with validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynamic_collision::prelude::*;
//!
//! fn frame(handler: &AdjustmentHandler, host: &dyn SimulationHost) {
//!     let report = handler.on_simulation_tick(host);
//!     if report.ran {
//!         info!("Adjusted {} controllers", report.count(UpdatePath::Full) + report.count(UpdatePath::Simple));
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dynamic_collision::foundation::logging::init();
//!     let handler = AdjustmentHandler::from_config_file("collision.toml")?;
//!     # let _ = handler;
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod adjustment;
pub mod config;
pub mod debug;
pub mod foundation;
pub mod physics;

#[cfg(test)]
mod test_support;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        actor::{Actor, ActorHandle, SimulationHost, Skeleton, SkeletonNode},
        adjustment::{AdjustError, AdjustResult, AdjustmentHandler, ShapeSnapshot, TickReport, UpdatePath},
        config::{AdjustmentSettings, Calibration, Config, ConfigError, DebugDrawMode},
        debug::ControllerDebugVisualizer,
        foundation::{
            logging::{debug, error, info, trace, warn},
            math::Vec3,
        },
        physics::{
            CharacterController, CharacterState, CollisionFilterInfo, CollisionLayers, ControllerId, PhysicsWorld,
            ShapeGraph, StaticCollider,
        },
    };
}
