//! Game entity seam
//!
//! The adjustment code never owns actors. It sees them through the [`Actor`]
//! trait and holds them weakly, so an actor unloading between ticks simply
//! turns into a skipped adjustment.

pub mod bones;
pub mod skeleton;

use std::sync::{Arc, Weak};

use crate::foundation::math::Vec3;
use crate::physics::{CollisionFilterInfo, ControllerId, PhysicsWorld};

pub use bones::{bone_offset, compute_scale, head_offset, model_scale, node_scale, root_offset};
pub use skeleton::{NodeCollision, NodeId, Skeleton, SkeletonNode};

/// Form id of the player character
pub const PLAYER_FORM_ID: u32 = 0x14;

/// A simulated game entity with character collision
pub trait Actor: Send + Sync {
    /// Persistent form id
    fn form_id(&self) -> u32;

    /// Whether this is the player character
    fn is_player(&self) -> bool {
        self.form_id() == PLAYER_FORM_ID
    }

    /// Whether this actor follows the player
    fn is_player_teammate(&self) -> bool;

    /// Whether this actor is dead
    fn is_dead(&self) -> bool;

    /// Whether this actor is sneaking
    fn is_sneaking(&self) -> bool;

    /// Whether the actor itself carries `keyword`
    fn has_keyword(&self, keyword: &str) -> bool;

    /// Whether the actor's race carries `keyword`, `None` if the race is not loaded
    fn race_has_keyword(&self, keyword: &str) -> Option<bool>;

    /// World position, game units
    fn position(&self) -> Vec3;

    /// Rotation about the up axis, radians
    fn heading(&self) -> f32;

    /// Collision filter of the actor's controller
    fn collision_filter_info(&self) -> CollisionFilterInfo;

    /// Physics world of the actor's cell, `None` without a loaded cell or world
    fn world(&self) -> Option<Arc<PhysicsWorld>>;

    /// The actor's character controller, if it has one
    fn controller_id(&self) -> Option<ControllerId>;

    /// Loaded skeleton, third or first person
    fn skeleton(&self, first_person: bool) -> Option<Arc<Skeleton>>;
}

/// Weak reference to an actor
pub type ActorHandle = Weak<dyn Actor>;

/// Host of the simulation the handler runs in
pub trait SimulationHost {
    /// Whether the simulation is paused
    fn is_paused(&self) -> bool;

    /// The player character, if loaded
    fn player(&self) -> Option<Arc<dyn Actor>>;

    /// Actors in high process range
    fn high_actors(&self) -> Vec<Arc<dyn Actor>>;
}
