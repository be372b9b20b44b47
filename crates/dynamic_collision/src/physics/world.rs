//! Physics world and its lock
//!
//! The world owns the shape arena, the character controllers and the static
//! colliders. All of it sits behind one reader/writer lock: introspection
//! takes the read side, anything that swaps a shape into a live controller
//! takes the write side.

use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::collision_layers::{CollisionFilterInfo, CollisionMatrix};
use super::controller::{CharacterController, ControllerId};
use super::raycast::{self, RayCastInput, RayCastOutput, StaticCollider};
use super::shape::ShapeGraph;
use crate::foundation::logging::warn;

new_key_type! {
    /// Arena key of a static collider
    pub struct ColliderId;
}

/// Everything guarded by the world lock
#[derive(Debug, Default)]
pub struct WorldState {
    /// Shape and wrapper arena
    pub shapes: ShapeGraph,
    controllers: HashMap<ControllerId, CharacterController>,
    colliders: SlotMap<ColliderId, StaticCollider>,
    /// Layer collision rules
    pub matrix: CollisionMatrix,
}

impl WorldState {
    /// Add a controller, returning its id
    pub fn add_controller(&mut self, controller: CharacterController) -> ControllerId {
        let id = controller.id();
        self.controllers.insert(id, controller);
        id
    }

    /// Remove a controller and free the shapes nothing references any more.
    /// Returns whether the controller existed.
    pub fn remove_controller(&mut self, id: ControllerId) -> bool {
        let Some(controller) = self.controllers.remove(&id) else {
            return false;
        };
        drop(controller);
        self.shapes.reclaim();
        true
    }

    /// Controller lookup
    pub fn controller(&self, id: ControllerId) -> Option<&CharacterController> {
        self.controllers.get(&id)
    }

    /// Mutable controller lookup
    pub fn controller_mut(&mut self, id: ControllerId) -> Option<&mut CharacterController> {
        self.controllers.get_mut(&id)
    }

    /// Controller and shape graph borrowed together
    pub fn controller_and_shapes(&mut self, id: ControllerId) -> Option<(&mut CharacterController, &mut ShapeGraph)> {
        let controller = self.controllers.get_mut(&id)?;
        Some((controller, &mut self.shapes))
    }

    /// Number of controllers
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Add a static collider
    pub fn add_collider(&mut self, collider: StaticCollider) -> ColliderId {
        self.colliders.insert(collider)
    }

    /// Remove a static collider
    pub fn remove_collider(&mut self, id: ColliderId) -> Option<StaticCollider> {
        self.colliders.remove(id)
    }

    /// Cast a segment against the static colliders the ray's filter
    /// collides with
    pub fn cast_ray(&self, input: &RayCastInput) -> RayCastOutput {
        let query: CollisionFilterInfo = input.filter_info;
        raycast::cast_ray(
            input,
            self.colliders.values().enumerate(),
            |collider| self.matrix.should_collide(query, collider.filter_info),
        )
    }
}

/// A physics world shared between the simulation and its observers
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    state: RwLock<WorldState>,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world with the given collision rules
    pub fn with_matrix(matrix: CollisionMatrix) -> Self {
        Self {
            state: RwLock::new(WorldState { matrix, ..WorldState::default() }),
        }
    }

    /// Shared access
    pub fn read(&self) -> RwLockReadGuard<'_, WorldState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Physics world lock poisoned, recovering read access");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Exclusive access
    pub fn write(&self) -> RwLockWriteGuard<'_, WorldState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Physics world lock poisoned, recovering write access");
            PoisonError::into_inner(poisoned)
        })
    }
}
