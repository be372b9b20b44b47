//! Physics collaborator model
//!
//! The shape arena, character controllers, the world lock and the ray cast
//! query the adjustment code works against.

pub mod collision_layers;
pub mod controller;
pub mod handle;
pub mod hull;
pub mod introspect;
pub mod raycast;
pub mod shape;
pub mod world;

pub use collision_layers::{CollisionFilterInfo, CollisionLayers, CollisionMatrix};
pub use controller::{CharacterController, CharacterState, ControllerFlags, ControllerId, ControllerKind, ShapeOwner};
pub use handle::RefHandle;
pub use hull::{ConvexVerticesShape, HullBuildConfig, HullError, HullTopology};
pub use introspect::{collect_capsules, collect_shapes, find_convex_shape, ConvexLocation, ShapeQueryError, ShapeSet};
pub use raycast::{ColliderShape, RayCastInput, RayCastOutput, StaticCollider};
pub use shape::{
    BvTreeShape, CapsuleShape, CloneError, ListShape, ShapeGraph, ShapeId, ShapeKind, ShapeMaterial, ShapeRef,
    ShapeTag, WrapperId, WrapperRef,
};
pub use world::{PhysicsWorld, WorldState};
