//! Character controllers
//!
//! A controller drives one actor's character collision. Two kinds exist:
//! a free proxy (player and followers), whose collision shape sits on a shape
//! phantom, and a rigid-body controller (everyone else), whose shape sits on
//! the character rigid body. Both also keep up to two wrapper slots pointing
//! at the shape wrappers they were created with.

use bitflags::bitflags;
use std::sync::atomic::{AtomicU64, Ordering};

use super::shape::{ShapeRef, WrapperRef};
use crate::foundation::math::Vec3;

static NEXT_CONTROLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique controller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(u64);

impl ControllerId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        Self(NEXT_CONTROLLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value for logs
    pub const fn raw(self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Controller state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControllerFlags: u32 {
        /// Bumper volume requested
        const BUMPER_ENABLED = 1 << 0;
        /// Bumper volume currently in the simulation
        const BUMPER_ACTIVE = 1 << 1;
    }
}

/// Movement state reported by the character state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterState {
    /// Walking or standing on ground
    #[default]
    OnGround,
    /// Jump in progress
    Jumping,
    /// Falling
    InAir,
    /// On a ladder or climbable
    Climbing,
    /// Flying
    Flying,
    /// In water
    Swimming,
}

/// Phantom volume carrying a proxy's collision shape
#[derive(Debug, Default)]
pub struct ShapePhantom {
    shape: Option<ShapeRef>,
}

/// Proxy controller body
#[derive(Debug, Default)]
pub struct CharacterProxy {
    /// Collision volume
    pub phantom: ShapePhantom,
}

/// Rigid body carrying a controller's collision shape
#[derive(Debug, Default)]
pub struct RigidBody {
    shape: Option<ShapeRef>,
}

/// Rigid-body controller body
#[derive(Debug, Default)]
pub struct CharacterRigidBody {
    /// Simulated body
    pub character: RigidBody,
}

macro_rules! shape_slot {
    ($owner:ty) => {
        impl $owner {
            /// Installed collision shape
            pub fn shape(&self) -> Option<&ShapeRef> {
                self.shape.as_ref()
            }

            /// Install a shape. Takes ownership of the passed reference and
            /// releases the one held on the previous shape.
            pub fn set_shape(&mut self, shape: Option<ShapeRef>) {
                self.shape = shape;
            }
        }
    };
}

shape_slot!(ShapePhantom);
shape_slot!(RigidBody);

/// Which object owns a controller's collision shape
#[derive(Debug)]
pub enum ControllerKind {
    /// Free proxy controller; the proxy may be absent while loading
    Proxy(Option<CharacterProxy>),
    /// Rigid-body controller; the body may be absent while loading
    RigidBody(Option<CharacterRigidBody>),
}

/// Tag-only view of [`ControllerKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeOwner {
    /// Proxy shape phantom
    ProxyPhantom,
    /// Rigid body character
    RigidBodyCharacter,
}

/// Per-actor character collision driver
#[derive(Debug)]
pub struct CharacterController {
    id: ControllerId,
    /// Shape owner
    pub kind: ControllerKind,
    /// Wrapper slots the controller was set up with
    pub shapes: [Option<WrapperRef>; 2],
    /// State bits
    pub flags: ControllerFlags,
    /// Position in physics units
    pub position: Vec3,
    /// Current movement state
    pub state: CharacterState,
}

impl CharacterController {
    /// Create a controller with a fresh id
    pub fn new(kind: ControllerKind, position: Vec3) -> Self {
        Self {
            id: ControllerId::next(),
            kind,
            shapes: [None, None],
            flags: ControllerFlags::empty(),
            position,
            state: CharacterState::OnGround,
        }
    }

    /// Proxy controller owning `shape` through its phantom
    pub fn proxy(shape: ShapeRef, position: Vec3) -> Self {
        let mut proxy = CharacterProxy::default();
        proxy.phantom.set_shape(Some(shape));
        Self::new(ControllerKind::Proxy(Some(proxy)), position)
    }

    /// Rigid-body controller owning `shape` through its body
    pub fn rigid_body(shape: ShapeRef, position: Vec3) -> Self {
        let mut body = CharacterRigidBody::default();
        body.character.set_shape(Some(shape));
        Self::new(ControllerKind::RigidBody(Some(body)), position)
    }

    /// Controller identity
    pub const fn id(&self) -> ControllerId {
        self.id
    }

    /// Whether this is a proxy controller
    pub const fn is_proxy(&self) -> bool {
        matches!(self.kind, ControllerKind::Proxy(_))
    }

    /// Owner kind, if the owning object exists
    pub const fn shape_owner(&self) -> Option<ShapeOwner> {
        match &self.kind {
            ControllerKind::Proxy(Some(_)) => Some(ShapeOwner::ProxyPhantom),
            ControllerKind::RigidBody(Some(_)) => Some(ShapeOwner::RigidBodyCharacter),
            _ => None,
        }
    }

    /// Root of the controller's collision shape graph
    pub fn collidable_shape(&self) -> Option<&ShapeRef> {
        match &self.kind {
            ControllerKind::Proxy(Some(proxy)) => proxy.phantom.shape(),
            ControllerKind::RigidBody(Some(body)) => body.character.shape(),
            _ => None,
        }
    }

    /// Replace the root collision shape on whichever owner exists.
    ///
    /// Returns `false` without consuming anything visible if there is no owner;
    /// the passed reference is then dropped.
    pub fn set_collidable_shape(&mut self, shape: ShapeRef) -> bool {
        match &mut self.kind {
            ControllerKind::Proxy(Some(proxy)) => proxy.phantom.set_shape(Some(shape)),
            ControllerKind::RigidBody(Some(body)) => body.character.set_shape(Some(shape)),
            _ => return false,
        }
        true
    }

    /// Active wrapper slot: 1 if occupied, else 0 if occupied
    pub fn shape_slot(&self) -> Option<usize> {
        if self.shapes[1].is_some() {
            Some(1)
        } else if self.shapes[0].is_some() {
            Some(0)
        } else {
            None
        }
    }

    /// Bring the bumper volume in line with [`ControllerFlags::BUMPER_ENABLED`]
    pub fn toggle_bumper(&mut self) {
        let enabled = self.flags.contains(ControllerFlags::BUMPER_ENABLED);
        self.flags.set(ControllerFlags::BUMPER_ACTIVE, enabled);
    }
}
