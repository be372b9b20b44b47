//! Shape graph arena
//!
//! Collision shapes form a small tree per controller: primitives (capsules,
//! convex hulls) at the leaves, list and bounding-volume-tree composites above
//! them. Each shape may be wrapped by a [`ShapeWrapper`], the engine-side
//! object that carries the material and points at the shape it wraps. The
//! shape points back at its wrapper through a non-owning id (`user_data`).
//!
//! Both live in slotmap arenas. Ownership between them is expressed with
//! [`ShapeRef`] and [`WrapperRef`] counted handles, and the arena reclaims
//! objects whose count dropped to zero.

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::handle::{RefCount, RefHandle};
use super::hull::{ConvexVerticesShape, HullError};
use crate::foundation::math::Vec3;

new_key_type! {
    /// Arena key of a shape
    pub struct ShapeId;

    /// Arena key of a shape wrapper
    pub struct WrapperId;
}

/// Counted reference to a shape
pub type ShapeRef = RefHandle<ShapeId>;

/// Counted reference to a shape wrapper
pub type WrapperRef = RefHandle<WrapperId>;

/// Swept-sphere primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    /// Sphere radius
    pub radius: f32,
    /// Top endpoint
    pub vertex_a: Vec3,
    /// Bottom endpoint
    pub vertex_b: Vec3,
}

/// Composite holding an ordered child array
#[derive(Debug, Default)]
pub struct ListShape {
    /// Owned child slots
    pub children: Vec<ShapeRef>,
}

/// Composite whose children are only reachable through keyed iteration
#[derive(Debug, Default)]
pub struct BvTreeShape {
    children: Vec<ShapeRef>,
}

/// Key into a [`BvTreeShape`]'s children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeKey(u32);

impl BvTreeShape {
    /// Create a tree over the given children
    pub fn new(children: Vec<ShapeRef>) -> Self {
        Self { children }
    }

    /// Number of child shapes
    pub fn num_child_shapes(&self) -> usize {
        self.children.len()
    }

    /// Key of the first child
    pub fn first_key(&self) -> ShapeKey {
        ShapeKey(0)
    }

    /// Key following `key`
    pub fn next_key(&self, key: ShapeKey) -> ShapeKey {
        ShapeKey(key.0.saturating_add(1))
    }

    /// Child behind `key`
    pub fn child_shape(&self, key: ShapeKey) -> Option<&ShapeRef> {
        self.children.get(key.0 as usize)
    }
}

/// Shape variants
#[derive(Debug)]
pub enum ShapeKind {
    /// Capsule primitive
    Capsule(CapsuleShape),
    /// Convex hull primitive
    ConvexVertices(ConvexVerticesShape),
    /// List composite
    List(ListShape),
    /// Bounding-volume-tree composite
    BvTree(BvTreeShape),
}

impl ShapeKind {
    /// Short type name for logs
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Capsule(_) => "capsule",
            Self::ConvexVertices(_) => "convex vertices",
            Self::List(_) => "list",
            Self::BvTree(_) => "bv tree",
        }
    }
}

/// Dynamic type identity the physics engine checks on installed shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeTag {
    /// Ordinary shape
    #[default]
    Plain,
    /// Shape usable as a character controller's collision shape
    CharControllerShape,
}

/// Surface material of a wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeMaterial {
    /// Any regular material
    #[default]
    Default,
    /// Material of the secondary character bumper volume
    CharacterBumper,
}

/// Arena entry for a shape
#[derive(Debug)]
pub struct ShapeNode {
    /// Shape data
    pub kind: ShapeKind,
    /// Wrapper that owns this shape, if any
    pub user_data: Option<WrapperId>,
    /// Dynamic type identity
    pub tag: ShapeTag,
    count: RefCount,
}

impl ShapeNode {
    /// Capsule data, if this is a capsule
    pub fn as_capsule(&self) -> Option<&CapsuleShape> {
        match &self.kind {
            ShapeKind::Capsule(capsule) => Some(capsule),
            _ => None,
        }
    }

    /// Hull data, if this is a convex vertices shape
    pub fn as_convex(&self) -> Option<&ConvexVerticesShape> {
        match &self.kind {
            ShapeKind::ConvexVertices(hull) => Some(hull),
            _ => None,
        }
    }
}

/// Engine-side wrapper around a shape
#[derive(Debug)]
pub struct ShapeWrapper {
    referenced: Option<ShapeRef>,
    /// Surface material
    pub material: ShapeMaterial,
    /// Wrappers of child shapes owned through this wrapper
    pub sub_wrappers: Vec<WrapperRef>,
    count: RefCount,
}

impl ShapeWrapper {
    /// The wrapped shape
    pub fn referenced(&self) -> Option<&ShapeRef> {
        self.referenced.as_ref()
    }

    /// Point the wrapper at another shape.
    ///
    /// Adds one reference to `shape` and releases the one held on the
    /// previous target.
    pub fn set_referenced_object(&mut self, shape: Option<&ShapeRef>) {
        self.referenced = shape.cloned();
    }
}

/// Arena of shapes and wrappers
#[derive(Debug, Default)]
pub struct ShapeGraph {
    shapes: SlotMap<ShapeId, ShapeNode>,
    wrappers: SlotMap<WrapperId, ShapeWrapper>,
}

impl ShapeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a shape and return its birth reference
    pub fn insert_shape(&mut self, kind: ShapeKind, tag: ShapeTag) -> ShapeRef {
        let count = ShapeRef::new_count();
        let key = self.shapes.insert(ShapeNode {
            kind,
            user_data: None,
            tag,
            count: Arc::clone(&count),
        });
        ShapeRef::birth(key, &count)
    }

    /// Insert an empty wrapper and return its birth reference
    pub fn insert_wrapper(&mut self, material: ShapeMaterial) -> WrapperRef {
        let count = WrapperRef::new_count();
        let key = self.wrappers.insert(ShapeWrapper {
            referenced: None,
            material,
            sub_wrappers: Vec::new(),
            count: Arc::clone(&count),
        });
        WrapperRef::birth(key, &count)
    }

    /// Point `wrapper` at `shape` and set the shape's back reference
    pub fn wrap(&mut self, wrapper: WrapperId, shape: &ShapeRef) {
        if let Some(w) = self.wrappers.get_mut(wrapper) {
            w.set_referenced_object(Some(shape));
        }
        if let Some(node) = self.shapes.get_mut(shape.key()) {
            node.user_data = Some(wrapper);
        }
    }

    /// Shape lookup
    pub fn shape(&self, id: ShapeId) -> Option<&ShapeNode> {
        self.shapes.get(id)
    }

    /// Mutable shape lookup
    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut ShapeNode> {
        self.shapes.get_mut(id)
    }

    /// Mutable capsule lookup
    pub fn capsule_mut(&mut self, id: ShapeId) -> Option<&mut CapsuleShape> {
        match self.shapes.get_mut(id).map(|node| &mut node.kind) {
            Some(ShapeKind::Capsule(capsule)) => Some(capsule),
            _ => None,
        }
    }

    /// Wrapper lookup
    pub fn wrapper(&self, id: WrapperId) -> Option<&ShapeWrapper> {
        self.wrappers.get(id)
    }

    /// Mutable wrapper lookup
    pub fn wrapper_mut(&mut self, id: WrapperId) -> Option<&mut ShapeWrapper> {
        self.wrappers.get_mut(id)
    }

    /// Material of the wrapper owning `id`, if it has one
    pub fn material_of(&self, id: ShapeId) -> Option<ShapeMaterial> {
        let wrapper = self.shapes.get(id)?.user_data?;
        self.wrappers.get(wrapper).map(|w| w.material)
    }

    /// Reference count of a live shape
    pub fn shape_ref_count(&self, id: ShapeId) -> Option<u32> {
        self.shapes.get(id).map(|node| node.count.load(Ordering::Acquire))
    }

    /// Reference count of a live wrapper
    pub fn wrapper_ref_count(&self, id: WrapperId) -> Option<u32> {
        self.wrappers.get(id).map(|w| w.count.load(Ordering::Acquire))
    }

    /// Number of live shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Number of live wrappers
    pub fn wrapper_count(&self) -> usize {
        self.wrappers.len()
    }

    /// Remove every object nobody references any more.
    ///
    /// Removing a composite or wrapper drops the references it held, so the
    /// sweep repeats until nothing else falls to zero. Returns the number of
    /// objects removed.
    pub fn reclaim(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let dead_shapes: Vec<ShapeId> = self
                .shapes
                .iter()
                .filter(|(_, node)| node.count.load(Ordering::Acquire) == 0)
                .map(|(id, _)| id)
                .collect();
            let dead_wrappers: Vec<WrapperId> = self
                .wrappers
                .iter()
                .filter(|(_, w)| w.count.load(Ordering::Acquire) == 0)
                .map(|(id, _)| id)
                .collect();

            if dead_shapes.is_empty() && dead_wrappers.is_empty() {
                return removed;
            }

            removed += dead_shapes.len() + dead_wrappers.len();
            for id in dead_shapes {
                self.shapes.remove(id);
            }
            for id in dead_wrappers {
                self.wrappers.remove(id);
            }
        }
    }

    /// Deep-copy a wrapper and the shape tree it references, multiplying all
    /// geometry by `scale`.
    ///
    /// Every wrapper found on a copied shape is copied as well and owned by
    /// the returned root wrapper. Copies never alias the source, so scaling
    /// one actor's shapes cannot leak into another actor sharing the same
    /// template. Fails with `Ok(None)` if `wrapper` is not live or wraps
    /// nothing.
    pub fn deep_clone_wrapper(
        &mut self,
        wrapper: WrapperId,
        scale: f32,
        budget: usize,
    ) -> Result<Option<WrapperRef>, CloneError> {
        let Some(source) = self.wrappers.get(wrapper) else {
            return Ok(None);
        };
        let material = source.material;
        let Some(root) = source.referenced().map(RefHandle::key) else {
            return Ok(None);
        };

        let mut remaining = budget;
        let mut sub_wrappers = Vec::new();
        let shape = self.clone_shape(root, scale, &mut remaining, &mut sub_wrappers)?;

        let clone = self.insert_wrapper(material);
        self.wrap(clone.key(), &shape);
        if let Some(w) = self.wrappers.get_mut(clone.key()) {
            w.sub_wrappers = sub_wrappers;
        }
        Ok(Some(clone))
    }

    fn clone_shape(
        &mut self,
        id: ShapeId,
        scale: f32,
        remaining: &mut usize,
        sub_wrappers: &mut Vec<WrapperRef>,
    ) -> Result<ShapeRef, CloneError> {
        if *remaining == 0 {
            return Err(CloneError::BudgetExceeded);
        }
        *remaining -= 1;

        let node = self.shapes.get(id).ok_or(CloneError::MissingShape)?;
        let tag = node.tag;
        let source_wrapper = node.user_data;

        let plan = match &node.kind {
            ShapeKind::Capsule(capsule) => ClonePlan::Leaf(ShapeKind::Capsule(CapsuleShape {
                radius: capsule.radius * scale,
                vertex_a: capsule.vertex_a * scale,
                vertex_b: capsule.vertex_b * scale,
            })),
            ShapeKind::ConvexVertices(hull) => ClonePlan::Leaf(ShapeKind::ConvexVertices(hull.scaled(scale)?)),
            ShapeKind::List(list) => ClonePlan::List(list.children.iter().map(RefHandle::key).collect()),
            ShapeKind::BvTree(tree) => {
                let mut children = Vec::with_capacity(tree.num_child_shapes());
                let mut key = tree.first_key();
                for _ in 0..tree.num_child_shapes() {
                    if let Some(child) = tree.child_shape(key) {
                        children.push(child.key());
                    }
                    key = tree.next_key(key);
                }
                ClonePlan::BvTree(children)
            }
        };

        let kind = match plan {
            ClonePlan::Leaf(kind) => kind,
            ClonePlan::List(children) => {
                let mut cloned = Vec::with_capacity(children.len());
                for child in children {
                    cloned.push(self.clone_shape(child, scale, remaining, sub_wrappers)?);
                }
                ShapeKind::List(ListShape { children: cloned })
            }
            ClonePlan::BvTree(children) => {
                let mut cloned = Vec::with_capacity(children.len());
                for child in children {
                    cloned.push(self.clone_shape(child, scale, remaining, sub_wrappers)?);
                }
                ShapeKind::BvTree(BvTreeShape::new(cloned))
            }
        };

        let shape = self.insert_shape(kind, tag);
        if let Some(material) = source_wrapper.and_then(|w| self.wrappers.get(w)).map(|w| w.material) {
            let copy = self.insert_wrapper(material);
            self.wrap(copy.key(), &shape);
            sub_wrappers.push(copy);
        }
        Ok(shape)
    }
}

enum ClonePlan {
    Leaf(ShapeKind),
    List(Vec<ShapeId>),
    BvTree(Vec<ShapeId>),
}

/// Deep clone failures
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CloneError {
    /// A referenced shape is no longer in the arena
    #[error("shape graph references a reclaimed shape")]
    MissingShape,

    /// Traversal budget exhausted, the graph is cyclic or pathological
    #[error("shape graph traversal budget exceeded")]
    BudgetExceeded,

    /// A hull could not be rebuilt at the new scale
    #[error("hull rebuild failed: {0}")]
    Hull(#[from] HullError),
}
