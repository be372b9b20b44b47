//! Skeleton node tree
//!
//! Nodes live in a slotmap arena and are linked parent to children. Named
//! nodes are indexed for direct lookup; a name missing from the index falls
//! back to a bounded breadth-first search, since some loaders attach nodes
//! without registering their names.

use slotmap::{new_key_type, SlotMap};
use std::collections::{HashMap, VecDeque};

use crate::foundation::logging::warn;
use crate::foundation::math::Vec3;
use crate::physics::collision_layers::{CollisionFilterInfo, CollisionLayers};
use crate::physics::shape::ShapeMaterial;

new_key_type! {
    /// Arena key of a skeleton node
    pub struct NodeId;
}

/// Collision object attached to a skeleton node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCollision {
    /// Layer and group of the collision object
    pub filter_info: CollisionFilterInfo,
    /// Material of the collision object's shape
    pub material: ShapeMaterial,
}

/// A node in the skeleton tree
#[derive(Debug, Clone)]
pub struct SkeletonNode {
    /// Node name
    pub name: String,
    /// Translation relative to the parent, game units
    pub local_translate: Vec3,
    /// Uniform scale relative to the parent
    pub local_scale: f32,
    /// Translation in world space, game units
    pub world_translate: Vec3,
    /// Attached collision object
    pub collision: Option<NodeCollision>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SkeletonNode {
    /// Create a node at the parent origin with unit scale
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_translate: Vec3::zeros(),
            local_scale: 1.0,
            world_translate: Vec3::zeros(),
            collision: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder: local translation
    pub fn with_translate(mut self, translate: Vec3) -> Self {
        self.local_translate = translate;
        self
    }

    /// Builder: local scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.local_scale = scale;
        self
    }

    /// Builder: attached collision object
    pub fn with_collision(mut self, filter_info: CollisionFilterInfo, material: ShapeMaterial) -> Self {
        self.collision = Some(NodeCollision { filter_info, material });
        self
    }

    /// Parent node
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An actor's loaded skeleton
#[derive(Debug, Clone)]
pub struct Skeleton {
    nodes: SlotMap<NodeId, SkeletonNode>,
    names: HashMap<String, NodeId>,
    root: NodeId,
}

impl Skeleton {
    /// Create a skeleton from its root node
    pub fn new(root: SkeletonNode) -> Self {
        let mut nodes = SlotMap::with_key();
        let name = root.name.clone();
        let root = nodes.insert(root);
        let mut names = HashMap::new();
        names.insert(name, root);
        let mut skeleton = Self { nodes, names, root };
        skeleton.update_world_transforms();
        skeleton
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Root node data
    pub fn root_node(&self) -> Option<&SkeletonNode> {
        self.nodes.get(self.root)
    }

    /// Node lookup
    pub fn node(&self, id: NodeId) -> Option<&SkeletonNode> {
        self.nodes.get(id)
    }

    /// Mutable node lookup. Call [`Self::update_world_transforms`] after
    /// changing local transforms.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SkeletonNode> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the skeleton has only its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Attach `node` under `parent` and index its name
    pub fn add_child(&mut self, parent: NodeId, node: SkeletonNode) -> Option<NodeId> {
        let name = node.name.clone();
        let id = self.add_child_unindexed(parent, node)?;
        self.names.entry(name).or_insert(id);
        Some(id)
    }

    /// Attach `node` under `parent` without indexing its name; it is then
    /// only reachable through the search fallback of [`Self::find`]
    pub fn add_child_unindexed(&mut self, parent: NodeId, mut node: SkeletonNode) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        self.update_world_transforms();
        Some(id)
    }

    /// Recompute world translations from the local transforms
    pub fn update_world_transforms(&mut self) {
        let mut stack = vec![(self.root, Vec3::zeros(), 1.0_f32)];
        while let Some((id, parent_translate, parent_scale)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.world_translate = parent_translate + node.local_translate * parent_scale;
            let scale = parent_scale * node.local_scale;
            let translate = node.world_translate;
            stack.extend(node.children.iter().map(|&child| (child, translate, scale)));
        }
    }

    /// Find a node by name.
    ///
    /// The name index is consulted first. Otherwise the tree is searched
    /// breadth first, visiting at most `budget` nodes and giving up on any
    /// node with more than `budget` children.
    pub fn find(&self, name: &str, budget: usize) -> Option<NodeId> {
        if let Some(&id) = self.names.get(name) {
            return Some(id);
        }

        let mut queue = VecDeque::from([self.root]);
        let mut remaining = budget;
        while let Some(id) = queue.pop_front() {
            if remaining == 0 {
                warn!("Bone search for '{}' exceeded its budget of {} nodes", name, budget);
                return None;
            }
            remaining -= 1;

            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node.children.len() > budget {
                warn!("Bone search for '{}' hit a node with {} children", name, node.children.len());
                return None;
            }
            queue.extend(node.children.iter().copied());
            if node.name == name {
                return Some(id);
            }
        }
        None
    }

    /// Find a node by name and return its data
    pub fn find_node(&self, name: &str, budget: usize) -> Option<&SkeletonNode> {
        self.find(name, budget).and_then(|id| self.nodes.get(id))
    }

    /// Whether the sub-tree under `from` holds a collision object on the
    /// character controller layer that is not a bumper.
    ///
    /// Visits at most `budget` nodes; an exhausted budget answers `false`.
    pub fn has_character_collision(&self, from: NodeId, budget: usize) -> bool {
        let mut stack = vec![from];
        let mut remaining = budget;
        while let Some(id) = stack.pop() {
            if remaining == 0 {
                warn!("Character collision search exceeded its budget of {} nodes", budget);
                return false;
            }
            remaining -= 1;

            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if let Some(collision) = node.collision {
                if collision.filter_info.layer() == CollisionLayers::CHAR_CONTROLLER
                    && collision.material != ShapeMaterial::CharacterBumper
                {
                    return true;
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        false
    }
}
