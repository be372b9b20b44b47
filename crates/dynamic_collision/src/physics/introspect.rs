//! Shape graph introspection
//!
//! Walks a controller's collision shape tree depth-first with an explicit
//! stack and pulls out the primitives the adjustment code edits. Every walk
//! is bounded by a node budget so a cyclic or corrupted graph ends in an
//! error instead of looping.

use super::controller::{CharacterController, ShapeOwner};
use super::shape::{ShapeGraph, ShapeId, ShapeKind};

/// Introspection failures
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeQueryError {
    /// The controller has no collision shape installed
    #[error("controller has no collision shape")]
    NoShape,

    /// The shape tree holds nothing of the requested kind
    #[error("no {0} shape in the controller's shape tree")]
    NotFound(&'static str),

    /// Traversal budget exhausted
    #[error("shape traversal exceeded its budget of {0} nodes")]
    BudgetExceeded(usize),
}

/// Primitives reachable from a controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeSet {
    /// Convex hull, if any
    pub convex: Option<ShapeId>,
    /// Capsules in depth-first order
    pub capsules: Vec<ShapeId>,
}

/// Where a controller's convex hull lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvexLocation {
    /// Object owning the root shape
    pub owner: ShapeOwner,
    /// List shape holding the hull as its first child, if the root is a list
    pub list: Option<ShapeId>,
    /// The hull itself
    pub convex: ShapeId,
}

struct Walk<'a> {
    graph: &'a ShapeGraph,
    budget: usize,
    visited: usize,
    pending: Vec<ShapeId>,
    set: ShapeSet,
}

impl Walk<'_> {
    fn run(&mut self, root: ShapeId) -> Result<(), ShapeQueryError> {
        self.pending.push(root);
        while let Some(id) = self.pending.pop() {
            if self.visited >= self.budget {
                return Err(ShapeQueryError::BudgetExceeded(self.budget));
            }
            self.visited += 1;
            self.visit(id);
        }
        Ok(())
    }

    fn visit(&mut self, id: ShapeId) {
        let Some(node) = self.graph.shape(id) else {
            return;
        };
        // Children go on in reverse so they pop in order.
        let mark = self.pending.len();
        match &node.kind {
            ShapeKind::Capsule(_) => self.set.capsules.push(id),
            ShapeKind::ConvexVertices(_) => {
                if self.set.convex.is_none() {
                    self.set.convex = Some(id);
                }
            }
            ShapeKind::List(list) => {
                self.pending.extend(list.children.iter().map(|child| child.key()));
            }
            ShapeKind::BvTree(tree) => {
                let mut key = tree.first_key();
                for _ in 0..tree.num_child_shapes() {
                    if let Some(child) = tree.child_shape(key) {
                        self.pending.push(child.key());
                    }
                    key = tree.next_key(key);
                }
            }
        }
        self.pending[mark..].reverse();
    }
}

/// Collect every capsule and the first convex hull under the controller's
/// collision shape
pub fn collect_shapes(
    graph: &ShapeGraph,
    controller: &CharacterController,
    budget: usize,
) -> Result<ShapeSet, ShapeQueryError> {
    let root = controller.collidable_shape().ok_or(ShapeQueryError::NoShape)?;
    let mut walk = Walk {
        graph,
        budget,
        visited: 0,
        pending: Vec::new(),
        set: ShapeSet::default(),
    };
    walk.run(root.key())?;
    Ok(walk.set)
}

/// Capsules under the controller's collision shape, in depth-first order
pub fn collect_capsules(
    graph: &ShapeGraph,
    controller: &CharacterController,
    budget: usize,
) -> Result<Vec<ShapeId>, ShapeQueryError> {
    let set = collect_shapes(graph, controller, budget)?;
    if set.capsules.is_empty() {
        return Err(ShapeQueryError::NotFound("capsule"));
    }
    Ok(set.capsules)
}

/// Locate the controller's convex hull.
///
/// The hull is either the root shape itself or the first child of a root
/// list shape.
pub fn find_convex_shape(graph: &ShapeGraph, controller: &CharacterController) -> Result<ConvexLocation, ShapeQueryError> {
    let owner = controller.shape_owner().ok_or(ShapeQueryError::NoShape)?;
    let root = controller.collidable_shape().ok_or(ShapeQueryError::NoShape)?.key();
    let node = graph.shape(root).ok_or(ShapeQueryError::NoShape)?;

    let (list, candidate) = match &node.kind {
        ShapeKind::List(list) => {
            let first = list.children.first().ok_or(ShapeQueryError::NotFound("convex vertices"))?;
            (Some(root), first.key())
        }
        _ => (None, root),
    };

    match graph.shape(candidate).map(|node| &node.kind) {
        Some(ShapeKind::ConvexVertices(_)) => Ok(ConvexLocation { owner, list, convex: candidate }),
        _ => Err(ShapeQueryError::NotFound("convex vertices")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::hull::{ConvexVerticesShape, HullBuildConfig, HullTopology};
    use crate::physics::shape::{BvTreeShape, CapsuleShape, ListShape, ShapeRef, ShapeTag};
    use crate::test_support::bumper_vertices;

    fn capsule(graph: &mut ShapeGraph, radius: f32) -> ShapeRef {
        graph.insert_shape(
            ShapeKind::Capsule(CapsuleShape { radius, vertex_a: Vec3::z(), vertex_b: Vec3::zeros() }),
            ShapeTag::Plain,
        )
    }

    fn hull(graph: &mut ShapeGraph) -> ShapeRef {
        let vertices = bumper_vertices(HullTopology::Full, 0.3, 1.2);
        let shape = ConvexVerticesShape::build(&vertices, &HullBuildConfig::default()).unwrap();
        graph.insert_shape(ShapeKind::ConvexVertices(shape), ShapeTag::CharControllerShape)
    }

    #[test]
    fn test_collect_through_list_and_bv_tree() {
        let mut graph = ShapeGraph::new();
        let a = capsule(&mut graph, 0.1);
        let b = capsule(&mut graph, 0.2);
        let c = capsule(&mut graph, 0.3);
        let (a_id, b_id, c_id) = (a.key(), b.key(), c.key());
        let tree = graph.insert_shape(ShapeKind::BvTree(BvTreeShape::new(vec![b, c])), ShapeTag::Plain);
        let convex = hull(&mut graph);
        let convex_id = convex.key();
        let root = graph.insert_shape(ShapeKind::List(ListShape { children: vec![convex, a, tree] }), ShapeTag::Plain);

        let controller = CharacterController::rigid_body(root, Vec3::zeros());
        let set = collect_shapes(&graph, &controller, 64).unwrap();
        assert_eq!(set.convex, Some(convex_id));
        assert_eq!(set.capsules, vec![a_id, b_id, c_id]);
    }

    #[test]
    fn test_budget_stops_runaway() {
        let mut graph = ShapeGraph::new();
        let mut shape = capsule(&mut graph, 0.1);
        for _ in 0..10 {
            shape = graph.insert_shape(ShapeKind::List(ListShape { children: vec![shape] }), ShapeTag::Plain);
        }
        let controller = CharacterController::proxy(shape, Vec3::zeros());

        assert_eq!(collect_capsules(&graph, &controller, 5), Err(ShapeQueryError::BudgetExceeded(5)));
        assert_eq!(collect_capsules(&graph, &controller, 11).map(|c| c.len()), Ok(1));
    }

    #[test]
    fn test_nested_lists_keep_depth_first_order() {
        let mut graph = ShapeGraph::new();
        let a = capsule(&mut graph, 0.1);
        let b = capsule(&mut graph, 0.2);
        let c = capsule(&mut graph, 0.3);
        let ids = vec![a.key(), b.key(), c.key()];
        let inner = graph.insert_shape(ShapeKind::List(ListShape { children: vec![a, b] }), ShapeTag::Plain);
        let root = graph.insert_shape(ShapeKind::List(ListShape { children: vec![inner, c] }), ShapeTag::Plain);

        let controller = CharacterController::proxy(root, Vec3::zeros());
        assert_eq!(collect_capsules(&graph, &controller, 16), Ok(ids));
    }

    #[test]
    fn test_deep_chain_walks_without_recursion() {
        let depth = 50_000;
        let mut graph = ShapeGraph::new();
        let mut shape = capsule(&mut graph, 0.1);
        for _ in 0..depth {
            shape = graph.insert_shape(ShapeKind::List(ListShape { children: vec![shape] }), ShapeTag::Plain);
        }
        let controller = CharacterController::proxy(shape, Vec3::zeros());

        assert_eq!(collect_capsules(&graph, &controller, depth + 1).map(|c| c.len()), Ok(1));
    }

    #[test]
    fn test_find_convex_in_list_or_direct() {
        let mut graph = ShapeGraph::new();
        let convex = hull(&mut graph);
        let convex_id = convex.key();
        let list = graph.insert_shape(ShapeKind::List(ListShape { children: vec![convex] }), ShapeTag::Plain);
        let list_id = list.key();
        let controller = CharacterController::proxy(list, Vec3::zeros());

        let found = find_convex_shape(&graph, &controller).unwrap();
        assert_eq!(found.list, Some(list_id));
        assert_eq!(found.convex, convex_id);
        assert_eq!(found.owner, ShapeOwner::ProxyPhantom);

        let direct = hull(&mut graph);
        let direct_id = direct.key();
        let controller = CharacterController::rigid_body(direct, Vec3::zeros());
        let found = find_convex_shape(&graph, &controller).unwrap();
        assert_eq!(found.list, None);
        assert_eq!(found.convex, direct_id);
        assert_eq!(found.owner, ShapeOwner::RigidBodyCharacter);
    }

    #[test]
    fn test_no_convex() {
        let mut graph = ShapeGraph::new();
        let controller = CharacterController::proxy(capsule(&mut graph, 0.2), Vec3::zeros());
        assert_eq!(
            find_convex_shape(&graph, &controller),
            Err(ShapeQueryError::NotFound("convex vertices"))
        );
    }
}
