//! Fixtures shared by the unit tests: bumper hulls, a humanoid skeleton,
//! a scriptable actor and a host, and controllers spawned into a world.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::actor::{Actor, ActorHandle, SimulationHost, Skeleton, SkeletonNode, PLAYER_FORM_ID};
use crate::foundation::math::{constants::PI, Vec3};
use crate::physics::collision_layers::{CollisionFilterInfo, CollisionLayers};
use crate::physics::{
    CapsuleShape, CharacterController, ControllerId, ConvexVerticesShape, HullBuildConfig, HullTopology, ListShape,
    PhysicsWorld, ShapeId, ShapeKind, ShapeMaterial, ShapeTag, WrapperId,
};

/// Bumper hull vertices: bottom apex at the origin, bottom ring at a tenth
/// of `height`, top ring at eight tenths, top apex (full topology) at `height`.
pub fn bumper_vertices(topology: HullTopology, radius: f32, height: f32) -> Vec<Vec3> {
    let mut vertices = vec![Vec3::zeros(); topology.vertex_count()];
    for (k, (top, bottom)) in topology.top_ring().into_iter().zip(topology.bottom_ring()).enumerate() {
        let angle = k as f32 * PI / 4.0;
        let (s, c) = angle.sin_cos();
        vertices[top] = Vec3::new(c * radius, s * radius, height * 0.8);
        vertices[bottom] = Vec3::new(c * radius, s * radius, height * 0.1);
    }
    if let Some(apex) = topology.top_apex() {
        vertices[apex] = Vec3::new(0.0, 0.0, height);
    }
    vertices
}

/// Model root, `NPC`, `NPC Root [Root]` and the three sampled bones, sized
/// for a character `height` game units tall
pub fn humanoid_skeleton(height: f32) -> Skeleton {
    let mut skeleton = Skeleton::new(SkeletonNode::new("model"));
    let npc = skeleton
        .add_child(skeleton.root(), SkeletonNode::new("NPC"))
        .expect("model root exists");
    let root = skeleton
        .add_child(npc, SkeletonNode::new("NPC Root [Root]"))
        .expect("NPC exists");
    skeleton.add_child(
        root,
        SkeletonNode::new("NPC Head [Head]").with_translate(Vec3::new(0.0, 0.05 * height, 0.95 * height)),
    );
    skeleton.add_child(
        root,
        SkeletonNode::new("NPC R Clavicle [RClv]").with_translate(Vec3::new(0.1 * height, 0.0, 0.8 * height)),
    );
    skeleton.add_child(
        root,
        SkeletonNode::new("NPC R RearCalf [RrClf]").with_translate(Vec3::new(0.08 * height, 0.0, 0.25 * height)),
    );
    skeleton
}

/// Scriptable actor
pub struct TestActor {
    form_id: u32,
    teammate: bool,
    npc_keyword: bool,
    race_keyword: Option<bool>,
    heading: f32,
    group: u16,
    dead: AtomicBool,
    sneaking: AtomicBool,
    position: RwLock<Vec3>,
    world: RwLock<Option<Arc<PhysicsWorld>>>,
    controller: RwLock<Option<ControllerId>>,
    skeleton: RwLock<Option<Arc<Skeleton>>>,
    first_person: Option<Arc<Skeleton>>,
}

/// Builder for [`TestActor`]
pub struct TestActorBuilder {
    actor: TestActor,
}

impl TestActor {
    /// Humanoid non-player actor
    pub fn npc() -> TestActorBuilder {
        TestActorBuilder {
            actor: Self {
                form_id: 0xFF00_0800,
                teammate: false,
                npc_keyword: true,
                race_keyword: Some(true),
                heading: 0.0,
                group: 1,
                dead: AtomicBool::new(false),
                sneaking: AtomicBool::new(false),
                position: RwLock::new(Vec3::zeros()),
                world: RwLock::new(None),
                controller: RwLock::new(None),
                skeleton: RwLock::new(None),
                first_person: None,
            },
        }
    }

    /// The player character
    pub fn player() -> TestActorBuilder {
        let mut builder = Self::npc();
        builder.actor.form_id = PLAYER_FORM_ID;
        builder
    }

    /// Non-humanoid actor
    pub fn creature() -> TestActorBuilder {
        let mut builder = Self::npc();
        builder.actor.npc_keyword = false;
        builder.actor.race_keyword = Some(false);
        builder
    }

    /// Weak handle as the handler stores it
    pub fn handle(self: &Arc<Self>) -> ActorHandle {
        let actor: Arc<dyn Actor> = Arc::clone(self) as Arc<dyn Actor>;
        Arc::downgrade(&actor)
    }

    /// Kill or revive
    pub fn set_dead(&self, dead: bool) {
        self.dead.store(dead, Ordering::Release);
    }

    /// Start or stop sneaking
    pub fn set_sneaking(&self, sneaking: bool) {
        self.sneaking.store(sneaking, Ordering::Release);
    }

    /// Swap the third person skeleton
    pub fn set_skeleton(&self, skeleton: Skeleton) {
        *self.skeleton.write().unwrap() = Some(Arc::new(skeleton));
    }

    /// Unload the physics world
    pub fn clear_world(&self) {
        *self.world.write().unwrap() = None;
    }

    /// Attach a controller after the fact
    pub fn set_controller(&self, id: ControllerId) {
        *self.controller.write().unwrap() = Some(id);
    }
}

impl TestActorBuilder {
    /// Mark as a player teammate
    pub fn teammate(mut self) -> Self {
        self.actor.teammate = true;
        self
    }

    /// Race data not loaded
    pub fn without_race(mut self) -> Self {
        self.actor.race_keyword = None;
        self
    }

    /// Physics world of the actor's cell
    pub fn with_world(self, world: Arc<PhysicsWorld>) -> Self {
        *self.actor.world.write().unwrap() = Some(world);
        self
    }

    /// Character controller
    pub fn with_controller(self, id: ControllerId) -> Self {
        *self.actor.controller.write().unwrap() = Some(id);
        self
    }

    /// Third person skeleton
    pub fn with_skeleton(self, skeleton: Skeleton) -> Self {
        *self.actor.skeleton.write().unwrap() = Some(Arc::new(skeleton));
        self
    }

    /// First person skeleton
    pub fn with_first_person_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.actor.first_person = Some(Arc::new(skeleton));
        self
    }

    /// World position, game units
    pub fn with_position(self, position: Vec3) -> Self {
        *self.actor.position.write().unwrap() = position;
        self
    }

    /// Heading, radians
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.actor.heading = heading;
        self
    }

    /// Collision group
    pub fn with_group(mut self, group: u16) -> Self {
        self.actor.group = group;
        self
    }

    /// Finish
    pub fn build(self) -> Arc<TestActor> {
        Arc::new(self.actor)
    }
}

impl Actor for TestActor {
    fn form_id(&self) -> u32 {
        self.form_id
    }

    fn is_player_teammate(&self) -> bool {
        self.teammate
    }

    fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    fn is_sneaking(&self) -> bool {
        self.sneaking.load(Ordering::Acquire)
    }

    fn has_keyword(&self, _keyword: &str) -> bool {
        self.npc_keyword
    }

    fn race_has_keyword(&self, _keyword: &str) -> Option<bool> {
        self.race_keyword
    }

    fn position(&self) -> Vec3 {
        *self.position.read().unwrap()
    }

    fn heading(&self) -> f32 {
        self.heading
    }

    fn collision_filter_info(&self) -> CollisionFilterInfo {
        CollisionFilterInfo::new(CollisionLayers::BIPED, self.group)
    }

    fn world(&self) -> Option<Arc<PhysicsWorld>> {
        self.world.read().unwrap().clone()
    }

    fn controller_id(&self) -> Option<ControllerId> {
        *self.controller.read().unwrap()
    }

    fn skeleton(&self, first_person: bool) -> Option<Arc<Skeleton>> {
        if first_person {
            self.first_person.clone()
        } else {
            self.skeleton.read().unwrap().clone()
        }
    }
}

/// Scriptable simulation host
#[derive(Default)]
pub struct TestHost {
    /// Pause flag
    pub paused: bool,
    /// Player character
    pub player: Option<Arc<dyn Actor>>,
    /// High process actors
    pub high: Vec<Arc<dyn Actor>>,
}

impl TestHost {
    /// Host with a player and no other actors
    pub fn with_player(player: Arc<TestActor>) -> Self {
        Self {
            player: Some(player),
            ..Self::default()
        }
    }
}

impl SimulationHost for TestHost {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn player(&self) -> Option<Arc<dyn Actor>> {
        self.player.clone()
    }

    fn high_actors(&self) -> Vec<Arc<dyn Actor>> {
        self.high.clone()
    }
}

/// Standard body capsule, physics units
pub fn body_capsule() -> CapsuleShape {
    CapsuleShape {
        radius: 0.25,
        vertex_a: Vec3::new(0.0, 0.02, 1.0),
        vertex_b: Vec3::new(0.0, 0.02, 0.3),
    }
}

/// Controller layout to spawn
pub struct ControllerFixture {
    proxy: bool,
    hull: Option<Vec<Vec3>>,
    direct: bool,
    capsules: Vec<CapsuleShape>,
    bumper: Option<CapsuleShape>,
    position: Vec3,
}

/// Ids of a spawned fixture
#[derive(Debug, Clone)]
pub struct Spawned {
    /// Controller
    pub id: ControllerId,
    /// Wrapper of the root shape, held in the controller's second slot
    pub root_wrapper: WrapperId,
    /// Root shape
    pub root: ShapeId,
    /// Hull
    pub convex: Option<ShapeId>,
    /// Body capsules
    pub capsules: Vec<ShapeId>,
    /// Bumper capsule
    pub bumper: Option<ShapeId>,
}

impl ControllerFixture {
    /// Proxy controller with an 18 vertex hull and one body capsule in a list
    pub fn proxy() -> Self {
        Self {
            proxy: true,
            hull: Some(bumper_vertices(HullTopology::Full, 0.3, 1.2)),
            direct: false,
            capsules: vec![body_capsule()],
            bumper: None,
            position: Vec3::zeros(),
        }
    }

    /// Rigid-body controller with the same layout as [`Self::proxy`]
    pub fn rigid_body() -> Self {
        Self {
            proxy: false,
            ..Self::proxy()
        }
    }

    /// Replace the hull vertices, `None` for no hull
    pub fn with_hull(mut self, vertices: Option<Vec<Vec3>>) -> Self {
        self.hull = vertices;
        self
    }

    /// Install the hull as the root shape instead of inside a list
    pub fn direct(mut self) -> Self {
        self.direct = true;
        self
    }

    /// Replace the body capsules
    pub fn with_capsules(mut self, capsules: Vec<CapsuleShape>) -> Self {
        self.capsules = capsules;
        self
    }

    /// Add a bumper capsule after the body capsules
    pub fn with_bumper(mut self, bumper: CapsuleShape) -> Self {
        self.bumper = Some(bumper);
        self
    }

    /// Controller position, physics units
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Build the shapes and add the controller to `world`
    pub fn spawn(self, world: &PhysicsWorld) -> Spawned {
        let mut state = world.write();
        let shapes = &mut state.shapes;

        let hull = self.hull.map(|vertices| {
            let built = ConvexVerticesShape::build(&vertices, &HullBuildConfig::default()).unwrap();
            let hull = shapes.insert_shape(ShapeKind::ConvexVertices(built), ShapeTag::CharControllerShape);
            let wrapper = shapes.insert_wrapper(ShapeMaterial::Default);
            shapes.wrap(wrapper.key(), &hull);
            (hull, wrapper)
        });
        let convex = hull.as_ref().map(|(hull, _)| hull.key());

        let mut sub_wrappers = Vec::new();
        let (root, capsules, bumper) = if self.direct {
            let (hull, wrapper) = hull.expect("direct fixture needs a hull");
            sub_wrappers.push(wrapper);
            (hull, Vec::new(), None)
        } else {
            let mut children = Vec::new();
            if let Some((hull, wrapper)) = hull {
                children.push(hull);
                sub_wrappers.push(wrapper);
            }
            let mut capsules = Vec::new();
            for capsule in self.capsules {
                let shape = shapes.insert_shape(ShapeKind::Capsule(capsule), ShapeTag::Plain);
                capsules.push(shape.key());
                children.push(shape);
            }
            let bumper = self.bumper.map(|capsule| {
                let shape = shapes.insert_shape(ShapeKind::Capsule(capsule), ShapeTag::Plain);
                let wrapper = shapes.insert_wrapper(ShapeMaterial::CharacterBumper);
                shapes.wrap(wrapper.key(), &shape);
                sub_wrappers.push(wrapper);
                let id = shape.key();
                children.push(shape);
                id
            });
            let list = shapes.insert_shape(ShapeKind::List(ListShape { children }), ShapeTag::Plain);
            (list, capsules, bumper)
        };

        let root_id = root.key();
        // the hull wrapper doubles as the root wrapper when the hull is the root
        let root_wrapper = if self.direct {
            sub_wrappers.remove(0)
        } else {
            let wrapper = shapes.insert_wrapper(ShapeMaterial::Default);
            shapes.wrap(wrapper.key(), &root);
            if let Some(w) = shapes.wrapper_mut(wrapper.key()) {
                w.sub_wrappers = sub_wrappers;
            }
            wrapper
        };
        let root_wrapper_id = root_wrapper.key();

        let mut controller = if self.proxy {
            CharacterController::proxy(root, self.position)
        } else {
            CharacterController::rigid_body(root, self.position)
        };
        controller.shapes[1] = Some(root_wrapper);
        let id = state.add_controller(controller);

        Spawned {
            id,
            root_wrapper: root_wrapper_id,
            root: root_id,
            convex,
            capsules,
            bumper,
        }
    }
}
