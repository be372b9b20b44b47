//! Per-controller adjustment state
//!
//! A [`ControllerRecord`] captures a controller's original geometry once and
//! rebuilds the live shapes from it whenever the actor's scale or state calls
//! for it. Setup takes the world write lock itself; every later operation is
//! handed the already locked [`WorldState`] so a whole tick shares one lock.

use std::sync::Arc;

use super::capsule::{adjust_capsule, CapsuleSnapshot, CapsuleTop};
use super::convex::{full_hull, simple_hull, BoneSamples, StateMultipliers};
use super::error::{AdjustError, AdjustResult};
use crate::actor::{bone_offset, compute_scale, head_offset, Actor, ActorHandle};
use crate::config::AdjustmentSettings;
use crate::foundation::logging::{debug, trace};
use crate::foundation::math::{utils, Vec3};
use crate::physics::{
    collect_capsules, find_convex_shape, CharacterController, CharacterState, CloneError, ControllerFlags,
    ControllerId, ConvexVerticesShape, HullTopology, PhysicsWorld, ShapeGraph, ShapeKind, ShapeQueryError, ShapeTag,
    WorldState, WrapperRef,
};

/// Which branch a tick took for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    /// Per-tick adjustment is switched off
    Disabled,
    /// The actor or its world is gone
    Unavailable,
    /// The actor is dead
    Dead,
    /// Player or teammate: bone-driven hull and capsules
    Full,
    /// Scale changed on an ordinary actor: scale-driven hull and capsules
    Simple,
    /// Nothing to do this tick
    Skipped,
}

/// Adjustment state of one character controller
#[derive(Debug)]
pub struct ControllerRecord {
    controller: ControllerId,
    actor: ActorHandle,
    /// Scale applied by the last adjustment
    pub scale: f32,
    /// Scale the creature clone was last built at
    pub previous_scale: f32,
    /// Neither the actor nor its race is humanoid
    pub is_creature: bool,
    /// Last reported sneak state
    pub is_sneaking: bool,
    /// Last reported movement state
    pub movement_state: CharacterState,
    original_convex_radius: f32,
    original_vertices: Vec<Vec3>,
    original_capsules: Vec<CapsuleSnapshot>,
    cached_collider_height: Vec3,
    owned_clone: Option<WrapperRef>,
    initialized: bool,
}

impl ControllerRecord {
    /// Empty record; run [`Self::initialize`] and [`Self::setup_capsules`]
    /// before adjusting
    pub fn new(controller: ControllerId, actor: ActorHandle) -> Self {
        Self {
            controller,
            actor,
            scale: 1.0,
            previous_scale: 1.0,
            is_creature: false,
            is_sneaking: false,
            movement_state: CharacterState::OnGround,
            original_convex_radius: 0.0,
            original_vertices: Vec::new(),
            original_capsules: Vec::new(),
            cached_collider_height: Vec3::zeros(),
            owned_clone: None,
            initialized: false,
        }
    }

    /// Record and run both setup steps, logging what failed
    pub fn create(controller: ControllerId, actor: ActorHandle, settings: &AdjustmentSettings) -> Self {
        let mut record = Self::new(controller, actor);
        if let Err(e) = record.initialize(settings) {
            debug!("Controller {} not initialized: {}", controller.raw(), e);
        }
        if let Err(e) = record.setup_capsules(settings) {
            debug!("Controller {} capsule setup skipped: {}", controller.raw(), e);
        }
        record
    }

    /// Controller this record adjusts
    pub fn controller(&self) -> ControllerId {
        self.controller
    }

    /// The tracked actor, if still loaded
    pub fn actor(&self) -> Option<Arc<dyn Actor>> {
        self.actor.upgrade()
    }

    /// Physics world of the tracked actor
    pub fn world(&self) -> Option<Arc<PhysicsWorld>> {
        self.actor.upgrade().and_then(|actor| actor.world())
    }

    /// Whether [`Self::initialize`] completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Hull vertices captured at setup
    pub fn original_vertices(&self) -> &[Vec3] {
        &self.original_vertices
    }

    /// Horizontal radius of the captured hull, 0 if its layout is unknown
    pub fn original_convex_radius(&self) -> f32 {
        self.original_convex_radius
    }

    /// Capsules captured at setup
    pub fn original_capsules(&self) -> &[CapsuleSnapshot] {
        &self.original_capsules
    }

    /// Vector from the controller origin to the hull top at the last full
    /// adjustment
    pub fn cached_collider_height(&self) -> Vec3 {
        self.cached_collider_height
    }

    /// Capture the controller's hull and enable its bumper.
    ///
    /// A controller without a hull still counts as initialized; the hull
    /// adjustments then fail on the empty snapshot.
    pub fn initialize(&mut self, settings: &AdjustmentSettings) -> AdjustResult {
        let actor = self.actor.upgrade().ok_or(AdjustError::Unavailable("actor"))?;
        let world = actor.world().ok_or(AdjustError::Unavailable("physics world"))?;

        self.is_sneaking = actor.is_sneaking();
        self.scale = compute_scale(&*actor, settings);

        let mut state = world.write();
        let (controller, shapes) = state
            .controller_and_shapes(self.controller)
            .ok_or(AdjustError::Unavailable("controller"))?;
        self.movement_state = controller.state;

        match find_convex_shape(shapes, controller) {
            Ok(location) => {
                if let Some(hull) = shapes.shape(location.convex).and_then(|node| node.as_convex()) {
                    self.original_vertices = hull.original_vertices().to_vec();
                    self.original_convex_radius = if HullTopology::detect(self.original_vertices.len()).is_some() {
                        utils::planar_length(&self.original_vertices[0])
                    } else {
                        0.0
                    };
                }
            }
            Err(e) => debug!("Controller {} has no bumper hull: {}", self.controller.raw(), e),
        }

        controller.flags.insert(ControllerFlags::BUMPER_ENABLED);
        controller.toggle_bumper();
        self.initialized = true;
        Ok(())
    }

    /// Classify the actor and capture its capsules.
    ///
    /// A creature on a rigid-body controller first gets a private deep copy
    /// of its shape tree at its current scale, so its geometry never aliases
    /// the template shared with other actors of its kind.
    pub fn setup_capsules(&mut self, settings: &AdjustmentSettings) -> AdjustResult {
        let actor = self.actor.upgrade().ok_or(AdjustError::Unavailable("actor"))?;
        let world = actor.world().ok_or(AdjustError::Unavailable("physics world"))?;
        let race_is_npc = actor
            .race_has_keyword(&settings.npc_keyword)
            .ok_or(AdjustError::Unavailable("race"))?;
        self.is_creature = !actor.has_keyword(&settings.npc_keyword) && !race_is_npc;

        let mut state = world.write();
        let (controller, shapes) = state
            .controller_and_shapes(self.controller)
            .ok_or(AdjustError::Unavailable("controller"))?;
        let slot = controller.shape_slot().ok_or(AdjustError::Unavailable("shape slot"))?;

        if !controller.is_proxy() {
            if self.is_creature {
                let clone = Self::clone_root(controller, shapes, self.scale, settings.traversal_budget)?;
                self.install_clone(controller, shapes, slot, clone)?;
            }
            self.previous_scale = self.scale;
        }

        self.original_capsules = collect_capsules(shapes, controller, settings.traversal_budget)?
            .into_iter()
            .filter_map(|id| shapes.shape(id).and_then(|node| node.as_capsule()).map(CapsuleSnapshot::from))
            .collect();
        Ok(())
    }

    fn clone_root(
        controller: &CharacterController,
        shapes: &mut ShapeGraph,
        scale: f32,
        budget: usize,
    ) -> AdjustResult<WrapperRef> {
        let root = controller.collidable_shape().ok_or(ShapeQueryError::NoShape)?.key();
        let wrapper = shapes
            .shape(root)
            .and_then(|node| node.user_data)
            .ok_or(AdjustError::Unavailable("root wrapper"))?;
        shapes
            .deep_clone_wrapper(wrapper, scale, budget)?
            .ok_or(AdjustError::Unavailable("root wrapper"))
    }

    fn install_clone(
        &mut self,
        controller: &mut CharacterController,
        shapes: &mut ShapeGraph,
        slot: usize,
        clone: WrapperRef,
    ) -> AdjustResult {
        let root = shapes
            .wrapper(clone.key())
            .and_then(|wrapper| wrapper.referenced())
            .cloned()
            .ok_or(CloneError::MissingShape)?;
        if !controller.set_collidable_shape(root) {
            return Err(AdjustError::Unavailable("rigid body"));
        }
        controller.shapes[slot] = Some(clone.clone());
        self.owned_clone = Some(clone);
        shapes.reclaim();
        Ok(())
    }

    /// Rebuild a creature's private shape copy for the current scale.
    ///
    /// The copy is scaled relative to the scale it was last built at.
    pub fn rescale_creature(&mut self, state: &mut WorldState, settings: &AdjustmentSettings) -> AdjustResult {
        if !self.is_creature {
            return Err(AdjustError::NotApplicable("not a creature"));
        }
        let (controller, shapes) = state
            .controller_and_shapes(self.controller)
            .ok_or(AdjustError::Unavailable("controller"))?;
        if controller.is_proxy() {
            return Err(AdjustError::NotApplicable("proxy controller"));
        }
        let slot = controller.shape_slot().ok_or(AdjustError::Unavailable("shape slot"))?;

        let factor = self.scale / self.previous_scale;
        let clone = Self::clone_root(controller, shapes, factor, settings.traversal_budget)?;
        self.install_clone(controller, shapes, slot, clone)?;
        self.previous_scale = self.scale;
        Ok(())
    }

    fn ensure_initialized(&self) -> AdjustResult {
        if self.initialized {
            Ok(())
        } else {
            Err(AdjustError::Unavailable("controller record"))
        }
    }

    /// Fit the hull to the actor's head, shoulder and lower leg bones
    pub fn adjust_convex_full(
        &mut self,
        state: &mut WorldState,
        actor: &dyn Actor,
        settings: &AdjustmentSettings,
    ) -> AdjustResult {
        self.ensure_initialized()?;
        let bones = &settings.bones;
        let samples = BoneSamples {
            head: bone_offset(actor, &bones.head, false, true, settings),
            shoulder_z: bone_offset(actor, &bones.shoulder, false, true, settings).z,
            lower_leg_z: bone_offset(actor, &bones.lower_leg, true, true, settings).z,
        };

        let adjusted = full_hull(
            &self.original_vertices,
            self.original_convex_radius,
            self.scale,
            &samples,
            &settings.calibration,
        )?;
        if let Some(height) = adjusted.collider_height {
            self.cached_collider_height = height;
        }
        self.install_hull(state, &adjusted.vertices, settings)
    }

    /// Stretch the hull by scale, sneak and swim state
    pub fn adjust_convex_simple(&mut self, state: &mut WorldState, settings: &AdjustmentSettings) -> AdjustResult {
        self.ensure_initialized()?;
        if !settings.enable_state_adjustments {
            return Err(AdjustError::NotApplicable("state adjustments disabled"));
        }
        let multipliers = StateMultipliers::from_state(self.is_sneaking, self.movement_state, settings);
        let vertices = simple_hull(
            &self.original_vertices,
            self.original_convex_radius,
            self.scale,
            multipliers,
        )?;
        self.install_hull(state, &vertices, settings)
    }

    /// Build a hull from `vertices` and swap it in for the live one.
    ///
    /// The old hull's wrapper is pointed at the new hull, then the new hull
    /// takes the old one's slot: the root list's first child or the
    /// controller's collision shape. The old hull loses both references and
    /// is reclaimed; the new one ends up held by its wrapper and its slot.
    fn install_hull(&self, state: &mut WorldState, vertices: &[Vec3], settings: &AdjustmentSettings) -> AdjustResult {
        let (controller, shapes) = state
            .controller_and_shapes(self.controller)
            .ok_or(AdjustError::Unavailable("controller"))?;
        let location = find_convex_shape(shapes, controller)?;
        let hull = ConvexVerticesShape::build(vertices, &settings.hull_build)?;
        let wrapper = shapes.shape(location.convex).and_then(|node| node.user_data);

        let birth = shapes.insert_shape(ShapeKind::ConvexVertices(hull), ShapeTag::CharControllerShape);
        if let Some(wrapper) = wrapper {
            shapes.wrap(wrapper, &birth);
        }

        match location.list {
            Some(list) => {
                if let Some(ShapeKind::List(list)) = shapes.shape_mut(list).map(|node| &mut node.kind) {
                    if let Some(slot) = list.children.first_mut() {
                        *slot = birth;
                    }
                }
            }
            None => {
                controller.set_collidable_shape(birth.clone());
                drop(birth);
            }
        }

        let reclaimed = shapes.reclaim();
        trace!("Controller {} hull swapped, {} objects reclaimed", self.controller.raw(), reclaimed);
        Ok(())
    }

    /// Resize capsules with tops following the actor's head
    pub fn adjust_capsules_full(
        &mut self,
        state: &mut WorldState,
        actor: &dyn Actor,
        settings: &AdjustmentSettings,
    ) -> AdjustResult {
        self.ensure_initialized()?;
        if self.is_creature {
            return Err(AdjustError::NotApplicable("creature"));
        }
        let head = head_offset(actor, settings.calibration.capsule_head_correction, settings);
        self.apply_capsules(state, CapsuleTop::HeadSample(head.z), settings)
    }

    /// Resize capsules with tops scaled in place. Rigid-body controllers only.
    pub fn adjust_capsules_simple(&mut self, state: &mut WorldState, settings: &AdjustmentSettings) -> AdjustResult {
        self.ensure_initialized()?;
        if self.is_creature {
            return Err(AdjustError::NotApplicable("creature"));
        }
        let controller = state
            .controller(self.controller)
            .ok_or(AdjustError::Unavailable("controller"))?;
        if controller.is_proxy() {
            return Err(AdjustError::NotApplicable("proxy controller"));
        }
        self.apply_capsules(state, CapsuleTop::Scaled, settings)
    }

    fn apply_capsules(&self, state: &mut WorldState, top: CapsuleTop, settings: &AdjustmentSettings) -> AdjustResult {
        let (controller, shapes) = state
            .controller_and_shapes(self.controller)
            .ok_or(AdjustError::Unavailable("controller"))?;
        controller.shape_slot().ok_or(AdjustError::Unavailable("shape slot"))?;

        let capsules = collect_capsules(shapes, controller, settings.traversal_budget)?;
        if capsules.len() != self.original_capsules.len() {
            return Err(AdjustError::TopologyMismatch {
                expected: self.original_capsules.len(),
                found: capsules.len(),
            });
        }

        for (id, original) in capsules.into_iter().zip(&self.original_capsules) {
            if let Some(live) = shapes.capsule_mut(id) {
                adjust_capsule(live, original, self.scale, top, &settings.calibration);
            }
        }
        Ok(())
    }

    /// Run one tick of adjustment.
    ///
    /// The player and teammates get the bone-driven variants every tick.
    /// Other humanoids get the scale-driven variants only on ticks where
    /// their scale changed. Creatures are left alone.
    pub fn update(&mut self, state: &mut WorldState, settings: &AdjustmentSettings) -> UpdatePath {
        if !settings.enable_actor_scale_fix {
            return UpdatePath::Disabled;
        }
        let Some(actor) = self.actor.upgrade() else {
            return UpdatePath::Unavailable;
        };
        if actor.is_dead() {
            return UpdatePath::Dead;
        }

        let current = compute_scale(&*actor, settings);
        let unchanged = utils::floats_equal(current, self.scale, settings.scale_epsilon);
        self.scale = current;

        if actor.is_player() || actor.is_player_teammate() {
            let hull = self.adjust_convex_full(state, &*actor, settings);
            self.report("full hull", hull);
            let capsules = self.adjust_capsules_full(state, &*actor, settings);
            self.report("full capsules", capsules);
            UpdatePath::Full
        } else if !unchanged && !self.is_creature {
            let hull = self.adjust_convex_simple(state, settings);
            self.report("simple hull", hull);
            let capsules = self.adjust_capsules_simple(state, settings);
            self.report("simple capsules", capsules);
            UpdatePath::Simple
        } else {
            UpdatePath::Skipped
        }
    }

    fn report(&self, what: &str, result: AdjustResult) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_benign() => trace!("Controller {} {} skipped: {}", self.controller.raw(), what, e),
            Err(e) => debug!("Controller {} {} failed: {}", self.controller.raw(), what, e),
        }
    }
}
