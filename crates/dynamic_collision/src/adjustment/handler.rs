//! Adjustment handler
//!
//! The host-facing entry point. The host forwards controller lifecycle and
//! state events plus one call per simulation tick; the handler keeps the
//! registry of [`ControllerRecord`]s and applies the adjustments.
//!
//! Locks are always taken world first, record second. Anything that needs a
//! record's fields while holding a world lock copies them out and releases
//! the record beforehand.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use super::record::{ControllerRecord, UpdatePath};
use super::registry::{lock_record, ControllerRegistry, SharedRecord};
use super::error::{AdjustError, AdjustResult};
use crate::actor::{Actor, ActorHandle, NodeId, Skeleton, SimulationHost};
use crate::config::{AdjustmentSettings, Config, ConfigError, DebugDrawMode};
use crate::debug::ControllerDebugVisualizer;
use crate::foundation::logging::{debug, info, trace, warn};
use crate::foundation::math::Vec3;
use crate::physics::{
    collect_shapes, CharacterState, CollisionFilterInfo, CollisionLayers, ControllerId, PhysicsWorld, RayCastInput,
    ShapeMaterial,
};

/// A capsule as the debug overlay sees it, physics units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleView {
    /// Radius
    pub radius: f32,
    /// Top endpoint
    pub vertex_a: Vec3,
    /// Bottom endpoint
    pub vertex_b: Vec3,
    /// Belongs to the character bumper volume
    pub is_bumper: bool,
}

/// Copy of a controller's live shapes, physics units
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSnapshot {
    /// Controller position
    pub position: Vec3,
    /// Actor heading, radians
    pub heading: f32,
    /// Hull vertices, if the controller has a hull
    pub hull: Option<Vec<Vec3>>,
    /// Capsules in shape-tree order
    pub capsules: Vec<CapsuleView>,
    /// Hull top offset from the last full adjustment, for tracked controllers
    pub collider_height: Option<Vec3>,
}

/// What a tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the tick ran at all
    pub ran: bool,
    /// Number of physics worlds locked
    pub worlds: usize,
    /// Branch taken per controller
    pub outcomes: Vec<(ControllerId, UpdatePath)>,
}

impl TickReport {
    /// Number of controllers that took `path`
    pub fn count(&self, path: UpdatePath) -> usize {
        self.outcomes.iter().filter(|(_, p)| *p == path).count()
    }

    /// Branch taken for one controller
    pub fn outcome(&self, id: ControllerId) -> Option<UpdatePath> {
        self.outcomes.iter().find(|(c, _)| *c == id).map(|(_, p)| *p)
    }
}

/// Tracks character controllers and keeps their collision shapes in step
/// with actor scale and state
#[derive(Debug)]
pub struct AdjustmentHandler {
    settings: RwLock<Arc<AdjustmentSettings>>,
    registry: ControllerRegistry,
}

impl AdjustmentHandler {
    /// Create a handler. Settings that fail validation are replaced by the
    /// defaults.
    pub fn new(settings: AdjustmentSettings) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!("Invalid collision adjustment settings, using defaults: {}", e);
                AdjustmentSettings::default()
            }
        };
        Self {
            settings: RwLock::new(Arc::new(settings)),
            registry: ControllerRegistry::new(),
        }
    }

    /// Create a handler from a TOML or RON settings file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = AdjustmentSettings::load_from_file(path)?;
        info!("Loaded collision adjustment settings");
        Ok(Self::new(settings))
    }

    /// Current settings
    pub fn settings(&self) -> Arc<AdjustmentSettings> {
        let guard = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the settings. Rejected settings leave the current ones in place.
    pub fn update_settings(&self, settings: AdjustmentSettings) -> Result<(), ConfigError> {
        settings.validate().map_err(ConfigError::Invalid)?;
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
        Ok(())
    }

    /// The tracked records
    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// Drop every record
    pub fn shutdown(&self) {
        let count = self.registry.len();
        self.registry.clear();
        info!("Collision adjustment shut down, released {} controllers", count);
    }

    /// Start tracking a new controller.
    ///
    /// Captures its original geometry right away; an actor that is already
    /// gone is not tracked.
    pub fn on_controller_created(&self, id: ControllerId, actor: ActorHandle) -> Option<SharedRecord> {
        if actor.upgrade().is_none() {
            warn!("Controller {} created for an unloaded actor, not tracking", id.raw());
            return None;
        }
        let settings = self.settings();
        let record = ControllerRecord::create(id, actor, &settings);
        debug!(
            "Tracking controller {} (creature: {}, {} hull vertices, {} capsules)",
            id.raw(),
            record.is_creature,
            record.original_vertices().len(),
            record.original_capsules().len()
        );
        Some(self.registry.insert(record))
    }

    /// Stop tracking a controller. Returns whether it was tracked.
    ///
    /// Dropping the record releases a creature's private shape copy, which
    /// is freed from the world right away.
    pub fn on_controller_destroyed(&self, id: ControllerId) -> bool {
        let Some(record) = self.registry.remove(id) else {
            return false;
        };
        let world = lock_record(&record).world();
        drop(record);
        if let Some(world) = world {
            let reclaimed = world.write().shapes.reclaim();
            debug!("Released controller {}, {} objects reclaimed", id.raw(), reclaimed);
        } else {
            debug!("Released controller {}", id.raw());
        }
        true
    }

    /// Record an actor's new sneak state
    pub fn on_sneak_state_changed(&self, actor: &dyn Actor, sneaking: bool) {
        let Some(record) = actor.controller_id().and_then(|id| self.registry.get(id)) else {
            return;
        };
        lock_record(&record).is_sneaking = sneaking;
    }

    /// Record a controller's new movement state
    pub fn on_movement_state_changed(&self, id: ControllerId, state: CharacterState) {
        if let Some(record) = self.registry.get(id) {
            lock_record(&record).movement_state = state;
        }
    }

    /// Adjust every tracked controller.
    ///
    /// Skipped while paused or while the player's controller is not loaded.
    /// Records are grouped by physics world and each world is write-locked
    /// once for its whole group.
    pub fn on_simulation_tick(&self, host: &dyn SimulationHost) -> TickReport {
        let mut report = TickReport::default();
        if host.is_paused() || !player_loaded(host) {
            return report;
        }
        report.ran = true;

        let settings = self.settings();
        let mut groups: Vec<(Arc<PhysicsWorld>, Vec<SharedRecord>)> = Vec::new();
        for (id, record) in self.registry.snapshot() {
            let world = lock_record(&record).world();
            let Some(world) = world else {
                report.outcomes.push((id, UpdatePath::Unavailable));
                continue;
            };
            match groups.iter_mut().find(|(w, _)| Arc::ptr_eq(w, &world)) {
                Some((_, members)) => members.push(record),
                None => groups.push((world, vec![record])),
            }
        }

        report.worlds = groups.len();
        for (world, members) in groups {
            let mut state = world.write();
            for record in members {
                let mut record = lock_record(&record);
                let path = record.update(&mut state, &settings);
                report.outcomes.push((record.controller(), path));
            }
        }

        trace!(
            "Tick adjusted {} full, {} simple across {} worlds",
            report.count(UpdatePath::Full),
            report.count(UpdatePath::Simple),
            report.worlds
        );
        report
    }

    /// Copy an actor's live controller shapes
    pub fn shape_snapshot(&self, actor: &dyn Actor) -> Option<ShapeSnapshot> {
        let id = actor.controller_id()?;
        let world = actor.world()?;
        let settings = self.settings();
        let collider_height = self
            .registry
            .get(id)
            .map(|record| lock_record(&record).cached_collider_height());

        let state = world.read();
        let controller = state.controller(id)?;
        let set = match collect_shapes(&state.shapes, controller, settings.traversal_budget) {
            Ok(set) => set,
            Err(e) => {
                trace!("No shapes to snapshot on controller {}: {}", id.raw(), e);
                return None;
            }
        };

        let hull = set
            .convex
            .and_then(|convex| state.shapes.shape(convex))
            .and_then(|node| node.as_convex())
            .map(|hull| hull.vertices().to_vec());
        let capsules = set
            .capsules
            .iter()
            .filter_map(|&capsule| {
                let shape = state.shapes.shape(capsule)?.as_capsule()?;
                Some(CapsuleView {
                    radius: shape.radius,
                    vertex_a: shape.vertex_a,
                    vertex_b: shape.vertex_b,
                    is_bumper: state.shapes.material_of(capsule) == Some(ShapeMaterial::CharacterBumper),
                })
            })
            .collect();

        Some(ShapeSnapshot {
            position: controller.position,
            heading: actor.heading(),
            hull,
            capsules,
            collider_height,
        })
    }

    /// Whether the actor has room to stand up.
    ///
    /// Casts from the controller position along the cached hull height and
    /// answers `false` on any hit against something the character collides
    /// with. Anything missing, or a hull of an unknown layout, answers `true`.
    /// With debug drawing on, a blocked cast is marked on `visualizer`.
    pub fn check_enough_space_to_stand(
        &self,
        actor: &dyn Actor,
        visualizer: Option<&mut ControllerDebugVisualizer>,
    ) -> bool {
        let (Some(id), Some(world)) = (actor.controller_id(), actor.world()) else {
            return true;
        };
        let Some(record) = self.registry.get(id) else {
            return true;
        };
        let (vertex_count, height) = {
            let record = lock_record(&record);
            (record.original_vertices().len(), record.cached_collider_height())
        };
        if vertex_count != 18 {
            return true;
        }

        let state = world.read();
        let Some(controller) = state.controller(id) else {
            return true;
        };
        let from = controller.position;
        let input = RayCastInput {
            from,
            to: from + height,
            filter_info: CollisionFilterInfo::new(CollisionLayers::CHAR_CONTROLLER, actor.collision_filter_info().group()),
        };
        let blocked = state.cast_ray(&input).has_hit();
        drop(state);

        let settings = self.settings();
        if let Some(visualizer) = visualizer.filter(|_| settings.debug_draw != DebugDrawMode::None) {
            if blocked {
                let inverse = settings.world_scale_inverse();
                visualizer.draw_blocked_stand(id, input.from * inverse, input.to * inverse);
            } else {
                visualizer.clear_blocked_stand(id);
            }
        }
        !blocked
    }

    /// Whether the sub-tree under `node` carries character collision other
    /// than the bumper
    pub fn skeleton_has_character_collision(&self, skeleton: &Skeleton, node: NodeId) -> bool {
        skeleton.has_character_collision(node, self.settings().traversal_budget)
    }

    /// Rebuild a tracked creature's private shape copy at its current scale
    pub fn rescale_creature(&self, id: ControllerId) -> AdjustResult {
        let record = self.registry.get(id).ok_or(AdjustError::Unavailable("controller record"))?;
        let world = lock_record(&record).world().ok_or(AdjustError::Unavailable("physics world"))?;
        let settings = self.settings();

        let mut state = world.write();
        let mut record = lock_record(&record);
        record.rescale_creature(&mut state, &settings)
    }

    /// Draw the controllers selected by the debug mode
    pub fn debug_draw(&self, host: &dyn SimulationHost, visualizer: &mut ControllerDebugVisualizer) {
        let settings = self.settings();
        if settings.debug_draw == DebugDrawMode::None || host.is_paused() {
            return;
        }

        let actors: Vec<Arc<dyn Actor>> = match settings.debug_draw {
            DebugDrawMode::None => Vec::new(),
            DebugDrawMode::Adjusted => self
                .registry
                .snapshot()
                .into_iter()
                .filter_map(|(_, record)| lock_record(&record).actor())
                .collect(),
            DebugDrawMode::All => host.player().into_iter().chain(host.high_actors()).collect(),
        };

        for actor in actors {
            if actor.is_dead() {
                continue;
            }
            if let Some(snapshot) = self.shape_snapshot(&*actor) {
                visualizer.draw_controller(&snapshot, &settings);
            }
        }
    }
}

impl Default for AdjustmentHandler {
    fn default() -> Self {
        Self::new(AdjustmentSettings::default())
    }
}

fn player_loaded(host: &dyn SimulationHost) -> bool {
    let Some(player) = host.player() else {
        return false;
    };
    match (player.world(), player.controller_id()) {
        (Some(world), Some(id)) => world.read().controller(id).is_some(),
        _ => false,
    }
}
