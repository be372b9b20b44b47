//! Character controller debug visualization
//!
//! Turns a [`ShapeSnapshot`] into wireframe lines and capsules in game
//! units, and marks positions where the stand check found the way up
//! blocked.

use crate::adjustment::{CapsuleView, ShapeSnapshot};
use crate::config::AdjustmentSettings;
use crate::debug::draw::{DebugDrawSystem, DebugShape};
use crate::foundation::math::{utils, Vec3, Vec4};
use crate::physics::{ControllerId, HullTopology};

/// Convert a packed `0xRRGGBBAA` color
pub fn color_from_rgba(rgba: u32) -> Vec4 {
    let channel = |shift: u32| ((rgba >> shift) & 0xFF) as f32 / 255.0;
    Vec4::new(channel(24), channel(16), channel(8), channel(0))
}

/// Color scheme for controller visualization
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerDebugColors {
    /// Bumper hull wireframe
    pub hull: Vec4,
    /// Body capsules
    pub capsule: Vec4,
    /// Character bumper capsule
    pub bumper: Vec4,
    /// Blocked stand ray
    pub blocked: Vec4,
}

impl Default for ControllerDebugColors {
    fn default() -> Self {
        Self {
            hull: color_from_rgba(0x00FF_00FF),
            capsule: color_from_rgba(0xFFFF_00FF),
            bumper: color_from_rgba(0x0040_87FF),
            blocked: color_from_rgba(0xFF00_00FF),
        }
    }
}

/// Controller debug visualizer
///
/// Owns a [`DebugDrawSystem`] the host renders from. Controller shapes are
/// drawn as one-frame temporaries; blocked stand rays are persistent and
/// cleared once the controller can stand again.
pub struct ControllerDebugVisualizer {
    debug_draw: DebugDrawSystem,
    colors: ControllerDebugColors,

    /// Lifetime of controller shapes, seconds
    pub shape_duration: f32,
}

impl ControllerDebugVisualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            debug_draw: DebugDrawSystem::new(),
            colors: ControllerDebugColors::default(),
            shape_duration: 0.0,
        }
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: ControllerDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Active color scheme
    pub fn colors(&self) -> &ControllerDebugColors {
        &self.colors
    }

    /// Draw one controller's hull and capsules
    pub fn draw_controller(&mut self, snapshot: &ShapeSnapshot, settings: &AdjustmentSettings) {
        let inverse = settings.world_scale_inverse();
        let origin = snapshot.position * inverse;

        if let Some(vertices) = &snapshot.hull {
            if let Some(topology) = HullTopology::detect(vertices.len()) {
                for (a, b) in topology.edges() {
                    self.debug_draw.draw_line(
                        vertices[a] * inverse + origin,
                        vertices[b] * inverse + origin,
                        self.colors.hull,
                        self.shape_duration,
                    );
                }
            }
        }

        for capsule in &snapshot.capsules {
            if capsule.is_bumper && !settings.display_character_bumper {
                continue;
            }
            self.draw_capsule(capsule, snapshot.heading, origin, inverse);
        }
    }

    fn draw_capsule(&mut self, capsule: &CapsuleView, heading: f32, origin: Vec3, inverse: f32) {
        let place = |v: Vec3| utils::rotate_angle_axis(&(v * inverse), -heading, &Vec3::z()) + origin;
        let color = if capsule.is_bumper {
            self.colors.bumper
        } else {
            self.colors.capsule
        };
        self.debug_draw.draw_capsule(
            place(capsule.vertex_a),
            place(capsule.vertex_b),
            capsule.radius * inverse,
            color,
            self.shape_duration,
        );
    }

    /// Mark a blocked stand ray, game units
    pub fn draw_blocked_stand(&mut self, controller: ControllerId, from: Vec3, to: Vec3) {
        self.debug_draw.draw_persistent(
            stand_key(controller),
            DebugShape::Arrow {
                start: from,
                end: to,
                color: self.colors.blocked,
                duration: f32::INFINITY,
            },
        );
    }

    /// Remove a controller's blocked stand marker
    pub fn clear_blocked_stand(&mut self, controller: ControllerId) {
        self.debug_draw.clear_persistent(&stand_key(controller));
    }

    /// Clear all visualization
    pub fn clear(&mut self) {
        self.debug_draw.clear();
    }

    /// Update debug system (expire temporary shapes)
    pub fn update(&mut self, delta_time: f32) {
        self.debug_draw.update(delta_time);
    }

    /// Get all debug shapes for rendering
    pub fn get_shapes(&self) -> Vec<&DebugShape> {
        self.debug_draw.get_shapes()
    }

    /// Enable/disable the entire debug system
    pub fn set_enabled(&mut self, enabled: bool) {
        self.debug_draw.enabled = enabled;
    }

    /// Check if debug system is enabled
    pub fn is_enabled(&self) -> bool {
        self.debug_draw.enabled
    }

    /// Get reference to underlying debug draw system
    pub fn debug_draw(&self) -> &DebugDrawSystem {
        &self.debug_draw
    }
}

impl Default for ControllerDebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

fn stand_key(controller: ControllerId) -> String {
    format!("blocked_stand_{}", controller.raw())
}
