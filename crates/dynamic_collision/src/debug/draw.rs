//! Debug drawing primitives and system
//!
//! The host renderer pulls shapes out of a [`DebugDrawSystem`] each frame.
//! Temporary shapes expire after their duration; persistent shapes stay
//! until removed by id.

use crate::foundation::math::{Vec3, Vec4};
use std::collections::HashMap;

/// Unique identifier for persistent debug shapes
pub type DebugShapeId = String;

/// Debug shape primitives, game units
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// First endpoint
        start: Vec3,
        /// Second endpoint
        end: Vec3,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime, seconds
        duration: f32,
    },

    /// Capsule from start to end with radius
    Capsule {
        /// First endpoint
        start: Vec3,
        /// Second endpoint
        end: Vec3,
        /// Sphere radius
        radius: f32,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime, seconds
        duration: f32,
    },

    /// Arrow pointing from start to end
    Arrow {
        /// Tail
        start: Vec3,
        /// Head
        end: Vec3,
        /// RGBA color
        color: Vec4,
        /// Remaining lifetime, seconds
        duration: f32,
    },
}

impl DebugShape {
    /// Get remaining duration
    pub fn duration(&self) -> f32 {
        match self {
            DebugShape::Line { duration, .. }
            | DebugShape::Capsule { duration, .. }
            | DebugShape::Arrow { duration, .. } => *duration,
        }
    }

    /// Set duration (returns modified shape)
    pub fn with_duration(mut self, new_duration: f32) -> Self {
        match &mut self {
            DebugShape::Line { duration, .. }
            | DebugShape::Capsule { duration, .. }
            | DebugShape::Arrow { duration, .. } => *duration = new_duration,
        }
        self
    }

    /// Color of the shape
    pub fn color(&self) -> Vec4 {
        match self {
            DebugShape::Line { color, .. } | DebugShape::Capsule { color, .. } | DebugShape::Arrow { color, .. } => {
                *color
            }
        }
    }

    /// Decrease duration by delta_time, returns true if expired
    pub fn tick(&mut self, delta_time: f32) -> bool {
        match self {
            DebugShape::Line { duration, .. }
            | DebugShape::Capsule { duration, .. }
            | DebugShape::Arrow { duration, .. } => {
                *duration -= delta_time;
                *duration <= 0.0
            }
        }
    }
}

/// Debug drawing system for rendering debug shapes
pub struct DebugDrawSystem {
    /// Temporary shapes that expire after their duration
    temporary_shapes: Vec<DebugShape>,

    /// Persistent shapes that remain until manually removed
    persistent_shapes: HashMap<DebugShapeId, DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            temporary_shapes: Vec::new(),
            persistent_shapes: HashMap::new(),
            enabled: true,
        }
    }

    /// Draw a line segment (temporary)
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, color: Vec4, duration: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.push(DebugShape::Line {
            start,
            end,
            color,
            duration,
        });
    }

    /// Draw a capsule (temporary)
    pub fn draw_capsule(&mut self, start: Vec3, end: Vec3, radius: f32, color: Vec4, duration: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.push(DebugShape::Capsule {
            start,
            end,
            radius,
            color,
            duration,
        });
    }

    /// Draw an arrow (temporary)
    pub fn draw_arrow(&mut self, start: Vec3, end: Vec3, color: Vec4, duration: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.push(DebugShape::Arrow {
            start,
            end,
            color,
            duration,
        });
    }

    /// Draw a persistent shape that remains until explicitly removed
    pub fn draw_persistent(&mut self, id: impl Into<String>, shape: DebugShape) {
        if !self.enabled {
            return;
        }

        self.persistent_shapes.insert(id.into(), shape);
    }

    /// Remove a persistent shape
    pub fn clear_persistent(&mut self, id: &str) {
        self.persistent_shapes.remove(id);
    }

    /// Persistent shape lookup
    pub fn persistent(&self, id: &str) -> Option<&DebugShape> {
        self.persistent_shapes.get(id)
    }

    /// Update shape lifetimes and remove expired temporary shapes
    pub fn update(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.retain_mut(|shape| !shape.tick(delta_time));
    }

    /// Get all shapes for rendering (both temporary and persistent)
    pub fn get_shapes(&self) -> Vec<&DebugShape> {
        if !self.enabled {
            return Vec::new();
        }

        self.temporary_shapes.iter().chain(self.persistent_shapes.values()).collect()
    }

    /// Get the number of active shapes
    pub fn shape_count(&self) -> usize {
        self.temporary_shapes.len() + self.persistent_shapes.len()
    }

    /// Clear all shapes (temporary and persistent)
    pub fn clear(&mut self) {
        self.temporary_shapes.clear();
        self.persistent_shapes.clear();
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}
