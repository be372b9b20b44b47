//! # Adjustment Settings
//!
//! Every tunable the shape adjustment consumes: feature toggles, state
//! multipliers, debug options, unit conversion and the empirical calibration
//! constants used by the capsule and hull formulas.
//!
//! All structs use `#[serde(default)]`, so a settings file only needs to name
//! the values it overrides.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::physics::hull::HullBuildConfig;

/// Which controllers the debug overlay draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DebugDrawMode {
    /// Draw nothing
    #[default]
    None,
    /// Draw only controllers tracked by the adjustment handler
    Adjusted,
    /// Draw the player and every high-process actor
    All,
}

/// Empirical constants of the hull and capsule fits.
///
/// None of these are derived. They were fitted by eye against scaled models
/// and are kept configurable so they can be recalibrated without a rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Capsule radius multiplier applied on top of scale
    pub capsule_shrink: f32,
    /// Correction scale fed to the head sample for capsule tops
    pub capsule_head_correction: f32,
    /// Slope of the linear vertical correction `scale * slope + offset`
    pub correction_slope: f32,
    /// Offset of the linear vertical correction
    pub correction_offset: f32,
    /// Minimum gap between capsule top and bottom endpoints
    pub capsule_top_epsilon: f32,
    /// Minimum gap between the hull top apex and bottom apex
    pub apex_epsilon: f32,
    /// Minimum gap between the hull top ring and bottom apex
    pub top_ring_epsilon: f32,
    /// Minimum gap between the hull bottom ring and bottom apex
    pub bottom_ring_epsilon: f32,
}

impl Calibration {
    /// Linear vertical correction for a given scale
    pub fn correction(&self, scale: f32) -> f32 {
        scale * self.correction_slope + self.correction_offset
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            capsule_shrink: 0.8,
            capsule_head_correction: 1.45,
            correction_slope: 0.32,
            correction_offset: -1.0,
            capsule_top_epsilon: 0.01,
            apex_epsilon: 0.0003,
            top_ring_epsilon: 0.0002,
            bottom_ring_epsilon: 0.0001,
        }
    }
}

/// Skeleton node names sampled by the adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoneNames {
    /// Drives the hull apex and capsule tops
    pub head: String,
    /// Drives the hull top ring
    pub shoulder: String,
    /// Drives the hull bottom ring
    pub lower_leg: String,
    /// Skeleton root
    pub root: String,
    /// Nodes whose local scale multiplies into the actor scale
    pub scale_nodes: Vec<String>,
}

impl Default for BoneNames {
    fn default() -> Self {
        Self {
            head: "NPC Head [Head]".to_string(),
            shoulder: "NPC R Clavicle [RClv]".to_string(),
            lower_leg: "NPC R RearCalf [RrClf]".to_string(),
            root: "NPC Root [Root]".to_string(),
            scale_nodes: vec!["NPC".to_string(), "NPC Root [Root]".to_string()],
        }
    }
}

/// Settings consumed by the adjustment handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentSettings {
    /// Master toggle for per-tick adjustment
    pub enable_actor_scale_fix: bool,
    /// Gates the scale-driven hull rebuild for ordinary actors
    pub enable_state_adjustments: bool,
    /// Hull height multiplier while sneaking on the ground
    pub sneak_height_multiplier: f32,
    /// Hull height multiplier while swimming
    pub swimming_height_multiplier: f32,
    /// Hull radius multiplier while swimming
    pub swimming_radius_multiplier: f32,
    /// Debug overlay selection
    pub debug_draw: DebugDrawMode,
    /// Also draw the character bumper capsule
    pub display_character_bumper: bool,
    /// Game units to physics units
    pub world_scale: f32,
    /// Lower clamp of the computed actor scale
    pub scale_min: f32,
    /// Upper clamp of the computed actor scale
    pub scale_max: f32,
    /// Scale change threshold below which a tick counts as unchanged
    pub scale_epsilon: f32,
    /// Bound on nodes visited by shape-graph and skeleton traversal
    pub traversal_budget: usize,
    /// Keyword marking humanoid actors and races
    pub npc_keyword: String,
    /// Empirical fit constants
    pub calibration: Calibration,
    /// Sampled skeleton nodes
    pub bones: BoneNames,
    /// Convex hull rebuild options
    pub hull_build: HullBuildConfig,
}

impl AdjustmentSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a TOML document and validate them
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Config::validate(&settings).map_err(ConfigError::Invalid)?;
        Ok(settings)
    }

    /// Enable or disable per-tick adjustment
    pub fn with_actor_scale_fix(mut self, enabled: bool) -> Self {
        self.enable_actor_scale_fix = enabled;
        self
    }

    /// Enable or disable the scale-driven hull rebuild for ordinary actors
    pub fn with_state_adjustments(mut self, enabled: bool) -> Self {
        self.enable_state_adjustments = enabled;
        self
    }

    /// Set the debug overlay mode
    pub fn with_debug_draw(mut self, mode: DebugDrawMode, show_bumper: bool) -> Self {
        self.debug_draw = mode;
        self.display_character_bumper = show_bumper;
        self
    }

    /// Physics units to game units
    pub fn world_scale_inverse(&self) -> f32 {
        1.0 / self.world_scale
    }
}

impl Default for AdjustmentSettings {
    fn default() -> Self {
        Self {
            enable_actor_scale_fix: true,
            enable_state_adjustments: true,
            sneak_height_multiplier: 0.68,
            swimming_height_multiplier: 0.7,
            swimming_radius_multiplier: 0.8,
            debug_draw: DebugDrawMode::None,
            display_character_bumper: false,
            world_scale: 0.014_287_5,
            scale_min: 0.15,
            scale_max: 20.0,
            scale_epsilon: f32::EPSILON,
            traversal_budget: 512,
            npc_keyword: "ActorTypeNPC".to_string(),
            calibration: Calibration::default(),
            bones: BoneNames::default(),
            hull_build: HullBuildConfig::default(),
        }
    }
}

impl Config for AdjustmentSettings {
    fn validate(&self) -> Result<(), String> {
        if self.world_scale <= 0.0 {
            return Err("World scale must be positive".to_string());
        }
        if self.scale_min <= 0.0 || self.scale_min > self.scale_max {
            return Err(format!(
                "Scale bounds must satisfy 0 < min <= max (got {} .. {})",
                self.scale_min, self.scale_max
            ));
        }
        if self.scale_epsilon < 0.0 {
            return Err("Scale epsilon cannot be negative".to_string());
        }
        if self.traversal_budget == 0 {
            return Err("Traversal budget must be at least 1".to_string());
        }
        for (name, value) in [
            ("sneak_height_multiplier", self.sneak_height_multiplier),
            ("swimming_height_multiplier", self.swimming_height_multiplier),
            ("swimming_radius_multiplier", self.swimming_radius_multiplier),
            ("calibration.capsule_shrink", self.calibration.capsule_shrink),
        ] {
            if value <= 0.0 {
                return Err(format!("{name} must be positive (got {value})"));
            }
        }
        if self.bones.head.is_empty() || self.bones.shoulder.is_empty() || self.bones.lower_leg.is_empty() {
            return Err("Sampled bone names cannot be empty".to_string());
        }
        self.hull_build.validate()
    }
}
