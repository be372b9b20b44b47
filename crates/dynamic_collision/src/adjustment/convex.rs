//! Bumper hull reshaping
//!
//! Both variants start from the hull's original vertex set and return a new
//! one; the caller rebuilds the primitive and swaps it into the controller.
//! Ring vertices are always pushed back out to the scaled original radius
//! once their heights are settled.

use super::error::{AdjustError, AdjustResult};
use crate::config::{AdjustmentSettings, Calibration};
use crate::foundation::math::{utils, Vec3};
use crate::physics::{CharacterState, HullTopology};

/// Bone heights driving the full variant, physics units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneSamples {
    /// Head offset, applied component-wise to the top apex
    pub head: Vec3,
    /// Shoulder height factor for the top ring
    pub shoulder_z: f32,
    /// Lower leg height factor for the bottom ring
    pub lower_leg_z: f32,
}

/// Output of [`full_hull`]
#[derive(Debug, Clone, PartialEq)]
pub struct HullAdjustment {
    /// Reshaped vertex set, same order as the input
    pub vertices: Vec<Vec3>,
    /// Vector from the controller origin to the hull top, for the stand check.
    /// Only known for the full topology.
    pub collider_height: Option<Vec3>,
}

/// Height and radius multipliers from the movement state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateMultipliers {
    /// Height multiplier, before scale
    pub height: f32,
    /// Radius multiplier, before scale
    pub radius: f32,
}

impl StateMultipliers {
    /// No state influence
    pub const IDENTITY: Self = Self { height: 1.0, radius: 1.0 };

    /// Multipliers for an actor's sneak flag and movement state.
    ///
    /// Sneaking only counts on the ground.
    pub fn from_state(sneaking: bool, state: CharacterState, settings: &AdjustmentSettings) -> Self {
        let sneak = if sneaking && state == CharacterState::OnGround {
            settings.sneak_height_multiplier
        } else {
            1.0
        };
        let (swim_height, swim_radius) = if state == CharacterState::Swimming {
            (settings.swimming_height_multiplier, settings.swimming_radius_multiplier)
        } else {
            (1.0, 1.0)
        };
        Self {
            height: sneak * swim_height,
            radius: swim_radius,
        }
    }
}

fn topology_of(vertices: &[Vec3]) -> AdjustResult<HullTopology> {
    HullTopology::detect(vertices.len()).ok_or(AdjustError::TopologyMismatch {
        expected: HullTopology::Full.vertex_count(),
        found: vertices.len(),
    })
}

fn clamp_above(z: f32, floor: f32, epsilon: f32) -> f32 {
    if z <= floor {
        floor + epsilon
    } else {
        z
    }
}

fn renormalize(vertices: &mut [Vec3], indices: impl IntoIterator<Item = usize>, radius: f32) {
    for i in indices {
        vertices[i] = utils::with_planar_length(&vertices[i], radius);
    }
}

/// Fit the hull to sampled bone heights.
///
/// The top apex follows the head, the top ring the shoulder, the bottom
/// ring the lower leg. Everything gets the scale correction added and is
/// kept strictly above the bottom apex, which never moves. A 17 vertex hull
/// comes back as its original vertices with no collider height.
pub fn full_hull(
    original: &[Vec3],
    radius: f32,
    scale: f32,
    samples: &BoneSamples,
    calibration: &Calibration,
) -> AdjustResult<HullAdjustment> {
    let topology = topology_of(original)?;
    let mut vertices = original.to_vec();
    let Some(apex) = topology.top_apex() else {
        return Ok(HullAdjustment { vertices, collider_height: None });
    };
    let bottom = original[topology.bottom_apex()];
    let correction = calibration.correction(scale);

    let top = original[apex];
    let new_top = top.component_mul(&samples.head);
    let z = clamp_above(new_top.z + correction, bottom.z, calibration.apex_epsilon);
    vertices[apex] = Vec3::new(new_top.x, new_top.y, z);

    for i in topology.top_ring() {
        let z = original[i].z * samples.shoulder_z + correction;
        vertices[i].z = clamp_above(z, bottom.z, calibration.top_ring_epsilon);
    }
    for i in topology.bottom_ring() {
        let z = original[i].z * samples.lower_leg_z + correction;
        vertices[i].z = clamp_above(z, bottom.z, calibration.bottom_ring_epsilon);
    }

    renormalize(&mut vertices, topology.ring_indices(), radius * scale);
    Ok(HullAdjustment {
        vertices,
        collider_height: Some(top * 2.0 * scale + bottom),
    })
}

/// Stretch the hull by scale and movement state.
///
/// The top apex moves to `2 * top * height + bottom` and the top ring shifts
/// by the distance the apex travelled: down when the hull shrinks, up
/// otherwise. A 17 vertex hull comes back unchanged.
pub fn simple_hull(
    original: &[Vec3],
    radius: f32,
    scale: f32,
    multipliers: StateMultipliers,
) -> AdjustResult<Vec<Vec3>> {
    let topology = topology_of(original)?;
    let mut vertices = original.to_vec();
    let Some(apex) = topology.top_apex() else {
        return Ok(vertices);
    };
    let bottom = original[topology.bottom_apex()];
    let height = multipliers.height * scale;

    let top = original[apex];
    let new_top = top * 2.0 * height + bottom;
    let distance = (top - new_top).norm();
    vertices[apex] = new_top;

    let shift = if height < 1.0 { -distance } else { distance };
    for i in topology.top_ring() {
        vertices[i].z += shift;
    }

    renormalize(&mut vertices, topology.ring_indices(), radius * scale * multipliers.radius);
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bumper_vertices;
    use approx::assert_relative_eq;

    const RADIUS: f32 = 0.3;
    const HEIGHT: f32 = 1.2;

    fn samples() -> BoneSamples {
        BoneSamples {
            head: Vec3::new(0.0, 0.1, 1.4),
            shoulder_z: 1.3,
            lower_leg_z: 5.0,
        }
    }

    #[test]
    fn test_full_moves_apex_and_rings() {
        let calibration = Calibration::default();
        let original = bumper_vertices(HullTopology::Full, RADIUS, HEIGHT);
        let adjusted = full_hull(&original, RADIUS, 2.0, &samples(), &calibration).unwrap();
        let correction = calibration.correction(2.0);

        assert_relative_eq!(adjusted.vertices[9].z, HEIGHT * 1.4 + correction, epsilon = 1e-5);
        assert_eq!(adjusted.vertices[8], original[8]);

        for i in HullTopology::Full.top_ring() {
            assert_relative_eq!(adjusted.vertices[i].z, original[i].z * 1.3 + correction, epsilon = 1e-5);
        }
        for i in HullTopology::Full.bottom_ring() {
            assert_relative_eq!(adjusted.vertices[i].z, original[i].z * 5.0 + correction, epsilon = 1e-5);
        }
        for i in HullTopology::Full.ring_indices() {
            assert_relative_eq!(utils::planar_length(&adjusted.vertices[i]), RADIUS * 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_full_collider_height() {
        let original = bumper_vertices(HullTopology::Full, RADIUS, HEIGHT);
        let adjusted = full_hull(&original, RADIUS, 1.5, &samples(), &Calibration::default()).unwrap();
        let height = adjusted.collider_height.unwrap();
        assert_relative_eq!(height, original[9] * 3.0 + original[8], epsilon = 1e-6);
    }

    #[test]
    fn test_full_keeps_everything_above_bottom_apex() {
        let calibration = Calibration::default();
        let original = bumper_vertices(HullTopology::Full, RADIUS, HEIGHT);
        let sunk = BoneSamples {
            head: Vec3::zeros(),
            shoulder_z: 0.0,
            lower_leg_z: -1.0,
        };
        let adjusted = full_hull(&original, RADIUS, 1.0, &sunk, &calibration).unwrap();
        let floor = original[8].z;

        assert_relative_eq!(adjusted.vertices[9].z, floor + calibration.apex_epsilon);
        for i in HullTopology::Full.top_ring() {
            assert_relative_eq!(adjusted.vertices[i].z, floor + calibration.top_ring_epsilon);
        }
        for i in HullTopology::Full.bottom_ring() {
            assert_relative_eq!(adjusted.vertices[i].z, floor + calibration.bottom_ring_epsilon);
        }
    }

    #[test]
    fn test_short_hull_left_as_is() {
        let original = bumper_vertices(HullTopology::Short, RADIUS, HEIGHT);
        let adjusted = full_hull(&original, RADIUS, 2.0, &samples(), &Calibration::default()).unwrap();
        assert_eq!(adjusted.vertices, original);
        assert!(adjusted.collider_height.is_none());
    }

    #[test]
    fn test_unknown_topology_rejected() {
        let original = vec![Vec3::zeros(); 12];
        assert_eq!(
            full_hull(&original, RADIUS, 1.0, &samples(), &Calibration::default()),
            Err(AdjustError::TopologyMismatch { expected: 18, found: 12 })
        );
        assert!(simple_hull(&original, RADIUS, 1.0, StateMultipliers::IDENTITY).is_err());
    }

    #[test]
    fn test_simple_grows_with_scale() {
        let original = bumper_vertices(HullTopology::Full, RADIUS, HEIGHT);
        let adjusted = simple_hull(&original, RADIUS, 1.5, StateMultipliers::IDENTITY).unwrap();

        let new_top = original[9] * 3.0 + original[8];
        let distance = (original[9] - new_top).norm();
        assert_relative_eq!(adjusted[9], new_top);
        for i in HullTopology::Full.top_ring() {
            assert_relative_eq!(adjusted[i].z, original[i].z + distance, epsilon = 1e-5);
            assert_relative_eq!(utils::planar_length(&adjusted[i]), RADIUS * 1.5, epsilon = 1e-5);
        }
        for i in HullTopology::Full.bottom_ring() {
            assert_relative_eq!(adjusted[i].z, original[i].z);
        }
    }

    #[test]
    fn test_simple_shrinks_when_sneaking() {
        let settings = AdjustmentSettings::default();
        let multipliers = StateMultipliers::from_state(true, CharacterState::OnGround, &settings);
        assert_relative_eq!(multipliers.height, 0.68);

        let original = bumper_vertices(HullTopology::Full, RADIUS, HEIGHT);
        let adjusted = simple_hull(&original, RADIUS, 1.0, multipliers).unwrap();
        let new_top = original[9] * 2.0 * 0.68 + original[8];
        let distance = (original[9] - new_top).norm();
        for i in HullTopology::Full.top_ring() {
            assert_relative_eq!(adjusted[i].z, original[i].z - distance, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_state_multipliers() {
        let settings = AdjustmentSettings::default();
        assert_eq!(
            StateMultipliers::from_state(true, CharacterState::InAir, &settings),
            StateMultipliers::IDENTITY
        );

        let swimming = StateMultipliers::from_state(true, CharacterState::Swimming, &settings);
        assert_relative_eq!(swimming.height, 0.7);
        assert_relative_eq!(swimming.radius, 0.8);

        let original = bumper_vertices(HullTopology::Full, RADIUS, HEIGHT);
        let adjusted = simple_hull(&original, RADIUS, 2.0, swimming).unwrap();
        for i in HullTopology::Full.ring_indices() {
            assert_relative_eq!(utils::planar_length(&adjusted[i]), RADIUS * 2.0 * 0.8, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_simple_short_hull_left_as_is() {
        let original = bumper_vertices(HullTopology::Short, RADIUS, HEIGHT);
        let settings = AdjustmentSettings::default();
        let swimming = StateMultipliers::from_state(false, CharacterState::Swimming, &settings);
        assert_eq!(simple_hull(&original, RADIUS, 1.7, swimming).unwrap(), original);
    }
}
