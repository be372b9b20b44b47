//! Capsule resizing
//!
//! A capsule is rebuilt from its captured original every time, never from
//! its live value, so repeated adjustments do not drift.

use crate::config::Calibration;
use crate::foundation::math::{utils, Vec3};
use crate::physics::CapsuleShape;

/// Untransformed capsule captured at setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleSnapshot {
    /// Original radius
    pub radius: f32,
    /// Original top endpoint
    pub vertex_a: Vec3,
    /// Original bottom endpoint
    pub vertex_b: Vec3,
}

impl From<&CapsuleShape> for CapsuleSnapshot {
    fn from(capsule: &CapsuleShape) -> Self {
        Self {
            radius: capsule.radius,
            vertex_a: capsule.vertex_a,
            vertex_b: capsule.vertex_b,
        }
    }
}

/// How the top endpoint height is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapsuleTop {
    /// From a head bone height sample, physics units
    HeadSample(f32),
    /// Original height times scale
    Scaled,
}

/// Resize `live` from `original` at `scale`.
///
/// The radius shrinks by the calibration factor, the bottom endpoint moves
/// by the radius change so the capsule keeps its ground contact, and the
/// forward (Y) coordinates of both endpoints scale. X is left alone.
pub fn adjust_capsule(
    live: &mut CapsuleShape,
    original: &CapsuleSnapshot,
    scale: f32,
    top: CapsuleTop,
    calibration: &Calibration,
) {
    live.radius = original.radius * scale * calibration.capsule_shrink;

    let ground_offset = utils::sphere_offset(original.radius, live.radius);
    live.vertex_b.z = original.vertex_b.z + ground_offset;

    live.vertex_a.z = match top {
        CapsuleTop::HeadSample(head_z) => {
            let target = head_z - original.vertex_a.z;
            let bottom = live.vertex_b.z;
            if target <= bottom {
                bottom + calibration.capsule_top_epsilon
            } else {
                target
            }
        }
        CapsuleTop::Scaled => original.vertex_a.z * scale,
    };

    live.vertex_a.y = original.vertex_a.y * scale;
    live.vertex_b.y = original.vertex_b.y * scale;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn original() -> CapsuleSnapshot {
        CapsuleSnapshot {
            radius: 10.0,
            vertex_a: Vec3::new(0.0, 0.0, 50.0),
            vertex_b: Vec3::new(0.0, 0.0, 0.0),
        }
    }

    fn live_copy(snapshot: &CapsuleSnapshot) -> CapsuleShape {
        CapsuleShape {
            radius: snapshot.radius,
            vertex_a: snapshot.vertex_a,
            vertex_b: snapshot.vertex_b,
        }
    }

    #[test]
    fn test_head_sample_above_bottom() {
        let calibration = Calibration::default();
        let snapshot = original();
        let mut live = live_copy(&snapshot);

        adjust_capsule(&mut live, &snapshot, 2.0, CapsuleTop::HeadSample(80.0), &calibration);
        assert_relative_eq!(live.radius, 16.0);
        assert_relative_eq!(live.vertex_b.z, 6.0);
        assert_relative_eq!(live.vertex_a.z, 30.0);
    }

    #[test]
    fn test_head_sample_clamped_above_bottom() {
        let calibration = Calibration::default();
        let snapshot = original();
        let mut live = live_copy(&snapshot);

        adjust_capsule(&mut live, &snapshot, 2.0, CapsuleTop::HeadSample(40.0), &calibration);
        assert_relative_eq!(live.vertex_a.z, 6.01, epsilon = 1e-5);

        // equal to the bottom also clamps
        adjust_capsule(&mut live, &snapshot, 2.0, CapsuleTop::HeadSample(56.0), &calibration);
        assert_relative_eq!(live.vertex_a.z, 6.01, epsilon = 1e-5);
    }

    #[test]
    fn test_scaled_top_and_forward_shift() {
        let calibration = Calibration::default();
        let snapshot = CapsuleSnapshot {
            radius: 0.25,
            vertex_a: Vec3::new(0.1, 0.2, 1.0),
            vertex_b: Vec3::new(0.1, -0.1, 0.25),
        };
        let mut live = live_copy(&snapshot);

        adjust_capsule(&mut live, &snapshot, 1.5, CapsuleTop::Scaled, &calibration);
        assert_relative_eq!(live.radius, 0.3, epsilon = 1e-6);
        assert_relative_eq!(live.vertex_b.z, 0.25 + 0.05, epsilon = 1e-6);
        assert_relative_eq!(live.vertex_a.z, 1.5, epsilon = 1e-6);
        assert_relative_eq!(live.vertex_a.y, 0.3, epsilon = 1e-6);
        assert_relative_eq!(live.vertex_b.y, -0.15, epsilon = 1e-6);
        assert_relative_eq!(live.vertex_a.x, 0.1);
    }

    #[test]
    fn test_radius_exact_across_range() {
        let calibration = Calibration::default();
        let snapshot = original();
        let mut live = live_copy(&snapshot);
        for scale in [0.15, 0.5, 1.0, 3.7, 20.0] {
            adjust_capsule(&mut live, &snapshot, scale, CapsuleTop::Scaled, &calibration);
            assert_eq!(live.radius, snapshot.radius * scale * 0.8);
        }
    }

    #[test]
    fn test_repeated_adjustment_does_not_drift() {
        let calibration = Calibration::default();
        let snapshot = original();
        let mut live = live_copy(&snapshot);
        adjust_capsule(&mut live, &snapshot, 3.0, CapsuleTop::HeadSample(120.0), &calibration);
        let first = live;
        adjust_capsule(&mut live, &snapshot, 3.0, CapsuleTop::HeadSample(120.0), &calibration);
        assert_eq!(live, first);
    }
}
