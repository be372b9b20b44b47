//! Math utilities and types
//!
//! Provides the vector types used for collision geometry plus the small set
//! of scalar and planar helpers the shape adjustment code relies on.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Rotation3, Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type, used for RGBA debug colors
pub type Vec4 = Vector4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}

/// Math utility functions
pub mod utils {
    use super::{Rotation3, Unit, Vec2, Vec3};

    /// Approximate float equality: `|a - b| < epsilon`.
    ///
    /// Used for change detection on scale factors, where anything closer than
    /// `epsilon` is treated as "unchanged". This is intentionally approximate.
    pub fn floats_equal(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() < epsilon
    }

    /// Vertical offset needed to keep a sphere resting on the same ground
    /// point after its radius changes from `original` to `scaled`.
    pub fn sphere_offset(original: f32, scaled: f32) -> f32 {
        scaled - original
    }

    /// Length of the horizontal (XY) component of a vector
    pub fn planar_length(v: &Vec3) -> f32 {
        Vec2::new(v.x, v.y).norm()
    }

    /// Reset the horizontal magnitude of `v` to `radius`, keeping its
    /// horizontal direction and its Z coordinate.
    ///
    /// A vector with no horizontal component stays on the axis.
    pub fn with_planar_length(v: &Vec3, radius: f32) -> Vec3 {
        let planar = Vec2::new(v.x, v.y);
        let len = planar.norm();
        if len == 0.0 {
            return Vec3::new(0.0, 0.0, v.z);
        }
        let scaled = planar * (radius / len);
        Vec3::new(scaled.x, scaled.y, v.z)
    }

    /// Rotate `v` by `angle` radians around `axis`. The axis need not be
    /// normalized.
    pub fn rotate_angle_axis(v: &Vec3, angle: f32, axis: &Vec3) -> Vec3 {
        Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle) * v
    }

    /// Map `value` linearly from `[old_min, old_max]` onto `[new_min, new_max]`.
    ///
    /// Values outside the old range extrapolate. A degenerate old range maps
    /// everything to `new_min`.
    pub fn remap(value: f32, old_min: f32, old_max: f32, new_min: f32, new_max: f32) -> f32 {
        let span = old_max - old_min;
        if span == 0.0 {
            return new_min;
        }
        (value - old_min) * (new_max - new_min) / span + new_min
    }

    /// Smoothed power curve, normalized so `x == o` lands on `1 + a`.
    ///
    /// `k` scales the input, `n` is the power, `s` the softness of the knee
    /// and `a` a constant added to the result.
    pub fn soft_power(x: f32, k: f32, n: f32, s: f32, o: f32, a: f32) -> f32 {
        let knee = |t: f32| (1.0 + (k * t).powf(n * s)).powf(1.0 / s);
        knee(x) / knee(o) + a
    }

    /// Reciprocal of [`soft_power`] plus `a`: falls from `1 + a` at `x == o`
    /// towards `a` as `x` grows.
    pub fn soft_core(x: f32, k: f32, n: f32, s: f32, o: f32, a: f32) -> f32 {
        1.0 / soft_power(x, k, n, s, o, 0.0) + a
    }
}
