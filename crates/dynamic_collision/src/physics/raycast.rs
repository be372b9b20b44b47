//! Ray casting against static colliders
//!
//! Rays are segment casts: `from` to `to`, reporting the closest hit as a
//! fraction of the segment. Only the primitives the stand-clearance query
//! needs are supported.

use super::collision_layers::CollisionFilterInfo;
use crate::foundation::math::Vec3;

/// A ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Segment cast request
#[derive(Debug, Clone, Copy)]
pub struct RayCastInput {
    /// Segment start
    pub from: Vec3,
    /// Segment end
    pub to: Vec3,
    /// Filter of the ray
    pub filter_info: CollisionFilterInfo,
}

/// Closest hit of a segment cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastOutput {
    /// Hit position as a fraction of the segment, 1.0 for no hit
    pub hit_fraction: f32,
    /// Surface normal at the hit
    pub normal: Vec3,
    /// Index of the collider that was hit
    pub collider: Option<usize>,
}

impl RayCastOutput {
    /// Output of a cast that hit nothing
    pub fn miss() -> Self {
        Self {
            hit_fraction: 1.0,
            normal: Vec3::zeros(),
            collider: None,
        }
    }

    /// Whether anything was hit
    pub fn has_hit(&self) -> bool {
        self.collider.is_some()
    }
}

/// Static collider geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Sphere
    Sphere {
        /// Center
        center: Vec3,
        /// Radius
        radius: f32,
    },
    /// Axis-aligned box
    Aabb {
        /// Minimum corner
        min: Vec3,
        /// Maximum corner
        max: Vec3,
    },
    /// Swept sphere between two points
    Capsule {
        /// First endpoint
        a: Vec3,
        /// Second endpoint
        b: Vec3,
        /// Radius
        radius: f32,
    },
}

/// Static collidable in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticCollider {
    /// Geometry
    pub shape: ColliderShape,
    /// Layer and group
    pub filter_info: CollisionFilterInfo,
}

impl ColliderShape {
    /// Distance along `ray` to the first intersection and the surface normal
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        match *self {
            Self::Sphere { center, radius } => intersect_sphere(ray, &center, radius),
            Self::Aabb { min, max } => intersect_aabb(ray, &min, &max),
            Self::Capsule { a, b, radius } => intersect_capsule(ray, &a, &b, radius),
        }
    }
}

fn intersect_sphere(ray: &Ray, center: &Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let oc = ray.origin - center;

    // Solve: |origin + t*direction - center|^2 = radius^2
    let b = oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let t1 = -b - sqrt_discriminant;
    let t2 = -b + sqrt_discriminant;
    let t = if t1 >= 0.0 {
        t1
    } else if t2 >= 0.0 {
        // origin inside
        0.0
    } else {
        return None;
    };

    let normal = (ray.point_at(t) - center).try_normalize(f32::EPSILON).unwrap_or(-ray.direction);
    Some((t, normal))
}

// Slab method
fn intersect_aabb(ray: &Ray, min: &Vec3, max: &Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::zeros();

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction == 0.0 {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let (mut t1, mut t2) = ((min[axis] - origin) * inv, (max[axis] - origin) * inv);
        let mut sign = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            sign = 1.0;
        }
        if t1 > t_enter {
            t_enter = t1;
            normal = Vec3::zeros();
            normal[axis] = sign;
        }
        t_exit = t_exit.min(t2);
    }

    if t_exit < t_enter || t_exit < 0.0 {
        return None;
    }
    if t_enter < 0.0 {
        return Some((0.0, -ray.direction));
    }
    Some((t_enter, normal))
}

fn intersect_capsule(ray: &Ray, a: &Vec3, b: &Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let axis = b - a;
    let length_sq = axis.norm_squared();
    if length_sq <= f32::EPSILON {
        return intersect_sphere(ray, a, radius);
    }

    // Infinite cylinder around the axis, then the end caps
    let mut best: Option<(f32, Vec3)> = None;
    let ao = ray.origin - a;
    let d_par = ray.direction.dot(&axis) / length_sq;
    let o_par = ao.dot(&axis) / length_sq;
    let d_perp = ray.direction - axis * d_par;
    let o_perp = ao - axis * o_par;

    let qa = d_perp.norm_squared();
    let qb = o_perp.dot(&d_perp);
    let qc = o_perp.norm_squared() - radius * radius;
    if qa > f32::EPSILON {
        let discriminant = qb * qb - qa * qc;
        if discriminant >= 0.0 {
            let t = (-qb - discriminant.sqrt()) / qa;
            let along = o_par + d_par * t;
            if t >= 0.0 && (0.0..=1.0).contains(&along) {
                let hit = ray.point_at(t);
                let normal = (hit - (a + axis * along)).normalize();
                best = Some((t, normal));
            }
        }
    }
    if qc <= 0.0 && (0.0..=1.0).contains(&o_par) {
        return Some((0.0, -ray.direction));
    }

    for cap in [a, b] {
        if let Some(hit) = intersect_sphere(ray, cap, radius) {
            if best.map_or(true, |(t, _)| hit.0 < t) {
                best = Some(hit);
            }
        }
    }
    best
}

/// Cast a segment against `colliders`, keeping the ones `accept` lets through
pub fn cast_ray<'a>(
    input: &RayCastInput,
    colliders: impl IntoIterator<Item = (usize, &'a StaticCollider)>,
    accept: impl Fn(&StaticCollider) -> bool,
) -> RayCastOutput {
    let segment = input.to - input.from;
    let length = segment.norm();
    if length <= f32::EPSILON {
        return RayCastOutput::miss();
    }
    let ray = Ray::new(input.from, segment);

    let mut output = RayCastOutput::miss();
    for (index, collider) in colliders {
        if !accept(collider) {
            continue;
        }
        if let Some((t, normal)) = collider.shape.intersect_ray(&ray) {
            let fraction = t / length;
            if fraction <= 1.0 && (output.collider.is_none() || fraction < output.hit_fraction) {
                output = RayCastOutput {
                    hit_fraction: fraction,
                    normal,
                    collider: Some(index),
                };
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn up(length: f32) -> RayCastInput {
        RayCastInput {
            from: Vec3::zeros(),
            to: Vec3::new(0.0, 0.0, length),
            filter_info: CollisionFilterInfo::default(),
        }
    }

    fn collider(shape: ColliderShape) -> StaticCollider {
        StaticCollider { shape, filter_info: CollisionFilterInfo::default() }
    }

    #[test]
    fn test_sphere_hit_fraction() {
        let sphere = collider(ColliderShape::Sphere { center: Vec3::new(0.0, 0.0, 5.0), radius: 1.0 });
        let output = cast_ray(&up(10.0), [(0, &sphere)], |_| true);
        assert!(output.has_hit());
        assert_relative_eq!(output.hit_fraction, 0.4, epsilon = 1e-5);
        assert_relative_eq!(output.normal.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_segment_stops_short() {
        let sphere = collider(ColliderShape::Sphere { center: Vec3::new(0.0, 0.0, 5.0), radius: 1.0 });
        assert!(!cast_ray(&up(3.0), [(0, &sphere)], |_| true).has_hit());
    }

    #[test]
    fn test_aabb_slab() {
        let ceiling = collider(ColliderShape::Aabb {
            min: Vec3::new(-1.0, -1.0, 2.0),
            max: Vec3::new(1.0, 1.0, 3.0),
        });
        let output = cast_ray(&up(4.0), [(3, &ceiling)], |_| true);
        assert_eq!(output.collider, Some(3));
        assert_relative_eq!(output.hit_fraction, 0.5, epsilon = 1e-5);
        assert_relative_eq!(output.normal.z, -1.0);

        let beside = collider(ColliderShape::Aabb {
            min: Vec3::new(2.0, 2.0, 2.0),
            max: Vec3::new(3.0, 3.0, 3.0),
        });
        assert!(!cast_ray(&up(4.0), [(0, &beside)], |_| true).has_hit());
    }

    #[test]
    fn test_capsule_side_and_cap() {
        // horizontal beam overhead
        let beam = collider(ColliderShape::Capsule {
            a: Vec3::new(-2.0, 0.0, 3.0),
            b: Vec3::new(2.0, 0.0, 3.0),
            radius: 0.5,
        });
        let output = cast_ray(&up(5.0), [(0, &beam)], |_| true);
        assert_relative_eq!(output.hit_fraction, 0.5, epsilon = 1e-5);

        // vertical pillar above, hit through its lower cap
        let pillar = collider(ColliderShape::Capsule {
            a: Vec3::new(0.0, 0.0, 3.0),
            b: Vec3::new(0.0, 0.0, 6.0),
            radius: 0.5,
        });
        let output = cast_ray(&up(5.0), [(0, &pillar)], |_| true);
        assert_relative_eq!(output.hit_fraction, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_filter_rejects_and_closest_wins() {
        let near = collider(ColliderShape::Sphere { center: Vec3::new(0.0, 0.0, 2.0), radius: 0.5 });
        let far = collider(ColliderShape::Sphere { center: Vec3::new(0.0, 0.0, 6.0), radius: 0.5 });
        let all = [(0, &far), (1, &near)];

        let output = cast_ray(&up(10.0), all, |_| true);
        assert_eq!(output.collider, Some(1));

        let output = cast_ray(&up(10.0), all, |c| c.shape != near.shape);
        assert_eq!(output.collider, Some(0));
    }
}
