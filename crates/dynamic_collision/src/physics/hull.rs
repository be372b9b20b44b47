//! Convex vertices shapes
//!
//! A character bumper hull is a fixed, small point set: two horizontal rings
//! of eight vertices plus a bottom apex and, in the full topology, a top apex.
//! [`HullTopology`] names those index sets. [`ConvexVerticesShape`] is the
//! built primitive: the input vertices, the supporting planes derived from
//! them and an optional inward shrink by the convex radius.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Options for building a convex vertices shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullBuildConfig {
    /// Record which input vertices support each plane
    pub create_connectivity: bool,
    /// Move vertices inward by the convex radius
    pub shrink_by_convex_radius: bool,
    /// Shrink along per-vertex normals instead of toward the centroid
    pub use_optimized_shrinking: bool,
    /// Collision skin thickness around the hull
    pub convex_radius: f32,
    /// Maximum accepted input vertices, 0 for unlimited
    pub max_vertices: u32,
    /// Cap on shrink as a fraction of the smallest half extent, 0 for none
    pub max_relative_shrink: f32,
    /// Cap on absolute vertex displacement while shrinking, 0 for none
    pub max_shrinking_vertices_displacement: f32,
    /// Planes whose normal deviates more than this from a vertex normal are
    /// ignored when shrinking that vertex
    pub min_cos_angle_between_planes: f32,
}

impl HullBuildConfig {
    /// Check the options for values the builder cannot honor
    pub fn validate(&self) -> Result<(), String> {
        if self.convex_radius < 0.0 {
            return Err("Convex radius cannot be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.max_relative_shrink) {
            return Err("Max relative shrink must be within [0, 1]".to_string());
        }
        if self.max_shrinking_vertices_displacement < 0.0 {
            return Err("Max shrinking displacement cannot be negative".to_string());
        }
        if !(-1.0..=1.0).contains(&self.min_cos_angle_between_planes) {
            return Err("Min cos angle between planes must be within [-1, 1]".to_string());
        }
        Ok(())
    }
}

impl Default for HullBuildConfig {
    fn default() -> Self {
        Self {
            create_connectivity: false,
            shrink_by_convex_radius: false,
            use_optimized_shrinking: true,
            convex_radius: 0.05,
            max_vertices: 0,
            max_relative_shrink: 0.0,
            max_shrinking_vertices_displacement: 0.0,
            min_cos_angle_between_planes: -0.1,
        }
    }
}

/// Hull build failures
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HullError {
    /// Fewer points than a solid needs
    #[error("convex hull needs at least 4 vertices, got {0}")]
    TooFewVertices(usize),

    /// More points than `max_vertices` allows
    #[error("convex hull accepts at most {max} vertices, got {count}")]
    TooManyVertices {
        /// Input vertex count
        count: usize,
        /// Configured limit
        max: u32,
    },

    /// NaN or infinite coordinate
    #[error("vertex {0} has a non-finite coordinate")]
    NonFinite(usize),

    /// All points coplanar or collinear
    #[error("vertices do not enclose a volume")]
    Degenerate,
}

/// Supporting plane, `normal . p <= offset` inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Outward unit normal
    pub normal: Vec3,
    /// Distance along the normal from the origin
    pub offset: f32,
}

impl Plane {
    /// Signed distance of `point`, positive outside
    pub fn distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

/// A built convex hull primitive
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexVerticesShape {
    original_vertices: Vec<Vec3>,
    vertices: Vec<Vec3>,
    planes: Vec<Plane>,
    connectivity: Option<Vec<Vec<usize>>>,
    config: HullBuildConfig,
    aabb_min: Vec3,
    aabb_max: Vec3,
}

impl ConvexVerticesShape {
    /// Build a hull from a vertex set
    pub fn build(vertices: &[Vec3], config: &HullBuildConfig) -> Result<Self, HullError> {
        if vertices.len() < 4 {
            return Err(HullError::TooFewVertices(vertices.len()));
        }
        if config.max_vertices > 0 && vertices.len() > config.max_vertices as usize {
            return Err(HullError::TooManyVertices {
                count: vertices.len(),
                max: config.max_vertices,
            });
        }
        if let Some(i) = vertices.iter().position(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(HullError::NonFinite(i));
        }

        let (aabb_min, aabb_max) = bounds(vertices);
        let tolerance = 1.0e-5 * (aabb_max - aabb_min).amax().max(1.0);
        let planes = supporting_planes(vertices, tolerance);
        if planes.len() < 4 {
            return Err(HullError::Degenerate);
        }

        let connectivity: Option<Vec<Vec<usize>>> = config.create_connectivity.then(|| {
            planes
                .iter()
                .map(|plane| {
                    (0..vertices.len())
                        .filter(|&i| plane.distance(&vertices[i]).abs() <= tolerance)
                        .collect::<Vec<usize>>()
                })
                .collect()
        });

        let shrunk = if config.shrink_by_convex_radius && config.convex_radius > 0.0 {
            shrink(vertices, &planes, config, tolerance, &aabb_min, &aabb_max)
        } else {
            vertices.to_vec()
        };

        Ok(Self {
            original_vertices: vertices.to_vec(),
            vertices: shrunk,
            planes,
            connectivity,
            config: *config,
            aabb_min,
            aabb_max,
        })
    }

    /// The vertices the hull was built from, in input order
    pub fn original_vertices(&self) -> &[Vec3] {
        &self.original_vertices
    }

    /// Vertices after shrinking
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Supporting planes
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Per-plane supporting vertex indices, if requested at build time
    pub fn connectivity(&self) -> Option<&[Vec<usize>]> {
        self.connectivity.as_deref()
    }

    /// Options the hull was built with
    pub fn config(&self) -> &HullBuildConfig {
        &self.config
    }

    /// Collision skin thickness
    pub fn convex_radius(&self) -> f32 {
        self.config.convex_radius
    }

    /// Axis-aligned bounds of the input vertices
    pub fn aabb(&self) -> (Vec3, Vec3) {
        (self.aabb_min, self.aabb_max)
    }

    /// Rebuild with every input vertex multiplied by `scale`
    pub fn scaled(&self, scale: f32) -> Result<Self, HullError> {
        let vertices: Vec<Vec3> = self.original_vertices.iter().map(|v| v * scale).collect();
        Self::build(&vertices, &self.config)
    }
}

fn bounds(vertices: &[Vec3]) -> (Vec3, Vec3) {
    vertices.iter().skip(1).fold((vertices[0], vertices[0]), |(lo, hi), v| {
        (lo.inf(v), hi.sup(v))
    })
}

// Brute force over vertex triples. Bumper hulls have under twenty points.
fn supporting_planes(vertices: &[Vec3], tolerance: f32) -> Vec<Plane> {
    let n = vertices.len();
    let mut planes: Vec<Plane> = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let normal = (vertices[j] - vertices[i]).cross(&(vertices[k] - vertices[i]));
                let length = normal.norm();
                if length <= tolerance * tolerance {
                    continue;
                }
                let mut normal = normal / length;
                let mut offset = normal.dot(&vertices[i]);

                let (mut above, mut below) = (false, false);
                for v in vertices {
                    let d = normal.dot(v) - offset;
                    if d > tolerance {
                        above = true;
                    } else if d < -tolerance {
                        below = true;
                    }
                }
                if above && below {
                    continue;
                }
                if !below && !above {
                    // coplanar input, no volume on either side
                    continue;
                }
                if above {
                    normal = -normal;
                    offset = -offset;
                }

                let duplicate = planes.iter().any(|p| {
                    (p.normal - normal).norm() < 1.0e-4 && (p.offset - offset).abs() <= tolerance
                });
                if !duplicate {
                    planes.push(Plane { normal, offset });
                }
            }
        }
    }

    planes
}

fn shrink(
    vertices: &[Vec3],
    planes: &[Plane],
    config: &HullBuildConfig,
    tolerance: f32,
    aabb_min: &Vec3,
    aabb_max: &Vec3,
) -> Vec<Vec3> {
    let mut limit = config.convex_radius;
    if config.max_relative_shrink > 0.0 {
        let half_extent = ((aabb_max - aabb_min) * 0.5).min();
        limit = limit.min(half_extent * config.max_relative_shrink);
    }
    if config.max_shrinking_vertices_displacement > 0.0 {
        limit = limit.min(config.max_shrinking_vertices_displacement);
    }

    if !config.use_optimized_shrinking {
        let centroid = vertices.iter().sum::<Vec3>() / vertices.len() as f32;
        return vertices
            .iter()
            .map(|v| {
                let to_center = centroid - v;
                let distance = to_center.norm();
                if distance <= limit {
                    centroid
                } else {
                    v + to_center * (limit / distance)
                }
            })
            .collect();
    }

    vertices
        .iter()
        .map(|v| {
            let touching: Vec<&Plane> = planes
                .iter()
                .filter(|p| p.distance(v).abs() <= tolerance)
                .collect();
            let average = touching.iter().map(|p| p.normal).sum::<Vec3>();
            if average.norm() == 0.0 {
                return *v;
            }
            let average = average.normalize();

            let kept = touching
                .iter()
                .filter(|p| p.normal.dot(&average) >= config.min_cos_angle_between_planes)
                .map(|p| p.normal)
                .sum::<Vec3>();
            if kept.norm() == 0.0 {
                return *v;
            }
            v - kept.normalize() * limit
        })
        .collect()
}

/// Known vertex layouts of a character bumper hull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullTopology {
    /// 18 vertices: top apex 9, bottom apex 8, two rings of eight
    Full,
    /// 17 vertices of a very short hull: no top apex, bottom apex 8
    Short,
}

impl HullTopology {
    /// Match a vertex count against the known layouts
    pub const fn detect(vertex_count: usize) -> Option<Self> {
        match vertex_count {
            18 => Some(Self::Full),
            17 => Some(Self::Short),
            _ => None,
        }
    }

    /// Number of vertices in the layout
    pub const fn vertex_count(self) -> usize {
        match self {
            Self::Full => 18,
            Self::Short => 17,
        }
    }

    /// Index of the top apex
    pub const fn top_apex(self) -> Option<usize> {
        match self {
            Self::Full => Some(9),
            Self::Short => None,
        }
    }

    /// Index of the bottom apex
    pub const fn bottom_apex(self) -> usize {
        8
    }

    /// Top ring indices in outline order
    pub const fn top_ring(self) -> [usize; 8] {
        match self {
            Self::Full => [1, 4, 13, 7, 3, 16, 5, 11],
            Self::Short => [1, 4, 12, 7, 3, 15, 5, 10],
        }
    }

    /// Bottom ring indices in outline order, aligned with [`Self::top_ring`]
    pub const fn bottom_ring(self) -> [usize; 8] {
        match self {
            Self::Full => [0, 2, 12, 6, 15, 17, 14, 10],
            Self::Short => [0, 2, 11, 6, 14, 16, 13, 9],
        }
    }

    /// Both rings
    pub fn ring_indices(self) -> impl Iterator<Item = usize> {
        self.top_ring().into_iter().chain(self.bottom_ring())
    }

    /// Wireframe edges: ring outlines, ring-to-ring verticals, apex spokes
    pub fn edges(self) -> Vec<(usize, usize)> {
        let top = self.top_ring();
        let bottom = self.bottom_ring();
        let mut edges = Vec::with_capacity(48);

        for ring in [top, bottom] {
            for i in 0..ring.len() {
                edges.push((ring[i], ring[(i + 1) % ring.len()]));
            }
        }
        edges.extend(top.iter().copied().zip(bottom.iter().copied()));
        if let Some(apex) = self.top_apex() {
            edges.extend(top.iter().map(|&i| (apex, i)));
        }
        edges.extend(bottom.iter().map(|&i| (self.bottom_apex(), i)));

        edges
    }
}
