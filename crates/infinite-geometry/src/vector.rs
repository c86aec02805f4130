//! Vector and buffer types shared by every generator.
//!
//! Generators produce plain data: points, line segments, and indexed
//! triangle meshes. A renderer uploads them as-is.

use core::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Build a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.x.mul_add(self.x, self.y.mul_add(self.y, self.z * self.z)).sqrt()
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 { self * (1.0 / len) } else { self }
    }

    /// Distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A straight line between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point.
    pub start: Vec3,
    /// End point.
    pub end: Vec3,
}

impl Segment {
    /// Build a segment.
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }
}

/// A connected line through a sequence of points, optionally coloured per
/// vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Vertices in drawing order.
    pub points: Vec<Vec3>,
    /// Per-vertex colours. Empty when the line is drawn in one colour.
    pub colors: Vec<Rgb>,
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals.
    pub normals: Vec<Vec3>,
    /// Per-vertex texture coordinates.
    pub uvs: Vec<[f64; 2]>,
    /// Triangle vertex indices, three per triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether every index refers to an existing vertex.
    pub fn indices_in_bounds(&self) -> bool {
        let n = self.positions.len();
        self.indices
            .iter()
            .all(|&i| usize::try_from(i).is_ok_and(|i| i < n))
    }
}

/// Evenly spaced fraction `i / n` as `f64`. Returns 0 when `n` is 0.
pub(crate) fn fraction(i: u32, n: u32) -> f64 {
    if n == 0 {
        0.0
    } else {
        f64::from(i) / f64::from(n)
    }
}
