//! Sacred geometry figures and the Penrose triangle outline.

use core::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::vector::{Segment, Vec3, fraction};

/// Segments per Flower of Life circle.
pub const FLOWER_CIRCLE_SEGMENTS: u32 = 64;

/// Centres of Metatron's cube: the origin, an inner hexagon of radius 1,
/// and an outer hexagon of radius 2.
pub fn metatron_centres() -> [Vec3; 13] {
    let h = 3.0f64.sqrt() / 2.0;
    [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.5, h, 0.0),
        Vec3::new(-0.5, h, 0.0),
        Vec3::new(0.5, -h, 0.0),
        Vec3::new(-0.5, -h, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(-2.0, 0.0, 0.0),
        Vec3::new(1.0, 2.0 * h, 0.0),
        Vec3::new(-1.0, 2.0 * h, 0.0),
        Vec3::new(1.0, -2.0 * h, 0.0),
        Vec3::new(-1.0, -2.0 * h, 0.0),
    ]
}

/// Metatron's cube: a segment between every pair of centres.
pub fn metatron_cube() -> Vec<Segment> {
    let centres = metatron_centres();
    centres
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| {
            centres
                .iter()
                .skip(i.saturating_add(1))
                .map(move |&b| Segment::new(a, b))
        })
        .collect()
}

/// Flower of Life: six unit circles whose centres sit on a unit circle.
pub fn flower_of_life() -> Vec<Segment> {
    let radius = 1.0;
    let on_circle = |cx: f64, cy: f64, k: u32| {
        let angle = fraction(k, FLOWER_CIRCLE_SEGMENTS) * TAU;
        Vec3::new(
            angle.cos().mul_add(radius, cx),
            angle.sin().mul_add(radius, cy),
            0.0,
        )
    };

    (0..6_u32)
        .flat_map(|i| {
            let angle = fraction(i, 6) * TAU;
            let (cx, cy) = (angle.cos() * radius, angle.sin() * radius);
            (1..=FLOWER_CIRCLE_SEGMENTS).map(move |k| {
                Segment::new(on_circle(cx, cy, k.saturating_sub(1)), on_circle(cx, cy, k))
            })
        })
        .collect()
}

/// The Merkabah star tetrahedron as a triangle soup: two interlocked
/// tetrahedra, four faces each, three vertices per face.
pub fn merkabah() -> Vec<Vec3> {
    let h = (2.0f64 / 3.0).sqrt();
    let s = 1.0 / 3.0f64.sqrt();
    let upper = [
        Vec3::new(0.0, h, 0.0),
        Vec3::new(-1.0, -h / 2.0, -s),
        Vec3::new(1.0, -h / 2.0, -s),
        Vec3::new(0.0, -h / 2.0, 2.0 * s),
    ];
    let lower = [
        Vec3::new(0.0, -h, 0.0),
        Vec3::new(-1.0, h / 2.0, s),
        Vec3::new(1.0, h / 2.0, s),
        Vec3::new(0.0, h / 2.0, -2.0 * s),
    ];
    let faces: [[usize; 3]; 4] = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]];

    [upper, lower]
        .iter()
        .flat_map(|tetra| {
            faces
                .iter()
                .flat_map(move |face| face.iter().filter_map(move |&k| tetra.get(k).copied()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Penrose triangle
// ---------------------------------------------------------------------------

/// Default outer triangle size.
pub const PENROSE_SIZE: f64 = 2.0;

/// Inner triangle size relative to the outer one.
pub const PENROSE_INNER_RATIO: f64 = 0.6;

/// Rotations (radians about Z) of the three beams that form the illusion.
pub const PENROSE_ROTATIONS: [f64; 3] = [0.0, TAU / 3.0, 2.0 * TAU / 3.0];

/// The outline of one Penrose beam: an outer triangle with a triangular hole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenroseOutline {
    /// Outer triangle, apex first.
    pub outer: [Vec3; 3],
    /// Inner triangle (the hole), apex first.
    pub inner: [Vec3; 3],
}

impl PenroseOutline {
    /// The closed outline as six segments: outer loop then inner loop.
    pub fn segments(&self) -> Vec<Segment> {
        [self.outer, self.inner]
            .iter()
            .flat_map(|tri| {
                let [a, b, c] = *tri;
                [Segment::new(a, b), Segment::new(b, c), Segment::new(c, a)]
            })
            .collect()
    }
}

fn equilateral(size: f64) -> [Vec3; 3] {
    let half_width = size * 0.866;
    [
        Vec3::new(0.0, size, 0.0),
        Vec3::new(-half_width, -size * 0.5, 0.0),
        Vec3::new(half_width, -size * 0.5, 0.0),
    ]
}

/// The Penrose triangle outline for an outer triangle of `size`.
pub fn penrose_triangle(size: f64) -> PenroseOutline {
    PenroseOutline {
        outer: equilateral(size),
        inner: equilateral(size * PENROSE_INNER_RATIO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metatron_connects_every_pair() {
        let segments = metatron_cube();
        assert_eq!(segments.len(), 78);
        assert!(segments.iter().all(|s| s.start != s.end));
    }

    #[test]
    fn flower_circles_are_closed_and_unit() {
        let segments = flower_of_life();
        assert_eq!(segments.len(), 6 * 64);
        let first = segments.first().map(|s| s.start);
        let last_of_first_circle = segments.get(63).map(|s| s.end);
        let (Some(a), Some(b)) = (first, last_of_first_circle) else { return };
        assert!(a.distance(b) < 1e-9);
    }

    #[test]
    fn merkabah_has_24_vertices() {
        let vertices = merkabah();
        assert_eq!(vertices.len(), 24);
    }

    #[test]
    fn penrose_outline() {
        let outline = penrose_triangle(PENROSE_SIZE);
        assert_eq!(outline.segments().len(), 6);
        assert!((outline.inner[0].y - 1.2).abs() < 1e-12);
        assert!((outline.outer[1].x + 1.732).abs() < 1e-12);
    }
}
