//! Parametric surfaces and curves: Mobius strip, Klein bottle, torus knot.

use core::f64::consts::{PI, TAU};

use crate::vector::{Mesh, Polyline, Vec3, fraction};

/// Default Mobius strip segment count along the loop.
pub const MOBIUS_SEGMENTS: u32 = 100;

/// Default Mobius strip width.
pub const MOBIUS_WIDTH: f64 = 1.0;

/// Default Klein bottle grid resolution along `u`.
pub const KLEIN_U_SEGMENTS: u32 = 64;

/// Default Klein bottle grid resolution along `v`.
pub const KLEIN_V_SEGMENTS: u32 = 32;

/// Scale applied to Klein bottle positions.
pub const KLEIN_SCALE: f64 = 0.05;

/// Parameters of a torus knot centreline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusKnot {
    /// Windings around the axis of rotational symmetry.
    pub p: u32,
    /// Windings around the interior circle.
    pub q: u32,
    /// Radius of the torus.
    pub radius: f64,
    /// Number of segments along the curve.
    pub segments: u32,
}

impl Default for TorusKnot {
    /// The gateway's infinity symbol: a (2, 3) knot of radius 2.
    fn default() -> Self {
        Self {
            p: 2,
            q: 3,
            radius: 2.0,
            segments: 128,
        }
    }
}

/// Triangle indices for a `(cols + 1) x (rows + 1)` vertex grid laid out
/// row-major with `rows + 1` vertices per column.
#[allow(clippy::arithmetic_side_effects)]
fn grid_indices(cols: u32, rows: u32) -> Vec<u32> {
    let stride = rows + 1;
    let mut indices = Vec::new();
    for i in 0..cols {
        for j in 0..rows {
            let a = i * stride + j;
            let b = a + stride;
            let c = a + 1;
            let d = b + 1;
            indices.extend_from_slice(&[a, b, c, b, d, c]);
        }
    }
    indices
}

/// A Mobius strip of unit radius: `segments + 1` columns of two vertices.
pub fn mobius_strip(segments: u32, width: f64) -> Mesh {
    let mut mesh = Mesh::default();

    for i in 0..=segments {
        let u = fraction(i, segments) * TAU;
        let half = u / 2.0;
        for j in 0..=1_u32 {
            let v = (f64::from(j) - 0.5) * width;
            let ring = v.mul_add(half.cos(), 1.0);
            mesh.positions
                .push(Vec3::new(ring * u.cos(), ring * u.sin(), v * half.sin()));
            mesh.normals.push(Vec3::new(
                u.cos() * half.cos(),
                u.sin() * half.cos(),
                half.sin(),
            ));
            mesh.uvs.push([fraction(i, segments), f64::from(j)]);
        }
    }

    mesh.indices = strip_indices(segments);
    mesh
}

/// Two triangles per quad of a strip with two vertices per column.
#[allow(clippy::arithmetic_side_effects)]
fn strip_indices(segments: u32) -> Vec<u32> {
    let mut indices = Vec::new();
    for i in 0..segments {
        let a = i * 2;
        indices.extend_from_slice(&[a, a + 1, a + 2, a + 1, a + 3, a + 2]);
    }
    indices
}

/// A Klein bottle immersion on a `u_segments x v_segments` grid.
///
/// The surface uses a piecewise parametrization that switches branch at
/// `u = pi`. Normals are the normalized unscaled position, which is only an
/// approximation of the true surface normal.
pub fn klein_bottle(u_segments: u32, v_segments: u32) -> Mesh {
    let mut mesh = Mesh::default();

    for i in 0..=u_segments {
        let u = fraction(i, u_segments) * TAU;
        for j in 0..=v_segments {
            let v = fraction(j, v_segments) * TAU;
            let r = 4.0 * (1.0 - u.cos() / 2.0);

            let (x, y) = if u < PI {
                (
                    (6.0 * u.cos()).mul_add(1.0 + u.sin(), r * u.cos() * v.cos()),
                    (r * u.sin()).mul_add(v.cos(), 16.0 * u.sin()),
                )
            } else {
                (
                    (6.0 * u.cos()).mul_add(1.0 + u.sin(), r * (v + PI).cos()),
                    16.0 * u.sin(),
                )
            };
            let z = r * v.sin();
            let raw = Vec3::new(x, y, z);

            mesh.positions.push(raw * KLEIN_SCALE);
            mesh.normals.push(raw.normalize());
            mesh.uvs
                .push([fraction(i, u_segments), fraction(j, v_segments)]);
        }
    }

    mesh.indices = grid_indices(u_segments, v_segments);
    mesh
}

/// The centreline of a torus knot, `segments + 1` points from `u = 0` to
/// `u = p * 2pi`.
pub fn torus_knot(knot: TorusKnot) -> Polyline {
    let p = f64::from(knot.p.max(1));
    let q = f64::from(knot.q);
    let points = (0..=knot.segments)
        .map(|i| {
            let u = fraction(i, knot.segments) * p * TAU;
            let qu = q / p * u;
            let ring = knot.radius * (2.0 + qu.cos()) * 0.5;
            Vec3::new(ring * u.cos(), ring * u.sin(), knot.radius * qu.sin() * 0.5)
        })
        .collect();

    Polyline {
        points,
        colors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobius_counts() {
        let mesh = mobius_strip(MOBIUS_SEGMENTS, MOBIUS_WIDTH);
        assert_eq!(mesh.positions.len(), 202);
        assert_eq!(mesh.normals.len(), 202);
        assert_eq!(mesh.uvs.len(), 202);
        assert_eq!(mesh.triangle_count(), 200);
        assert!(mesh.indices_in_bounds());
    }

    #[test]
    fn mobius_closes_with_a_half_twist() {
        let mesh = mobius_strip(MOBIUS_SEGMENTS, MOBIUS_WIDTH);
        let first = mesh.positions.first().copied().unwrap_or_default();
        let last_row = mesh.positions.get(201).copied().unwrap_or_default();
        // After a full turn the two edges of the strip have swapped.
        assert!(first.distance(last_row) < 1e-9);
    }

    #[test]
    fn klein_counts() {
        let mesh = klein_bottle(KLEIN_U_SEGMENTS, KLEIN_V_SEGMENTS);
        assert_eq!(mesh.positions.len(), 65 * 33);
        assert_eq!(mesh.triangle_count(), 64 * 32 * 2);
        assert!(mesh.indices_in_bounds());
        assert!(mesh.positions.iter().all(|p| p.length().is_finite()));
    }

    #[test]
    fn torus_knot_is_closed() {
        let knot = torus_knot(TorusKnot::default());
        assert_eq!(knot.points.len(), 129);
        let first = knot.points.first().copied().unwrap_or_default();
        let last = knot.points.last().copied().unwrap_or_default();
        assert!(first.distance(last) < 1e-9);
    }
}
