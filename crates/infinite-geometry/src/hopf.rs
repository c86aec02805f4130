//! Hopf fibration fibers, stereographically projected into 3D.

use core::f64::consts::{FRAC_PI_4, TAU};

use serde::{Deserialize, Serialize};

use crate::color::{Rgb, hsl_to_rgb};
use crate::vector::{Vec3, fraction};

/// Default number of fibers.
pub const FIBERS: u32 = 24;

/// Default samples per fiber.
pub const POINTS_PER_FIBER: u32 = 128;

/// Base point parameter on the 2-sphere.
pub const ETA: f64 = FRAC_PI_4;

/// Scale applied to projected points.
pub const SCALE: f64 = 2.0;

/// Projected points at or beyond this radius (before scaling) are dropped.
pub const MAX_RADIUS: f64 = 5.0;

/// One fiber: a circle of the 3-sphere after projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fiber {
    /// Points along the fiber that survived the radius cut.
    pub points: Vec<Vec3>,
    /// Line colour.
    pub color: Rgb,
}

/// Generate `fibers` fibers of `points_per_fiber` samples each.
pub fn hopf_fibration(fibers: u32, points_per_fiber: u32) -> Vec<Fiber> {
    let (sin_eta, cos_eta) = ETA.sin_cos();
    let last = points_per_fiber.saturating_sub(1);

    (0..fibers)
        .map(|i| {
            let phi = fraction(i, fibers) * TAU;
            let points = (0..points_per_fiber)
                .filter_map(|j| {
                    let half = fraction(j, last) * TAU / 2.0;
                    let q0 = cos_eta * half.cos();
                    let q1 = cos_eta * half.sin();
                    let q2 = sin_eta * (phi + half).cos();
                    let q3 = sin_eta * (phi + half).sin();

                    let denom = 1.0 - q3;
                    if denom.abs() < f64::EPSILON {
                        return None;
                    }
                    let p = Vec3::new(q0 / denom, q1 / denom, q2 / denom);
                    (p.length() < MAX_RADIUS).then_some(p * SCALE)
                })
                .collect();

            Fiber {
                points,
                color: hsl_to_rgb(fraction(i, fibers).mul_add(0.8, 0.5), 0.8, 0.6),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fiber_counts_and_bounds() {
        let fibers = hopf_fibration(FIBERS, POINTS_PER_FIBER);
        assert_eq!(fibers.len(), 24);
        for fiber in &fibers {
            assert!(fiber.points.len() <= 128);
            assert!(fiber.points.iter().all(|p| p.length() < MAX_RADIUS * SCALE));
        }
    }

    #[test]
    fn eta_quarter_pi_keeps_every_point() {
        // With eta = pi/4, |q3| <= sin(pi/4) < 1, so no point escapes far.
        let fibers = hopf_fibration(FIBERS, POINTS_PER_FIBER);
        let total: usize = fibers.iter().map(|f| f.points.len()).sum();
        assert_eq!(total, 24 * 128);
    }
}
