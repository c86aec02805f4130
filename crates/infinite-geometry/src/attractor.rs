//! Strange attractors integrated with fixed-step Euler.
//!
//! Each system starts from a fixed initial condition and is stepped
//! [`ITERATIONS`] times with step [`DT`]. Every state after a step becomes
//! one point of the trail, scaled per system. Vertex colours sweep the hue
//! range `[0.5, 1.0)` along the trail.

use serde::{Deserialize, Serialize};

use crate::color::hsl_to_rgb;
use crate::vector::{Polyline, Vec3, fraction};

/// Integration step.
pub const DT: f64 = 0.01;

/// Number of integration steps (and trail points).
pub const ITERATIONS: u32 = 10_000;

/// The attractor systems available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttractorKind {
    /// Lorenz system, sigma 10, rho 28, beta 8/3.
    Lorenz,
    /// Rossler system, a 0.2, b 0.2, c 5.7.
    Rossler,
    /// Chua's circuit, a 15.6, b 28, c -1.143, d -0.714.
    Chua,
}

impl AttractorKind {
    /// All systems.
    pub const ALL: [Self; 3] = [Self::Lorenz, Self::Rossler, Self::Chua];

    const fn start(self) -> Vec3 {
        match self {
            Self::Lorenz | Self::Chua => Vec3::new(0.1, 0.0, 0.0),
            Self::Rossler => Vec3::new(1.0, 1.0, 1.0),
        }
    }

    const fn scale(self) -> Vec3 {
        match self {
            Self::Lorenz => Vec3::new(0.1, 0.1, 0.1),
            Self::Rossler => Vec3::new(0.5, 0.5, 0.05),
            Self::Chua => Vec3::new(0.5, 0.5, 0.5),
        }
    }

    /// The time derivative at `p`.
    fn derivative(self, p: Vec3) -> Vec3 {
        match self {
            Self::Lorenz => {
                let (sigma, rho, beta) = (10.0, 28.0, 8.0 / 3.0);
                Vec3::new(
                    sigma * (p.y - p.x),
                    p.x.mul_add(rho - p.z, -p.y),
                    p.x.mul_add(p.y, -beta * p.z),
                )
            }
            Self::Rossler => {
                let (a, b, c): (f64, f64, f64) = (0.2, 0.2, 5.7);
                Vec3::new(-p.y - p.z, a.mul_add(p.y, p.x), p.z.mul_add(p.x - c, b))
            }
            Self::Chua => {
                let (a, b) = (15.6, 28.0);
                Vec3::new(a * (p.y - p.x - chua_diode(p.x)), p.x - p.y + p.z, -b * p.y)
            }
        }
    }
}

/// Chua's piecewise-linear diode response.
fn chua_diode(x: f64) -> f64 {
    let (c, d): (f64, f64) = (-1.143, -0.714);
    (0.5 * (d - c)).mul_add((x + 1.0).abs() - (x - 1.0).abs(), c * x)
}

/// Integrate `kind` and return the coloured trail.
pub fn attractor(kind: AttractorKind) -> Polyline {
    let scale = kind.scale();
    let mut p = kind.start();
    let mut points = Vec::with_capacity(10_000);
    let mut colors = Vec::with_capacity(10_000);

    for i in 0..ITERATIONS {
        p = p + kind.derivative(p) * DT;
        points.push(Vec3::new(p.x * scale.x, p.y * scale.y, p.z * scale.z));
        colors.push(hsl_to_rgb(fraction(i, ITERATIONS).mul_add(0.5, 0.5), 0.8, 0.5));
    }

    Polyline { points, colors }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_system_produces_a_full_finite_trail() {
        for kind in AttractorKind::ALL {
            let trail = attractor(kind);
            assert_eq!(trail.points.len(), 10_000);
            assert_eq!(trail.colors.len(), 10_000);
            assert!(trail.points.iter().all(|p| p.length().is_finite()));
        }
    }

    #[test]
    fn lorenz_first_step() {
        let trail = attractor(AttractorKind::Lorenz);
        let first = trail.points.first().copied().unwrap_or_default();
        // raw x = 0.1 + 10 * (0 - 0.1) * 0.01 = 0.09, raw y = 0.1 * 28 * 0.01 = 0.028
        assert!((first.x - 0.009).abs() < 1e-12);
        assert!((first.y - 0.0028).abs() < 1e-12);
        assert!(first.z.abs() < 1e-12);
    }

    #[test]
    fn lorenz_stays_on_the_butterfly() {
        let trail = attractor(AttractorKind::Lorenz);
        assert!(trail.points.iter().all(|p| p.length() < 10.0));
    }

    #[test]
    fn rossler_derivative() {
        let d = AttractorKind::Rossler.derivative(Vec3::new(1.0, 1.0, 1.0));
        assert!((d.x + 2.0).abs() < 1e-12);
        assert!((d.y - 1.2).abs() < 1e-12);
        assert!((d.z + 4.5).abs() < 1e-12);
    }

    #[test]
    fn chua_diode_is_piecewise_linear() {
        assert!(chua_diode(0.0).abs() < 1e-12);
        // Outer slope past |x| = 1: 0.429 - 2.286.
        assert!((chua_diode(2.0) + 1.857).abs() < 1e-12);
        assert!((chua_diode(-2.0) - 1.857).abs() < 1e-12);
    }

    #[test]
    fn deterministic() {
        assert_eq!(attractor(AttractorKind::Chua), attractor(AttractorKind::Chua));
    }
}
