//! Cantor dust: the endpoints of a middle-thirds Cantor set, each smeared
//! into a cloud of random points in the Y/Z plane.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::vector::Vec3;

/// Default recursion level.
pub const DEFAULT_LEVEL: u32 = 5;

/// Interval the set is built on.
pub const RANGE: (f64, f64) = (-5.0, 5.0);

/// Points scattered around each endpoint.
pub const POINTS_PER_ENDPOINT: usize = 100;

/// Width of the Y/Z scatter around each endpoint.
pub const SCATTER: f64 = 10.0;

/// Endpoints of the intervals left after `level` rounds of removing the
/// open middle third of `[start, end]`, in order.
pub fn cantor_endpoints(start: f64, end: f64, level: u32) -> Vec<f64> {
    let mut out = Vec::new();
    collect(start, end, level, &mut out);
    out
}

fn collect(start: f64, end: f64, level: u32, out: &mut Vec<f64>) {
    if level == 0 {
        out.push(start);
        out.push(end);
        return;
    }
    let third = (end - start) / 3.0;
    let next = level.saturating_sub(1);
    collect(start, start + third, next, out);
    collect(end - third, end, next, out);
}

/// The dust cloud: for every endpoint at `level`, [`POINTS_PER_ENDPOINT`]
/// points sharing its X with Y and Z drawn uniformly from
/// `[-SCATTER/2, SCATTER/2)`.
pub fn cantor_dust(level: u32, seed: u64) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    cantor_endpoints(RANGE.0, RANGE.1, level)
        .into_iter()
        .flat_map(|x| {
            (0..POINTS_PER_ENDPOINT)
                .map(|_| {
                    let y = (rng.random::<f64>() - 0.5) * SCATTER;
                    let z = (rng.random::<f64>() - 0.5) * SCATTER;
                    Vec3::new(x, y, z)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_removes_the_middle_third() {
        let ends = cantor_endpoints(0.0, 3.0, 1);
        assert_eq!(ends.len(), 4);
        let expected = [0.0, 1.0, 2.0, 3.0];
        assert!(ends.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-12));
    }

    #[test]
    fn default_dust_size() {
        let dust = cantor_dust(DEFAULT_LEVEL, 9);
        // 2^5 intervals, two endpoints each, 100 points per endpoint.
        assert_eq!(dust.len(), 64 * 100);
        assert!(dust.iter().all(|p| p.y.abs() <= SCATTER / 2.0 && p.z.abs() <= SCATTER / 2.0));
    }

    #[test]
    fn seeded_dust_is_reproducible() {
        assert_eq!(cantor_dust(3, 11), cantor_dust(3, 11));
        assert_ne!(cantor_dust(3, 11), cantor_dust(3, 12));
    }
}
