//! Recursive fractal tree with seeded jitter.
//!
//! Every branch spawns a left and a right child at a fixed angular offset
//! with a little random jitter, and sometimes a shorter third child. The
//! random stream comes from a seeded generator so a given seed always grows
//! the same tree.

use core::f64::consts::{FRAC_PI_2, FRAC_PI_6};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, hsl_to_rgb};
use crate::vector::{Segment, Vec3, fraction};

/// Default recursion depth.
pub const DEFAULT_DEPTH: u32 = 7;

/// Angle between a branch and its side children.
pub const ANGLE_VARIATION: f64 = FRAC_PI_6;

/// Child length relative to the parent.
pub const LENGTH_FACTOR: f64 = 0.7;

/// Length of the trunk.
pub const INITIAL_LENGTH: f64 = 2.0;

/// Probability of a third, middle branch.
pub const THIRD_BRANCH_CHANCE: f64 = 0.3;

/// Length of a middle branch relative to the side children.
pub const THIRD_BRANCH_FACTOR: f64 = 0.8;

/// One branch of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// The branch as a line segment.
    pub segment: Segment,
    /// Recursion level, 0 for the trunk.
    pub level: u32,
    /// Colour by level: deeper branches shift hue and brighten.
    pub color: Rgb,
}

/// A generated tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalTree {
    /// All branches in generation order.
    pub branches: Vec<Branch>,
    /// End points of the branches at the deepest level.
    pub tips: Vec<Vec3>,
}

struct Grower {
    rng: StdRng,
    depth: u32,
    branches: Vec<Branch>,
}

impl Grower {
    /// Uniform jitter in `[-width/2, width/2)`.
    fn jitter(&mut self, width: f64) -> f64 {
        (self.rng.random::<f64>() - 0.5) * width
    }

    fn grow(&mut self, start: Vec3, angle: f64, length: f64, level: u32) {
        if level > self.depth {
            return;
        }

        let end = Vec3::new(
            angle.cos().mul_add(length, start.x),
            angle.sin().mul_add(length, start.y),
            start.z + self.jitter(0.2),
        );
        let ratio = fraction(level, self.depth);
        self.branches.push(Branch {
            segment: Segment::new(start, end),
            level,
            color: hsl_to_rgb(0.3f64.mul_add(-ratio, 0.3), 0.8, 0.3f64.mul_add(ratio, 0.5)),
        });

        let child_length = length * LENGTH_FACTOR;
        let left = angle + ANGLE_VARIATION + self.jitter(0.2);
        let right = angle - ANGLE_VARIATION + self.jitter(0.2);
        let next = level.saturating_add(1);
        self.grow(end, left, child_length, next);
        self.grow(end, right, child_length, next);

        if self.rng.random::<f64>() > 1.0 - THIRD_BRANCH_CHANCE {
            let middle = angle + self.jitter(0.3);
            self.grow(end, middle, child_length * THIRD_BRANCH_FACTOR, next);
        }
    }
}

/// Grow a tree of the given depth from a seed. The trunk starts at the
/// origin pointing straight up.
pub fn fractal_tree(depth: u32, seed: u64) -> FractalTree {
    let mut grower = Grower {
        rng: StdRng::seed_from_u64(seed),
        depth,
        branches: Vec::new(),
    };
    grower.grow(Vec3::ZERO, FRAC_PI_2, INITIAL_LENGTH, 0);

    let tips = grower
        .branches
        .iter()
        .filter(|b| b.level == depth)
        .map(|b| b.segment.end)
        .collect();

    FractalTree {
        branches: grower.branches,
        tips,
    }
}
