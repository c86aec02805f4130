//! Time-driven poses for each visualization.
//!
//! Shapes are generated once; afterwards only their pose changes. A pose is
//! a pure function of elapsed seconds, so every frame is reproducible.

use serde::{Deserialize, Serialize};

use crate::Shape;
use crate::vector::Vec3;

/// Orientation, opacity, and uniform scale of a shape at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Material opacity in `[0, 1]`.
    pub opacity: f64,
    /// Uniform scale factor.
    pub scale: f64,
}

impl Pose {
    const fn rest(opacity: f64) -> Self {
        Self {
            rotation: Vec3::ZERO,
            opacity,
            scale: 1.0,
        }
    }

    const fn rotated(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }
}

/// The pose of `shape` after `t` seconds.
pub fn pose(shape: Shape, t: f64) -> Pose {
    match shape {
        Shape::Lorenz | Shape::Rossler | Shape::Chua => Pose {
            rotation: Vec3::new((0.05 * t).sin() * 0.2, 0.1 * t, 0.0),
            opacity: (2.0 * t).sin().mul_add(0.2, 0.3),
            scale: 1.0,
        },
        Shape::Mobius => Pose::rest(1.0).rotated(0.2 * t, 0.3 * t, 0.0),
        Shape::Klein => Pose::rest(0.8).rotated((0.3 * t).sin() * 0.2, 0.2 * t, 0.0),
        Shape::Hopf => Pose::rest(0.6).rotated((0.2 * t).sin() * 0.1, 0.1 * t, 0.0),
        Shape::Tree => Pose {
            rotation: Vec3::new((0.3 * t).cos() * 0.03, 0.0, (0.5 * t).sin() * 0.05),
            opacity: 0.8,
            scale: (2.0 * t).sin().mul_add(0.02, 1.0),
        },
        Shape::Metatron => Pose::rest(0.3).rotated(0.0, 0.1 * t, (0.3 * t).sin() * 0.2),
        Shape::Flower => Pose {
            rotation: Vec3::new(0.0, 0.1 * t, -0.05 * t),
            opacity: 0.4,
            scale: (0.5 * t).sin().mul_add(0.1, 1.0),
        },
        Shape::Merkabah => Pose {
            rotation: Vec3::new(0.3 * t, 0.6 * t, 0.0),
            opacity: 0.6,
            scale: 0.5,
        },
        Shape::Penrose => Pose::rest(0.9).rotated(0.5 * t, 0.3 * t, 0.0),
        Shape::Cantor => Pose::rest(0.6).rotated(0.0, 0.1 * t, 0.0),
        Shape::Infinity => Pose::rest(1.0).rotated(
            (0.3 * t).sin() * 0.2,
            0.5 * t,
            (0.4 * t).cos() * 0.1,
        ),
    }
}
