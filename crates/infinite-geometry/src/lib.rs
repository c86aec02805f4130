//! Decorative parametric geometry for Infinite Resume.
//!
//! Every visualization in the journey is a closed-form shape evaluated once
//! and then animated by time alone. This crate computes the shapes as plain
//! vertex data (points, segments, indexed meshes) and the per-frame poses.
//! Nothing here touches journey state.
//!
//! Generators are deterministic: fixed parameters (and a fixed seed for the
//! two generators that use randomness) always produce identical output.
//!
//! # Modules
//!
//! - [`vector`] -- [`Vec3`] and the buffer types generators return
//! - [`color`] -- HSL to RGB conversion
//! - [`attractor`] -- Lorenz, Rossler, and Chua trails
//! - [`surface`] -- Mobius strip, Klein bottle, torus knot
//! - [`hopf`] -- Hopf fibration fibers
//! - [`tree`] -- Seeded recursive fractal tree
//! - [`sacred`] -- Metatron's cube, Flower of Life, Merkabah, Penrose triangle
//! - [`cantor`] -- Cantor dust
//! - [`animation`] -- Time-driven poses

pub mod animation;
pub mod attractor;
pub mod cantor;
pub mod color;
pub mod hopf;
pub mod sacred;
pub mod surface;
pub mod tree;
pub mod vector;

pub use animation::{Pose, pose};
pub use attractor::{AttractorKind, attractor};
pub use color::{Rgb, hsl_to_rgb};
pub use hopf::{Fiber, hopf_fibration};
pub use sacred::{PenroseOutline, penrose_triangle};
pub use surface::{TorusKnot, klein_bottle, mobius_strip, torus_knot};
pub use tree::{Branch, FractalTree, fractal_tree};
pub use vector::{Mesh, Polyline, Segment, Vec3};

use serde::{Deserialize, Serialize};

/// Errors raised when selecting a shape by name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The name does not match any shape.
    #[error("unknown shape: {0}")]
    UnknownShape(String),
}

/// Every visualization the journey draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Lorenz attractor trail.
    Lorenz,
    /// Rossler attractor trail.
    Rossler,
    /// Chua attractor trail.
    Chua,
    /// Mobius strip mesh.
    Mobius,
    /// Klein bottle mesh.
    Klein,
    /// Hopf fibration fibers.
    Hopf,
    /// Fractal tree.
    Tree,
    /// Metatron's cube.
    Metatron,
    /// Flower of Life.
    Flower,
    /// Merkabah star tetrahedron.
    Merkabah,
    /// Penrose triangle outline.
    Penrose,
    /// Cantor dust.
    Cantor,
    /// The gateway's (2, 3) torus knot.
    Infinity,
}

impl Shape {
    /// All shapes.
    pub const ALL: [Self; 13] = [
        Self::Lorenz,
        Self::Rossler,
        Self::Chua,
        Self::Mobius,
        Self::Klein,
        Self::Hopf,
        Self::Tree,
        Self::Metatron,
        Self::Flower,
        Self::Merkabah,
        Self::Penrose,
        Self::Cantor,
        Self::Infinity,
    ];

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lorenz => "lorenz",
            Self::Rossler => "rossler",
            Self::Chua => "chua",
            Self::Mobius => "mobius",
            Self::Klein => "klein",
            Self::Hopf => "hopf",
            Self::Tree => "tree",
            Self::Metatron => "metatron",
            Self::Flower => "flower",
            Self::Merkabah => "merkabah",
            Self::Penrose => "penrose",
            Self::Cantor => "cantor",
            Self::Infinity => "infinity",
        }
    }
}

impl core::str::FromStr for Shape {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| GeometryError::UnknownShape(s.to_owned()))
    }
}

impl core::fmt::Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated vertex data, tagged by layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    /// A connected line.
    Line(Polyline),
    /// An indexed triangle mesh.
    Mesh(Mesh),
    /// Unconnected line segments.
    Segments {
        /// The segments.
        segments: Vec<Segment>,
    },
    /// A point cloud or triangle soup.
    Points {
        /// The points.
        points: Vec<Vec3>,
    },
    /// Hopf fibers.
    Fibers {
        /// The fibers.
        fibers: Vec<Fiber>,
    },
    /// A fractal tree.
    Tree(FractalTree),
    /// A Penrose outline.
    Outline(PenroseOutline),
}

impl Geometry {
    /// Number of vertices carried.
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Line(line) => line.points.len(),
            Self::Mesh(mesh) => mesh.positions.len(),
            Self::Segments { segments } => segments.len().saturating_mul(2),
            Self::Points { points } => points.len(),
            Self::Fibers { fibers } => fibers.iter().map(|f| f.points.len()).sum(),
            Self::Tree(tree) => tree.branches.len().saturating_mul(2),
            Self::Outline(_) => 6,
        }
    }
}

/// Generate `shape` with default parameters. `seed` drives the shapes that
/// use randomness.
pub fn generate(shape: Shape, seed: u64) -> Geometry {
    match shape {
        Shape::Lorenz => Geometry::Line(attractor(AttractorKind::Lorenz)),
        Shape::Rossler => Geometry::Line(attractor(AttractorKind::Rossler)),
        Shape::Chua => Geometry::Line(attractor(AttractorKind::Chua)),
        Shape::Mobius => Geometry::Mesh(mobius_strip(
            surface::MOBIUS_SEGMENTS,
            surface::MOBIUS_WIDTH,
        )),
        Shape::Klein => Geometry::Mesh(klein_bottle(
            surface::KLEIN_U_SEGMENTS,
            surface::KLEIN_V_SEGMENTS,
        )),
        Shape::Hopf => Geometry::Fibers {
            fibers: hopf_fibration(hopf::FIBERS, hopf::POINTS_PER_FIBER),
        },
        Shape::Tree => Geometry::Tree(fractal_tree(tree::DEFAULT_DEPTH, seed)),
        Shape::Metatron => Geometry::Segments {
            segments: sacred::metatron_cube(),
        },
        Shape::Flower => Geometry::Segments {
            segments: sacred::flower_of_life(),
        },
        Shape::Merkabah => Geometry::Points {
            points: sacred::merkabah(),
        },
        Shape::Penrose => Geometry::Outline(penrose_triangle(sacred::PENROSE_SIZE)),
        Shape::Cantor => Geometry::Points {
            points: cantor::cantor_dust(cantor::DEFAULT_LEVEL, seed),
        },
        Shape::Infinity => Geometry::Line(torus_knot(TorusKnot::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_names_round_trip() {
        for shape in Shape::ALL {
            assert_eq!(shape.as_str().parse::<Shape>(), Ok(shape));
        }
        assert!(matches!("dodecahedron".parse::<Shape>(), Err(GeometryError::UnknownShape(_))));
    }

    #[test]
    fn every_shape_generates_vertices() {
        for shape in Shape::ALL {
            assert!(generate(shape, 1).vertex_count() > 0, "{shape} is empty");
        }
    }

    #[test]
    fn geometry_json_is_tagged() {
        let json = serde_json::to_value(generate(Shape::Metatron, 0)).unwrap_or_default();
        assert_eq!(json["kind"], "segments");
        assert_eq!(json["segments"].as_array().map(Vec::len), Some(78));
    }
}
