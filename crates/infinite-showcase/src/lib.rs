//! Stepped algorithm demonstrations for the Technical layer.
//!
//! Each demonstration advances one step per timer tick and exposes its
//! intermediate state for drawing.
//!
//! # Modules
//!
//! - [`sort`] -- Bubble sort, one swap per step
//! - [`pathfind`] -- Breadth-first grid search, one cell per step
//! - [`neural`] -- Feed-forward network with pulsing activations

pub mod neural;
pub mod pathfind;
pub mod sort;

pub use neural::NeuralPulse;
pub use pathfind::{Cell, GridPathfinder, PathStep};
pub use sort::{BubbleSort, SortStep};

use infinite_types::Algorithm;

/// A demonstration driven by a fixed-interval timer.
pub trait Demonstration {
    /// Which algorithm this visualizes.
    fn algorithm(&self) -> Algorithm;

    /// Advance one step. Returns `false` once there is nothing left to do;
    /// the caller may then stop the timer.
    fn advance(&mut self) -> bool;

    /// One-line description of the current state.
    fn summary(&self) -> String;
}

impl Demonstration for BubbleSort {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Sort
    }

    fn advance(&mut self) -> bool {
        matches!(self.step(), SortStep::Swapped { .. })
    }

    fn summary(&self) -> String {
        let state = if self.is_sorted() { "sorted" } else { "sorting" };
        format!("bubble sort {state}: {:?} ({} swaps)", self.values(), self.swaps())
    }
}

impl Demonstration for GridPathfinder {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Pathfind
    }

    fn advance(&mut self) -> bool {
        matches!(self.step(), PathStep::Visited { .. })
    }

    fn summary(&self) -> String {
        match self.path() {
            Some(path) => format!(
                "path found: {} cells after visiting {}",
                path.len(),
                self.visited().len()
            ),
            None if self.is_finished() => {
                format!("no path after visiting {} cells", self.visited().len())
            }
            None => format!("searching: {} cells visited", self.visited().len()),
        }
    }
}

impl Demonstration for NeuralPulse {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ml
    }

    fn advance(&mut self) -> bool {
        self.pulse();
        true
    }

    fn summary(&self) -> String {
        let output = self.layer_activations(3);
        format!(
            "forward pass {}: output activations {:.2?}",
            self.pulses(),
            output
        )
    }
}

/// Build the demonstration for `algorithm` in its initial state. `seed` drives
/// the neural pulse.
pub fn demonstration(algorithm: Algorithm, seed: u64) -> Box<dyn Demonstration + Send> {
    match algorithm {
        Algorithm::Sort => Box::new(BubbleSort::default()),
        Algorithm::Pathfind => Box::new(GridPathfinder::default()),
        Algorithm::Ml => Box::new(NeuralPulse::new(seed)),
    }
}
