//! Bubble sort, one swap per step.

use serde::{Deserialize, Serialize};

/// The array the demonstration starts from.
pub const INITIAL_VALUES: [i32; 8] = [8, 3, 5, 4, 7, 6, 1, 2];

/// The result of one sort step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SortStep {
    /// The pair at `left` and `left + 1` was out of order and swapped.
    Swapped {
        /// Index of the left element of the swapped pair.
        left: usize,
    },
    /// No adjacent pair is out of order.
    Sorted,
}

/// A bubble sort that performs the first out-of-order adjacent swap, scanning
/// left to right, on each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleSort {
    values: Vec<i32>,
    active: Option<usize>,
    swaps: u32,
    sorted: bool,
}

impl Default for BubbleSort {
    fn default() -> Self {
        Self::new(INITIAL_VALUES.to_vec())
    }
}

impl BubbleSort {
    /// Start sorting `values`.
    pub const fn new(values: Vec<i32>) -> Self {
        Self {
            values,
            active: None,
            swaps: 0,
            sorted: false,
        }
    }

    /// Perform one swap, or report that the array is sorted.
    pub fn step(&mut self) -> SortStep {
        if self.sorted {
            return SortStep::Sorted;
        }
        let inversion = self
            .values
            .windows(2)
            .position(|pair| matches!(pair, [a, b] if a > b));

        if let Some(left) = inversion {
            self.values.swap(left, left.saturating_add(1));
            self.active = Some(left);
            self.swaps = self.swaps.saturating_add(1);
            SortStep::Swapped { left }
        } else {
            self.active = None;
            self.sorted = true;
            SortStep::Sorted
        }
    }

    /// The array in its current order.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Index of the left element of the pair swapped by the last step.
    pub const fn active(&self) -> Option<usize> {
        self.active
    }

    /// Swaps performed so far.
    pub const fn swaps(&self) -> u32 {
        self.swaps
    }

    /// Whether a step has found no inversion.
    pub const fn is_sorted(&self) -> bool {
        self.sorted
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn first_step_swaps_leading_pair() {
        let mut sort = BubbleSort::default();
        assert_eq!(sort.step(), SortStep::Swapped { left: 0 });
        assert_eq!(sort.values(), &[3, 8, 5, 4, 7, 6, 1, 2]);
        assert_eq!(sort.active(), Some(0));
    }

    #[test]
    fn ends_sorted_after_one_swap_per_inversion() {
        let mut sort = BubbleSort::default();
        let mut steps = 0;
        while sort.step() != SortStep::Sorted {
            steps += 1;
            assert!(steps < 100);
        }
        assert_eq!(sort.values(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        // Each adjacent swap removes exactly one inversion.
        assert_eq!(sort.swaps(), 19);
        assert!(sort.is_sorted());
        assert_eq!(sort.active(), None);
    }

    #[test]
    fn sorted_is_sticky() {
        let mut sort = BubbleSort::new(vec![1, 2]);
        assert_eq!(sort.step(), SortStep::Sorted);
        assert_eq!(sort.step(), SortStep::Sorted);
        assert_eq!(sort.swaps(), 0);
    }
}
