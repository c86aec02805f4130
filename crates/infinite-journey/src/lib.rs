//! Journey state tracking for Infinite Resume.
//!
//! The tracker is the single source of truth for a visitor's progress
//! through the five layers. It counts what the visitor collected, decides
//! which layers are reachable, grants achievements, and persists the whole
//! state after every change so a returning visitor resumes where they left.
//!
//! # Architecture
//!
//! - [`reducer`] -- [`JourneyCommand`] and the [`reduce`] function: every
//!   mutation, its automatic achievements, and the progress formula.
//! - [`achievements`] -- The achievement catalog and grant thresholds.
//! - [`persistence`] -- The versioned [`Envelope`], its migration, and the
//!   [`SnapshotStore`] implementations.
//! - [`tracker`] -- [`JourneyTracker`], the owner that applies commands and
//!   writes through to storage.
//!
//! # Usage
//!
//! ```
//! use infinite_journey::{JourneyTracker, MemoryStore, TrackerSettings};
//! use infinite_types::Layer;
//!
//! let mut tracker = JourneyTracker::open(MemoryStore::new(), TrackerSettings::default());
//! tracker.unlock_layer(Layer::Narrative);
//! tracker.set_current_layer(Layer::Narrative);
//! for insight in ["a", "b", "c"] {
//!     tracker.add_philosophical_insight(insight);
//! }
//! assert!((tracker.progress() - 31.0).abs() < 1e-9);
//! ```

pub mod achievements;
pub mod persistence;
pub mod reducer;
pub mod tracker;

// Re-export primary types at crate root.
pub use persistence::{
    CURRENT_VERSION, Envelope, JsonFileStore, MemoryStore, STORAGE_KEY, SnapshotStore, migrate,
};
pub use reducer::{JourneyCommand, ReduceContext, Transition, compute_progress, reduce};
pub use tracker::{JourneyTracker, StateOrigin, TrackerSettings};

use std::path::PathBuf;

use infinite_types::Layer;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by tracker operations that have preconditions.
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    /// Navigation targeted a layer that has not been unlocked.
    #[error("layer {0} is locked")]
    LayerLocked(Layer),
}

/// Errors raised while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// A filesystem operation failed.
    #[error("snapshot I/O failed at {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by a newer layout.
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in storage.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },

    /// The storage key cannot be mapped to a location.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}
