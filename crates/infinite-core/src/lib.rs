//! Layer flows, navigation, timers, and configuration for Infinite Resume.
//!
//! This crate turns the journey tracker into an interactive session: it
//! mounts per-layer scenes, enforces which moves are allowed, runs each
//! layer's flow against the tracker, and drives the session from a command
//! channel alongside the animation and demo timers.
//!
//! # Modules
//!
//! - [`command`] -- [`Command`] and its line parser.
//! - [`config`] -- Configuration loading from `infinite-config.yaml` with
//!   environment overrides.
//! - [`navigation`] -- Locked-layer checks, arrow moves, and the dimension
//!   shift rule.
//! - [`runner`] -- [`run_session`], the async loop over commands and timers.
//! - [`scene`] -- Per-layer local state and the layer constants.
//! - [`session`] -- [`Session`], every layer operation in one place.
//!
//! [`Command`]: command::Command
//! [`run_session`]: runner::run_session
//! [`Session`]: session::Session

pub mod command;
pub mod config;
pub mod navigation;
pub mod runner;
pub mod scene;
pub mod session;

pub use command::{Command, CommandError};
pub use config::{ConfigError, Mode, ResumeConfig, TimerConfig};
pub use navigation::Direction;
pub use runner::{EndReason, NoOpCallback, RunSummary, SessionCallback, run_session};
pub use scene::{NarrativeMode, Scene};
pub use session::{Session, Status};

use infinite_journey::JourneyError;
use infinite_sandbox::EvolveError;
use infinite_types::{Demo, Layer};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The journey tracker refused the operation.
    #[error("{source}")]
    Journey {
        /// The underlying tracker error.
        #[from]
        source: JourneyError,
    },

    /// The operation belongs to another layer.
    #[error("'{action}' is only available in {required} (you are in {current})")]
    WrongLayer {
        /// The operation attempted.
        action: &'static str,
        /// The layer that offers it.
        required: Layer,
        /// The current layer.
        current: Layer,
    },

    /// The operation belongs to another Technical panel.
    #[error("'{action}' needs the {} panel (showing {})", .required.as_str(), .current.as_str())]
    WrongPanel {
        /// The operation attempted.
        action: &'static str,
        /// The panel that offers it.
        required: Demo,
        /// The panel on screen.
        current: Demo,
    },

    /// The current layer's flow is not finished yet.
    #[error("{0} is not complete yet")]
    Incomplete(Layer),

    /// There is no layer after this one.
    #[error("{0} is the last layer")]
    NoNextLayer(Layer),

    /// An arrow move ran past either end of the journey.
    #[error("cannot move {direction} from {layer}")]
    AtEdge {
        /// The attempted direction.
        direction: Direction,
        /// The current layer.
        layer: Layer,
    },

    /// The self-modifying code panel could not be built.
    #[error("code panel error: {source}")]
    CodePanel {
        /// The underlying evolution error.
        #[from]
        source: EvolveError,
    },

    /// A reply could not be encoded.
    #[error("encoding error: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
