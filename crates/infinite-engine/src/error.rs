//! Error types for the terminal front-end.
//!
//! [`EngineError`] wraps every failure that can stop the binary before or
//! during a session.

/// Top-level error for the terminal front-end.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: infinite_core::ConfigError,
    },

    /// The session could not be opened.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: infinite_core::SessionError,
    },
}
