//! Error types for the `delve` binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode between argument parsing and printing the session summary.

/// Top-level error for the `delve` binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: delve_core::ConfigError,
    },

    /// A game of the session could not be played.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: delve_core::RunnerError,
    },

    /// The session summary could not be rendered.
    #[error("output error: {source}")]
    Output {
        /// The underlying serializer error.
        #[from]
        source: serde_json::Error,
    },

    /// The logging filter could not be built.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the filter failure.
        message: String,
    },
}
