//! Error types for the admin binary.
//!
//! [`AdminError`] wraps every failure mode a command can hit so `main` can
//! propagate with `?`.

/// Top-level error for the admin binary.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// A persistence operation failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying persistence error.
        #[from]
        source: coursehub_db::DbError,
    },

    /// Rendering output failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
