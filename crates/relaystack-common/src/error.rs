//! Unified error types for the relaystack workspace.
//!
//! Configuration problems are kept in their own enum so callers can tell a
//! missing credential apart from a bad declaration. Failures reported by a
//! provisioning engine are carried untouched in [`RelayError::Engine`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration, before anything is declared.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {path} (create one from .env.example)")]
    MissingSource {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A required key is absent or empty.
    #[error("missing required configuration key {0}")]
    MissingKey(&'static str),

    /// A key is present but its value cannot be used.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A declaration was rejected before reaching the engine.
    #[error("invalid declaration: {message}")]
    Declaration {
        /// Description of the invalid declaration.
        message: String,
    },

    /// A referenced resource is unknown to the engine.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The provisioning engine rejected a declaration. The engine's own
    /// diagnostic is displayed as-is.
    #[error(transparent)]
    Engine(Box<dyn std::error::Error + Send + Sync>),

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl RelayError {
    /// Shorthand for a [`RelayError::Declaration`].
    pub fn declaration(message: impl Into<String>) -> Self {
        Self::Declaration {
            message: message.into(),
        }
    }

    /// Wraps an engine failure without altering its message.
    pub fn engine(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Engine(source.into())
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_is_displayed_verbatim() {
        let err = RelayError::engine("LimitExceeded: The maximum number of VPCs has been reached.");
        assert_eq!(
            err.to_string(),
            "LimitExceeded: The maximum number of VPCs has been reached."
        );
    }

    #[test]
    fn missing_key_names_the_key() {
        let err: RelayError = ConfigError::MissingKey("LITELLM_KEY").into();
        assert_eq!(
            err.to_string(),
            "missing required configuration key LITELLM_KEY"
        );
        assert!(matches!(err, RelayError::Config(ConfigError::MissingKey(_))));
    }

    #[test]
    fn declaration_shorthand() {
        let err = RelayError::declaration("max_zones must be at least 1");
        assert_eq!(err.to_string(), "invalid declaration: max_zones must be at least 1");
    }
}
