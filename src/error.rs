//! Error types for configuration resolution and prompt rendering.
//!
//! Every variant is fatal for the invocation that raised it. Nothing in
//! this crate retries.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, resolving, rendering or validating.
#[derive(Debug, Error)]
pub enum Error {
    /// A settings, persona or template source is malformed or structurally invalid.
    #[error("Configuration error in {source_id}: {message}")]
    Configuration { source_id: String, message: String },

    /// A role rendered to an empty string.
    #[error("Validation error: rendered '{role}' prompt is empty")]
    Validation { role: String },

    /// An override or persona names something the library does not contain.
    #[error("Missing {kind} '{name}'")]
    MissingReference { kind: ReferenceKind, name: String },

    /// The model response could not be parsed in the requested format.
    #[error("Failed to parse response as {format}: {message}")]
    Parse { format: String, message: String },

    /// The external model call failed.
    #[error("Generation failed: {source}")]
    Generation {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What kind of name a `MissingReference` failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Api,
    Model,
    Persona,
    Agent,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReferenceKind::Api => "api",
            ReferenceKind::Model => "model",
            ReferenceKind::Persona => "persona",
            ReferenceKind::Agent => "agent",
        };
        write!(f, "{}", s)
    }
}

impl Error {
    pub fn configuration(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    pub fn missing(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Error::MissingReference {
            kind,
            name: name.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
