//! Typed error hierarchy for the gate sequencer.
//!
//! One enum per subsystem:
//! - `StoryError`: story lookup, parsing and schema validation
//! - `SignalIoError`: checkpoint persistence failures
//! - `ConfigurationError`: run options that do not resolve to a gate range
//! - `ExecutorError`: failures that abort a gate instead of failing it

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating and validating a story document.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Story {path} failed schema validation: {}", violations.join("; "))]
    Validation {
        path: PathBuf,
        violations: Vec<String>,
    },

    #[error("No story document found for '{story_id}' under {root}")]
    NotFound { story_id: String, root: PathBuf },

    #[error("Story '{story_id}' matches {} documents: {}", candidates.len(), format_paths(candidates))]
    Ambiguous {
        story_id: String,
        candidates: Vec<PathBuf>,
    },

    #[error("Failed to parse story document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to read story document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from the signal store. Any of these aborts the current run.
#[derive(Debug, Error)]
pub enum SignalIoError {
    #[error("Failed to create signal directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write signal {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read signal {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed signal record {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Run options that cannot be turned into a gate range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Unknown gate '{name}' (expected gate0..gate{last})")]
    UnknownGate { name: String, last: usize },

    #[error("Start gate {start} comes after stop gate {stop}")]
    InvertedRange { start: String, stop: String },
}

/// Errors that abort gate execution rather than failing the gate.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Signal(#[from] SignalIoError),
}
