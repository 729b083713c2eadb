//! Error types for the ranking engine and its data sources.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the view-state engine.
///
/// None of these indicate corrupted state: every failing operation leaves the
/// previous snapshot untouched.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A fetch finished after a newer one was started.
    #[error("stale fetch completion ignored (generation {generation}, latest {latest})")]
    StaleFetchIgnored { generation: u64, latest: u64 },

    /// The caller requires at least one record and the snapshot had none.
    #[error("No stream data available for {artist}")]
    EmptyInput { artist: String },

    /// An operation needed a loaded snapshot.
    #[error("no artist snapshot loaded")]
    NoSnapshot,
}

/// Errors raised by a data source while producing a snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no stream data for '{artist}' at {}", .path.display())]
    NotFound { artist: String, path: PathBuf },

    #[error("no collaborator data for '{music_id}' at {}", .path.display())]
    NoCollaborators { music_id: String, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}
