//! Error types for the voxel world.
//!
//! Steady-state world operations never fail; malformed input degrades to a safe
//! default instead. These errors only surface at the edges: loading a
//! configuration, parsing a whole snapshot document, and spawning mesh workers.

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Failed to spawn mesh worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Mesh worker channel disconnected")]
    WorkerDisconnected,
}

/// Result alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
