//! Error types shared across the rendering and storage pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while merging rendered PDF buffers into one document.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to load PDF buffer #{index}: {source}")]
    Load {
        index: usize,
        #[source]
        source: lopdf::Error,
    },

    #[error("failed to serialize merged PDF: {0}")]
    Serialize(String),
}

/// Failure anywhere in a document job. Every variant aborts the job.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to read source file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rendering engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("failed to write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to close browser: {0}")]
    Close(String),
}

impl From<chromiumoxide::error::CdpError> for RenderError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        RenderError::Engine(e.to_string())
    }
}

/// Failure talking to the storage provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BucketError {
    #[error("request throttled by provider: {0}")]
    Throttled(String),

    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("provider rejected request: {0}")]
    Service(String),
}

impl BucketError {
    /// Throttling and transient failures are retried under the client's retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BucketError::Throttled(_) | BucketError::Transient(_))
    }
}
