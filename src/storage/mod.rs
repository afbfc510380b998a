//! Object-storage targets for the output artifact.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod s3;
pub mod sigv4;

pub use s3::{S3Store, StorageProfile};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage profile `{profile}` is incomplete: {missing} is not set")]
    Config { profile: String, missing: String },

    #[error("invalid storage endpoint '{endpoint}': {reason}")]
    Endpoint { endpoint: String, reason: String },

    #[error("failed to read artifact '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("object store returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// A place the artifact can be uploaded to.
pub trait ObjectStore {
    /// Upload the file at `path`, keyed by its file name.
    fn upload(&self, path: &Path) -> Result<(), StorageError>;
}

/// Result of uploading the artifact to one named target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub target: String,
    pub success: bool,
}
