//! After the artifact is written: upload it, decide its fate, report status.
//!
//! Upload and notification failures never abort the run. They show up as
//! `false` outcomes and as log lines; a partially uploaded artifact is moved
//! to the archive directory instead of being deleted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::notify::Notifier;
use crate::report::format_status_message;
use crate::storage::{ObjectStore, StorageError, UploadOutcome};

/// A named storage target. `store` is an error when its profile could not be built.
pub struct UploadTarget {
    pub name: String,
    pub store: Result<Box<dyn ObjectStore>, StorageError>,
}

/// What happened to the local artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Every upload succeeded; the local copy was deleted.
    Removed,
    /// At least one upload failed; the file now lives in the archive.
    Archived(PathBuf),
    /// No upload was attempted, or moving/deleting failed; the file is untouched.
    Retained,
}

#[derive(Debug)]
pub struct PublishReport {
    pub uploads: Vec<UploadOutcome>,
    pub disposition: Disposition,
}

impl PublishReport {
    pub fn all_uploaded(&self) -> bool {
        !self.uploads.is_empty() && self.uploads.iter().all(|u| u.success)
    }
}

pub fn upload_all(artifact: &Path, targets: &[UploadTarget]) -> Vec<UploadOutcome> {
    targets
        .iter()
        .map(|target| {
            let success = match &target.store {
                Ok(store) => match store.upload(artifact) {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(target_name = %target.name, error = %err, "Upload failed");
                        false
                    }
                },
                Err(err) => {
                    tracing::warn!(target_name = %target.name, error = %err, "Storage target is not usable");
                    false
                }
            };
            UploadOutcome {
                target: target.name.clone(),
                success,
            }
        })
        .collect()
}

/// Delete the artifact when every upload succeeded, archive it otherwise.
pub fn dispose(artifact: &Path, uploads: &[UploadOutcome], archive_dir: &Path) -> Disposition {
    if uploads.is_empty() {
        return Disposition::Retained;
    }

    if uploads.iter().all(|u| u.success) {
        return match fs::remove_file(artifact) {
            Ok(()) => Disposition::Removed,
            Err(e) => {
                tracing::warn!(path = %artifact.display(), error = %e, "Failed to delete uploaded artifact");
                Disposition::Retained
            }
        };
    }

    match archive(artifact, archive_dir) {
        Ok(dest) => {
            tracing::info!(path = %dest.display(), "Artifact archived after incomplete upload");
            Disposition::Archived(dest)
        }
        Err(e) => {
            tracing::error!(path = %artifact.display(), error = %e, "Failed to archive artifact; leaving it in place");
            Disposition::Retained
        }
    }
}

fn archive(artifact: &Path, archive_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(archive_dir)?;
    let name = artifact.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "artifact path has no file name")
    })?;
    let dest = archive_dir.join(name);

    // `rename` cannot cross filesystems; fall back to copy + delete.
    if fs::rename(artifact, &dest).is_err() {
        fs::copy(artifact, &dest)?;
        fs::remove_file(artifact)?;
    }
    Ok(dest)
}

pub fn publish(artifact: &Path, targets: &[UploadTarget], archive_dir: &Path) -> PublishReport {
    let uploads = upload_all(artifact, targets);
    let disposition = dispose(artifact, &uploads, archive_dir);
    PublishReport {
        uploads,
        disposition,
    }
}

/// Send the status message; returns whether it was delivered.
pub fn send_status(notifier: &dyn Notifier, quotes: usize, uploads: &[UploadOutcome]) -> bool {
    let text = format_status_message(quotes, uploads);
    match notifier.notify(&text) {
        Ok(()) => {
            tracing::info!("Status notification sent");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Status notification failed");
            false
        }
    }
}
