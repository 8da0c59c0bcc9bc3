//! Filesystem home of uploads and finished stickers.
//!
//! Layout:
//!
//! ```text
//! <upload_dir>/<id>/source.<ext>   staged upload, owned by a `Staging` guard
//! <output_dir>/<id>.webp           finished sticker, removed on cleanup
//! ```
//!
//! Nothing else in the crate touches these directories.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use stickerforge_common::paths::{DOWNLOAD_NAME, OUTPUT_EXTENSION, OUTPUT_MEDIA_TYPE};
use stickerforge_common::{ArtifactId, Error, Result};
use tokio::fs;

const ENTITY: &str = "File";
const INPUT_STEM: &str = "source";

/// Parse an identifier taken from a URL segment.
///
/// Anything that is not a UUID cannot name a stored artifact, so it is
/// reported as not found rather than as a bad request.
pub fn parse_id(raw: &str) -> Result<ArtifactId> {
    ArtifactId::from_str(raw).map_err(|_| Error::not_found(ENTITY, raw))
}

/// An opened sticker ready to be streamed to a client.
#[derive(Debug)]
pub struct StoredArtifact {
    pub file: fs::File,
    pub size_bytes: u64,
    pub media_type: &'static str,
    pub download_name: &'static str,
}

/// What a retention sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub outputs_removed: usize,
    pub uploads_removed: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.outputs_removed + self.uploads_removed
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating both directories if needed.
    pub fn open(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&upload_dir)?;
        std::fs::create_dir_all(&output_dir)?;
        tracing::debug!(?upload_dir, ?output_dir, "Artifact store ready");
        Ok(Self {
            upload_dir,
            output_dir,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn allocate(&self) -> ArtifactId {
        ArtifactId::new()
    }

    pub fn input_path(&self, id: ArtifactId, extension: &str) -> PathBuf {
        self.upload_dir
            .join(id.to_string())
            .join(format!("{INPUT_STEM}.{extension}"))
    }

    pub fn output_path(&self, id: ArtifactId) -> PathBuf {
        self.output_dir.join(format!("{id}.{OUTPUT_EXTENSION}"))
    }

    /// Stage upload bytes for `id`, replacing anything already there.
    ///
    /// The returned [`Staging`] owns the staged upload and the output path;
    /// dropping it cleans both up, so an early return, a panic or a
    /// cancelled request cannot leave them behind.
    pub async fn write_input(&self, id: ArtifactId, data: &[u8], extension: &str) -> Result<Staging> {
        let staging = Staging {
            id,
            dir: self.upload_dir.join(id.to_string()),
            input: self.input_path(id, extension),
            output: self.output_path(id),
            keep_output: false,
        };
        fs::create_dir_all(&staging.dir).await?;
        fs::write(&staging.input, data).await?;
        tracing::debug!(%id, bytes = data.len(), path = ?staging.input, "Staged upload");
        Ok(staging)
    }

    /// Size of the finished sticker.
    pub async fn size_of(&self, id: ArtifactId) -> Result<u64> {
        match fs::metadata(self.output_path(id)).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(Error::not_found(ENTITY, id)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(ENTITY, id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_output(&self, id: ArtifactId) -> Result<()> {
        match fs::remove_file(self.output_path(id)).await {
            Ok(()) => {
                tracing::info!(%id, "Deleted sticker");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(ENTITY, id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Open the finished sticker for streaming.
    pub async fn read_output(&self, id: ArtifactId) -> Result<StoredArtifact> {
        let size_bytes = self.size_of(id).await?;
        let file = match fs::File::open(self.output_path(id)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(ENTITY, id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(StoredArtifact {
            file,
            size_bytes,
            media_type: OUTPUT_MEDIA_TYPE,
            download_name: DOWNLOAD_NAME,
        })
    }

    /// Remove stickers and leftover uploads last modified more than
    /// `max_age` ago. Entries not named by an artifact id are left alone.
    pub async fn sweep_expired(&self, max_age: Duration) -> Result<SweepReport> {
        let now = SystemTime::now();
        let mut report = SweepReport::default();

        let mut outputs = fs::read_dir(&self.output_dir).await?;
        while let Some(entry) = outputs.next_entry().await? {
            let path = entry.path();
            let is_sticker = path.extension().and_then(|e| e.to_str()) == Some(OUTPUT_EXTENSION)
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| ArtifactId::from_str(s).is_ok());
            if !is_sticker || !expired(&entry, now, max_age).await {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => report.outputs_removed += 1,
                Err(e) => tracing::warn!(?path, error = %e, "Failed to sweep sticker"),
            }
        }

        let mut uploads = fs::read_dir(&self.upload_dir).await?;
        while let Some(entry) = uploads.next_entry().await? {
            let path = entry.path();
            let is_staging = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false)
                && path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| ArtifactId::from_str(s).is_ok());
            if !is_staging || !expired(&entry, now, max_age).await {
                continue;
            }
            match fs::remove_dir_all(&path).await {
                Ok(()) => report.uploads_removed += 1,
                Err(e) => tracing::warn!(?path, error = %e, "Failed to sweep staged upload"),
            }
        }

        Ok(report)
    }
}

/// Files belonging to one in-flight conversion.
///
/// Dropping it removes the staged upload directory, and the output as well
/// unless [`Staging::keep_output`] was called.
#[derive(Debug)]
pub struct Staging {
    id: ArtifactId,
    dir: PathBuf,
    input: PathBuf,
    output: PathBuf,
    keep_output: bool,
}

impl Staging {
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Remove the staged upload now. Never fails; a missing directory is
    /// fine and other errors are only logged.
    pub fn remove_input(&self) {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::debug!(id = %self.id, "Removed staged upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(id = %self.id, error = %e, "Failed to remove staged upload"),
        }
    }

    /// Hand the output over to the store; it now lives until cleanup.
    pub fn keep_output(mut self) {
        self.keep_output = true;
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        self.remove_input();
        if self.keep_output {
            return;
        }
        match std::fs::remove_file(&self.output) {
            Ok(()) => tracing::debug!(id = %self.id, "Discarded unfinished output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(id = %self.id, error = %e, "Failed to discard unfinished output"),
        }
    }
}

async fn expired(entry: &fs::DirEntry, now: SystemTime, max_age: Duration) -> bool {
    let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
        return false;
    };
    now.duration_since(modified).map(|age| age >= max_age).unwrap_or(false)
}
