//! The synchronous conversion flow.
//!
//! One call to [`ConversionService::convert`] walks an upload through
//! validation, pipeline construction, transcoding and size evaluation. The
//! staged upload is removed before the call returns, whatever the outcome,
//! and so is any output a failed transcode left behind. A finished sticker
//! stays in the store until [`ConversionService::cleanup`].

use std::fmt;
use std::sync::Arc;

use stickerforge_av::{build_pipeline, PipelineDescription, StickerProfile, Transcoder};
use stickerforge_common::{ArtifactId, ConversionOutcome, Error, Result};

use crate::config::ConversionConfig;
use crate::params::{validate_upload, ConversionLimits, RawParams, UploadedFile, ValidatedUpload};
use crate::store::{ArtifactStore, StoredArtifact};

/// Where a conversion currently is. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Validating,
    Building,
    Transcoding,
    Evaluating,
    Done,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Transcoding => "transcoding",
            Self::Evaluating => "evaluating",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Validate an upload and build its pipeline without touching the disk.
pub fn plan(
    file: Option<&UploadedFile>,
    raw: &RawParams,
    limits: &ConversionLimits,
    profile: &StickerProfile,
) -> Result<(ValidatedUpload, PipelineDescription)> {
    let upload = validate_upload(file, raw, limits)?;
    let pipeline = build_pipeline(&upload.request, profile);
    Ok((upload, pipeline))
}

pub struct ConversionService {
    transcoder: Arc<dyn Transcoder>,
    store: ArtifactStore,
    limits: ConversionLimits,
    profile: StickerProfile,
    size_warning_bytes: u64,
}

impl ConversionService {
    pub fn new(transcoder: Arc<dyn Transcoder>, store: ArtifactStore, config: &ConversionConfig) -> Self {
        Self {
            transcoder,
            store,
            limits: ConversionLimits::from(config),
            profile: config.profile.clone(),
            size_warning_bytes: config.size_warning_bytes,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn transcoder_name(&self) -> &str {
        self.transcoder.name()
    }

    /// Convert one upload into a stored sticker.
    pub async fn convert(&self, file: Option<UploadedFile>, raw: RawParams) -> Result<ConversionOutcome> {
        tracing::debug!(stage = %ConversionStage::Validating, "Conversion started");
        let (upload, pipeline) = match plan(file.as_ref(), &raw, &self.limits, &self.profile) {
            Ok(planned) => planned,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected upload");
                return Err(e);
            }
        };
        // Validation succeeded, so the file part exists.
        let data = file.map(|f| f.data).unwrap_or_default();

        let id = self.store.allocate();
        tracing::debug!(
            %id,
            stage = %ConversionStage::Building,
            filename = %upload.filename,
            request = ?upload.request,
            filters = %pipeline.filter_chain(),
            "Pipeline built"
        );

        let staging = match self.store.write_input(id, &data, &upload.extension).await {
            Ok(staging) => staging,
            Err(e) => {
                tracing::error!(%id, error = %e, "Failed to stage upload");
                return Err(e);
            }
        };

        tracing::debug!(
            %id,
            stage = %ConversionStage::Transcoding,
            transcoder = self.transcoder.name(),
            "Running transcoder"
        );
        let transcoded = self
            .transcoder
            .transcode(&pipeline, staging.input(), staging.output())
            .await;
        staging.remove_input();
        if let Err(e) = transcoded {
            tracing::error!(%id, error = %e, "Transcoding failed");
            return Err(e);
        }

        tracing::debug!(%id, stage = %ConversionStage::Evaluating, "Measuring output");
        let size_bytes = match self.store.size_of(id).await {
            Ok(size) => size,
            Err(Error::NotFound { .. }) => {
                tracing::error!(%id, "Transcoder reported success but left no output");
                return Err(Error::transcode_failed(format!(
                    "{} produced no output",
                    self.transcoder.name()
                )));
            }
            Err(e) => return Err(e),
        };
        staging.keep_output();
        let outcome = ConversionOutcome::evaluate(id, size_bytes, self.size_warning_bytes);

        if outcome.warning {
            tracing::warn!(
                %id,
                size_bytes,
                threshold = self.size_warning_bytes,
                "Sticker exceeds size limit"
            );
        }
        tracing::info!(
            %id,
            stage = %ConversionStage::Done,
            size_kb = outcome.size_kb,
            warning = outcome.warning,
            "Conversion finished"
        );

        Ok(outcome)
    }

    pub async fn download(&self, id: ArtifactId) -> Result<StoredArtifact> {
        self.store.read_output(id).await
    }

    pub async fn cleanup(&self, id: ArtifactId) -> Result<()> {
        self.store.delete_output(id).await
    }
}
