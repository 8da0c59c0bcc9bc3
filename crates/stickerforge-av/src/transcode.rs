//! The transcoder seam: pipeline description in, path in, path out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use stickerforge_common::{Error, Result};

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::pipeline::PipelineDescription;

/// Something that can turn an input file into a sticker following a
/// [`PipelineDescription`].
///
/// Implementations make exactly one attempt. On `Ok(())` the output file must
/// exist; on error the output may or may not exist and must not be trusted.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run the conversion to completion.
    ///
    /// # Errors
    ///
    /// - [`Error::TranscodeFailed`] when the transcoder ran and reported
    ///   failure; the diagnostic carries its error output.
    /// - [`Error::Invocation`] when it could not be run at all.
    async fn transcode(
        &self,
        pipeline: &PipelineDescription,
        input: &Path,
        output: &Path,
    ) -> Result<()>;
}

/// [`Transcoder`] backed by the ffmpeg command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    /// Use the given ffmpeg executable with the default timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the wall-clock limit for one conversion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the command that would run `pipeline`, without running it.
    pub fn command(&self, pipeline: &PipelineDescription, input: &Path, output: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.arg("-hide_banner")
            .args(pipeline.to_ffmpeg_args(input, output))
            .timeout(self.timeout);
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        pipeline: &PipelineDescription,
        input: &Path,
        output: &Path,
    ) -> Result<()> {
        let cmd = self.command(pipeline, input, output);
        tracing::debug!(argv = ?cmd.argv(), "Running transcoder");

        let out = cmd.execute().await?;

        if !out.success() {
            let diagnostic = out.stderr.trim();
            tracing::warn!(status = %out.status, "Transcoder exited with failure");
            return Err(Error::transcode_failed(if diagnostic.is_empty() {
                format!("{} exited with {}", self.name(), out.status)
            } else {
                diagnostic.to_string()
            }));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(Error::transcode_failed(format!(
                "{} reported success but produced no output",
                self.name()
            )));
        }

        Ok(())
    }
}
