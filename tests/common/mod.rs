//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a [`ConversionService`] around a
//! [`FakeTranscoder`] and an artifact store in a temporary directory. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use stickerforge::config::Config;
use stickerforge::server::{build_service, create_router, AppContext};
use stickerforge::service::ConversionService;
use stickerforge_av::{PipelineDescription, Transcoder};
use stickerforge_common::{Error, Result};
use tempfile::TempDir;

/// What the fake does when asked to transcode.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Write these bytes to the output path.
    Write(Vec<u8>),
    /// Exit "non-zero" with this diagnostic.
    Fail(String),
    /// Leave a truncated output behind, then fail with this diagnostic.
    FailAfterPartialWrite(String),
    /// Claim success without writing anything.
    NoOutput,
    /// Panic inside the handler.
    Panic,
    /// Never finish, like an ffmpeg stuck on a bad stream.
    Hang,
}

/// One recorded transcode call.
#[derive(Debug, Clone)]
pub struct FakeCall {
    pub filter_chain: String,
    pub ffmpeg_args: Vec<String>,
    pub input_existed: bool,
}

/// In-process [`Transcoder`] that records calls instead of running ffmpeg.
pub struct FakeTranscoder {
    behavior: Mutex<FakeBehavior>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeTranscoder {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: FakeBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn transcode(&self, pipeline: &PipelineDescription, input: &Path, output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(FakeCall {
            filter_chain: pipeline.filter_chain(),
            ffmpeg_args: pipeline.to_ffmpeg_args(input, output),
            input_existed: input.exists(),
        });

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            FakeBehavior::Write(bytes) => {
                tokio::fs::write(output, bytes).await?;
                Ok(())
            }
            FakeBehavior::Fail(diagnostic) => Err(Error::transcode_failed(diagnostic)),
            FakeBehavior::FailAfterPartialWrite(diagnostic) => {
                tokio::fs::write(output, &FAKE_WEBP[..4]).await?;
                Err(Error::transcode_failed(diagnostic))
            }
            FakeBehavior::NoOutput => Ok(()),
            FakeBehavior::Panic => panic!("transcoder exploded"),
            FakeBehavior::Hang => std::future::pending().await,
        }
    }
}

/// A small stand-in for a WebP file.
pub const FAKE_WEBP: &[u8] = b"RIFF\x1a\x00\x00\x00WEBPVP8X fake sticker";

pub struct TestHarness {
    pub ctx: AppContext,
    pub transcoder: Arc<FakeTranscoder>,
    pub tmp: TempDir,
}

impl TestHarness {
    /// Default config, fake transcoder writing [`FAKE_WEBP`].
    pub fn new() -> Self {
        Self::with_behavior(FakeBehavior::Write(FAKE_WEBP.to_vec()))
    }

    pub fn with_behavior(behavior: FakeBehavior) -> Self {
        Self::with_config(Config::default(), behavior)
    }

    /// Storage directories in `config` are replaced with temporary ones.
    pub fn with_config(mut config: Config, behavior: FakeBehavior) -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.upload_dir = tmp.path().join("uploads");
        config.storage.output_dir = tmp.path().join("outputs");

        let transcoder = Arc::new(FakeTranscoder::new(behavior));
        let service: ConversionService =
            build_service(&config, transcoder.clone()).expect("failed to build service");
        let ctx = AppContext::new(config, service);

        Self {
            ctx,
            transcoder,
            tmp,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    pub fn upload_dir(&self) -> &Path {
        self.ctx.service.store().upload_dir()
    }

    pub fn output_dir(&self) -> &Path {
        self.ctx.service.store().output_dir()
    }

    /// Number of entries left in the upload directory.
    pub fn staged_uploads(&self) -> usize {
        std::fs::read_dir(self.upload_dir()).unwrap().count()
    }

    /// Number of entries in the output directory.
    pub fn stored_outputs(&self) -> usize {
        std::fs::read_dir(self.output_dir()).unwrap().count()
    }
}

pub const BOUNDARY: &str = "stickerforge-test-boundary";

/// Hand-built multipart body for oneshot requests.
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn file(mut self, field: &str, filename: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buf
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }
}
