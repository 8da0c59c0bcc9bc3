//! # stickerforge-av
//!
//! Sticker pipeline construction and external transcoder management.
//!
//! This crate provides:
//!
//! - **Pipeline building** ([`build_pipeline`]) -- derive a typed
//!   [`PipelineDescription`] (time-scale, scale, pad, frame-rate stages plus
//!   trim and encode options) from a validated request. Pure, no I/O.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Tool discovery** ([`tools`]) -- locate ffmpeg and report its version.
//! - **Transcoding** ([`Transcoder`], [`FfmpegTranscoder`]) -- the narrow
//!   "pipeline in, path in, path out" seam used by the conversion service.
//!
//! ## Example
//!
//! ```
//! use stickerforge_av::{build_pipeline, StickerProfile};
//! use stickerforge_common::ConversionRequest;
//!
//! let request = ConversionRequest { speed: 2.0, ..Default::default() };
//! let pipeline = build_pipeline(&request, &StickerProfile::default());
//! assert!(pipeline.filter_chain().starts_with("setpts=0.5*PTS,"));
//! ```

pub mod command;
pub mod pipeline;
pub mod tools;
pub mod transcode;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use pipeline::{
    build_pipeline, EncodeOptions, EncoderPreset, PipelineDescription, Stage, StickerProfile,
    Trim,
};
pub use tools::{check_tool, resolve_tool_path, ToolInfo};
pub use transcode::{FfmpegTranscoder, Transcoder};
