//! Stickerforge-Common: Shared types, IDs, and errors.
//!
//! This crate provides the vocabulary used across stickerforge:
//!
//! - **Typed IDs**: [`ArtifactId`], the opaque key joining an upload, its
//!   sticker output, and later download/cleanup calls
//! - **Core Types**: the validated [`ConversionRequest`] and the
//!   [`ConversionOutcome`] reported back to callers
//! - **Path Utilities**: upload extension checks
//! - **Error Handling**: the unified [`Error`] enum and [`Result`] alias
//!
//! # Examples
//!
//! ```
//! use stickerforge_common::{ArtifactId, ConversionRequest, Error, Result};
//! use stickerforge_common::paths::is_supported_upload;
//!
//! let id = ArtifactId::new();
//! let request = ConversionRequest::default();
//! assert_eq!(request.max_duration, 17);
//!
//! assert!(is_supported_upload("clip.MP4"));
//!
//! fn lookup(id: ArtifactId) -> Result<()> {
//!     Err(Error::not_found("artifact", id))
//! }
//! assert!(lookup(id).is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
