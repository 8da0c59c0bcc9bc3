//! Core type definitions for conversion requests and their results.

use serde::{Deserialize, Serialize};

use crate::ids::ArtifactId;
use crate::paths::OUTPUT_EXTENSION;

/// Lowest accepted playback-speed multiplier.
pub const MIN_SPEED: f64 = 0.25;

/// Highest accepted playback-speed multiplier.
pub const MAX_SPEED: f64 = 4.0;

/// Default output duration ceiling in seconds.
pub const DEFAULT_MAX_DURATION: u32 = 17;

/// Default encoder quality.
pub const DEFAULT_QUALITY: i64 = 60;

/// Output size above which a conversion is flagged (1 MiB).
pub const DEFAULT_SIZE_WARNING_BYTES: u64 = 1024 * 1024;

/// A validated, normalized conversion request.
///
/// Instances are produced by the parameter validator and obey:
/// `MIN_SPEED <= speed <= MAX_SPEED`, `crop_start >= 0`, and
/// `crop_end > crop_start` whenever `crop_end` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Upper bound on output length, in seconds.
    pub max_duration: u32,
    /// Encoder quality, passed through to the transcoder unchecked.
    pub quality: i64,
    /// Playback-speed multiplier.
    pub speed: f64,
    /// Trim start, in seconds.
    pub crop_start: f64,
    /// Optional trim end, in seconds.
    pub crop_end: Option<f64>,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            quality: DEFAULT_QUALITY,
            speed: 1.0,
            crop_start: 0.0,
            crop_end: None,
        }
    }
}

/// Metadata reported after a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Identifier for later download/cleanup.
    pub id: ArtifactId,
    /// Name of the produced file (`<id>.webp`).
    pub output_name: String,
    /// Exact output size.
    pub size_bytes: u64,
    /// Output size in KiB, rounded to two decimals.
    pub size_kb: f64,
    /// True when `size_bytes` exceeds the warning threshold.
    pub warning: bool,
}

impl ConversionOutcome {
    /// Build the outcome for `id` given its measured size and threshold.
    pub fn evaluate(id: ArtifactId, size_bytes: u64, warning_threshold: u64) -> Self {
        Self {
            id,
            output_name: format!("{id}.{OUTPUT_EXTENSION}"),
            size_bytes,
            size_kb: round2(size_bytes as f64 / 1024.0),
            warning: size_bytes > warning_threshold,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
