//! Typed sticker pipeline description.
//!
//! [`build_pipeline`] turns a validated [`ConversionRequest`] into a
//! [`PipelineDescription`]: an ordered list of filter [`Stage`]s, the [`Trim`]
//! window, and fixed [`EncodeOptions`]. Nothing here touches the filesystem or
//! spawns processes; the description is only rendered into ffmpeg syntax by
//! [`PipelineDescription::filter_chain`] and
//! [`PipelineDescription::to_ffmpeg_args`] at the invocation boundary.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stickerforge_common::ConversionRequest;

/// Output geometry and encoder effort for produced stickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerProfile {
    /// Edge length of the square output canvas, in pixels.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// libwebp compression effort (0-6).
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,

    /// Allow sources smaller than the canvas to be scaled up.
    #[serde(default)]
    pub allow_upscale: bool,
}

fn default_canvas_size() -> u32 {
    512
}
fn default_fps() -> u32 {
    10
}
fn default_compression_level() -> u8 {
    6
}

impl Default for StickerProfile {
    fn default() -> Self {
        Self {
            canvas_size: default_canvas_size(),
            fps: default_fps(),
            compression_level: default_compression_level(),
            allow_upscale: false,
        }
    }
}

/// A single filter stage. Variants are listed in the only order they may
/// appear in a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stage {
    /// Rescale presentation timestamps by `factor` (`1 / speed`).
    TimeScale { factor: f64 },
    /// Fit inside `width`x`height`, preserving aspect ratio.
    ScaleToFit {
        width: u32,
        height: u32,
        allow_upscale: bool,
    },
    /// Center the frame on an exact `width`x`height` canvas.
    Pad { width: u32, height: u32, color: Rgba },
    /// Resample to a constant frame rate.
    FrameRate { fps: u32 },
}

impl Stage {
    /// Position of this stage kind in the fixed stage order.
    pub fn rank(&self) -> u8 {
        match self {
            Stage::TimeScale { .. } => 0,
            Stage::ScaleToFit { .. } => 1,
            Stage::Pad { .. } => 2,
            Stage::FrameRate { .. } => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TimeScale { factor } => write!(f, "setpts={factor}*PTS"),
            Stage::ScaleToFit {
                width,
                height,
                allow_upscale: true,
            } => write!(
                f,
                "scale={width}:{height}:force_original_aspect_ratio=decrease"
            ),
            Stage::ScaleToFit {
                width,
                height,
                allow_upscale: false,
            } => write!(
                f,
                "scale='min({width},iw)':'min({height},ih)':force_original_aspect_ratio=decrease"
            ),
            Stage::Pad {
                width,
                height,
                color,
            } => write!(f, "pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color={color}"),
            Stage::FrameRate { fps } => write!(f, "fps={fps}"),
        }
    }
}

/// An RGBA fill colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba(0, 0, 0, 0);
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}{:02X}{:02X}{:02X}", self.0, self.1, self.2, self.3)
    }
}

/// Window selected from the source, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trim {
    pub start: f64,
    pub length: f64,
}

/// libwebp encoder preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderPreset {
    /// Tuned for still or looping image content.
    Picture,
}

impl fmt::Display for EncoderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderPreset::Picture => write!(f, "picture"),
        }
    }
}

/// Encoder settings. Everything except `quality` is fixed per profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeOptions {
    pub codec: &'static str,
    pub lossless: bool,
    pub quality: i64,
    pub compression_level: u8,
    pub preset: EncoderPreset,
    /// 0 loops forever.
    pub loop_count: u32,
    pub strip_audio: bool,
    /// Keep source timestamps instead of duplicating/dropping frames.
    pub passthrough_timestamps: bool,
}

/// Ordered, immutable description of a sticker conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineDescription {
    stages: Vec<Stage>,
    trim: Trim,
    encode: EncodeOptions,
}

impl PipelineDescription {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn trim(&self) -> Trim {
        self.trim
    }

    pub fn encode(&self) -> &EncodeOptions {
        &self.encode
    }

    /// Render the stages as an ffmpeg `-vf` filter chain.
    pub fn filter_chain(&self) -> String {
        self.stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render the full ffmpeg argument list (without the program name).
    ///
    /// Trim options follow `-i`, so the seek is frame-accurate and `-t`
    /// bounds the produced output.
    pub fn to_ffmpeg_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
        ];

        if self.trim.start > 0.0 {
            args.push("-ss".to_string());
            args.push(self.trim.start.to_string());
        }
        args.push("-t".to_string());
        args.push(self.trim.length.to_string());

        args.push("-vf".to_string());
        args.push(self.filter_chain());

        let enc = &self.encode;
        args.push("-loop".to_string());
        args.push(enc.loop_count.to_string());
        if enc.strip_audio {
            args.push("-an".to_string());
        }
        if enc.passthrough_timestamps {
            args.push("-vsync".to_string());
            args.push("0".to_string());
        }
        let encoder_opts = [
            ("-c:v", enc.codec.to_string()),
            ("-lossless", u8::from(enc.lossless).to_string()),
            ("-q:v", enc.quality.to_string()),
            ("-compression_level", enc.compression_level.to_string()),
            ("-preset", enc.preset.to_string()),
        ];
        for (flag, value) in encoder_opts {
            args.push(flag.to_string());
            args.push(value);
        }

        args.push(output.to_string_lossy().into_owned());
        args
    }
}

/// Derive the pipeline for `request` under `profile`.
///
/// Deterministic and infallible for any validated request. Values such as
/// `quality` are passed through as-is; range checks are the transcoder's.
pub fn build_pipeline(request: &ConversionRequest, profile: &StickerProfile) -> PipelineDescription {
    let mut stages = Vec::with_capacity(4);

    if request.speed != 1.0 {
        stages.push(Stage::TimeScale {
            factor: 1.0 / request.speed,
        });
    }

    let size = profile.canvas_size;
    stages.push(Stage::ScaleToFit {
        width: size,
        height: size,
        allow_upscale: profile.allow_upscale,
    });
    stages.push(Stage::Pad {
        width: size,
        height: size,
        color: Rgba::TRANSPARENT,
    });
    stages.push(Stage::FrameRate { fps: profile.fps });

    PipelineDescription {
        stages,
        trim: trim_window(request),
        encode: EncodeOptions {
            codec: "libwebp",
            lossless: false,
            quality: request.quality,
            compression_level: profile.compression_level,
            preset: EncoderPreset::Picture,
            loop_count: 0,
            strip_audio: true,
            passthrough_timestamps: true,
        },
    }
}

fn trim_window(request: &ConversionRequest) -> Trim {
    let max = f64::from(request.max_duration);

    if request.crop_start > 0.0 || request.crop_end.is_some() {
        let duration = match request.crop_end {
            Some(end) => end - request.crop_start,
            None => max,
        };
        Trim {
            start: request.crop_start,
            length: duration.min(max),
        }
    } else {
        Trim {
            start: 0.0,
            length: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn build(request: ConversionRequest) -> PipelineDescription {
        build_pipeline(&request, &StickerProfile::default())
    }

    #[test]
    fn default_request_has_no_speed_stage() {
        let p = build(ConversionRequest::default());
        assert_eq!(p.stages().len(), 3);
        assert!(matches!(p.stages()[0], Stage::ScaleToFit { .. }));
        assert_eq!(p.trim(), Trim { start: 0.0, length: 17.0 });
    }

    #[test]
    fn speed_stage_uses_inverse_factor() {
        let p = build(ConversionRequest {
            speed: 4.0,
            ..Default::default()
        });
        assert_eq!(p.stages()[0], Stage::TimeScale { factor: 0.25 });

        let p = build(ConversionRequest {
            speed: 0.25,
            ..Default::default()
        });
        assert_eq!(p.stages()[0], Stage::TimeScale { factor: 4.0 });
    }

    #[test]
    fn stage_order_is_fixed() {
        for speed in [0.25, 0.5, 1.0, 1.5, 4.0] {
            let p = build(ConversionRequest {
                speed,
                ..Default::default()
            });
            let ranks: Vec<u8> = p.stages().iter().map(Stage::rank).collect();
            let mut sorted = ranks.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(ranks, sorted, "stages out of order for speed {speed}");
            assert_eq!(ranks.last(), Some(&3));
        }
    }

    #[test]
    fn crop_window_is_bounded_by_max_duration() {
        let p = build(ConversionRequest {
            crop_start: 2.0,
            crop_end: Some(40.0),
            ..Default::default()
        });
        assert_eq!(p.trim(), Trim { start: 2.0, length: 17.0 });

        let p = build(ConversionRequest {
            crop_start: 2.0,
            crop_end: Some(5.5),
            ..Default::default()
        });
        assert_eq!(p.trim(), Trim { start: 2.0, length: 3.5 });
    }

    #[test]
    fn crop_start_without_end_uses_max_duration() {
        let p = build(ConversionRequest {
            crop_start: 5.0,
            max_duration: 10,
            ..Default::default()
        });
        assert_eq!(p.trim(), Trim { start: 5.0, length: 10.0 });
    }

    #[test]
    fn filter_chain_rendering() {
        let p = build(ConversionRequest {
            speed: 2.0,
            ..Default::default()
        });
        assert_eq!(
            p.filter_chain(),
            "setpts=0.5*PTS,\
             scale='min(512,iw)':'min(512,ih)':force_original_aspect_ratio=decrease,\
             pad=512:512:(ow-iw)/2:(oh-ih)/2:color=0x00000000,\
             fps=10"
        );
    }

    #[test]
    fn upscale_profile_renders_plain_scale() {
        let profile = StickerProfile {
            allow_upscale: true,
            ..Default::default()
        };
        let p = build_pipeline(&ConversionRequest::default(), &profile);
        assert_eq!(
            p.stages()[0].to_string(),
            "scale=512:512:force_original_aspect_ratio=decrease"
        );
    }

    #[test]
    fn ffmpeg_args_without_crop() {
        let p = build(ConversionRequest::default());
        let args = p.to_ffmpeg_args(&PathBuf::from("in.mp4"), &PathBuf::from("out.webp"));

        assert_eq!(&args[..5], ["-y", "-i", "in.mp4", "-t", "17"]);
        assert!(!args.contains(&"-ss".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.webp"));

        let joined = args.join(" ");
        assert!(joined.contains(
            "-loop 0 -an -vsync 0 -c:v libwebp -lossless 0 -q:v 60 -compression_level 6 -preset picture"
        ));
    }

    #[test]
    fn ffmpeg_args_with_crop_seek() {
        let p = build(ConversionRequest {
            crop_start: 1.5,
            crop_end: Some(4.0),
            quality: 80,
            ..Default::default()
        });
        let args = p.to_ffmpeg_args(&PathBuf::from("in.mov"), &PathBuf::from("out.webp"));
        assert_eq!(&args[3..7], ["-ss", "1.5", "-t", "2.5"]);
        assert!(args.windows(2).any(|w| w == ["-q:v", "80"]));
    }

    #[test]
    fn out_of_range_quality_is_passed_through() {
        let p = build(ConversionRequest {
            quality: 500,
            ..Default::default()
        });
        assert_eq!(p.encode().quality, 500);
    }

    #[test]
    fn profile_deserializes_with_defaults() {
        let profile: StickerProfile = serde_json::from_str(r#"{"fps": 15}"#).unwrap();
        assert_eq!(profile.fps, 15);
        assert_eq!(profile.canvas_size, 512);
        assert_eq!(profile.compression_level, 6);
        assert!(!profile.allow_upscale);
    }
}
