//! Upload and form-field validation.
//!
//! Turns the raw multipart input of a conversion into a [`ValidatedUpload`]:
//! a sanitized filename, its lowercased extension, and a normalized
//! [`ConversionRequest`]. Nothing here touches the filesystem.

use bytes::Bytes;
use stickerforge_common::paths::{allowed_extensions_list, sanitize_filename, upload_extension, UPLOAD_EXTENSIONS};
use stickerforge_common::{ConversionRequest, Error, Result, MAX_SPEED, MIN_SPEED};

use crate::config::ConversionConfig;

/// The uploaded file part as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, untrusted.
    pub filename: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: Some(filename.into()),
            data: data.into(),
        }
    }
}

/// Form fields of a conversion, still as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams {
    pub max_duration: Option<String>,
    pub quality: Option<String>,
    pub speed: Option<String>,
    pub crop_start: Option<String>,
    pub crop_end: Option<String>,
}

impl RawParams {
    /// Store a form field by name. Returns `false` for unknown names.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            "max_duration" => &mut self.max_duration,
            "quality" => &mut self.quality,
            "speed" => &mut self.speed,
            "crop_start" => &mut self.crop_start,
            "crop_end" => &mut self.crop_end,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }
}

/// Configured bounds applied while normalizing a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionLimits {
    pub default_max_duration: u32,
    pub max_duration_ceiling: u32,
    pub default_quality: i64,
}

impl Default for ConversionLimits {
    fn default() -> Self {
        Self::from(&ConversionConfig::default())
    }
}

impl From<&ConversionConfig> for ConversionLimits {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            default_max_duration: config.default_max_duration,
            max_duration_ceiling: config.max_duration_ceiling,
            default_quality: config.default_quality,
        }
    }
}

/// An upload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    /// Final path component of the client filename.
    pub filename: String,
    /// Lowercased extension, one of the supported upload extensions.
    pub extension: String,
    pub request: ConversionRequest,
}

/// Validate the file part and coerce the form fields.
///
/// Field values are clamped in a fixed order: duration ceiling, speed range,
/// non-negative start, then `crop_end` is dropped unless it lies after the
/// start.
pub fn validate_upload(
    file: Option<&UploadedFile>,
    raw: &RawParams,
    limits: &ConversionLimits,
) -> Result<ValidatedUpload> {
    let file = file.ok_or_else(|| Error::MissingFile("No video file provided".to_string()))?;

    let filename = file
        .filename
        .as_deref()
        .map(sanitize_filename)
        .unwrap_or_default();
    if filename.is_empty() {
        return Err(Error::MissingFile("No file selected".to_string()));
    }

    let extension = upload_extension(&filename)
        .filter(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| Error::UnsupportedFormat {
            extension: upload_extension(&filename).unwrap_or_default(),
            allowed: allowed_extensions_list(),
        })?;

    let request = normalize(raw, limits)?;

    Ok(ValidatedUpload {
        filename,
        extension,
        request,
    })
}

fn normalize(raw: &RawParams, limits: &ConversionLimits) -> Result<ConversionRequest> {
    let max_duration = parse_int("max_duration", raw.max_duration.as_deref())?
        .unwrap_or(i64::from(limits.default_max_duration));
    if max_duration < 0 {
        return Err(Error::invalid_parameter(
            "max_duration",
            "must not be negative",
        ));
    }
    let ceiling = i64::from(limits.max_duration_ceiling);
    // Bounded by the u32 ceiling, so the conversion cannot fail.
    let max_duration = u32::try_from(max_duration.min(ceiling)).unwrap_or(limits.max_duration_ceiling);

    let quality = parse_int("quality", raw.quality.as_deref())?.unwrap_or(limits.default_quality);

    let speed = parse_float("speed", raw.speed.as_deref())?
        .unwrap_or(1.0)
        .clamp(MIN_SPEED, MAX_SPEED);

    let crop_start = parse_float("crop_start", raw.crop_start.as_deref())?
        .unwrap_or(0.0)
        .max(0.0);

    let crop_end = parse_float("crop_end", raw.crop_end.as_deref())?.filter(|end| *end > crop_start);

    Ok(ConversionRequest {
        max_duration,
        quality,
        speed,
        crop_start,
        crop_end,
    })
}

/// Blank fields count as absent.
fn field(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_int(name: &str, value: Option<&str>) -> Result<Option<i64>> {
    field(value)
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| Error::invalid_parameter(name, format!("expected an integer, got '{v}'")))
        })
        .transpose()
}

fn parse_float(name: &str, value: Option<&str>) -> Result<Option<f64>> {
    field(value)
        .map(|v| {
            let parsed = v
                .parse::<f64>()
                .map_err(|_| Error::invalid_parameter(name, format!("expected a number, got '{v}'")))?;
            if parsed.is_finite() {
                Ok(parsed)
            } else {
                Err(Error::invalid_parameter(name, "must be a finite number"))
            }
        })
        .transpose()
}
