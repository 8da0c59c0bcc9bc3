//! Path utilities for upload filenames.
//!
//! Uploads are accepted by extension only; the transcoder decides whether the
//! content is actually decodable.

use std::path::Path;

/// Extensions accepted as conversion sources.
pub const UPLOAD_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "gif"];

/// Extension of every produced sticker.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Media type served for produced stickers.
pub const OUTPUT_MEDIA_TYPE: &str = "image/webp";

/// Attachment name used when a sticker is downloaded.
pub const DOWNLOAD_NAME: &str = "sticker.webp";

/// Return the lowercased extension of `filename`, if any.
///
/// Only the text after the last `.` counts, so `archive.tar.mp4` yields `mp4`
/// and `noext` yields `None`.
///
/// # Examples
///
/// ```
/// use stickerforge_common::paths::upload_extension;
///
/// assert_eq!(upload_extension("Clip.MOV").as_deref(), Some("mov"));
/// assert_eq!(upload_extension("noext"), None);
/// ```
pub fn upload_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Check whether a filename carries one of [`UPLOAD_EXTENSIONS`].
pub fn is_supported_upload(filename: &str) -> bool {
    upload_extension(filename)
        .map(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Strip any directory components a client put into an upload name.
///
/// Both `/` and `\` are treated as separators so Windows-style names from
/// browsers are handled too.
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

/// Comma-separated list of accepted extensions, for error messages.
pub fn allowed_extensions_list() -> String {
    UPLOAD_EXTENSIONS.join(", ")
}
