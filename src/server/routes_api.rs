use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use stickerforge_common::{ArtifactId, ConversionOutcome};
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

use crate::params::{RawParams, UploadedFile};
use crate::server::error::ApiError;
use crate::server::AppContext;
use crate::store::parse_id;

/// Multipart field carrying the video.
const FILE_FIELD: &str = "video";

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/convert", post(convert))
        .route("/download/{id}", get(download))
        .route("/cleanup/{id}", delete(cleanup))
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is running", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Multipart form accepted by `/api/convert`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertForm {
    /// Video file (mp4, avi, mov, mkv, webm or gif).
    #[schema(value_type = String, format = Binary)]
    video: Vec<u8>,
    /// Output length limit in seconds (capped at 17).
    max_duration: Option<u32>,
    /// WebP quality.
    quality: Option<i64>,
    /// Playback speed multiplier, clamped to 0.25-4.
    speed: Option<f64>,
    /// Trim start in seconds.
    crop_start: Option<f64>,
    /// Trim end in seconds.
    crop_end: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConvertResponse {
    pub success: bool,
    #[schema(value_type = String, format = Uuid)]
    pub file_id: ArtifactId,
    pub filename: String,
    pub size_kb: f64,
    pub size_bytes: u64,
    /// Set when the sticker is over the size limit.
    pub warning: bool,
}

impl From<ConversionOutcome> for ConvertResponse {
    fn from(outcome: ConversionOutcome) -> Self {
        Self {
            success: true,
            file_id: outcome.id,
            filename: outcome.output_name,
            size_kb: outcome.size_kb,
            size_bytes: outcome.size_bytes,
            warning: outcome.warning,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[utoipa::path(
    post,
    path = "/api/convert",
    tag = "stickers",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Sticker created", body = ConvertResponse),
        (status = 400, description = "Missing file, bad extension or bad parameter", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Transcoder failed", body = ErrorResponse)
    )
)]
pub async fn convert(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut raw = RawParams::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD {
            let filename = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            if file.is_none() {
                file = Some(UploadedFile { filename, data });
            }
        } else {
            let value = field.text().await?;
            if !raw.set(&name, value) {
                tracing::debug!(field = %name, "Ignoring unknown form field");
            }
        }
    }

    let outcome = ctx.service.convert(file, raw).await?;
    Ok(Json(ConvertResponse::from(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/download/{id}",
    tag = "stickers",
    params(("id" = String, Path, description = "Sticker id returned by /api/convert")),
    responses(
        (status = 200, description = "Sticker file served as image/webp"),
        (status = 404, description = "Unknown id", body = ErrorResponse)
    )
)]
pub async fn download(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let artifact = ctx.service.download(id).await?;

    let body = Body::from_stream(ReaderStream::new(artifact.file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.media_type)
        .header(header::CONTENT_LENGTH, artifact.size_bytes.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.download_name),
        )
        .body(body)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "unexpected", e.to_string()))
}

#[derive(Serialize, ToSchema)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    delete,
    path = "/api/cleanup/{id}",
    tag = "stickers",
    params(("id" = String, Path, description = "Sticker id returned by /api/convert")),
    responses(
        (status = 200, description = "Sticker deleted", body = CleanupResponse),
        (status = 404, description = "Unknown id", body = ErrorResponse)
    )
)]
pub async fn cleanup(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    ctx.service.cleanup(id).await?;
    Ok(Json(CleanupResponse {
        success: true,
        message: "File deleted".to_string(),
    }))
}
