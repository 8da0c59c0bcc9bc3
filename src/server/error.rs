//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, ApiError>`; every failure becomes a JSON body
//! of the form `{"error": "...", "code": "..."}`.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stickerforge_common::Error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.code(), e.to_string())
    }
}

/// A malformed or oversized multipart body.
impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        let code = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            "payload_too_large"
        } else {
            "invalid_multipart"
        };
        Self::new(e.status(), code, e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                error = %self.message,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.message,
            "code": self.code,
        });

        (self.status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_produces_404() {
        let resp = ApiError::from(Error::not_found("File", "abc")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["error"], "File not found: abc");
    }

    #[tokio::test]
    async fn transcode_failure_carries_diagnostic() {
        let resp = ApiError::from(Error::transcode_failed("Invalid data found")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["code"], "transcode_failed");
        assert_eq!(json["error"], "Conversion failed: Invalid data found");
    }

    #[test]
    fn client_errors_are_400() {
        let err = ApiError::from(Error::MissingFile("No video file provided".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = ApiError::from(Error::invalid_parameter("speed", "expected a number"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
