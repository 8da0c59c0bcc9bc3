use crate::config::Config;
use crate::retention::start_retention_task;
use crate::service::ConversionService;
use crate::store::ArtifactStore;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stickerforge_av::{resolve_tool_path, FfmpegTranscoder, Transcoder};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod openapi;
pub mod routes_api;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub service: Arc<ConversionService>,
}

impl AppContext {
    pub fn new(config: Config, service: ConversionService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
        }
    }
}

/// Locate ffmpeg and wrap it as the production transcoder.
///
/// A missing binary is not fatal: the server still starts and every
/// conversion reports the invocation failure instead.
pub fn ffmpeg_transcoder(config: &Config) -> FfmpegTranscoder {
    let program = match resolve_tool_path("ffmpeg", config.tools.ffmpeg_path.as_deref()) {
        Ok(path) => {
            tracing::info!("Using ffmpeg at {:?}", path);
            path
        }
        Err(e) => {
            tracing::warn!("ffmpeg not available, conversions will fail: {}", e);
            PathBuf::from("ffmpeg")
        }
    };
    FfmpegTranscoder::new(program).with_timeout(Duration::from_secs(config.tools.timeout_secs))
}

/// Open the artifact store and wire a [`ConversionService`] around `transcoder`.
pub fn build_service(config: &Config, transcoder: Arc<dyn Transcoder>) -> Result<ConversionService> {
    let store = ArtifactStore::open(&config.storage.upload_dir, &config.storage.output_dir)
        .context("Failed to prepare storage directories")?;
    Ok(ConversionService::new(transcoder, store, &config.conversion))
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(&ctx.config.server.allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = ctx.config.server.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/api", routes_api::api_routes())
        .nest("/api", openapi::openapi_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(ctx)
}

/// Build the CORS origin policy. Each entry may hold one `*` wildcard.
fn allow_origin(patterns: &[String]) -> AllowOrigin {
    if patterns.is_empty() || patterns.iter().any(|p| p == "*") {
        return AllowOrigin::from(AnyOrigin);
    }

    let patterns = patterns.to_vec();
    AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin
            .to_str()
            .map(|origin| patterns.iter().any(|p| origin_matches(p, origin)))
            .unwrap_or(false)
    })
}

fn origin_matches(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == origin,
        Some((prefix, suffix)) => {
            origin.len() >= prefix.len() + suffix.len()
                && origin.starts_with(prefix)
                && origin.ends_with(suffix)
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Internal server error",
            "code": "unexpected",
        })),
    )
        .into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let transcoder: Arc<dyn Transcoder> = Arc::new(ffmpeg_transcoder(&config));
    let service = build_service(&config, transcoder)?;

    if let Some(secs) = config.storage.retention_secs {
        start_retention_task(
            service.store().clone(),
            Duration::from_secs(secs),
            Duration::from_secs(config.storage.sweep_interval_secs.max(1)),
        );
    }

    let ctx = AppContext::new(config, service);

    tracing::info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    serve(listener, ctx).await
}

/// Serve `ctx` on an already-bound listener until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, ctx: AppContext) -> Result<()> {
    let app = create_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_origin() {
        assert!(origin_matches("http://localhost:3000", "http://localhost:3000"));
        assert!(!origin_matches("http://localhost:3000", "http://localhost:3001"));
    }

    #[test]
    fn wildcard_origin() {
        let pattern = "https://*.netlify.app";
        assert!(origin_matches(pattern, "https://stickers.netlify.app"));
        assert!(!origin_matches(pattern, "https://netlify.app.evil.com"));
        assert!(!origin_matches(pattern, "http://stickers.netlify.app"));
        // Prefix and suffix may not overlap.
        assert!(!origin_matches("https://a*a", "https://a"));
    }
}
