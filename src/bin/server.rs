use anyhow::Context;
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use cutlist_packer::api::{self, OptimizeRequest, OptimizeResponse};
use cutlist_packer::config::{DEFAULT_LOG_FILE, DEFAULT_PORT, SERVER_MAX_INSTANCES};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    // Packing is CPU-bound and quadratic; keep it off the async workers
    let response = tokio::task::spawn_blocking(move || api::optimize(&req, SERVER_MAX_INSTANCES))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "packing task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "packing failed".to_string())
        })?
        .map_err(|e| {
            tracing::warn!(error = %e, "rejected cut list");
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    Ok(Json(response))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn main() -> anyhow::Result<()> {
    // Sentry stays disabled when SENTRY_DSN is unset
    let _sentry = sentry::init((
        std::env::var("SENTRY_DSN").ok(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let log_path = std::env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {log_path}"))?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?
        .block_on(serve())
}

async fn serve() -> anyhow::Result<()> {
    let port = std::env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("Listening on {addr}");
    tracing::info!(%addr, "server started");
    axum::serve(listener, app()).await?;
    Ok(())
}
