use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use bridge_api::{get_status, set_channel_direct, step_channel, BridgeContext};
use clap::Parser;
use endpoints::{FileCommandSink, FileStatusSource};
use shared::{
    domain::{Direction, PlaybackStatus},
    error::{ApiError, ErrorCode},
    protocol::DirectChannelRequest,
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod dashboard;

use config::{load_settings, Cli};

const MAX_BODY_BYTES: usize = 4 * 1024;

#[derive(Clone)]
struct AppState {
    bridge: BridgeContext,
}

type Peer = Option<ConnectInfo<SocketAddr>>;
type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    info!(
        status_path = %settings.status_path.display(),
        command_path = %settings.command_path.display(),
        listen_addr = %settings.listen_addr,
        settle_delay_ms = settings.settle_delay_ms,
        "configuration loaded"
    );

    let bridge = BridgeContext::new(
        FileStatusSource::new(&settings.status_path),
        FileCommandSink::new(&settings.command_path),
        settings.settle_delay(),
    );
    let app = build_router(Arc::new(AppState { bridge }));

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        error!(%addr, error = %err, "failed to bind listen address");
        err
    })?;
    info!(%addr, "server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(http_dashboard).fallback(method_not_allowed))
        .route("/healthz", get(healthz).fallback(method_not_allowed))
        .route("/status", get(http_status).fallback(method_not_allowed))
        .route(
            "/channel/up",
            post(http_channel_up).fallback(method_not_allowed),
        )
        .route(
            "/channel/down",
            post(http_channel_down).fallback(method_not_allowed),
        )
        .route(
            "/channel/direct",
            post(http_channel_direct).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_dashboard(
    State(state): State<Arc<AppState>>,
    peer: Peer,
) -> Result<Html<String>, HttpError> {
    info!(peer = %peer_addr(&peer), "dashboard requested");
    let status = get_status(&state.bridge).await.map_err(into_http)?;
    let page = dashboard::render(&status).map_err(|err| {
        error!(error = %err, "failed to render dashboard");
        let err = ApiError::new(ErrorCode::Internal, "Error rendering dashboard");
        into_http(err)
    })?;
    Ok(Html(page))
}

async fn http_status(
    State(state): State<Arc<AppState>>,
    peer: Peer,
) -> Result<Json<PlaybackStatus>, HttpError> {
    info!(peer = %peer_addr(&peer), "status requested");
    let status = get_status(&state.bridge).await.map_err(into_http)?;
    Ok(Json(status))
}

async fn http_channel_up(
    State(state): State<Arc<AppState>>,
    peer: Peer,
) -> Result<Json<PlaybackStatus>, HttpError> {
    http_step(&state, Direction::Up, &peer).await
}

async fn http_channel_down(
    State(state): State<Arc<AppState>>,
    peer: Peer,
) -> Result<Json<PlaybackStatus>, HttpError> {
    http_step(&state, Direction::Down, &peer).await
}

async fn http_step(
    state: &AppState,
    direction: Direction,
    peer: &Peer,
) -> Result<Json<PlaybackStatus>, HttpError> {
    info!(peer = %peer_addr(peer), %direction, "channel step requested");
    let status = step_channel(&state.bridge, direction)
        .await
        .map_err(into_http)?;
    Ok(Json(status))
}

/// The body is decoded by hand so any malformed payload, whatever its
/// content type, is a plain 400.
async fn http_channel_direct(
    State(state): State<Arc<AppState>>,
    peer: Peer,
    body: Bytes,
) -> Result<Json<PlaybackStatus>, HttpError> {
    let req: DirectChannelRequest = serde_json::from_slice(&body).map_err(|err| {
        warn!(peer = %peer_addr(&peer), error = %err, "invalid direct channel request body");
        into_http(ApiError::new(ErrorCode::Validation, "Invalid request body"))
    })?;
    info!(peer = %peer_addr(&peer), channel = req.channel, "direct channel requested");

    let status = set_channel_direct(&state.bridge, req.channel)
        .await
        .map_err(into_http)?;
    Ok(Json(status))
}

async fn method_not_allowed() -> HttpError {
    let err = ApiError::new(ErrorCode::MethodNotAllowed, "Method not allowed");
    into_http(err)
}

async fn not_found() -> HttpError {
    into_http(ApiError::new(ErrorCode::NotFound, "Not found"))
}

fn into_http(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

fn peer_addr(peer: &Peer) -> String {
    match peer {
        Some(ConnectInfo(addr)) => addr.to_string(),
        None => "unknown".into(),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
