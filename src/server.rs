use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::api::{ApiCastsResponse, ApiError, CastsQuery, MiniAppManifest, ShareResponse};
use crate::config::AppConfig;
use crate::neynar::{FetchError, NeynarClient};
use crate::ranking::RankingPipeline;
use crate::retry::RetryError;
use crate::{fetch_top_casts, Error, Result};

const MISSING_KEY_MESSAGE: &str =
    "Neynar API key is not configured. Please add NEYNAR_API_KEY to your environment variables.";
const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch casts. Please check your Neynar API key and try again.";

#[derive(Clone)]
pub struct AppState {
    client: Option<NeynarClient>,
    pipeline: RankingPipeline,
    config: Arc<AppConfig>,
}

impl AppState {
    /// A missing API key does not stop the server; `/api/casts` reports it
    /// per request instead.
    pub fn from_config(config: AppConfig) -> Self {
        let client = match NeynarClient::from_config(&config) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "Neynar client unavailable");
                None
            }
        };
        let pipeline = RankingPipeline::with_limit(config.ranking.limit);
        Self {
            client,
            pipeline,
            config: Arc::new(config),
        }
    }

    pub fn with_client(mut self, client: NeynarClient) -> Self {
        self.client = Some(client);
        self
    }
}

/// API routes only.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/casts", get(casts_handler))
        .route("/api/share", post(share_handler))
        .route("/.well-known/farcaster.json", get(manifest_handler))
        .with_state(state)
}

/// API routes plus the static frontend from `web_root`, with request tracing.
pub fn app(state: AppState, web_root: Option<&str>) -> Router {
    let mut app = router(state);
    if let Some(web_root) = web_root {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
        app = app.fallback_service(static_service);
    }
    app.layer(TraceLayer::new_for_http())
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| Error::Invalid(format!("invalid bind address: {}", err)))?;
    let web_root = config.server.web_root.clone();
    let state = AppState::from_config(config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Server)?;
    let local_addr = listener.local_addr().map_err(Error::Server)?;
    info!(address = %local_addr, web_root = %web_root, "serving castlytics");
    info!(
        "preview the Mini App at https://warpcast.com/~/developers with URL http://localhost:{}",
        local_addr.port()
    );

    axum::serve(listener, app(state, Some(&web_root)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Server)?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn casts_handler(
    State(state): State<AppState>,
    Query(query): Query<CastsQuery>,
) -> std::result::Result<Json<ApiCastsResponse>, ApiError> {
    let client = state
        .client
        .as_ref()
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_MESSAGE))?;
    let limit = query.limit_or(state.pipeline.limit())?;

    let fid = match (query.parsed_fid()?, query.username()) {
        (Some(fid), _) => fid,
        (None, Some(username)) => {
            client
                .lookup_user_by_username(username)
                .await
                .map_err(lookup_error)?
                .fid
        }
        (None, None) => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "FID parameter is required",
            ))
        }
    };

    let pipeline = state.pipeline.limited_to(limit);
    let report = fetch_top_casts(client, state.config.neynar.source, fid, &pipeline)
        .await
        .map_err(|err| {
            error!(fid, error = %err, "failed to fetch casts");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED_MESSAGE)
        })?;

    Ok(Json(ApiCastsResponse::from_report(report, query.username())))
}

fn lookup_error(err: RetryError<FetchError>) -> ApiError {
    match err.into_inner() {
        FetchError::UserNotFound(username) => ApiError::new(
            StatusCode::NOT_FOUND,
            format!("Farcaster user not found: {}", username),
        ),
        other => {
            error!(error = %other, "username lookup failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED_MESSAGE)
        }
    }
}

async fn share_handler(State(state): State<AppState>) -> Json<ShareResponse> {
    Json(ShareResponse {
        redirect_url: state.config.app.url.clone(),
    })
}

async fn manifest_handler(State(state): State<AppState>) -> Json<MiniAppManifest> {
    Json(MiniAppManifest::from_app(&state.config.app))
}
