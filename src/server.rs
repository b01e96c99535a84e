//! HTTP surface
//!
//! | Route | Behavior |
//! |---|---|
//! | `GET /health` | liveness |
//! | `POST /geojson2shp[/:basename]` | raw GeoJSON body, archive bytes back |
//! | `POST /inversion/geojson2shp[/:basename]` | `{"url": ...}` body, `202 {"url": ...}` back |
//!
//! Every fatal job error maps to a bare 500; the detail only goes to the log.
//! An invalid base name is rejected with 400 before a job is created.

use crate::adapters::converter::CommandConverter;
use crate::adapters::source::HttpFeatureSource;
use crate::adapters::storage::create_object_store;
use crate::config::GeoShpConfig;
use crate::core::convert::ConversionOrchestrator;
use crate::core::delivery::inversion::InversionSettings;
use crate::core::delivery::{DirectDelivery, InversionDelivery};
use crate::domain::{BaseName, GeoShpError, Result};
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    direct: DirectDelivery,
    inversion: InversionDelivery,
}

impl AppState {
    /// State from already-built orchestrators
    pub fn new(direct: DirectDelivery, inversion: InversionDelivery) -> Self {
        Self { direct, inversion }
    }

    /// Wire the production collaborators described by `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client or object store
    /// cannot be built.
    pub fn from_config(config: &GeoShpConfig) -> Result<Self> {
        let converter = Arc::new(CommandConverter::new(config.conversion.clone()));
        let orchestrator = ConversionOrchestrator::new(converter, config.archive.clone());
        let source = Arc::new(HttpFeatureSource::new(config.source.clone())?);
        let store = create_object_store(&config.object_store)?;

        let direct = DirectDelivery::new(orchestrator.clone(), config.workspace.root.clone());
        let inversion = InversionDelivery::new(
            source,
            orchestrator,
            store,
            InversionSettings {
                workspace_root: config.workspace.root.clone(),
                page_size: config.source.page_size,
                deadline: Duration::from_secs(config.jobs.deadline_seconds),
            },
        );

        Ok(Self::new(direct, inversion))
    }
}

/// Request body of the inversion route
#[derive(Debug, Deserialize)]
pub struct InversionRequest {
    /// Source feature collection
    pub url: String,
}

/// Response body of the inversion route
#[derive(Debug, Serialize, Deserialize)]
pub struct InversionResponse {
    /// Where the archive will appear
    pub url: String,
}

/// Error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<GeoShpError> for ApiError {
    fn from(err: GeoShpError) -> Self {
        match err {
            GeoShpError::Validation(message) => Self::bad_request(message),
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Internal Server Error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn base_name(param: Option<&str>) -> ApiResult<BaseName> {
    BaseName::or_default(param).map_err(ApiError::bad_request)
}

/// Build the router
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/geojson2shp", post(direct_default))
        .route("/geojson2shp/:basename", post(direct_named))
        .route("/inversion/geojson2shp", post(inversion_default))
        .route("/inversion/geojson2shp/:basename", post(inversion_named))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "geoshp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn direct_default(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    direct(state, None, body).await
}

async fn direct_named(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    direct(state, Some(name), body).await
}

async fn direct(state: AppState, name: Option<String>, body: Bytes) -> ApiResult<Response> {
    let base_name = base_name(name.as_deref())?;
    let disposition = format!("attachment; filename=\"{}\"", base_name.archive_file_name());

    let job = state.direct.handle(body, base_name).await?;

    // The report handle is dropped; the job finishes and logs on its own
    let mut response = Body::from_stream(job.archive.into_body_stream()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

async fn inversion_default(
    State(state): State<AppState>,
    Json(request): Json<InversionRequest>,
) -> ApiResult<(StatusCode, Json<InversionResponse>)> {
    inversion(state, None, request)
}

async fn inversion_named(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<InversionRequest>,
) -> ApiResult<(StatusCode, Json<InversionResponse>)> {
    inversion(state, Some(name), request)
}

fn inversion(
    state: AppState,
    name: Option<String>,
    request: InversionRequest,
) -> ApiResult<(StatusCode, Json<InversionResponse>)> {
    let base_name = base_name(name.as_deref())?;
    let source = Url::parse(&request.url)
        .map_err(|e| ApiError::bad_request(format!("Invalid source url: {e}")))?;

    let job = state.inversion.submit(source, base_name);
    Ok((
        StatusCode::ACCEPTED,
        Json(InversionResponse {
            url: job.target.url,
        }),
    ))
}

/// Serve until `shutdown` flips to `true`
///
/// In-flight requests finish before this returns. Detached inversion jobs
/// are not awaited.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot be bound or fails.
pub async fn serve(config: &GeoShpConfig, shutdown: watch::Receiver<bool>) -> Result<()> {
    let state = AppState::from_config(config)?;
    let app = router(state, config.server.max_body_bytes);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| GeoShpError::Configuration(format!("Invalid listen address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_requested(shutdown).await;
            tracing::info!("Shutting down HTTP server");
        })
        .await?;

    Ok(())
}

/// Resolves once `shutdown` flips to `true`
///
/// A dropped sender means no signal can arrive anymore, so this never
/// resolves in that case.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            tracing::warn!("Shutdown signal source closed; serving until the process exits");
            std::future::pending::<()>().await;
        }
    }
}
