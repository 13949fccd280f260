use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use infragen_core::{DomainProfile, GenerationRequest, Orchestrator, ResponseEnvelope};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Transport-level error. Generation failures never produce one; they are
/// reported inside a normal [`ResponseEnvelope`].
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub agent: String,
    pub specialization: String,
}

impl HealthResponse {
    pub fn for_profile(profile: &DomainProfile) -> Self {
        Self {
            status: "healthy",
            agent: profile.name.clone(),
            specialization: profile.specialization.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    health: Arc<HealthResponse>,
}

pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    let health = Arc::new(HealthResponse::for_profile(orchestrator.profile()));
    Router::new()
        .route("/agent", post(run_agent))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            orchestrator,
            health,
        })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(orchestrator: Orchestrator, bind: &str, port: u16) -> Result<()> {
    let app = build_router(Arc::new(orchestrator));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("infragen serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("infragen serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn run_agent(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.orchestrator.handle(&request).await))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.health.as_ref().clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
