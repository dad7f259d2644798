use crate::config::Config;
use crate::engine::{settle, BindingEngine};
use crate::errors::AppError;
use crate::scoring_client::ScoringApi;
use crate::shell;
use crate::view_model::{Event, Snapshot};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use moka::future::Cache;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the scoring/interpretation service, shared by every session.
    pub scoring: Arc<dyn ScoringApi>,
    /// Live dashboard sessions, one binding engine per browser page.
    /// Idle sessions expire; nothing outlives the process.
    pub sessions: Cache<Uuid, BindingEngine>,
}

impl AppState {
    pub fn new(config: Config, scoring: Arc<dyn ScoringApi>) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(Duration::from_secs(config.session_idle_secs))
            .max_capacity(config.max_sessions)
            .build();

        Self {
            config,
            scoring,
            sessions,
        }
    }

    async fn session(&self, id: Uuid) -> Result<BindingEngine, AppError> {
        self.sessions
            .get(&id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found or expired", id)))
    }
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub snapshot: Snapshot,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-eligibility-dashboard",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /
///
/// Renders the dashboard page. The customer dropdown is filled from the
/// scoring service's enumeration at request time; if that fails the dropdown
/// is simply empty.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Html<String> {
    let customers = state.scoring.fetch_enumeration().await;
    tracing::info!("GET / - {} customers available", customers.len());
    Html(shell::page(&customers))
}

/// POST /api/v1/sessions
///
/// Starts a session and runs the initial evaluation of every rule.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionCreated>) {
    let engine = BindingEngine::new(Arc::clone(&state.scoring));
    settle(engine.start()).await;

    let session_id = Uuid::new_v4();
    state.sessions.insert(session_id, engine.clone()).await;
    tracing::info!("Session {} started", session_id);

    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            snapshot: engine.snapshot(),
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Snapshot>, AppError> {
    let engine = state.session(id).await?;
    Ok(Json(engine.snapshot()))
}

/// POST /api/v1/sessions/:id/events
///
/// Applies one interaction, waits for the recomputations it issued, and
/// returns the session snapshot. Concurrent events for the same session are
/// allowed; the engine only lets the latest recomputation of a region commit.
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<Event>, JsonRejection>,
) -> Result<Json<Snapshot>, AppError> {
    let Json(event) = payload?;
    let engine = state.session(id).await?;
    tracing::info!("Session {} event: {:?}", id, event);

    settle(engine.dispatch(&event)).await;

    Ok(Json(engine.snapshot()))
}
