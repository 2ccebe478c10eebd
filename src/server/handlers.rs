//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::agents::AgentProfile;
use crate::feed::SocialAction;
use crate::generator::parse::extract_json;
use crate::generator::GenerationRequest;
use crate::groups::Group;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let logging = state.config.logging;
    let cors = state.config.cors_enabled;

    let mut router = Router::new()
        // Health and status
        .route("/health", get(health_check))
        .route("/status", get(status))
        // Records
        .route("/api/agents", get(list_agents).post(save_agent))
        .route("/api/feed", get(list_feed).post(save_activity))
        .route("/api/groups", get(list_groups).post(save_group))
        // Generator proxy
        .route("/api/ai/generate", post(generate))
        .with_state(state);

    if cors {
        router = router.layer(CorsLayer::permissive());
    }
    if logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub agents: usize,
    pub feed: usize,
    pub groups: usize,
    pub generator: Option<&'static str>,
}

/// Status endpoint
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (agents, feed, groups) = tokio::join!(
        state.store.fetch_agents(),
        state.store.fetch_feed(),
        state.store.fetch_groups()
    );

    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime().as_secs(),
        agents: agents.map(|a| a.len()).unwrap_or(0),
        feed: feed.map(|f| f.len()).unwrap_or(0),
        groups: groups.map(|g| g.len()).unwrap_or(0),
        generator: state.generator.as_ref().map(|g| g.name()),
    })
}

// ============================================================================
// Records
// ============================================================================

/// List agents; a store failure yields an empty list
async fn list_agents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.fetch_agents().await {
        Ok(agents) => Json(agents),
        Err(e) => {
            tracing::warn!(error = %e, "fetch agents failed");
            Json(Vec::new())
        },
    }
}

/// Create or replace an agent
async fn save_agent(
    State(state): State<Arc<AppState>>,
    Json(agent): Json<AgentProfile>,
) -> impl IntoResponse {
    if agent.id.trim().is_empty() || agent.name.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "agent needs an id and a name");
    }

    match state.store.save_agent(&agent).await {
        Ok(()) => (StatusCode::CREATED, Json(json!(agent))),
        Err(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Global feed, newest first, capped at `feed_limit`
async fn list_feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.fetch_feed().await {
        Ok(mut feed) => {
            feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            feed.truncate(state.config.feed_limit);
            Json(feed)
        },
        Err(e) => {
            tracing::warn!(error = %e, "fetch feed failed");
            Json(Vec::new())
        },
    }
}

/// Store one feed record (flat; nested replies are dropped)
async fn save_activity(
    State(state): State<Arc<AppState>>,
    Json(action): Json<SocialAction>,
) -> impl IntoResponse {
    if action.id.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "feed record needs an id");
    }

    let action = action.detached();
    match state.store.save_activity(&action).await {
        Ok(()) => (StatusCode::CREATED, Json(json!(action))),
        Err(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// List groups; a store failure yields an empty list
async fn list_groups(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.fetch_groups().await {
        Ok(groups) => Json(groups),
        Err(e) => {
            tracing::warn!(error = %e, "fetch groups failed");
            Json(Vec::new())
        },
    }
}

/// Create or replace a group
async fn save_group(
    State(state): State<Arc<AppState>>,
    Json(group): Json<Group>,
) -> impl IntoResponse {
    if group.id.trim().is_empty() || group.name.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "group needs an id and a name");
    }

    match state.store.save_group(&group).await {
        Ok(()) => (StatusCode::CREATED, Json(json!(group))),
        Err(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ============================================================================
// Generator proxy
// ============================================================================

/// Run one generation; answers with the model's JSON object, or
/// `{"content": text}` when the model did not produce one
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerationRequest>,
) -> impl IntoResponse {
    let Some(generator) = state.generator.as_ref() else {
        return error_body(StatusCode::SERVICE_UNAVAILABLE, "no generator configured");
    };

    match generator.generate(&request).await {
        Ok(text) => match extract_json(&text) {
            Some(obj) => (StatusCode::OK, Json(Value::Object(obj))),
            None => (StatusCode::OK, Json(json!({ "content": text }))),
        },
        Err(e) => {
            tracing::warn!(generator = generator.name(), error = %e, "generation failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        },
    }
}
