//! REST API and SSE routes for renderers and input handlers

use crate::layout::{HitRegion, Indicator};
use crate::scene::SceneSnapshot;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scene", get(latest_scene))
        .route("/api/scene/stream", get(scene_stream))
        .route("/api/hit_regions", get(hit_regions))
        .route("/api/hit", get(hit_test))
        .route("/api/sources", get(list_sources))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Scene Endpoints ===

async fn latest_scene(State(state): State<AppState>) -> Json<SceneSnapshot> {
    Json(state.scene.latest().as_ref().clone())
}

async fn scene_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.subscribe()).filter_map(|snapshot| async move {
        match Event::default().json_data(snapshot.as_ref()) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!("Failed to serialize snapshot: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// === Hit Testing Endpoints ===

async fn hit_regions(State(state): State<AppState>) -> Json<Vec<HitRegion>> {
    Json(state.scene.latest().layout.hit_regions())
}

#[derive(Deserialize)]
struct HitQuery {
    x: i32,
    y: i32,
}

#[derive(Serialize)]
struct HitResponse {
    x: i32,
    y: i32,
    indicator: Option<Indicator>,
}

async fn hit_test(
    State(state): State<AppState>,
    Query(query): Query<HitQuery>,
) -> Json<HitResponse> {
    let indicator = state.scene.latest().layout.hit_test(query.x, query.y);
    Json(HitResponse {
        x: query.x,
        y: query.y,
        indicator,
    })
}

// === Source Endpoints ===

#[derive(Serialize)]
struct SourceInfo {
    key: String,
    name: String,
    active: bool,
}

async fn list_sources(State(state): State<AppState>) -> Json<Vec<SourceInfo>> {
    let sources = state.sources.read().await;
    let info = sources
        .iter()
        .map(|source| SourceInfo {
            key: source.key().to_string(),
            name: source.name().to_string(),
            active: source.is_active(),
        })
        .collect();
    Json(info)
}
