/**
 * API Route Handlers
 *
 * Unauthenticated service endpoints.
 *
 * # Routes
 *
 * - `GET /` - service info and endpoint list
 * - `GET /health` - liveness with live connection and room counts
 */

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::backend::realtime::ConnectionRegistry;
use crate::backend::server::state::AppState;

/// Response of `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Response of `GET /health`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub connections: usize,
    pub rooms: usize,
}

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/", get(service_info))
        .route("/health", get(health))
}

async fn service_info() -> Json<ServiceInfo> {
    let endpoints = [
        "GET /health",
        "GET /chat/rooms",
        "GET /chat/rooms/{room_id}/messages",
        "POST /chat/rooms/{room_id}/messages",
        "DELETE /chat/rooms/{room_id}/messages/{message_id}",
        "POST /chat/rooms/{room_id}/read",
        "GET /chat/ws",
    ];

    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
    })
}

async fn health(State(registry): State<Arc<ConnectionRegistry>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        connections: registry.connection_count(),
        rooms: registry.room_count(),
    })
}
