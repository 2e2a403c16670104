/**
 * Server Initialization
 *
 * This module builds the application: state, stores and router.
 *
 * # Initialization Process
 *
 * 1. Connect the SQLite pool and apply migrations
 * 2. Wire the connection registry, broadcaster and chat service
 * 3. Create and configure the router
 *
 * Tests call `create_app_with_stores` directly with an in-memory store.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::{StoreError, Stores};

/// Create and configure the application from configuration
///
/// # Errors
///
/// Fails when the database cannot be opened or migrated. A chat server
/// without its store cannot serve anything, so startup aborts.
pub async fn create_app(config: ServerConfig) -> Result<Router, StoreError> {
    tracing::info!("[Server] Initializing taskchat backend");

    let store = Arc::new(load_database(&config).await?);

    Ok(create_app_with_stores(config, Stores::from_shared(store)))
}

/// Create the application over already constructed stores
pub fn create_app_with_stores(config: ServerConfig, stores: Stores) -> Router {
    create_router(AppState::new(config, stores))
}
