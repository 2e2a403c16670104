/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container of the server, holding:
 * - the chat service (store capabilities + room broadcaster)
 * - the connection registry shared with the broadcaster
 * - the loaded server configuration
 *
 * # Thread Safety
 *
 * Everything is cheap to clone and safe to share:
 * - `ChatService` holds `Arc<dyn ...>` store handles
 * - `Arc<ConnectionRegistry>` guards its indices with a mutex
 * - `Arc<ServerConfig>` is read-only after startup
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::chat::ChatService;
use crate::backend::realtime::{ConnectionRegistry, RoomBroadcaster};
use crate::backend::server::config::ServerConfig;
use crate::backend::store::Stores;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Chat operations over the stores and the broadcaster
    pub chat: ChatService,

    /// Live connections and their room subscriptions
    ///
    /// The same registry the broadcaster delivers through.
    pub registry: Arc<ConnectionRegistry>,

    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire a fresh registry, broadcaster and chat service over `stores`
    pub fn new(config: ServerConfig, stores: Stores) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = RoomBroadcaster::new(registry.clone());

        Self {
            chat: ChatService::new(stores, broadcaster),
            registry,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for ChatService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.chat.clone()
    }
}

impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
