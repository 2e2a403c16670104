/**
 * Chat Route Configuration
 *
 * Routes mounted under `/chat`.
 *
 * # Routes
 *
 * - `GET    /rooms` - caller's rooms
 * - `GET    /rooms/{room_id}/messages` - history
 * - `POST   /rooms/{room_id}/messages` - create message
 * - `DELETE /rooms/{room_id}/messages/{message_id}` - soft delete
 * - `POST   /rooms/{room_id}/read` - mark read
 * - `GET    /ws` - chat socket
 *
 * # Authentication
 *
 * The HTTP routes sit behind `auth_middleware` (added with `route_layer`,
 * so unknown paths still 404 instead of 401). `/ws` is registered after the
 * layer: the socket authenticates during its own handshake, where a
 * failure is reported as an `error` event rather than an HTTP status.
 */

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::backend::chat::handlers::{
    delete_message, get_messages, list_rooms, mark_room_read, post_message,
};
use crate::backend::chat::socket::chat_socket;
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;

/// Build the `/chat` sub-router
pub fn configure_chat_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route(
            "/rooms/{room_id}/messages",
            get(get_messages).post(post_message),
        )
        .route(
            "/rooms/{room_id}/messages/{message_id}",
            delete(delete_message),
        )
        .route("/rooms/{room_id}/read", post(mark_room_read))
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware))
        .route("/ws", get(chat_socket))
}
