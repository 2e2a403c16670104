/**
 * Chat HTTP Handlers
 *
 * The synchronous surface under `/chat`. Every route runs behind
 * `auth_middleware`, so handlers receive the resolved caller through the
 * `AuthUser` extractor.
 *
 * # Routes
 *
 * - `GET    /chat/rooms` - rooms the caller belongs to or leads
 * - `GET    /chat/rooms/{room_id}/messages` - paginated history
 * - `POST   /chat/rooms/{room_id}/messages` - create and broadcast a message
 * - `DELETE /chat/rooms/{room_id}/messages/{message_id}` - soft delete
 * - `POST   /chat/rooms/{room_id}/read` - mark the room read
 *
 * Body and query rejections are reported as `ChatError::MalformedRequest`
 * so every failure uses the same JSON error shape.
 */

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::chat::service::{ChatService, HistoryResponse, RoomSummary};
use crate::backend::error::{ChatError, ChatResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::config::ServerConfig;
use crate::shared::event::SendMessageBody;
use crate::shared::message::ChatMessagePayload;

/// Query parameters of the history route
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Response of the mark-read route
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkReadResponse {
    pub marked: u64,
}

/// Response of the delete route
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub success: bool,
}

/// List the caller's rooms (GET /chat/rooms)
pub async fn list_rooms(
    State(chat): State<ChatService>,
    AuthUser(user): AuthUser,
) -> ChatResult<Json<Vec<RoomSummary>>> {
    Ok(Json(chat.list_rooms(&user).await?))
}

/// Page through a room's history (GET /chat/rooms/{room_id}/messages)
///
/// `page` defaults to 1 (the newest messages); `per_page` defaults to the
/// configured page size and is clamped to the configured maximum.
pub async fn get_messages(
    State(chat): State<ChatService>,
    State(config): State<Arc<ServerConfig>>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ChatResult<Json<HistoryResponse>> {
    let Query(params) = params.map_err(|e| ChatError::malformed(e.body_text()))?;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = config.clamp_page_size(params.per_page);

    Ok(Json(chat.history(&user, &room_id, page, per_page).await?))
}

/// Create a message (POST /chat/rooms/{room_id}/messages)
///
/// Runs the same ingestion as the socket `send_message` frame and responds
/// with the payload that was broadcast.
pub async fn post_message(
    State(chat): State<ChatService>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
    body: Result<Json<SendMessageBody>, JsonRejection>,
) -> ChatResult<(StatusCode, Json<ChatMessagePayload>)> {
    let Json(body) = body.map_err(|e| ChatError::malformed(e.body_text()))?;
    let payload = chat.send_message(&user, &room_id, body).await?;
    Ok((StatusCode::CREATED, Json(payload)))
}

/// Soft-delete a message (DELETE /chat/rooms/{room_id}/messages/{message_id})
pub async fn delete_message(
    State(chat): State<ChatService>,
    AuthUser(user): AuthUser,
    Path((room_id, message_id)): Path<(String, String)>,
) -> ChatResult<Json<DeleteResponse>> {
    chat.delete_message(&user, &room_id, &message_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Mark a room read (POST /chat/rooms/{room_id}/read)
pub async fn mark_room_read(
    State(chat): State<ChatService>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
) -> ChatResult<Json<MarkReadResponse>> {
    let marked = chat.mark_room_read(&user, &room_id).await?;
    Ok(Json(MarkReadResponse { marked }))
}
