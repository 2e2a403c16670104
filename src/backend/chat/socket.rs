/**
 * Chat Socket Transport
 *
 * Upgrades `GET /ws` to a WebSocket and drives a `ChatSession` from it.
 *
 * # Handshake
 *
 * The credential is read from the `token` query parameter, falling back to
 * an `Authorization: Bearer` header. An optional `room_id` query parameter
 * subscribes the connection right after authentication.
 *
 * ```text
 * GET /ws?token=<credential>&room_id=<group id>
 * ```
 *
 * # Tasks
 *
 * Each socket runs two halves:
 * - a writer task draining the connection's outbound queue into the sink
 * - the reader loop, which feeds inbound frames to the session
 *
 * The session is closed (and the connection unregistered) whichever half
 * finishes first. Closing drops the last outbound sender, which ends the
 * writer task.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::backend::auth::extract_bearer;
use crate::backend::chat::service::ChatService;
use crate::backend::chat::session::{ChatSession, Flow, Handshake};
use crate::backend::realtime::ConnectionHandle;
use crate::backend::server::state::AppState;

/// Query parameters accepted by `GET /ws`
#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
    #[serde(alias = "roomId")]
    pub room_id: Option<String>,
}

/// Handle a chat socket upgrade (GET /ws)
pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<SocketParams>,
    headers: HeaderMap,
) -> Response {
    let handshake = Handshake {
        credential: params.token.or_else(|| extract_bearer(&headers)),
        room_id: params.room_id,
    };
    let chat = state.chat.clone();
    let jwt_secret = state.config.jwt_secret.clone();

    ws.on_upgrade(move |socket| run_session(socket, chat, jwt_secret, handshake))
}

/// Drive one chat session over an upgraded socket
pub async fn run_session(
    socket: WebSocket,
    chat: ChatService,
    jwt_secret: Option<String>,
    handshake: Handshake,
) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::channel();
    let connection_id = handle.id();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let mut session = ChatSession::new(handle, chat, jwt_secret);
    tracing::debug!(connection_id = %connection_id, "[Session] Socket opened");

    if session.authenticate(handshake).await == Flow::Continue {
        while let Some(frame) = stream.next().await {
            let flow = match frame {
                Ok(Message::Text(text)) => session.handle_text(text.as_str()).await,
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => session.handle_text(text).await,
                    Err(_) => session.reject_malformed("Binary frame is not valid UTF-8"),
                },
                Ok(Message::Close(_)) => Flow::Close,
                Ok(_) => Flow::Continue,
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "[Session] Socket error: {}", e);
                    Flow::Close
                }
            };

            if flow == Flow::Close {
                break;
            }
        }
    }

    session.close();
    drop(session);

    if let Err(e) = writer.await {
        tracing::warn!(connection_id = %connection_id, "[Session] Writer task failed: {}", e);
    }
    tracing::debug!(connection_id = %connection_id, "[Session] Socket closed");
}
