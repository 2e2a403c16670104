/**
 * Chat Session Protocol
 *
 * The state machine behind one chat socket. It is transport-agnostic: the
 * socket module feeds it decoded text frames and it answers through the
 * connection's `ConnectionHandle`.
 *
 * # States
 *
 * ```text
 * Connecting ──authenticate──► Authenticated ⇄ Subscribed ──► Closed
 *      └──────── auth failure ───────────────────────────────►┘
 * ```
 *
 * `Authenticated` and `Subscribed` differ only in whether the registry holds
 * any subscription for the connection. `Closed` is terminal.
 *
 * # Error Policy
 *
 * - Authentication failure, or any frame before authentication: `error`
 *   event, then `Closed`
 * - Malformed frame: `error{400}`, session continues
 * - Subscribe refused: `error{404|403}`, subscriptions unchanged
 * - Send refused: `message_sent{success:false}`, session continues
 *
 * # Teardown
 *
 * `close` unregisters the connection and is idempotent. `Drop` calls it, so
 * the registry is cleaned up on every exit path, unwinding included.
 */

use std::sync::Arc;

use chrono::Utc;

use crate::backend::auth::resolve_credential;
use crate::backend::chat::service::ChatService;
use crate::backend::error::ChatError;
use crate::backend::realtime::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::backend::store::User;
use crate::shared::event::{ClientFrame, SendMessageBody, ServerEvent};
use crate::shared::message::format_timestamp;

/// Observable protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    Subscribed,
    Closed,
}

/// What the transport should do after a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Parameters presented when the socket opens
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    /// Bearer credential from the query string or `Authorization` header
    pub credential: Option<String>,
    /// Room to subscribe to right after authenticating
    pub room_id: Option<String>,
}

/// One chat socket's protocol state
pub struct ChatSession {
    handle: ConnectionHandle,
    chat: ChatService,
    registry: Arc<ConnectionRegistry>,
    jwt_secret: Option<String>,
    user: Option<User>,
    closed: bool,
}

impl ChatSession {
    pub fn new(handle: ConnectionHandle, chat: ChatService, jwt_secret: Option<String>) -> Self {
        let registry = chat.broadcaster().registry().clone();
        Self {
            handle,
            chat,
            registry,
            jwt_secret,
            user: None,
            closed: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if self.closed {
            SessionState::Closed
        } else if self.user.is_none() {
            SessionState::Connecting
        } else if self.registry.rooms_of(self.id()).is_empty() {
            SessionState::Authenticated
        } else {
            SessionState::Subscribed
        }
    }

    /// Run the handshake
    ///
    /// On success the connection is registered, `connected` is sent, and the
    /// optional room is subscribed through the normal subscribe path.
    pub async fn authenticate(&mut self, handshake: Handshake) -> Flow {
        match self.state() {
            SessionState::Closed => return Flow::Close,
            SessionState::Connecting => {}
            _ => return Flow::Continue,
        }

        let resolved = resolve_credential(
            self.chat.stores().users.as_ref(),
            self.jwt_secret.as_deref(),
            handshake.credential.as_deref(),
        )
        .await;

        let user = match resolved {
            Ok(user) => user,
            Err(e) => {
                e.log_if_internal();
                tracing::warn!(connection_id = %self.id(), "[Session] Authentication failed: {}", e);
                return self.fail(&e);
            }
        };

        self.registry.register(self.handle.clone(), &user.id);
        tracing::info!(connection_id = %self.id(), user_id = %user.id, "[Session] Authenticated");
        self.user = Some(user);

        self.emit(&ServerEvent::Connected {
            server_time: format_timestamp(Utc::now()),
        });

        if let Some(room_id) = handshake.room_id.filter(|r| !r.trim().is_empty()) {
            self.subscribe(&room_id).await;
        }

        Flow::Continue
    }

    /// Handle one inbound text frame
    pub async fn handle_text(&mut self, text: &str) -> Flow {
        if self.closed {
            return Flow::Close;
        }
        if self.user.is_none() {
            return self.fail(&ChatError::authentication("Not authenticated"));
        }

        match ClientFrame::parse(text) {
            Ok(frame) => self.handle_frame(frame).await,
            Err(e) => {
                tracing::debug!(connection_id = %self.id(), "[Session] Malformed frame: {}", e);
                self.emit_error(&ChatError::from(e));
                Flow::Continue
            }
        }
    }

    /// Report input the transport could not even decode as text
    pub fn reject_malformed(&mut self, message: &str) -> Flow {
        if self.closed {
            return Flow::Close;
        }
        if self.user.is_none() {
            return self.fail(&ChatError::authentication("Not authenticated"));
        }
        self.emit_error(&ChatError::malformed(message));
        Flow::Continue
    }

    /// Handle one decoded frame
    pub async fn handle_frame(&mut self, frame: ClientFrame) -> Flow {
        if self.closed {
            return Flow::Close;
        }
        if self.user.is_none() {
            return self.fail(&ChatError::authentication("Not authenticated"));
        }

        match frame {
            ClientFrame::Subscribe { room_id } => self.subscribe(&room_id).await,
            ClientFrame::Unsubscribe { room_id } => {
                self.registry.unsubscribe(self.id(), &room_id);
            }
            ClientFrame::Ping { timestamp } => self.emit(&ServerEvent::Pong { timestamp }),
            frame @ ClientFrame::SendMessage { .. } => {
                if let Some((room_id, body)) = frame.into_send_message() {
                    self.send_message(&room_id, body).await;
                }
            }
        }
        Flow::Continue
    }

    async fn subscribe(&mut self, room_id: &str) {
        let Some(user_id) = self.user.as_ref().map(|u| u.id.clone()) else {
            return;
        };

        match self.chat.authorize_room(&user_id, room_id).await {
            Ok(_) => {
                self.registry.subscribe(self.id(), room_id);
                tracing::info!(
                    connection_id = %self.id(),
                    user_id = %user_id,
                    room_id = %room_id,
                    "[Session] Subscribed"
                );
                self.emit(&ServerEvent::Subscribed {
                    room_id: room_id.to_string(),
                });
            }
            Err(e) => {
                e.log_if_internal();
                self.emit_error(&e);
            }
        }
    }

    async fn send_message(&mut self, room_id: &str, body: SendMessageBody) {
        let Some(user) = self.user.clone() else {
            return;
        };

        match self.chat.send_message(&user, room_id, body).await {
            Ok(payload) => self.emit(&ServerEvent::message_sent(payload.id)),
            Err(e) => {
                e.log_if_internal();
                tracing::debug!(
                    connection_id = %self.id(),
                    room_id = %room_id,
                    "[Session] Message rejected: {}",
                    e
                );
                self.emit(&ServerEvent::message_failed(e.message()));
            }
        }
    }

    /// Unregister and mark the session closed
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.registry.unregister(self.id());
        tracing::debug!(connection_id = %self.id(), "[Session] Closed");
    }

    fn fail(&mut self, error: &ChatError) -> Flow {
        self.emit_error(error);
        self.close();
        Flow::Close
    }

    fn emit_error(&self, error: &ChatError) {
        self.emit(&ServerEvent::error(error.status_code().as_u16(), error.message()));
    }

    fn emit(&self, event: &ServerEvent) {
        if let Err(e) = self.handle.send(event) {
            tracing::debug!("[Session] Dropping outbound event: {}", e);
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}
