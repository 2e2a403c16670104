//! Seeded fixtures shared by the integration suites
//!
//! The seed describes one project room and its neighbours:
//!
//! | id   | username | in room `G1`           |
//! |------|----------|------------------------|
//! | `u1` | alice    | leader (no member row) |
//! | `u2` | bob      | no, leads `G2`         |
//! | `u3` | carol    | member                 |
//! | `u4` | dave     | member                 |
//!
//! Files: `f1` (alice, unshared), `f2` (bob, shared into `G2`), `f3`
//! (alice, deleted), `f4` (bob, shared into `G1`).
//! Tasks: `t1` (carol, project `G1`), `t2` (bob, project `G2`).

use std::sync::Arc;

use axum_test::TestServer;
use tokio::sync::mpsc::Receiver;

use taskchat::backend::chat::{ChatSession, Flow, Handshake};
use taskchat::backend::realtime::ConnectionHandle;
use taskchat::backend::routes::create_router;
use taskchat::backend::server::{AppState, ServerConfig};
use taskchat::backend::store::{
    MemoryStore, ProjectGroup, SharedFile, Stores, User, UserDirectory,
};
use taskchat::shared::{ServerEvent, Task};

pub const ROOM: &str = "G1";
pub const OTHER_ROOM: &str = "G2";

pub fn user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        is_active: true,
        avatar_url: Some(format!("/files/avatar-{id}")),
    }
}

pub fn group(id: &str, name: &str, leader_id: &str) -> ProjectGroup {
    ProjectGroup {
        id: id.to_string(),
        name: name.to_string(),
        project_title: format!("{name} project"),
        leader_id: leader_id.to_string(),
        is_active: true,
    }
}

pub fn file(id: &str, owner: &str, group_id: Option<&str>, is_deleted: bool) -> SharedFile {
    SharedFile {
        id: id.to_string(),
        user_id: owner.to_string(),
        group_id: group_id.map(str::to_string),
        filename: format!("{id}.png"),
        is_deleted,
    }
}

pub fn task(id: &str, owner: &str, project_id: &str) -> Task {
    Task {
        id: id.to_string(),
        user_id: owner.to_string(),
        project_id: Some(project_id.to_string()),
        parent_task_id: None,
        title: format!("Task {id}"),
        description: Some("Ship the release".to_string()),
        status: "in_progress".to_string(),
        priority: "high".to_string(),
        due_date: Some("2024-06-30".to_string()),
        created_at: "2024-05-01 09:00:00".to_string(),
        updated_at: "2024-05-02 09:00:00".to_string(),
        completed_at: None,
        is_deleted: false,
        position: 0,
    }
}

/// Build the seeded in-memory store
pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    for (id, name) in [("u1", "alice"), ("u2", "bob"), ("u3", "carol"), ("u4", "dave")] {
        store.insert_user(user(id, name)).await;
    }

    store.insert_group(group(ROOM, "Apollo", "u1")).await;
    store.insert_group(group(OTHER_ROOM, "Borealis", "u2")).await;
    store.add_member(ROOM, "u3").await;
    store.add_member(ROOM, "u4").await;

    store.insert_file(file("f1", "u1", None, false)).await;
    store.insert_file(file("f2", "u2", Some(OTHER_ROOM), false)).await;
    store.insert_file(file("f3", "u1", None, true)).await;
    store.insert_file(file("f4", "u2", Some(ROOM), false)).await;

    store.insert_task(task("t1", "u3", ROOM)).await;
    store.insert_task(task("t2", "u2", OTHER_ROOM)).await;

    store
}

/// Seeded store plus application state wired over it
pub struct TestChat {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestChat {
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let store = seeded_store().await;
        let state = AppState::new(config, Stores::from_shared(store.clone()));
        Self { store, state }
    }

    /// HTTP test server over the full router
    pub fn server(&self) -> TestServer {
        TestServer::new(create_router(self.state.clone())).unwrap()
    }

    /// Load a seeded user record
    pub async fn store_user(&self, id: &str) -> User {
        self.store.find_user_by_id(id).await.unwrap().unwrap()
    }

    /// Open an authenticated session, optionally subscribed to a room
    ///
    /// Handshake events (`connected`, `subscribed`) are drained.
    pub async fn connect(
        &self,
        credential: &str,
        room_id: Option<&str>,
    ) -> (ChatSession, Receiver<String>) {
        let (session, mut rx, flow) = self.open(credential, room_id).await;
        assert_eq!(flow, Flow::Continue, "handshake for {credential} failed");
        drain(&mut rx);
        (session, rx)
    }

    /// Run a handshake without asserting on its outcome
    pub async fn open(
        &self,
        credential: &str,
        room_id: Option<&str>,
    ) -> (ChatSession, Receiver<String>, Flow) {
        let (handle, rx) = ConnectionHandle::channel();
        let mut session = ChatSession::new(
            handle,
            self.state.chat.clone(),
            self.state.config.jwt_secret.clone(),
        );
        let flow = session
            .authenticate(Handshake {
                credential: Some(credential.to_string()),
                room_id: room_id.map(str::to_string),
            })
            .await;
        (session, rx, flow)
    }
}

/// Decode every event queued on a connection
pub fn drain(rx: &mut Receiver<String>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(text) = rx.try_recv() {
        events.push(serde_json::from_str(&text).unwrap());
    }
    events
}

/// Build a `send_message` frame
pub fn send_frame(room_id: &str, fields: serde_json::Value) -> String {
    let mut frame = serde_json::json!({"type": "send_message", "room_id": room_id});
    if let (Some(frame), Some(fields)) = (frame.as_object_mut(), fields.as_object()) {
        for (key, value) in fields {
            frame.insert(key.clone(), value.clone());
        }
    }
    frame.to_string()
}
