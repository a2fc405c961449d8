use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::models::{ClientEvent, UserId};
use super::{auth::CurrentUser, state::AppState};

const PING_INTERVAL: Duration = Duration::from_secs(20);

pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (mut write, mut read) = socket.split();
    let mut rx = state.chat.subscribe();
    info!("User {} joined chat ({} connected)", user_id, state.chat.subscriber_count());

    let mut send_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PING_INTERVAL);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!("Failed to encode chat event: {}", e);
                                continue;
                            }
                        };
                        if write.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Chat subscriber for user {} skipped {} events", user_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = interval.tick() => {
                    if write.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = read.next().await {
            match message {
                Message::Text(text) => handle_frame(&recv_state, user_id, &text).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("User {} left chat", user_id);
}

async fn handle_frame(state: &AppState, user_id: UserId, frame: &str) {
    let event = match serde_json::from_str::<ClientEvent>(frame) {
        Ok(event) => event,
        Err(e) => {
            debug!("Ignoring malformed chat frame from {}: {}", user_id, e);
            return;
        }
    };

    match event {
        ClientEvent::SendMessage { text } => match state.game.post_message(user_id, &text).await {
            Ok(event) => {
                let reached = state.chat.publish(event);
                debug!("Chat message from {} reached {} clients", user_id, reached);
            }
            Err(e) => warn!("Rejected chat message from {}: {}", user_id, e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Settings,
        models::ChatEvent,
        session::MemorySessionStore,
        storage::{GameStore, SqliteStore},
    };
    use tokio::sync::broadcast::error::TryRecvError;

    async fn state() -> Arc<AppState> {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        AppState::new(
            Settings::default(),
            Arc::new(store),
            Arc::new(MemorySessionStore::default()),
        )
    }

    #[tokio::test]
    async fn test_frame_is_posted_and_broadcast() {
        let state = state().await;
        let alice = state.game.register("alice", "pw").await.unwrap();
        let mut rx = state.chat.subscribe();

        handle_frame(&state, alice.id, r#"{"event":"send_message","text":"hi"}"#).await;
        handle_frame(&state, alice.id, "garbage").await;

        match rx.recv().await.unwrap() {
            ChatEvent::ReceiveMessage { username, text, place, .. } => {
                assert_eq!(username, "alice");
                assert_eq!(text, "hi");
                assert_eq!(place, 1);
            }
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        let history = state.game.chat_history(alice.id).await.unwrap();
        assert_eq!(history.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_frame_is_not_broadcast() {
        let state = state().await;
        let alice = state.game.register("alice", "pw").await.unwrap();
        let mut rx = state.chat.subscribe();

        handle_frame(&state, alice.id, r#"{"event":"send_message","text":"   "}"#).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
