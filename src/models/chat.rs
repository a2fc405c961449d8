use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: UserId,
    pub username: String,
    pub avatar: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Frames sent by chat clients over the websocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage { text: String },
}

/// Frames pushed to every connected chat client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    ReceiveMessage {
        username: String,
        avatar: String,
        text: String,
        place: usize,
    },
}
