use serde::{Deserialize, Serialize};

use crate::chat::store::Message;

/// Frames the browser sends. Unknown event names fail to decode and the
/// frame is dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom { code: String, user: Option<String> },
    ChatMessage { code: String, text: String },
    Typing { code: String, typing: bool },
    LeaveRoom { code: String },
}

/// Frames pushed at members. `RoomHistory` goes to a joiner only; `System`
/// carries plain notice text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomHistory(Vec<Message>),
    ChatMessage(Message),
    System(String),
    Typing { user: String, typing: bool },
}
