use std::sync::Arc;

use axum::debug_handler;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chat::event::{ClientEvent, ServerEvent};
use crate::chat::registry::ConnId;
use crate::chat::server::{ChatServer, JoinOutcome};
use crate::classrooms::store::normalize_code;

#[debug_handler]
pub async fn chat_ws(
    State(chat): State<Arc<ChatServer>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(async move |socket| {
        let conn = Uuid::now_v7();
        let (mut sender, mut receiver) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // everything outbound funnels through one writer task
        let write_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Ok(frame) = serde_json::to_string(&event) else {
                    continue;
                };
                if sender.send(frame.into()).await.is_err() {
                    break;
                }
            }
        });

        // the room this connection sits in, with the name it goes by there
        let mut current: Option<(String, String)> = None;

        while let Some(Ok(frame)) = receiver.next().await {
            let Ok(event) = serde_json::from_slice(&frame.into_data()) else {
                continue;
            };
            handle_event(&chat, conn, &mut current, event, &tx).await;
        }

        // transport went away; drop whatever membership is left
        if let Some((code, _)) = current {
            chat.leave(conn, &code);
        }
        write_task.abort();
    })
}

/// Applies one decoded frame against the connection's membership. `current`
/// holds the single room the connection sits in and the name it goes by
/// there; frames that need a membership are dropped until a join lands.
async fn handle_event(
    chat: &ChatServer,
    conn: ConnId,
    current: &mut Option<(String, String)>,
    event: ClientEvent,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::JoinRoom { code, user } => {
            let code = normalize_code(&code);
            // one room per connection: switching rooms leaves the old one
            if let Some((prev, _)) = current.take_if(|(active, _)| *active != code) {
                chat.leave(conn, &prev);
            }
            if let JoinOutcome::Joined { user } = chat.join(conn, &code, user, tx.clone()).await {
                *current = Some((code, user));
            }
        }
        ClientEvent::ChatMessage { code, text } => {
            let Some((_, user)) = current.as_ref() else {
                return;
            };
            chat.send(&normalize_code(&code), user, &text).await;
        }
        ClientEvent::Typing { code, typing } => {
            let Some((_, user)) = current.as_ref() else {
                return;
            };
            chat.typing(conn, &normalize_code(&code), user, typing);
        }
        ClientEvent::LeaveRoom { code } => {
            let code = normalize_code(&code);
            if current.as_ref().is_some_and(|(active, _)| *active == code) {
                *current = None;
            }
            chat.leave(conn, &code);
        }
    }
}
