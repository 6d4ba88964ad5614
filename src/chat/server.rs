use rand::Rng;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::chat::event::ServerEvent;
use crate::chat::registry::{ConnId, Member, Rooms};
use crate::chat::store::{self, HISTORY_LIMIT, Message};

/// What became of a join attempt. The wire stays silent for the dropped
/// cases; the variants exist so callers and logs can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { user: String },
    DroppedInvalidRoom,
    DroppedStoreFailure,
}

/// What became of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { recipients: usize },
    DroppedInvalidRoom,
    DroppedEmptyText,
    DroppedStoreFailure,
}

/// Owns the live room map and fans room events out over it. One of these
/// exists per process, shared by every socket.
pub struct ChatServer {
    rooms: Rooms,
    db_pool: SqlitePool,
}

impl ChatServer {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self {
            rooms: Rooms::default(),
            db_pool,
        }
    }

    /// Admits the connection to a room: register, replay history to the
    /// joiner alone, tell everyone else. A room without a classroom row
    /// refuses the join with no events at all.
    pub async fn join(
        &self,
        conn: ConnId,
        code: &str,
        user: Option<String>,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> JoinOutcome {
        match store::room_exists(&self.db_pool, code).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("join dropped: no classroom {code}");
                return JoinOutcome::DroppedInvalidRoom;
            }
            Err(err) => {
                tracing::warn!("join dropped: classroom lookup for {code} failed: {err}");
                return JoinOutcome::DroppedStoreFailure;
            }
        }

        let user = user
            .map(|user| user.trim().to_owned())
            .filter(|user| !user.is_empty())
            .unwrap_or_else(random_user);

        self.rooms.join(
            code,
            conn,
            Member {
                user: user.clone(),
                tx: tx.clone(),
            },
        );

        let history = match store::recent_messages(&self.db_pool, code, HISTORY_LIMIT).await {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!("history fetch for {code} failed, replaying none: {err}");
                Vec::new()
            }
        };
        let _ = tx.send(ServerEvent::RoomHistory(history));

        self.rooms
            .broadcast_except(code, conn, &ServerEvent::System(format!("{user} joined")));

        tracing::debug!("{user} joined {code}");
        JoinOutcome::Joined { user }
    }

    /// Persists the line, then fans it out to the whole room, sender
    /// included. Drops are silent on the wire.
    pub async fn send(&self, code: &str, user: &str, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::DroppedEmptyText;
        }

        match store::room_exists(&self.db_pool, code).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("message dropped: no classroom {code}");
                return SendOutcome::DroppedInvalidRoom;
            }
            Err(err) => {
                tracing::warn!("message dropped: classroom lookup for {code} failed: {err}");
                return SendOutcome::DroppedStoreFailure;
            }
        }

        let message = Message::new(code, user, text);
        if let Err(err) = store::insert_message(&self.db_pool, &message).await {
            tracing::warn!("message dropped: insert failed: {err}");
            return SendOutcome::DroppedStoreFailure;
        }

        let recipients = self
            .rooms
            .broadcast(code, &ServerEvent::ChatMessage(message));
        SendOutcome::Delivered { recipients }
    }

    /// Relays a typing flip to everyone but the typist. Nothing is stored.
    pub fn typing(&self, conn: ConnId, code: &str, user: &str, typing: bool) -> usize {
        self.rooms.broadcast_except(
            code,
            conn,
            &ServerEvent::Typing {
                user: user.to_owned(),
                typing,
            },
        )
    }

    /// Drops the membership and tells whoever is left. A connection that was
    /// never in the room leaves no trace.
    pub fn leave(&self, conn: ConnId, code: &str) -> Option<String> {
        let user = self.rooms.leave(code, conn)?;
        self.rooms
            .broadcast(code, &ServerEvent::System(format!("{user} left")));
        tracing::debug!("{user} left {code}");
        Some(user)
    }
}

fn random_user() -> String {
    format!("User-{}", rand::rng().random_range(1000..10000))
}
