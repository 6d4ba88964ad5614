use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::classrooms::store::normalize_code;

/// How many messages a joiner gets replayed.
pub const HISTORY_LIMIT: i64 = 50;

/// A persisted chat line. `ts` is Unix milliseconds; rows are immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub classroom_code: String,
    pub user: String,
    pub text: String,
    pub ts: i64,
}

impl Message {
    pub fn new(code: &str, user: &str, text: &str) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            classroom_code: normalize_code(code),
            user: user.to_owned(),
            text: text.to_owned(),
            ts: now_millis(),
        }
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub async fn room_exists(db_pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM classrooms WHERE code = ?")
        .bind(normalize_code(code))
        .fetch_optional(db_pool)
        .await?;
    Ok(row.is_some())
}

pub async fn insert_message(db_pool: &SqlitePool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO messages (id, classroom_code, user, text, ts) VALUES (?, ?, ?, ?, ?)")
        .bind(&message.id)
        .bind(&message.classroom_code)
        .bind(&message.user)
        .bind(&message.text)
        .bind(message.ts)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// The `limit` most recent room messages, oldest first. Same-millisecond rows
/// keep their insert order through the time-ordered id tiebreak.
pub async fn recent_messages(
    db_pool: &SqlitePool,
    code: &str,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let mut messages: Vec<Message> = sqlx::query_as(
        "SELECT id, classroom_code, user, text, ts FROM messages \
         WHERE classroom_code = ? ORDER BY ts DESC, id DESC LIMIT ?",
    )
    .bind(normalize_code(code))
    .bind(limit)
    .fetch_all(db_pool)
    .await?;
    messages.reverse();
    Ok(messages)
}
