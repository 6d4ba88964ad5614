pub mod event;
pub mod registry;
pub mod server;
pub mod store;
mod ws;

pub use event::{ClientEvent, ServerEvent};
pub use server::{ChatServer, JoinOutcome, SendOutcome};

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::chat_ws))
}
