pub mod chat;
pub mod classrooms;
pub mod config;
pub mod db;
pub mod error;
pub mod students;


use std::sync::Arc;

use axum::{Router, extract::FromRef};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use crate::chat::ChatServer;

pub use crate::error::{ApiError, ApiResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub chat: Arc<ChatServer>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        let chat = Arc::new(ChatServer::new(db_pool.clone()));
        Self { db_pool, chat }
    }
}

/// The whole HTTP surface: per-resource routers merged under one state, with
/// the permissive CORS the browser client expects.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(students::router())
        .merge(classrooms::router())
        .merge(chat::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
}
