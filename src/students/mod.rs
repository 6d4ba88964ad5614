pub mod store;

pub use store::{Student, StudentInput};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router, debug_handler};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiResult, bad_body};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add_user", post(add_user))
        .route("/students", get(students))
        .route("/get_student/{id}", get(get_student))
        .route("/edit_user/{id}", post(edit_user))
        .route("/delete/{id}", delete(delete_user))
}

#[debug_handler]
async fn add_user(
    State(db_pool): State<SqlitePool>,
    body: Result<Json<StudentInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(input) = body.map_err(bad_body)?;
    store::create_student(&db_pool, input).await?;
    Ok(Json(json!({ "success": "Student added successfully" })))
}

#[derive(Deserialize)]
struct StudentsQuery {
    unassigned: Option<bool>,
}

#[debug_handler]
async fn students(
    State(db_pool): State<SqlitePool>,
    Query(query): Query<StudentsQuery>,
) -> ApiResult<Json<Vec<Student>>> {
    let only_unassigned = query.unassigned.unwrap_or(false);
    Ok(Json(store::list_students(&db_pool, only_unassigned).await?))
}

#[debug_handler]
async fn get_student(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> ApiResult<Json<Option<Student>>> {
    Ok(Json(store::get_student(&db_pool, id).await?))
}

#[debug_handler]
async fn edit_user(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    body: Result<Json<StudentInput>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(input) = body.map_err(bad_body)?;
    store::update_student(&db_pool, id, input).await?;
    Ok(Json(json!({ "success": "Student updated successfully" })))
}

#[debug_handler]
async fn delete_user(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> ApiResult<Json<Value>> {
    store::delete_student(&db_pool, id).await?;
    Ok(Json(json!({ "success": "Student deleted successfully" })))
}
