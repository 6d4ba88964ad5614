pub mod store;

pub use store::{Classroom, ClassroomInput, normalize_code};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, debug_handler};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::chat::store::{HISTORY_LIMIT, Message, recent_messages};
use crate::error::{ApiResult, bad_body};
use crate::students::Student;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/classrooms", post(create_classroom).get(list_classrooms))
        .route("/classrooms/{code}", get(get_classroom))
        .route("/classrooms/{code}/students", get(classroom_students))
        .route("/classrooms/{code}/messages", get(classroom_messages))
        .route("/classrooms/{code}/assign", post(assign_student))
        .route("/classrooms/{code}/unassign", post(unassign_student))
}

#[debug_handler]
async fn create_classroom(
    State(db_pool): State<SqlitePool>,
    body: Result<Json<ClassroomInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Classroom>)> {
    let Json(input) = body.map_err(bad_body)?;
    let classroom = store::create_classroom(&db_pool, input).await?;
    Ok((StatusCode::CREATED, Json(classroom)))
}

#[debug_handler]
async fn list_classrooms(State(db_pool): State<SqlitePool>) -> ApiResult<Json<Vec<Classroom>>> {
    Ok(Json(store::list_classrooms(&db_pool).await?))
}

#[debug_handler]
async fn get_classroom(
    Path(code): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> ApiResult<Json<Classroom>> {
    Ok(Json(store::get_classroom(&db_pool, &code).await?))
}

#[debug_handler]
async fn classroom_students(
    Path(code): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> ApiResult<Json<Vec<Student>>> {
    Ok(Json(store::students_in_classroom(&db_pool, &code).await?))
}

#[derive(Deserialize)]
struct MessagesQuery {
    limit: Option<i64>,
}

#[debug_handler]
async fn classroom_messages(
    Path(code): Path<String>,
    Query(query): Query<MessagesQuery>,
    State(db_pool): State<SqlitePool>,
) -> ApiResult<Json<Vec<Message>>> {
    let limit = query.limit.unwrap_or(HISTORY_LIMIT).clamp(1, 200);
    Ok(Json(recent_messages(&db_pool, &code, limit).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody {
    student_id: Uuid,
}

#[debug_handler]
async fn assign_student(
    Path(code): Path<String>,
    State(db_pool): State<SqlitePool>,
    body: Result<Json<AssignBody>, JsonRejection>,
) -> ApiResult<Json<Student>> {
    let Json(body) = body.map_err(bad_body)?;
    Ok(Json(
        store::assign_student(&db_pool, &code, body.student_id).await?,
    ))
}

#[debug_handler]
async fn unassign_student(
    Path(code): Path<String>,
    State(db_pool): State<SqlitePool>,
    body: Result<Json<AssignBody>, JsonRejection>,
) -> ApiResult<Json<Student>> {
    let Json(body) = body.map_err(bad_body)?;
    Ok(Json(
        store::unassign_student(&db_pool, &code, body.student_id).await?,
    ))
}
