use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, is_unique_violation};
use crate::students::store::Student;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Classroom {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassroomInput {
    pub name: Option<String>,
    pub code: Option<String>,
}

/// Codes compare case-insensitively everywhere; uppercase is the stored and
/// wire form.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub async fn create_classroom(db_pool: &SqlitePool, input: ClassroomInput) -> ApiResult<Classroom> {
    let name = input
        .name
        .map(|name| name.trim().to_owned())
        .unwrap_or_default();
    let code = input
        .code
        .map(|code| normalize_code(&code))
        .unwrap_or_default();
    if name.is_empty() || code.is_empty() {
        return Err(ApiError::Validation("name and code are required".to_owned()));
    }

    if classroom_by_code(db_pool, &code).await?.is_some() {
        return Err(ApiError::Conflict("Classroom code already exists".to_owned()));
    }

    let id = Uuid::now_v7();
    // the NOCASE unique index stays authoritative under racing creates
    sqlx::query("INSERT INTO classrooms (id, name, code) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(&name)
        .bind(&code)
        .execute(db_pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ApiError::Conflict("Classroom code already exists".to_owned())
            } else {
                err.into()
            }
        })?;

    Ok(Classroom {
        id: id.to_string(),
        name,
        code,
    })
}

pub async fn list_classrooms(db_pool: &SqlitePool) -> ApiResult<Vec<Classroom>> {
    Ok(
        sqlx::query_as("SELECT id, name, code FROM classrooms ORDER BY name ASC")
            .fetch_all(db_pool)
            .await?,
    )
}

pub async fn classroom_by_code(
    db_pool: &SqlitePool,
    code: &str,
) -> ApiResult<Option<Classroom>> {
    Ok(
        sqlx::query_as("SELECT id, name, code FROM classrooms WHERE code = ?")
            .bind(normalize_code(code))
            .fetch_optional(db_pool)
            .await?,
    )
}

pub async fn get_classroom(db_pool: &SqlitePool, code: &str) -> ApiResult<Classroom> {
    classroom_by_code(db_pool, code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Classroom not found".to_owned()))
}

pub async fn students_in_classroom(db_pool: &SqlitePool, code: &str) -> ApiResult<Vec<Student>> {
    Ok(sqlx::query_as(
        "SELECT id, name, email, age, gender, classroom_code FROM students \
         WHERE classroom_code = ? ORDER BY name ASC",
    )
    .bind(normalize_code(code))
    .fetch_all(db_pool)
    .await?)
}

pub async fn assign_student(
    db_pool: &SqlitePool,
    code: &str,
    student_id: Uuid,
) -> ApiResult<Student> {
    let code = normalize_code(code);
    set_student_classroom(db_pool, &code, student_id, Some(&code)).await
}

pub async fn unassign_student(
    db_pool: &SqlitePool,
    code: &str,
    student_id: Uuid,
) -> ApiResult<Student> {
    let code = normalize_code(code);
    set_student_classroom(db_pool, &code, student_id, None).await
}

async fn set_student_classroom(
    db_pool: &SqlitePool,
    code: &str,
    student_id: Uuid,
    new_code: Option<&str>,
) -> ApiResult<Student> {
    get_classroom(db_pool, code).await?;

    let updated = sqlx::query("UPDATE students SET classroom_code = ? WHERE id = ?")
        .bind(new_code)
        .bind(student_id.to_string())
        .execute(db_pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::NotFound("Student not found".to_owned()));
    }

    Ok(sqlx::query_as(
        "SELECT id, name, email, age, gender, classroom_code FROM students WHERE id = ?",
    )
    .bind(student_id.to_string())
    .fetch_one(db_pool)
    .await?)
}
