use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::classrooms::store::normalize_code;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i64,
    pub gender: String,
    pub classroom_code: Option<String>,
}

/// Body shape shared by create and edit. Everything is optional here: create
/// checks presence itself, edit keeps whatever was not submitted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "flexible_age")]
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub classroom_code: Option<String>,
}

// The browser forms send age as a number from one page and as a string from
// another; both decode here.
fn flexible_age<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(de)? {
        None => Ok(None),
        Some(Raw::Num(age)) => Ok(Some(age)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn require<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

/// Uppercases a submitted code; blank means unassigned.
fn submitted_code(code: Option<String>) -> Option<String> {
    code.map(|code| normalize_code(&code))
        .filter(|code| !code.is_empty())
}

pub async fn create_student(db_pool: &SqlitePool, input: StudentInput) -> ApiResult<Student> {
    let name = require(input.name, "name")?;
    let email = require(input.email, "email")?;
    let age = require(input.age, "age")?;
    let gender = require(input.gender, "gender")?;
    let classroom_code = submitted_code(input.classroom_code);

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO students (id, name, email, age, gender, classroom_code) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&name)
    .bind(&email)
    .bind(age)
    .bind(&gender)
    .bind(&classroom_code)
    .execute(db_pool)
    .await?;

    Ok(Student {
        id: id.to_string(),
        name,
        email,
        age,
        gender,
        classroom_code,
    })
}

pub async fn list_students(db_pool: &SqlitePool, only_unassigned: bool) -> ApiResult<Vec<Student>> {
    let sql = if only_unassigned {
        "SELECT id, name, email, age, gender, classroom_code FROM students WHERE classroom_code IS NULL"
    } else {
        "SELECT id, name, email, age, gender, classroom_code FROM students"
    };

    Ok(sqlx::query_as(sql).fetch_all(db_pool).await?)
}

pub async fn get_student(db_pool: &SqlitePool, id: Uuid) -> ApiResult<Option<Student>> {
    Ok(sqlx::query_as(
        "SELECT id, name, email, age, gender, classroom_code FROM students WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(db_pool)
    .await?)
}

/// Applies whatever fields were submitted and keeps the rest. An id nobody
/// has is a quiet no-op, not a 404.
pub async fn update_student(db_pool: &SqlitePool, id: Uuid, input: StudentInput) -> ApiResult<()> {
    match input.classroom_code {
        Some(code) => {
            sqlx::query(
                "UPDATE students SET name = COALESCE(?, name), email = COALESCE(?, email), \
                 age = COALESCE(?, age), gender = COALESCE(?, gender), classroom_code = ? \
                 WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.email)
            .bind(input.age)
            .bind(&input.gender)
            .bind(submitted_code(Some(code)))
            .bind(id.to_string())
            .execute(db_pool)
            .await?;
        }
        None => {
            sqlx::query(
                "UPDATE students SET name = COALESCE(?, name), email = COALESCE(?, email), \
                 age = COALESCE(?, age), gender = COALESCE(?, gender) WHERE id = ?",
            )
            .bind(&input.name)
            .bind(&input.email)
            .bind(input.age)
            .bind(&input.gender)
            .bind(id.to_string())
            .execute(db_pool)
            .await?;
        }
    }

    Ok(())
}

pub async fn delete_student(db_pool: &SqlitePool, id: Uuid) -> ApiResult<()> {
    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id.to_string())
        .execute(db_pool)
        .await?;
    Ok(())
}
