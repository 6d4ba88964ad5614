use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything a handler can answer with besides a success body. The first
/// three map straight to client-fault statuses; `Store` is the catch-all for
/// anything the database throws at us.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Something unexpected occurred: {0}")]
    Store(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Store(err) = &self {
            tracing::error!("request failed: {err:?}");
        }

        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// True when the store rejected a write over a UNIQUE index.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Folds a body-extraction failure into the validation lane.
pub(crate) fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_wrap_the_cause_in_the_stock_wording() {
        let err = ApiError::Store(sqlx::Error::PoolClosed);
        let text = err.to_string();
        assert!(text.starts_with("Something unexpected occurred:"), "{text}");
    }

    #[test]
    fn client_fault_errors_show_their_message_bare() {
        assert_eq!(
            ApiError::Validation("name is required".to_owned()).to_string(),
            "name is required"
        );
        assert_eq!(
            ApiError::NotFound("Classroom not found".to_owned()).to_string(),
            "Classroom not found"
        );
    }

    #[test]
    fn each_variant_maps_to_its_status() {
        assert_eq!(
            ApiError::Validation(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict(String::new()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound(String::new()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Store(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
