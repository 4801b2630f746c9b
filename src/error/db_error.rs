use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error(transparent)]
    Query(sqlx::Error),
    #[error("{0}")]
    SomethingWentWrong(String),
}

impl DbError {
    /// Postgres unique violations become `Conflict` so callers can tell a
    /// lost insert race from a broken connection.
    pub fn from_sqlx(error: sqlx::Error) -> Self {
        match error.as_database_error() {
            Some(db_error) if db_error.is_unique_violation() => {
                DbError::Conflict(db_error.message().to_string())
            }
            _ => DbError::Query(error),
        }
    }
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let status_code = match self {
            DbError::Conflict(_) => StatusCode::CONFLICT,
            DbError::Query(_) | DbError::SomethingWentWrong(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ErrorResponse::send("Database error".to_string()).with_status(status_code).into_response()
    }
}
