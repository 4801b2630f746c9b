use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User already exists")]
    UserAlreadyExists,
    /// Covers unknown email, wrong password and disabled accounts alike.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password validation failed: {details}")]
    InvalidPasswordWithDetails { details: String },
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status_code = match self {
            UserError::UserAlreadyExists => StatusCode::CONFLICT,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            UserError::InvalidPasswordWithDetails { .. } => StatusCode::BAD_REQUEST,
        };

        ErrorResponse::send(self.to_string()).with_status(status_code).into_response()
    }
}
