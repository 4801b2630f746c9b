use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Missing Bearer token")]
    MissingToken,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Token error: {0}")]
    TokenCreationError(String),
    #[error("{0} is not configured")]
    MissingSecret(&'static str),
    #[error("{key} must be at least 32 bytes (256 bits), got {length}")]
    WeakSecret { key: &'static str, length: usize },
    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
    #[error("{key} must be between 1 and {max}, got {value}")]
    InvalidLifetime { key: &'static str, value: i64, max: i64 },
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status_code = match self {
            TokenError::InvalidToken
            | TokenError::TokenExpired
            | TokenError::MissingToken
            | TokenError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            TokenError::TokenCreationError(_)
            | TokenError::MissingSecret(_)
            | TokenError::WeakSecret { .. }
            | TokenError::SharedSecret
            | TokenError::InvalidLifetime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status_code.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        ErrorResponse::send(message).with_status(status_code).into_response()
    }
}
