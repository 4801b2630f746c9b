use crate::error::db_error::DbError;
use crate::error::request_error::RequestError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Token(error) => error.into_response(),
            ApiError::User(error) => error.into_response(),
            ApiError::Db(error) => error.into_response(),
            ApiError::Request(error) => error.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (UserError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (UserError::UserAlreadyExists.into(), StatusCode::CONFLICT),
            (TokenError::InvalidRefreshToken.into(), StatusCode::UNAUTHORIZED),
            (TokenError::MissingToken.into(), StatusCode::UNAUTHORIZED),
            (TokenError::TokenCreationError("boom".to_string()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (DbError::SomethingWentWrong("boom".to_string()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
