use crate::config::logging::secure_log;
use crate::entity::user::User;
use crate::error::api_error::ApiError;
use crate::error::token_error::TokenError;
use crate::service::token_service::TokenServiceTrait;
use crate::state::token_state::TokenState;
use axum::extract::{Request, State};
use axum::{http, middleware::Next, response::Response};
use tracing::info;

/// Resolves `Authorization: Bearer <access token>` to an active user and
/// stores it as a request extension.
pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| {
            secure_log::secure_error!("Missing authorization header");
            TokenError::MissingToken
        })?;

    if token.is_empty() {
        secure_log::secure_error!("Empty authorization token");
        return Err(TokenError::MissingToken)?;
    }

    let claims = state.token_service.retrieve_access_claims(token).map_err(|e| {
        secure_log::secure_error!("Access token rejected", e);
        e
    })?;

    let user: User = state
        .user_repo
        .find(claims.sub)
        .await?
        .filter(User::can_authenticate)
        .ok_or_else(|| {
            secure_log::secure_error!("Token subject is missing or inactive", claims.sub);
            TokenError::InvalidToken
        })?;

    info!("SECURITY: Authentication successful for user ID: {}", user.id);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
