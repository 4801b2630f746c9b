use crate::dto::token_dto::{LogoutResponseDto, RefreshTokenRequestDto, TokenPairDto};
use crate::entity::user::User;
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::auth_state::AuthState;
use axum::Extension;
use axum::extract::State;

/// Exchange a refresh token for a new pair
pub async fn refresh_token(
    State(state): State<AuthState>,
    ValidatedRequest(payload): ValidatedRequest<RefreshTokenRequestDto>,
) -> Result<SuccessResponse<TokenPairDto>, ApiError> {
    let tokens = state
        .auth_service
        .refresh_with_token(&payload.refresh_token)
        .await?;

    Ok(SuccessResponse::send(tokens))
}

/// End the caller's session
pub async fn logout(
    State(state): State<AuthState>,
    Extension(current_user): Extension<User>,
) -> Result<SuccessResponse<LogoutResponseDto>, ApiError> {
    state.auth_service.logout(current_user.id).await?;

    Ok(SuccessResponse::send(LogoutResponseDto {
        message: "Logged out successfully".to_string(),
    }))
}
