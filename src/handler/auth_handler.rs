use crate::config::logging::secure_log;
use crate::dto::user_dto::{AuthResponseDto, UserLoginDto};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::auth_state::AuthState;
use axum::extract::State;

pub async fn login(
    State(state): State<AuthState>,
    ValidatedRequest(payload): ValidatedRequest<UserLoginDto>,
) -> Result<SuccessResponse<AuthResponseDto>, ApiError> {
    secure_log::sensitive_debug!("Login attempt for email: {}", payload.email);

    let response = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(SuccessResponse::send(response))
}
