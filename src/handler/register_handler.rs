use crate::config::logging::secure_log;
use crate::dto::user_dto::{AuthResponseDto, UserRegisterDto};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::auth_state::AuthState;
use axum::extract::State;
use axum::http::StatusCode;

pub async fn register(
    State(state): State<AuthState>,
    ValidatedRequest(payload): ValidatedRequest<UserRegisterDto>,
) -> Result<SuccessResponse<AuthResponseDto>, ApiError> {
    secure_log::sensitive_debug!("User registration attempt for email: {}", payload.email);

    match state.auth_service.register(payload).await {
        Ok(response) => {
            secure_log::sensitive_debug!("User registration completed for email: {}", response.user.email);
            Ok(SuccessResponse::send(response).with_status(StatusCode::CREATED))
        }
        Err(e) => {
            tracing::warn!("User registration failed: {}", e);
            Err(e)
        }
    }
}
