use crate::config::logging::secure_log;
use crate::config::parameter;
use crate::response::app_response::SuccessResponse;
use crate::state::auth_state::AuthState;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub storage: StorageHealth,
    pub configuration_parameters: usize,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StorageHealth {
    pub status: String,
    pub response_time_ms: Option<u128>,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

pub fn init_start_time() {
    START_TIME.set(Instant::now()).ok();
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// 200 when the credential store answers, 503 otherwise
pub async fn health_check(State(state): State<AuthState>) -> SuccessResponse<HealthStatus> {
    let start_time = Instant::now();

    let storage = match state.user_repo.ping().await {
        Ok(()) => StorageHealth {
            status: "healthy".to_string(),
            response_time_ms: Some(start_time.elapsed().as_millis()),
        },
        Err(e) => {
            secure_log::secure_error!("Storage health check failed", e);
            StorageHealth {
                status: "unhealthy".to_string(),
                response_time_ms: None,
            }
        }
    };

    let status_code = if storage.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    SuccessResponse::send(HealthStatus {
        status: storage.status.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: get_uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage,
        configuration_parameters: parameter::loaded_count(),
    })
    .with_status(status_code)
}
