use crate::config::logging::secure_log;
use crate::response::app_response::ErrorResponse;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Sliding-window limiter shared across requests
#[derive(Clone)]
pub struct RateLimitState {
    /// Map of client key to request history
    attempts: Arc<DashMap<String, Vec<Instant>>>,
    /// Maximum requests per window
    max_requests: u32,
    /// Time window duration
    window_duration: Duration,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    /// Records an attempt and reports whether it is within the limit
    pub fn check_rate_limit(&self, client: &str) -> bool {
        let now = Instant::now();

        let mut attempts = self.attempts.entry(client.to_string()).or_default();
        attempts.retain(|&time| now.duration_since(time) < self.window_duration);

        if attempts.len() < self.max_requests as usize {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Drops clients with no attempts inside the window
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.attempts.len();

        self.attempts.retain(|_, attempts| {
            attempts.retain(|&time| now.duration_since(time) < self.window_duration);
            !attempts.is_empty()
        });

        before.saturating_sub(self.attempts.len())
    }
}

/// Client identity: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer when the server was started with connect info.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded_for) = headers.get("x-forwarded-for")
        && let Ok(forwarded_str) = forwarded_for.to_str()
        && let Some(first_ip) = forwarded_str.split(',').next()
    {
        let ip = first_ip.trim();
        if !ip.is_empty() && ip != "unknown" {
            return Some(ip.to_string());
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(real_ip_str) = real_ip.to_str()
        && !real_ip_str.is_empty()
        && real_ip_str != "unknown"
    {
        return Some(real_ip_str.to_string());
    }

    peer.map(|addr| addr.ip().to_string())
}

/// Rate limiting middleware for register and login
pub async fn rate_limit_auth(
    State(state): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    // Nothing to key on (in-process calls); let the request through
    let Some(client) = client_key(req.headers(), peer) else {
        return next.run(req).await;
    };

    if !state.check_rate_limit(&client) {
        tracing::warn!("SECURITY: Rate limit exceeded on authentication endpoint");
        secure_log::sensitive_debug!("Rate limited client: {}", client);

        return ErrorResponse::send("Too many requests, please try again later".to_string())
            .with_status(StatusCode::TOO_MANY_REQUESTS)
            .into_response();
    }

    next.run(req).await
}

/// Periodic pruning of idle clients, stopped by `shutdown_token`
pub fn start_cleanup_task(
    state: RateLimitState,
    interval_seconds: u64,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    let interval_duration = Duration::from_secs(interval_seconds.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval_duration);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let cleaned = state.cleanup();
                    if cleaned > 0 {
                        tracing::debug!("Pruned {} idle rate limit entries", cleaned);
                    }
                }
                _ = shutdown_token.cancelled() => {
                    tracing::info!("Rate limit cleanup task received shutdown signal, stopping gracefully");
                    break;
                }
            }
        }

        tracing::info!("Rate limit cleanup task stopped");
    })
}
