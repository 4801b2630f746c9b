use crate::handler::{auth_handler, profile_handler, refresh_handler, register_handler};
use crate::middleware::auth as auth_middleware;
use crate::middleware::rate_limit::{self, RateLimitState};
use crate::state::auth_state::AuthState;
use crate::state::token_state::TokenState;
use axum::routing::{get, post};
use axum::{Router, middleware};

pub fn routes(token_state: TokenState, rate_limit_state: RateLimitState) -> Router<AuthState> {
    // Register and login draw from one per-client budget
    let rate_limited = Router::<AuthState>::new()
        .route("/register", post(register_handler::register))
        .route("/login", post(auth_handler::login))
        .route_layer(middleware::from_fn_with_state(
            rate_limit_state,
            rate_limit::rate_limit_auth,
        ));

    let authenticated = Router::<AuthState>::new()
        .route("/logout", post(refresh_handler::logout))
        .route("/profile", get(profile_handler::profile))
        .route_layer(middleware::from_fn_with_state(token_state, auth_middleware::auth));

    Router::<AuthState>::new()
        .route("/refresh", post(refresh_handler::refresh_token))
        .merge(rate_limited)
        .merge(authenticated)
}
