use super::auth;
use crate::config::parameter;
use crate::error::token_error::TokenError;
use crate::handler::{api_handler, health_handler};
use crate::middleware::rate_limit::RateLimitState;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::token_service::TokenService;
use crate::state::auth_state::AuthState;
use crate::state::token_state::TokenState;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application from the loaded parameters. Fails when the JWT
/// secrets are missing or unusable.
pub fn routes(
    user_repo: Arc<dyn UserRepositoryTrait>,
    rate_limit_state: RateLimitState,
) -> Result<Router, TokenError> {
    let token_service = TokenService::from_parameters()?;
    let bcrypt_cost = parameter::get_u32("BCRYPT_COST");

    Ok(build_router(user_repo, token_service, bcrypt_cost, rate_limit_state))
}

pub fn build_router(
    user_repo: Arc<dyn UserRepositoryTrait>,
    token_service: TokenService,
    bcrypt_cost: u32,
    rate_limit_state: RateLimitState,
) -> Router {
    let auth_state = AuthState::new(user_repo.clone(), token_service.clone(), bcrypt_cost);
    let token_state = TokenState::new(user_repo, token_service);

    let api_router = Router::<AuthState>::new()
        .nest("/auth", auth::routes(token_state, rate_limit_state))
        .route("/health", get(health_handler::health_check))
        .with_state(auth_state);

    Router::new()
        .nest("/api", api_router)
        .fallback(api_handler::not_found)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_user_repository::InMemoryUserRepository;
    use crate::service::token_service::tests::test_settings;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        app_with_limit(RateLimitState::new(10, 15))
    }

    fn app_with_limit(rate_limit_state: RateLimitState) -> Router {
        build_router(
            InMemoryUserRepository::new_shared(),
            TokenService::new(test_settings()).unwrap(),
            4,
            rate_limit_state,
        )
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn register_body() -> Value {
        json!({
            "email": "a@b.com",
            "password": "Abcdef12",
            "confirmPassword": "Abcdef12",
            "fullName": "A B",
            "phone": "123"
        })
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let app = app();

        let (status, body) = send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["user"]["email"], json!("a@b.com"));
        assert_eq!(body["data"]["user"]["role"], json!("owner"));
        assert!(body["data"]["user"].get("password").is_none());
        assert!(!body["data"]["tokens"]["accessToken"].as_str().unwrap().is_empty());
        assert!(!body["data"]["tokens"]["refreshToken"].as_str().unwrap().is_empty());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "a@b.com", "password": "Abcdef12"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["data"]["tokens"]["accessToken"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_accepts_differently_cased_padded_email() {
        let app = app();
        let mut body = register_body();
        body["email"] = json!("A@B.com");

        let (status, registered) = send(&app, "POST", "/api/auth/register", Some(body), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered["data"]["user"]["email"], json!("a@b.com"));

        let (status, logged_in) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "  a@b.COM ", "password": "Abcdef12"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logged_in["data"]["user"]["id"], registered["data"]["user"]["id"]);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let app = app();
        send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;

        let (wrong_status, wrong_body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "a@b.com", "password": "wrong"})),
            None,
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "nobody@b.com", "password": "Abcdef12"})),
            None,
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
        assert!(wrong_body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_confirmation() {
        let app = app();
        let mut body = register_body();
        body["confirmPassword"] = json!("Abcdef13");

        let (status, response) = send(&app, "POST", "/api/auth/register", Some(body), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["errors"][0]["field"], json!("confirmPassword"));
        assert_eq!(response["errors"][0]["type"], json!("MISMATCH"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "a@b.com", "password": "Abcdef12"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = app();
        send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;

        let mut body = register_body();
        body["email"] = json!("A@B.COM");
        let (status, _) = send(&app, "POST", "/api/auth/register", Some(body), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_logout() {
        let app = app();
        let (_, registered) = send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;
        let first_refresh = registered["data"]["tokens"]["refreshToken"].clone();

        let (status, refreshed) = send(
            &app,
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": first_refresh})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access_token = refreshed["data"]["accessToken"].as_str().unwrap().to_string();
        let second_refresh = refreshed["data"]["refreshToken"].clone();

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": first_refresh})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/api/auth/logout", None, Some(&access_token)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/refresh",
            Some(json!({"refreshToken": second_refresh})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_requires_access_token() {
        let app = app();
        let (_, registered) = send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;
        let access_token = registered["data"]["tokens"]["accessToken"].as_str().unwrap().to_string();
        let refresh_token = registered["data"]["tokens"]["refreshToken"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "GET", "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/auth/profile", None, Some(&refresh_token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, "GET", "/api/auth/profile", None, Some(&access_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["fullName"], json!("A B"));

        let (status, _) = send(&app, "POST", "/api/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_is_rate_limited() {
        let app = app();
        let body = json!({"email": "nobody@b.com", "password": "Abcdef12"});

        for _ in 0..10 {
            let (status, _) = send(&app, "POST", "/api/auth/login", Some(body.clone()), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, response) = send(&app, "POST", "/api/auth/login", Some(body), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response["success"], json!(false));
    }

    #[tokio::test]
    async fn test_register_is_rate_limited() {
        let app = app();

        for i in 0..10 {
            let mut body = register_body();
            body["email"] = json!(format!("user{}@b.com", i));
            let (status, _) = send(&app, "POST", "/api/auth/register", Some(body), None).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let mut body = register_body();
        body["email"] = json!("late@b.com");
        let (status, _) = send(&app, "POST", "/api/auth/register", Some(body), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_register_and_login_share_one_budget() {
        let app = app();
        let login = json!({"email": "a@b.com", "password": "Abcdef12"});

        let (status, _) = send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;
        assert_eq!(status, StatusCode::CREATED);
        for _ in 0..4 {
            let (status, _) = send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;
            assert_eq!(status, StatusCode::CONFLICT);
        }
        for _ in 0..5 {
            let (status, _) = send(&app, "POST", "/api/auth/login", Some(login.clone()), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = send(&app, "POST", "/api/auth/login", Some(login), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let (status, _) = send(&app, "POST", "/api/auth/register", Some(register_body()), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_refresh_is_not_rate_limited() {
        let app = app_with_limit(RateLimitState::new(1, 15));

        for _ in 0..3 {
            let (status, _) = send(
                &app,
                "POST",
                "/api/auth/refresh",
                Some(json!({"refreshToken": "garbage"})),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_health_and_unknown_route() {
        let app = app();

        let (status, body) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], json!("healthy"));

        let (status, body) = send(&app, "GET", "/api/rooms", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }
}
