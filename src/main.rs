use crate::config::database::DatabaseTrait;
use crate::config::{database, logging, parameter};
use crate::handler::health_handler;
use crate::middleware::rate_limit::{RateLimitState, start_cleanup_task};
use crate::repository::memory_user_repository::InMemoryUserRepository;
use crate::repository::user_repository::{UserRepository, UserRepositoryTrait};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

mod config;
mod dto;
mod entity;
mod error;
mod handler;
mod middleware;
mod repository;
mod response;
mod routes;
mod service;
mod state;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_subscriber();
    parameter::init();
    logging::init();

    info!("Starting RoomKeep authentication service...");

    health_handler::init_start_time();

    let user_repo = match storage_backend().await {
        Ok(repo) => repo,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
    };

    let server_address = parameter::get("SERVER_ADDRESS");
    let server_port = parameter::get("SERVER_PORT");
    let host = format!("{}:{}", server_address, server_port);
    info!("Server will bind to: {}", host);

    let rate_limit_state = RateLimitState::new(
        parameter::get_u32("AUTH_RATE_LIMIT_REQUESTS"),
        parameter::get_u64("AUTH_RATE_LIMIT_WINDOW_SECONDS"),
    );

    let cleanup_shutdown_token = tokio_util::sync::CancellationToken::new();
    let cleanup_task_handle = start_cleanup_task(
        rate_limit_state.clone(),
        parameter::get_u64("RATE_LIMIT_CLEANUP_INTERVAL_SECONDS"),
        cleanup_shutdown_token.clone(),
    );
    info!("Rate limit cleanup task started");

    // Secrets are validated here, before the socket is bound
    let app = match routes::root::routes(user_repo, rate_limit_state) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to initialize routes: {}", e);
            cleanup_shutdown_token.cancel();
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
    };

    let listener = match tokio::net::TcpListener::bind(&host).await {
        Ok(listener) => {
            info!("Server successfully bound to {}", host);
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", host, e);
            cleanup_shutdown_token.cancel();
            return Err(e.into());
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, initiating graceful shutdown...");
                cleanup_shutdown_token.cancel();
                let _ = shutdown_tx.send(());
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    info!("Server starting...");

    match axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        shutdown_rx.await.ok();
        if let Err(e) = cleanup_task_handle.await {
            error!("Error waiting for cleanup task to finish: {}", e);
        }
    })
    .await
    {
        Ok(_) => {
            info!("Server shutdown gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}

/// `STORAGE_BACKEND=memory` keeps accounts in process and loses them on exit.
async fn storage_backend() -> Result<Arc<dyn UserRepositoryTrait>, sqlx::Error> {
    match parameter::get("STORAGE_BACKEND").to_lowercase().as_str() {
        "memory" => {
            warn!("Using in-memory credential store; accounts will not survive a restart");
            let repo: Arc<dyn UserRepositoryTrait> = InMemoryUserRepository::new_shared();
            Ok(repo)
        }
        backend => {
            if backend != "postgres" {
                warn!("Unknown STORAGE_BACKEND '{}', falling back to postgres", backend);
            }
            let connection = Arc::new(database::Database::init().await?);
            info!("Database connection established successfully");
            let repo: Arc<dyn UserRepositoryTrait> = Arc::new(UserRepository::new(&connection));
            Ok(repo)
        }
    }
}
