//! graphsync service
//!
//! Connects Eliona to Microsoft 365: periodic room/equipment collection per
//! configured tenant, booking management through an interactive device-code
//! flow, and a tenant fan-out proxy for arbitrary Graph calls.

mod config;
mod eliona;
mod logging;

use config::Config;
use eliona::ElionaBackend;
use graphsync_api::{api_router, ApiState};
use graphsync_collector::Collector;
use graphsync_msgraph::GraphEnvironment;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Pause between scheduling rounds of the collector.
const COLLECTOR_TICK: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.api_server_port,
        "starting graphsync"
    );

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("database connection established");
            pool
        }
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = graphsync_db::migrations::run(&pool).await {
        eprintln!("Failed to run migrations: {e}");
        std::process::exit(1);
    }

    let backend = Arc::new(ElionaBackend::new(
        config.api_endpoint.clone(),
        config.api_token.clone(),
    ));
    let env = GraphEnvironment::default();

    let collector = Arc::new(Collector::new(pool.clone(), backend, env.clone()));
    tokio::spawn(collector.run(COLLECTOR_TICK));
    info!("collector started");

    let app = api_router(ApiState::new(pool, env))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_server_port));
    info!(%addr, "API server listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("API server error: {e}");
        std::process::exit(1);
    }

    info!("server shutdown complete");
}

/// Completes on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
