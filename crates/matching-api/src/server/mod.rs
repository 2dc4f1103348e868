//! Server setup and initialization
//!
//! Wires configuration into the service context, builds the router and runs
//! the HTTP server next to the payment reconciler.

use std::sync::Arc;

use axum::Router;
use matching_common::{AppConfig, AppError, JwtService};
use matching_core::SnowflakeGenerator;
use matching_db::{apply_schema, create_pool};
use matching_payment::HttpPaymentGateway;
use matching_service::{Reconciler, ServiceContext, ServiceContextBuilder, ServiceSettings};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
///
/// # Errors
/// Returns an error if the middleware configuration is invalid
pub fn create_app(state: AppState, config: &AppConfig) -> Result<Router, AppError> {
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    )?;
    let health = apply_middleware(health_routes());

    Ok(api.merge(health).with_state(state))
}

/// Connect to PostgreSQL and the payment gateway and build the service context
///
/// # Errors
/// Returns an error if the database is unreachable or a setting is invalid
pub async fn create_service_context(config: &AppConfig) -> Result<ServiceContext, AppError> {
    info!("Connecting to PostgreSQL...");
    let db_config = matching_db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..Default::default()
    };
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    if config.database.run_migrations {
        apply_schema(&pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
    }

    let gateway = HttpPaymentGateway::new(&config.payment)
        .map_err(|e| AppError::Config(e.to_string()))?;

    let worker_id = config.snowflake.worker_id;
    if worker_id > SnowflakeGenerator::MAX_WORKER_ID {
        return Err(AppError::Config(format!(
            "WORKER_ID must be at most {}, got {worker_id}",
            SnowflakeGenerator::MAX_WORKER_ID
        )));
    }

    ServiceContextBuilder::new()
        .postgres(pool)
        .gateway(Arc::new(gateway))
        .snowflake_generator(Arc::new(SnowflakeGenerator::new(worker_id)))
        .settings(ServiceSettings::from_config(config))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))
}

/// Resolves on Ctrl+C (or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Run the HTTP server until a shutdown signal arrives
///
/// # Errors
/// Returns an error if the address cannot be bound or serving fails
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
///
/// # Errors
/// Returns an error if startup fails or the server stops with an error
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let service_context = Arc::new(create_service_context(&config).await?);
    let state = AppState::new(
        Arc::clone(&service_context),
        JwtService::new(&config.jwt.secret),
    );
    let app = create_app(state, &config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = if config.settlement.reconcile_enabled {
        Some(tokio::spawn(Reconciler::new(service_context).run(shutdown_rx)))
    } else {
        info!("Payment reconciler disabled");
        None
    };

    let served = run_server(app, &config.api.address()).await;

    // Stop the sweep even when the server failed
    let _ = shutdown_tx.send(true);
    if let Some(task) = reconciler {
        if let Err(e) = task.await {
            warn!(error = %e, "Reconciler task ended abnormally");
        }
    }

    served
}
