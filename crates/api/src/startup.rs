//! Process wiring shared by the service binaries.

use axum::Router;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use storage::{PostgresStore, StoreError};
use thiserror::Error;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::{Config, ConfigError, LogFormat};

/// Fatal errors while bringing a service up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Tracing(#[from] TryInitError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` directives go through [`EnvFilter`]; an unparsable value
/// falls back to `info`.
pub fn init_tracing(config: &Config) -> Result<(), StartupError> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (text, json) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()?;
    Ok(())
}

/// Installs the Prometheus recorder and describes the write-path metrics.
pub fn install_metrics() -> Result<PrometheusHandle, StartupError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(
        "order_writes_total",
        "Order writes by operation and outcome"
    );
    metrics::describe_histogram!(
        "order_write_duration_seconds",
        metrics::Unit::Seconds,
        "Latency of order write transactions"
    );
    metrics::describe_counter!(
        "outbox_entries_written_total",
        "Outbox entries committed, by event type"
    );

    Ok(handle)
}

/// Opens the connection pool and applies migrations when enabled.
pub async fn connect_postgres(config: &Config) -> Result<PostgresStore, StartupError> {
    let db = &config.database;
    tracing::info!(
        url = %db.redacted_url(),
        max_connections = db.max_connections,
        "connecting to PostgreSQL"
    );

    let pool = db.pool_options().connect_with(db.connect_options()?).await?;
    let store = PostgresStore::new(pool);

    if config.run_migrations {
        store.run_migrations().await?;
        tracing::info!("database migrations applied");
    }
    Ok(store)
}

/// Binds `addr` and serves `app` until SIGINT or SIGTERM.
pub async fn serve(app: Router, addr: &str) -> Result<(), StartupError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
