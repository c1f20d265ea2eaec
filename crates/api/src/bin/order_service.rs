//! Order service entry point.

use std::sync::Arc;

use api::config::{Config, ServiceDefaults, StoreBackend};
use api::startup::{self, StartupError};
use service::{OrderService, PrometheusMetrics};
use storage::InMemoryStore;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = Config::from_env(ServiceDefaults::ORDERS)?;
    startup::init_tracing(&config)?;
    let metrics_handle = startup::install_metrics()?;

    let app = match config.store_backend {
        StoreBackend::Postgres => {
            let store = startup::connect_postgres(&config).await?;
            let service = OrderService::new(store.clone(), store, Arc::new(PrometheusMetrics))
                .with_tx_timeout(config.tx_timeout);
            api::order_app(Arc::new(service), metrics_handle)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, data is lost on restart");
            let store = InMemoryStore::new();
            let service = OrderService::new(store.clone(), store, Arc::new(PrometheusMetrics))
                .with_tx_timeout(config.tx_timeout);
            api::order_app(Arc::new(service), metrics_handle)
        }
    };

    tracing::info!(
        backend = ?config.store_backend,
        tx_timeout_ms = config.tx_timeout.as_millis() as u64,
        "starting order service"
    );
    startup::serve(app, &config.addr()).await
}
