//! Product service entry point.

use std::sync::Arc;

use api::config::{Config, ServiceDefaults, StoreBackend};
use api::startup::{self, StartupError};
use service::ProductService;
use storage::InMemoryStore;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = Config::from_env(ServiceDefaults::PRODUCTS)?;
    startup::init_tracing(&config)?;
    let metrics_handle = startup::install_metrics()?;

    let app = match config.store_backend {
        StoreBackend::Postgres => {
            let store = startup::connect_postgres(&config).await?;
            api::product_app(Arc::new(ProductService::new(store)), metrics_handle)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, data is lost on restart");
            api::product_app(
                Arc::new(ProductService::new(InMemoryStore::new())),
                metrics_handle,
            )
        }
    };

    tracing::info!(backend = ?config.store_backend, "starting product service");
    startup::serve(app, &config.addr()).await
}
