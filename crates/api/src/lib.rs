//! HTTP surface for the order and product services.
//!
//! Each service gets its own router with JSON endpoints, a health check and
//! a Prometheus scrape endpoint. Startup helpers shared by the two binaries
//! live in [`startup`].

pub mod config;
pub mod error;
pub mod routes;
pub mod startup;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use service::{OrderService, ProductService};
use storage::{OrderStore, OutboxStore, ProductStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the order service router.
pub fn order_app<S, O>(service: Arc<OrderService<S, O>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    O: OutboxStore<Tx = S::Tx> + 'static,
{
    let api = Router::new()
        .route(
            "/orders",
            get(routes::orders::list::<S, O>).post(routes::orders::create::<S, O>),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S, O>).patch(routes::orders::update_status::<S, O>),
        )
        .route("/health", get(routes::health::orders))
        .with_state(service);

    with_observability(api, metrics_handle)
}

/// Creates the product service router.
pub fn product_app<P>(service: Arc<ProductService<P>>, metrics_handle: PrometheusHandle) -> Router
where
    P: ProductStore + 'static,
{
    let api = Router::new()
        .route(
            "/products",
            get(routes::products::list::<P>).post(routes::products::create::<P>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<P>)
                .put(routes::products::update::<P>)
                .patch(routes::products::update::<P>)
                .delete(routes::products::delete::<P>),
        )
        .route("/health", get(routes::health::products))
        .with_state(service);

    with_observability(api, metrics_handle)
}

fn with_observability(api: Router, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    api.merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
