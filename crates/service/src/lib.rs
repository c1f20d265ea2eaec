//! Application services for orders and products.
//!
//! [`OrderService`] owns the outbox write path: every order write and the
//! outbox entry describing it commit in one transaction or not at all.

pub mod error;
pub mod order;
pub mod product;
pub mod recorder;

pub use error::{Result, ServiceError};
pub use order::{DEFAULT_TX_TIMEOUT, OrderService};
pub use product::ProductService;
pub use recorder::{NoopMetrics, Outcome, PrometheusMetrics, WriteMetrics, WriteOperation};
