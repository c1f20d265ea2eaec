//! Domain layer for the ordering services.
//!
//! This crate holds the plain data models and their invariants:
//! - Order, OrderItem and OrderStatus
//! - Product and ProductStatus
//! - OutboxEntry, the event envelope read by the change-data-capture consumer
//!
//! Nothing here performs I/O.

mod coded;
pub mod error;
pub mod order;
pub mod outbox;
pub mod product;
pub mod time;

pub use error::ValidationError;
pub use order::{NewOrder, Order, OrderId, OrderItem, OrderStatus, UnknownOrderStatus};
pub use outbox::{AggregateType, OutboxEntry, OutboxEntryId, OutboxEventType};
pub use product::{NewProduct, Product, ProductStatus, ProductUpdate, UnknownProductStatus};
pub use time::timestamp_now;
