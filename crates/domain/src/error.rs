//! Domain error types.

use thiserror::Error;

use crate::OrderStatus;

/// A caller-supplied value violates a precondition.
///
/// Validation errors are reported synchronously and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An entity identifier was empty.
    #[error("{entity} id is required")]
    IdRequired { entity: &'static str },

    /// Customer ID is required.
    #[error("customer_id is required")]
    CustomerIdRequired,

    /// Order has no items.
    #[error("at least one item is required")]
    NoItems,

    /// An order item has no product reference.
    #[error("item {index}: product_id is required")]
    ProductIdRequired { index: usize },

    /// Invalid item quantity.
    #[error("item {index}: invalid quantity {quantity} (must be greater than 0)")]
    InvalidQuantity { index: usize, quantity: i32 },

    /// Invalid item price.
    #[error("item {index}: invalid price {price} (cannot be negative)")]
    NegativePrice { index: usize, price: i64 },

    /// An explicit order total was negative.
    #[error("invalid total_amount {0} (cannot be negative)")]
    NegativeTotal(i64),

    /// New orders always start as PENDING.
    #[error("initial status must be PENDING, got {0}")]
    InitialStatus(OrderStatus),

    /// The item total does not fit in an `i64`.
    #[error("order total overflows")]
    TotalOverflow,

    /// The UNSPECIFIED sentinel was supplied where a real status is needed.
    #[error("status must not be UNSPECIFIED")]
    UnspecifiedStatus,

    /// Product name is required.
    #[error("name is required")]
    NameRequired,

    /// Product price must be positive.
    #[error("invalid price {0} (must be greater than 0)")]
    NonPositivePrice(i64),

    /// Product stock cannot go below zero.
    #[error("invalid stock {0} (cannot be negative)")]
    NegativeStock(i32),
}
