//! The order aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderItem, OrderStatus};
use crate::ValidationError;

/// A persisted order.
///
/// Items are fixed at creation. Only `status` and `updated_at` change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,

    /// Total in minor currency units.
    pub total_amount: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sums `price * quantity` over the items. `None` on `i64` overflow.
    pub fn items_total(items: &[OrderItem]) -> Option<i64> {
        items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.line_total()?))
    }

    /// Returns the number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns true when `total_amount` matches the items.
    ///
    /// False only when the creator supplied an explicit override.
    pub fn total_matches_items(&self) -> bool {
        Self::items_total(&self.items) == Some(self.total_amount)
    }
}

/// Input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Caller-chosen id. A fresh one is generated when absent.
    pub id: Option<OrderId>,

    pub customer_id: String,
    pub items: Vec<OrderItem>,

    /// Initial status. Must be `Pending` or `Unspecified`; orders always
    /// start out pending.
    pub status: OrderStatus,

    /// Explicit total. Computed from the items when absent.
    pub total_amount: Option<i64>,
}

impl NewOrder {
    /// Creates a pending order request for a customer.
    pub fn new(customer_id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            id: None,
            customer_id: customer_id.into(),
            items,
            status: OrderStatus::Pending,
            total_amount: None,
        }
    }

    /// Uses a caller-chosen id instead of a generated one.
    pub fn with_id(mut self, id: impl Into<OrderId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Overrides the computed total.
    pub fn with_total_amount(mut self, total_amount: i64) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    /// Checks the creation preconditions.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_id.trim().is_empty() {
            return Err(ValidationError::CustomerIdRequired);
        }

        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.product_id.trim().is_empty() {
                return Err(ValidationError::ProductIdRequired { index });
            }
            if item.quantity <= 0 {
                return Err(ValidationError::InvalidQuantity {
                    index,
                    quantity: item.quantity,
                });
            }
            if item.price < 0 {
                return Err(ValidationError::NegativePrice {
                    index,
                    price: item.price,
                });
            }
        }

        if !matches!(self.status, OrderStatus::Unspecified | OrderStatus::Pending) {
            return Err(ValidationError::InitialStatus(self.status));
        }

        if Order::items_total(&self.items).is_none() {
            return Err(ValidationError::TotalOverflow);
        }
        if let Some(total) = self.total_amount
            && total < 0
        {
            return Err(ValidationError::NegativeTotal(total));
        }

        Ok(())
    }

    /// Validates, then fills in server-assigned fields: id, timestamps,
    /// total and the `Pending` status.
    pub fn prepare(self, now: DateTime<Utc>) -> Result<Order, ValidationError> {
        self.validate()?;

        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(OrderId::generate);
        let total_amount = match self.total_amount {
            Some(total) => total,
            None => Order::items_total(&self.items).ok_or(ValidationError::TotalOverflow)?,
        };

        Ok(Order {
            id,
            customer_id: self.customer_id,
            items: self.items,
            status: OrderStatus::Pending,
            total_amount,
            created_at: now,
            updated_at: now,
        })
    }
}
