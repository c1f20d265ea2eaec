//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Unique identifier for an order.
///
/// Opaque to clients; generated as a UUID when the caller supplies none.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates an order ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random order ID.
    pub fn generate() -> Self {
        Self(common::new_id())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the ID is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An item in an order.
///
/// `price` is a per-unit snapshot taken when the order was placed, in minor
/// currency units. It does not follow later product price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: String,

    /// Quantity ordered.
    pub quantity: i32,

    /// Price per unit in minor currency units.
    pub price: i64,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: impl Into<String>, quantity: i32, price: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            price,
        }
    }

    /// Returns quantity * price, or `None` if it does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_generate_creates_unique_ids() {
        let id1 = OrderId::generate();
        let id2 = OrderId::generate();
        assert_ne!(id1, id2);
        assert!(!id1.is_empty());
    }

    #[test]
    fn test_order_id_string_conversion() {
        let id = OrderId::new("order-1");
        assert_eq!(id.as_str(), "order-1");

        let id2: OrderId = "order-2".into();
        assert_eq!(id2.to_string(), "order-2");
    }

    #[test]
    fn test_order_id_serializes_transparently() {
        let json = serde_json::to_string(&OrderId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem::new("p1", 3, 1000);
        assert_eq!(item.line_total(), Some(3000));
    }

    #[test]
    fn test_order_item_line_total_overflow() {
        let item = OrderItem::new("p1", 3, i64::MAX / 2);
        assert_eq!(item.line_total(), None);
    }

    #[test]
    fn test_order_item_serialization() {
        let item = OrderItem::new("p1", 2, 999);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product_id": "p1", "quantity": 2, "price": 999})
        );
    }
}
