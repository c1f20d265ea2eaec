//! Order status.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::coded::{self, Coded};

/// The status of an order.
///
/// No transition table is enforced: any status may follow any other.
/// `Unspecified` is a sentinel and is never persisted as a final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Unspecified,
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in code order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Unspecified,
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns the database code (`0..=5`).
    pub fn code(&self) -> i16 {
        match self {
            OrderStatus::Unspecified => 0,
            OrderStatus::Pending => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 5,
        }
    }

    /// Looks up a status by its database code.
    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Returns true for the UNSPECIFIED sentinel.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, OrderStatus::Unspecified)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unspecified => "UNSPECIFIED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string names no order status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i16>() {
            return Self::from_code(code).ok_or_else(|| UnknownOrderStatus(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

impl Coded for OrderStatus {
    const EXPECTING: &'static str = "an order status name or code 0-5";

    fn from_code(code: i64) -> Option<Self> {
        i16::try_from(code).ok().and_then(OrderStatus::from_code)
    }

    fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        coded::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_unspecified() {
        assert_eq!(OrderStatus::default(), OrderStatus::Unspecified);
        assert!(OrderStatus::default().is_unspecified());
    }

    #[test]
    fn test_codes_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code(6), None);
        assert_eq!(OrderStatus::from_code(-1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "PENDING");
        assert_eq!(OrderStatus::Shipped.to_string(), "SHIPPED");
        assert_eq!(OrderStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(" Delivered ".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert_eq!("2".parse::<OrderStatus>(), Ok(OrderStatus::Processing));
        assert!("lost".parse::<OrderStatus>().is_err());
        assert!("9".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }

    #[test]
    fn test_deserializes_from_name_or_code() {
        let from_name: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        let from_code: OrderStatus = serde_json::from_str("5").unwrap();
        assert_eq!(from_name, OrderStatus::Cancelled);
        assert_eq!(from_code, OrderStatus::Cancelled);

        assert!(serde_json::from_str::<OrderStatus>("42").is_err());
        assert!(serde_json::from_str::<OrderStatus>("\"LOST\"").is_err());
    }
}
