//! Product catalogue model.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ValidationError;
use crate::coded::{self, Coded};

/// Availability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    Unspecified,
    Active,
    Inactive,
    OutOfStock,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 4] = [
        ProductStatus::Unspecified,
        ProductStatus::Active,
        ProductStatus::Inactive,
        ProductStatus::OutOfStock,
    ];

    /// Returns the database code (`0..=3`).
    pub fn code(&self) -> i16 {
        match self {
            ProductStatus::Unspecified => 0,
            ProductStatus::Active => 1,
            ProductStatus::Inactive => 2,
            ProductStatus::OutOfStock => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Unspecified => "UNSPECIFIED",
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
            ProductStatus::OutOfStock => "OUT_OF_STOCK",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product status: {0}")]
pub struct UnknownProductStatus(pub String);

impl FromStr for ProductStatus {
    type Err = UnknownProductStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i16>() {
            return Self::from_code(code).ok_or_else(|| UnknownProductStatus(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownProductStatus(s.to_string()))
    }
}

impl Coded for ProductStatus {
    const EXPECTING: &'static str = "a product status name or code 0-3";

    fn from_code(code: i64) -> Option<Self> {
        i16::try_from(code).ok().and_then(ProductStatus::from_code)
    }

    fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl<'de> Deserialize<'de> for ProductStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        coded::deserialize(deserializer)
    }
}

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Unit price in minor currency units.
    pub price: i64,

    pub stock: i32,
    pub category: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_fields(name: &str, price: i64, stock: i32) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if price <= 0 {
        return Err(ValidationError::NonPositivePrice(price));
    }
    if stock < 0 {
        return Err(ValidationError::NegativeStock(stock));
    }
    Ok(())
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.price, self.stock)
    }

    /// Fills in id, timestamps and the default ACTIVE status.
    pub fn prepare(self, now: DateTime<Utc>) -> Product {
        let status = match self.status {
            ProductStatus::Unspecified => ProductStatus::Active,
            other => other,
        };

        Product {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(common::new_id),
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Replacement values for an existing product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: ProductStatus,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.price, self.stock)
    }

    /// Applies the update to `current`, keeping its id and creation time.
    ///
    /// An UNSPECIFIED status leaves the current status in place.
    pub fn apply_to(self, current: &Product, now: DateTime<Utc>) -> Product {
        let status = match self.status {
            ProductStatus::Unspecified => current.status,
            other => other,
        };

        Product {
            id: current.id.clone(),
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            status,
            created_at: current.created_at,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp_now;

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            price: 1299,
            stock: 4,
            category: "tools".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn prepare_defaults_status_to_active() {
        let product = new_product().prepare(timestamp_now());
        assert_eq!(product.status, ProductStatus::Active);
        assert!(!product.id.is_empty());
    }

    #[test]
    fn validate_rules() {
        assert!(new_product().validate().is_ok());

        let mut p = new_product();
        p.name = " ".to_string();
        assert_eq!(p.validate(), Err(ValidationError::NameRequired));

        let mut p = new_product();
        p.price = 0;
        assert_eq!(p.validate(), Err(ValidationError::NonPositivePrice(0)));

        let mut p = new_product();
        p.stock = -1;
        assert_eq!(p.validate(), Err(ValidationError::NegativeStock(-1)));
    }

    #[test]
    fn update_keeps_identity_and_creation_time() {
        let created = new_product().prepare(timestamp_now());
        let update = ProductUpdate {
            name: "Widget Pro".to_string(),
            price: 1999,
            stock: 0,
            status: ProductStatus::OutOfStock,
            ..Default::default()
        };

        let later = timestamp_now();
        let updated = update.apply_to(&created, later);

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.name, "Widget Pro");
        assert_eq!(updated.status, ProductStatus::OutOfStock);
    }

    #[test]
    fn update_with_unspecified_status_keeps_current() {
        let created = new_product().prepare(timestamp_now());
        let update = ProductUpdate {
            name: "Widget".to_string(),
            price: 1,
            ..Default::default()
        };
        let updated = update.apply_to(&created, timestamp_now());
        assert_eq!(updated.status, ProductStatus::Active);
    }

    #[test]
    fn status_codes_and_names() {
        for status in ProductStatus::ALL {
            assert_eq!(ProductStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(
            "out_of_stock".parse::<ProductStatus>(),
            Ok(ProductStatus::OutOfStock)
        );
        let parsed: ProductStatus = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, ProductStatus::Inactive);
    }
}
