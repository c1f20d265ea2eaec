//! Outbox entries: the event envelope read by the change-data-capture consumer.
//!
//! An entry is written in the same transaction as the order change it
//! describes, and carries a full snapshot of the order at that moment.
//! Entries are append-only.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Order, timestamp_now};

/// Unique identifier for an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutboxEntryId(Uuid);

impl OutboxEntryId {
    /// Creates a new random entry ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entry ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OutboxEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OutboxEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of aggregate an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    Order,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Order => "order",
        }
    }
}

impl std::fmt::Display for AggregateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The state transition an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxEventType {
    OrderCreated,
    OrderStatusUpdated,
}

impl OutboxEventType {
    /// Returns the value stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxEventType::OrderCreated => "order_created",
            OutboxEventType::OrderStatusUpdated => "order_status_updated",
        }
    }
}

impl std::fmt::Display for OutboxEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `order_outbox` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Unique identifier for this entry.
    pub id: OutboxEntryId,

    /// Always [`AggregateType::Order`] for now.
    pub aggregate_type: AggregateType,

    /// The id of the order this entry describes.
    pub aggregate_id: String,

    pub event_type: OutboxEventType,

    /// JSON snapshot of the order after the write.
    pub payload: serde_json::Value,

    /// When the entry was created. Consumers order and expire by this.
    pub created_at: DateTime<Utc>,
}

impl OutboxEntry {
    /// Records the creation of `order`.
    pub fn order_created(order: &Order) -> Result<Self, serde_json::Error> {
        Self::for_order(OutboxEventType::OrderCreated, order)
    }

    /// Records a status change of `order`. `order` must already carry the new status.
    pub fn order_status_updated(order: &Order) -> Result<Self, serde_json::Error> {
        Self::for_order(OutboxEventType::OrderStatusUpdated, order)
    }

    fn for_order(event_type: OutboxEventType, order: &Order) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_value(order)?;

        Ok(Self {
            id: OutboxEntryId::new(),
            aggregate_type: AggregateType::Order,
            aggregate_id: order.id.to_string(),
            event_type,
            payload,
            created_at: timestamp_now(),
        })
    }

    /// Decodes the payload snapshot.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewOrder, OrderItem, OrderStatus};

    fn order() -> Order {
        NewOrder::new("c1", vec![OrderItem::new("p1", 2, 1000)])
            .prepare(timestamp_now())
            .unwrap()
    }

    #[test]
    fn entry_ids_are_unique() {
        assert_ne!(OutboxEntryId::new(), OutboxEntryId::new());
    }

    #[test]
    fn order_created_entry_carries_snapshot() {
        let order = order();
        let entry = OutboxEntry::order_created(&order).unwrap();

        assert_eq!(entry.aggregate_type, AggregateType::Order);
        assert_eq!(entry.aggregate_id, order.id.as_str());
        assert_eq!(entry.event_type, OutboxEventType::OrderCreated);

        let snapshot: Order = entry.decode_payload().unwrap();
        assert_eq!(snapshot, order);
    }

    #[test]
    fn status_updated_entry_snapshots_new_status() {
        let mut order = order();
        order.status = OrderStatus::Shipped;
        let entry = OutboxEntry::order_status_updated(&order).unwrap();

        assert_eq!(entry.event_type, OutboxEventType::OrderStatusUpdated);
        assert_eq!(entry.payload["status"], "SHIPPED");
    }

    #[test]
    fn each_entry_gets_a_fresh_id() {
        let order = order();
        let a = OutboxEntry::order_created(&order).unwrap();
        let b = OutboxEntry::order_created(&order).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn column_values_match_consumer_contract() {
        assert_eq!(AggregateType::Order.as_str(), "order");
        assert_eq!(OutboxEventType::OrderCreated.as_str(), "order_created");
        assert_eq!(
            OutboxEventType::OrderStatusUpdated.as_str(),
            "order_status_updated"
        );
        assert_eq!(
            serde_json::to_string(&OutboxEventType::OrderStatusUpdated).unwrap(),
            "\"order_status_updated\""
        );
    }
}
