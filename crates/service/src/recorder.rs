//! Write-path metrics.
//!
//! Services record through a [`WriteMetrics`] handed to their constructor.
//! Binaries pass [`PrometheusMetrics`]; tests usually pass [`NoopMetrics`].

use std::time::Duration;

use domain::OutboxEventType;

use crate::ServiceError;

/// The write being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    CreateOrder,
    UpdateOrderStatus,
}

impl WriteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOperation::CreateOrder => "create_order",
            WriteOperation::UpdateOrderStatus => "update_order_status",
        }
    }
}

/// How a write ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Invalid,
    NotFound,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Invalid => "invalid",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }

    pub fn of<T>(result: &Result<T, ServiceError>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(ServiceError::Validation(_) | ServiceError::AlreadyExists { .. }) => {
                Outcome::Invalid
            }
            Err(ServiceError::NotFound { .. }) => Outcome::NotFound,
            Err(_) => Outcome::Error,
        }
    }
}

/// Receives write-path measurements.
pub trait WriteMetrics: Send + Sync {
    /// Called once per write attempt, whatever the outcome.
    fn record_write(&self, operation: WriteOperation, outcome: Outcome, elapsed: Duration);

    /// Called once per committed outbox entry.
    fn record_outbox_entry(&self, event_type: OutboxEventType);
}

/// Records into the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl WriteMetrics for PrometheusMetrics {
    fn record_write(&self, operation: WriteOperation, outcome: Outcome, elapsed: Duration) {
        metrics::counter!(
            "order_writes_total",
            "operation" => operation.as_str(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!("order_write_duration_seconds", "operation" => operation.as_str())
            .record(elapsed.as_secs_f64());
    }

    fn record_outbox_entry(&self, event_type: OutboxEventType) {
        metrics::counter!("outbox_entries_written_total", "event_type" => event_type.as_str())
            .increment(1);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl WriteMetrics for NoopMetrics {
    fn record_write(&self, _: WriteOperation, _: Outcome, _: Duration) {}

    fn record_outbox_entry(&self, _: OutboxEventType) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ValidationError;

    #[test]
    fn outcome_classifies_errors() {
        assert_eq!(Outcome::of(&Ok::<_, ServiceError>(())), Outcome::Success);
        assert_eq!(
            Outcome::of::<()>(&Err(ValidationError::NoItems.into())),
            Outcome::Invalid
        );
        assert_eq!(
            Outcome::of::<()>(&Err(ServiceError::NotFound {
                entity: "order",
                id: "o1".to_string()
            })),
            Outcome::NotFound
        );
        assert_eq!(
            Outcome::of::<()>(&Err(ServiceError::Timeout(Duration::from_millis(5)))),
            Outcome::Error
        );
    }

    #[test]
    fn label_values_are_stable() {
        assert_eq!(WriteOperation::CreateOrder.as_str(), "create_order");
        assert_eq!(
            WriteOperation::UpdateOrderStatus.as_str(),
            "update_order_status"
        );
        assert_eq!(Outcome::Success.as_str(), "success");
    }
}
