use async_trait::async_trait;
use domain::OutboxEntry;

use crate::Result;

/// Append-only storage for outbox entries.
///
/// Entries are consumed outside this process by tailing the table's change
/// log, so there is no read or dequeue operation.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Transaction handle. Callers pairing outbox writes with order writes
    /// require this to equal [`crate::OrderStore::Tx`].
    type Tx: Send + 'static;

    /// Inserts one entry inside `tx`.
    async fn save_outbox_entry_with_tx(&self, tx: &mut Self::Tx, entry: &OutboxEntry)
    -> Result<()>;
}
