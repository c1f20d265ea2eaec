//! Storage for the ordering services.
//!
//! Order and outbox writes share one transaction handle so that a state
//! change and its outbox entry commit together. Two backends implement the
//! traits: [`PostgresStore`] and [`InMemoryStore`].

pub mod error;
pub mod memory;
pub mod order;
pub mod outbox;
pub mod postgres;
pub mod product;

pub use error::{Result, StoreError, TxStage};
pub use memory::{InMemoryStore, MemoryTx};
pub use order::{OrderStore, OrderStoreExt};
pub use outbox::OutboxStore;
pub use postgres::{PgTx, PostgresStore};
pub use product::ProductStore;
