//! Vending Sync Engine
//!
//! Storage and reconciliation core for the vending-machine order sync gateway. The engine is
//! split into:
//!
//! 1. Database management ([`mod@sqlite`]). SQLite is the supported backend. You should never
//!    need to reach into the database directly; use the public API instead. The exception is the
//!    data types, which live in [`mod@db_types`] and are public.
//! 2. The ingest API ([`OrderIngestApi`]). This wraps a [`SyncGatewayDatabase`] backend and adds
//!    the flow-level behaviour: machine-health bookkeeping, the create-only order upsert, and
//!    the order-written events that downstream consumers (such as the webhook notifier) can
//!    subscribe to through a simple hook framework.
mod sqlite;
mod vse_api;

pub mod db_types;
pub mod events;
pub mod traits;

pub use sqlite::SqliteDatabase;
pub use traits::{InsertOrderResult, MachineHealthSummary, SyncGatewayDatabase, SyncGatewayError};
pub use vse_api::{OrderIngestApi, MACHINE_STALE_AFTER_DAYS};
