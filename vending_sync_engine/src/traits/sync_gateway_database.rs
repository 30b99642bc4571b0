use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Account, Machine, NewOrder, Order, OrderId},
    traits::{InsertOrderResult, MachineHealthSummary},
};

/// Storage contract for the sync gateway.
///
/// The engine only ever inserts or updates through these operations; nothing is deleted. Each
/// operation that touches more than one row (notably [`Self::reconcile_order`]) must be atomic,
/// so a crash can never leave a machine updated without its order, or vice versa.
#[allow(async_fn_in_trait)]
pub trait SyncGatewayDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// All configured merchant accounts, in id order.
    async fn fetch_accounts(&self) -> Result<Vec<Account>, SyncGatewayError>;

    /// Recomputes the broken flag for every machine belonging to the account: a machine is
    /// broken when it has never seen an order, or when its last order predates `cutoff`. Only
    /// changed flags are written. Returns the number of flags switched each way.
    async fn mark_stale_machines(
        &self,
        account_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<MachineHealthSummary, SyncGatewayError>;

    /// The oldest `last_order` among the account's machines that are not broken and have seen at
    /// least one order. This is the resume point for the window planner.
    async fn resume_from(&self, account_id: i64) -> Result<Option<DateTime<Utc>>, SyncGatewayError>;

    /// Reconciles one normalized order in a single atomic transaction:
    /// * when the row names a machine, get-or-create it by number, advance its `last_order` if
    ///   this order is newer, and unconditionally clear its broken flag;
    /// * create-only upsert of the order by uuid. An existing order is returned unmodified.
    async fn reconcile_order(
        &self,
        order: NewOrder,
        account_id: i64,
    ) -> Result<InsertOrderResult, SyncGatewayError>;

    async fn fetch_order_by_uuid(&self, uuid: &OrderId) -> Result<Option<Order>, SyncGatewayError>;

    async fn fetch_machine_by_number(&self, number: &str) -> Result<Option<Machine>, SyncGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SyncGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SyncGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested account id {0} does not exist")]
    AccountNotFound(i64),
    #[error("The machine {0} does not exist (even though it should)")]
    MachineShouldExist(String),
    #[error("Could not serialize the source payload: {0}")]
    PayloadError(String),
}

impl From<sqlx::Error> for SyncGatewayError {
    fn from(e: sqlx::Error) -> Self {
        SyncGatewayError::DatabaseError(e.to_string())
    }
}
