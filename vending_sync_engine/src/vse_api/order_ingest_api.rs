use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::{Account, NewOrder},
    events::{EventProducers, OrderWrittenEvent},
    traits::{InsertOrderResult, MachineHealthSummary, SyncGatewayDatabase, SyncGatewayError},
};

/// A machine with no paid order in this many days is considered broken.
///
/// The business rule has historically been described as "90 days", but 30 days is what has
/// always been enforced and is what operators expect; see DESIGN.md.
pub const MACHINE_STALE_AFTER_DAYS: i64 = 30;

/// `OrderIngestApi` is the primary API for reconciling remote order rows into storage and for
/// the per-cycle machine-health pass. Order writes are announced to event subscribers.
pub struct OrderIngestApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderIngestApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderIngestApi")
    }
}

impl<B> OrderIngestApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderIngestApi<B>
where B: SyncGatewayDatabase
{
    /// Reconciles one normalized order for the given account.
    ///
    /// The write is atomic (machine upkeep + order insert together). A new order triggers the
    /// order-written hook; a previously seen uuid is a no-op and triggers nothing.
    pub async fn process_order(
        &self,
        order: NewOrder,
        account_id: i64,
    ) -> Result<InsertOrderResult, SyncGatewayError> {
        let machine_number = order.machine_number.clone();
        let result = self.db.reconcile_order(order, account_id).await?;
        match &result {
            InsertOrderResult::Inserted(order) => {
                debug!("🔄️📦️ Order [{}] reconciled as new", order.uuid);
                let event = OrderWrittenEvent::new(order.clone(), machine_number, true);
                self.call_order_written_hook(event).await;
            },
            InsertOrderResult::AlreadyExists(order) => {
                trace!("🔄️📦️ Order [{}] already synced. Nothing to do", order.uuid);
            },
        }
        Ok(result)
    }

    async fn call_order_written_hook(&self, event: OrderWrittenEvent) {
        for producer in &self.producers.order_written_producer {
            trace!("🔄️📦️ Notifying order-written hook subscribers");
            producer.publish_event(event.clone()).await;
        }
    }

    /// The per-cycle machine-health pass: flags machines whose most recent order is older than
    /// the staleness cutoff (or that have never ordered), and un-flags recovered ones.
    pub async fn mark_stale_machines(
        &self,
        account_id: i64,
        now: DateTime<Utc>,
    ) -> Result<MachineHealthSummary, SyncGatewayError> {
        let cutoff = now - Duration::days(MACHINE_STALE_AFTER_DAYS);
        let summary = self.db.mark_stale_machines(account_id, cutoff).await?;
        if summary.has_changes() {
            info!(
                "🔄️🩺️ Account #{account_id}: {} machines newly broken, {} newly healthy",
                summary.newly_broken, summary.newly_cleared
            );
        }
        Ok(summary)
    }

    /// The resume point for the window planner: the oldest `last_order` among the account's
    /// healthy machines.
    pub async fn resume_from(&self, account_id: i64) -> Result<Option<DateTime<Utc>>, SyncGatewayError> {
        self.db.resume_from(account_id).await
    }

    pub async fn fetch_accounts(&self) -> Result<Vec<Account>, SyncGatewayError> {
        self.db.fetch_accounts().await
    }
}
