//! `SqliteDatabase` is the concrete storage backend for the sync gateway.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{accounts, db_url, machines, new_pool, orders, run_migrations};
use crate::{
    db_types::{Account, Machine, NewOrder, Order, OrderId},
    traits::{InsertOrderResult, MachineHealthSummary, SyncGatewayDatabase, SyncGatewayError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, SyncGatewayError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SyncGatewayError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Call once at startup.
    pub async fn migrate(&self) -> Result<(), SyncGatewayError> {
        run_migrations(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates a merchant account. This is an operator-tooling operation; the sync cycle itself
    /// only ever reads accounts.
    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        shbh: Option<&str>,
        userid: Option<&str>,
    ) -> Result<Account, SyncGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::insert(username, password, shbh, userid, &mut conn).await?;
        info!("🗃️ Account {username} created with id {}", account.id);
        Ok(account)
    }
}

impl SyncGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_accounts(&self) -> Result<Vec<Account>, SyncGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let accounts = accounts::fetch_all(&mut conn).await?;
        Ok(accounts)
    }

    async fn mark_stale_machines(
        &self,
        account_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<MachineHealthSummary, SyncGatewayError> {
        let mut tx = self.pool.begin().await?;
        let mut summary = MachineHealthSummary::default();
        for machine in machines::fetch_for_account(account_id, &mut tx).await? {
            let is_broken = match machine.last_order {
                None => true,
                Some(last_order) => last_order < cutoff,
            };
            if is_broken != machine.is_broken {
                machines::set_broken(machine.id, is_broken, &mut tx).await?;
                if is_broken {
                    summary.newly_broken += 1;
                } else {
                    summary.newly_cleared += 1;
                }
                debug!(
                    "🗃️ Machine {} marked {}",
                    machine.number,
                    if is_broken { "broken" } else { "healthy" }
                );
            }
        }
        tx.commit().await?;
        Ok(summary)
    }

    async fn resume_from(&self, account_id: i64) -> Result<Option<DateTime<Utc>>, SyncGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let oldest = machines::oldest_healthy_last_order(account_id, &mut conn).await?;
        Ok(oldest)
    }

    /// Machine upkeep and the create-only order upsert, in a single transaction.
    async fn reconcile_order(
        &self,
        order: NewOrder,
        account_id: i64,
    ) -> Result<InsertOrderResult, SyncGatewayError> {
        let mut tx = self.pool.begin().await?;
        let machine_id = match &order.machine_number {
            Some(number) => {
                let machine =
                    machines::get_or_create(account_id, number, order.machine_name.as_deref(), &mut tx).await?;
                if machines::advance_last_order(machine.id, order.payment_time, &mut tx).await? {
                    trace!("🗃️ Machine {number} last_order advanced to {}", order.payment_time);
                }
                if machines::clear_broken(machine.id, &mut tx).await? {
                    debug!("🗃️ Machine {number} healed by fresh order [{}]", order.uuid);
                }
                Some(machine.id)
            },
            None => None,
        };
        let result = orders::idempotent_insert(order, machine_id, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_uuid(&self, uuid: &OrderId) -> Result<Option<Order>, SyncGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_by_uuid(uuid, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_machine_by_number(&self, number: &str) -> Result<Option<Machine>, SyncGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let machine = machines::fetch_by_number(number, &mut conn).await?;
        Ok(machine)
    }

    async fn close(&mut self) -> Result<(), SyncGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
