//! The sync-cycle orchestrator.
//!
//! Drives one full pass over every configured account: health pass, window planning, chunked
//! querying, normalization and reconciliation. Failure containment is deliberate and layered:
//! a bad row skips the row, a dead chunk abandons the chunk, a failing account moves on to the
//! next account, and in continuous mode a failing cycle just waits for the next tick.
use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use vending_sync_engine::{
    db_types::Account,
    events::{EventHandlers, EventHooks},
    OrderIngestApi, SqliteDatabase, SyncGatewayDatabase,
};
use xy_tools::{ScopeFilters, XyApi, XyApiConfig, XyCredentials};

use crate::{
    cli::Arguments,
    config::SyncdConfig,
    errors::SyncError,
    planner::{compute_window, seven_day_chunks},
    webhook::attach_order_webhook,
    xy_order::normalize_order,
};

const MAX_DB_CONNECTIONS: u32 = 25;
const EVENT_BUFFER_SIZE: usize = 25;
/// How much of a rejected row's payload makes it into the log.
const PAYLOAD_LOG_LIMIT: usize = 300;

/// Connects to the database, wires up the webhook hook, and runs the daemon until it exits
/// (single-run mode) or forever (continuous mode).
pub async fn run_sync_daemon(config: SyncdConfig, args: Arguments) -> Result<(), SyncError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS).await?;
    db.migrate().await?;
    info!("🚀️ Database ready at {}", db.url());

    let mut hooks = EventHooks::default();
    match config.webhook.clone() {
        Some(webhook_config) => attach_order_webhook(&mut hooks, webhook_config)?,
        None => info!("🚀️ No webhook configured. Order-written events will not be forwarded."),
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = OrderIngestApi::new(db, producers);
    let orchestrator = Orchestrator::new(api, &config, &args);
    if args.once {
        info!("🚀️ Running a single sync cycle");
        return orchestrator.run_cycle().await;
    }
    info!("🚀️ Polling every {}s", config.sync_interval.as_secs());
    loop {
        if let Err(e) = orchestrator.run_cycle().await {
            error!("🔄️ Sync cycle failed: {e}");
        }
        tokio::time::sleep(config.sync_interval).await;
    }
}

pub struct Orchestrator {
    api: OrderIngestApi<SqliteDatabase>,
    xy_config: XyApiConfig,
    page_size: u64,
    page_delay: std::time::Duration,
    start_override: Option<NaiveDate>,
    end_override: Option<NaiveDate>,
}

impl Orchestrator {
    pub fn new(api: OrderIngestApi<SqliteDatabase>, config: &SyncdConfig, args: &Arguments) -> Self {
        Self {
            api,
            xy_config: config.xy_config.clone(),
            page_size: args.page_size.unwrap_or(config.page_size),
            page_delay: config.page_delay,
            start_override: args.start,
            end_override: args.end,
        }
    }

    /// One full pass over every account. Per-account failures are contained; the cycle itself
    /// only fails when the account list cannot be read.
    pub async fn run_cycle(&self) -> Result<(), SyncError> {
        let accounts = self.api.fetch_accounts().await?;
        if accounts.is_empty() {
            warn!("🔄️ No accounts configured. Nothing to sync.");
            return Ok(());
        }
        for account in accounts {
            if let Err(e) = self.sync_account(&account).await {
                error!("🔄️ Sync failed for account {}: {e}", account.username);
            }
        }
        Ok(())
    }

    async fn sync_account(&self, account: &Account) -> Result<(), SyncError> {
        let now = Utc::now();
        self.api.mark_stale_machines(account.id, now).await?;
        let resume = self.api.resume_from(account.id).await?;
        let (start, end) = compute_window(resume, self.start_override, self.end_override, now);
        info!("🔄️ Syncing account {} over [{start}, {end})", account.username);

        let credentials = XyCredentials::new(account.username.as_str(), account.password.as_str());
        let mut client = XyApi::new(credentials, self.xy_config.clone())?;
        let scope = ScopeFilters::new(account.shbh.clone(), account.userid.clone());
        for (chunk_start, chunk_end) in seven_day_chunks(start, end) {
            if let Err(e) = self.sync_chunk(&mut client, &scope, account.id, chunk_start, chunk_end).await {
                // The next cycle's window still covers this chunk, so losing it here is safe.
                error!("🔄️ Abandoning chunk [{chunk_start}, {chunk_end}): {e}");
            }
        }
        Ok(())
    }

    async fn sync_chunk(
        &self,
        client: &mut XyApi,
        scope: &ScopeFilters,
        account_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let mut page = 1u64;
        loop {
            let result = client.query_orders_retrying_empty(start, end, page, self.page_size, scope).await?;
            if result.rows.is_empty() {
                debug!("🔄️ Chunk [{start}, {end}) page {page} is empty. Chunk done.");
                return Ok(());
            }
            debug!("🔄️ Chunk [{start}, {end}) page {page}: {} rows of {}", result.rows.len(), result.total);
            for row in &result.rows {
                match normalize_order(row) {
                    Ok(order) => {
                        if let Err(e) = self.api.process_order(order, account_id).await {
                            error!("🔄️ Could not reconcile row: {e}. Payload: {}", payload_snippet(row));
                        }
                    },
                    Err(e) => {
                        warn!("🔄️ Skipping row: {e}. Payload: {}", payload_snippet(row));
                    },
                }
            }
            if page * self.page_size >= result.total {
                return Ok(());
            }
            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }
    }
}

fn payload_snippet(row: &xy_tools::RawOrder) -> String {
    let payload = row.payload.to_string();
    if payload.len() <= PAYLOAD_LOG_LIMIT {
        payload
    } else {
        let truncated: String = payload.chars().take(PAYLOAD_LOG_LIMIT).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payload_snippet_truncates_long_rows() {
        let row = xy_tools::RawOrder::from_value(&serde_json::json!({ "extend2": "x".repeat(600) })).unwrap();
        let snippet = payload_snippet(&row);
        assert!(snippet.chars().count() <= PAYLOAD_LOG_LIMIT + 1);
        assert!(snippet.ends_with('…'));
    }
}
