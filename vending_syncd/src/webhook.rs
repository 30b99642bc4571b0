//! The order-written webhook notifier.
//!
//! Subscribes to the engine's order-written events and forwards matching orders to an external
//! endpoint. Delivery is fire-and-forget: at-least-once is not promised, failures are logged and
//! never retried, and nothing here can stall or fail a sync cycle.
use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde_json::{json, Value};
use vending_sync_engine::events::{EventHooks, OrderWrittenEvent};

use crate::{config::WebhookConfig, errors::SyncError};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| SyncError::ConfigurationError(format!("Could not build webhook client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Forwards the event if it belongs to the configured machine.
    pub async fn notify(&self, event: OrderWrittenEvent) {
        if event.machine_number.as_deref() != Some(self.config.machine_number.as_str()) {
            trace!("🪝️ Order [{}] is not from the watched machine. Not forwarding.", event.order.uuid);
            return;
        }
        let uuid = event.order.uuid.clone();
        let payload = webhook_payload(&event, &self.config.product_label);
        let result = self
            .client
            .post(&self.config.url)
            .header("Authorization", self.config.api_key.reveal())
            .json(&payload)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                info!("🪝️ Order [{uuid}] forwarded to the webhook endpoint");
            },
            Ok(response) => {
                warn!("🪝️ Webhook endpoint rejected order [{uuid}]: {}", response.status());
            },
            Err(e) => {
                warn!("🪝️ Could not deliver order [{uuid}] to the webhook endpoint: {e}");
            },
        }
    }
}

/// Attaches the notifier to the order-written hook.
pub fn attach_order_webhook(hooks: &mut EventHooks, config: WebhookConfig) -> Result<(), SyncError> {
    info!("🪝️ Webhook notifier enabled for machine {} -> {}", config.machine_number, config.url);
    let notifier = Arc::new(WebhookNotifier::new(config)?);
    hooks.on_order_written(move |event| {
        let notifier = Arc::clone(&notifier);
        Box::pin(async move {
            notifier.notify(event).await;
        })
    });
    Ok(())
}

fn webhook_payload(event: &OrderWrittenEvent, product_label: &str) -> Value {
    let order = &event.order;
    json!({
        "uuid": order.uuid,
        "machine_number": event.machine_number,
        "pos_id": 1,
        "product_name": product_label,
        "delivery_state": order.delivery_state,
        "purchase_date": order.payment_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        "price": order.payment_amount.to_f64(),
        "payment_method_id": 2,
        "created": event.created,
    })
}
