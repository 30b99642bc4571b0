use std::{env, time::Duration};

use log::*;
use vgw_common::Secret;
use xy_tools::XyApiConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/vending_store.db";
const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_PAGE_SIZE: u64 = 100;
/// Pause between successive page requests within a chunk.
const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_WEBHOOK_MACHINE: &str = "2501000832";
const DEFAULT_WEBHOOK_PRODUCT_LABEL: &str = "Gift Card";

#[derive(Clone, Debug)]
pub struct SyncdConfig {
    pub database_url: String,
    /// Sleep between sync cycles in continuous mode.
    pub sync_interval: Duration,
    pub page_size: u64,
    pub page_delay: Duration,
    pub xy_config: XyApiConfig,
    /// `None` disables the order-written webhook entirely.
    pub webhook: Option<WebhookConfig>,
}

impl Default for SyncdConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
            xy_config: XyApiConfig::default(),
            webhook: None,
        }
    }
}

impl SyncdConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("VGW_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ VGW_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let sync_interval = env::var("VGW_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| error!("🪛️ {s} is not a valid value for VGW_SYNC_INTERVAL_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SYNC_INTERVAL);
        let page_size = env::var("VGW_PAGE_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| error!("🪛️ {s} is not a valid value for VGW_PAGE_SIZE. {e}")).ok()
            })
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let xy_config = XyApiConfig::from_env_or_default();
        let webhook = WebhookConfig::from_env();
        Self {
            database_url,
            sync_interval,
            page_size,
            page_delay: DEFAULT_PAGE_DELAY,
            xy_config,
            webhook,
        }
    }
}

/// Destination and filter for the order-written webhook. Only orders from `machine_number` are
/// forwarded, and they are announced under the configured product label rather than the real
/// product name.
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub url: String,
    pub api_key: Secret<String>,
    pub machine_number: String,
    pub product_label: String,
}

impl WebhookConfig {
    /// Returns `None` unless both VGW_WEBHOOK_URL and VGW_WEBHOOK_API_KEY are set.
    pub fn from_env() -> Option<Self> {
        let url = env::var("VGW_WEBHOOK_URL").ok().filter(|s| !s.trim().is_empty());
        let api_key = env::var("VGW_WEBHOOK_API_KEY").ok().filter(|s| !s.trim().is_empty());
        let (url, api_key) = match (url, api_key) {
            (Some(url), Some(key)) => (url, Secret::new(key)),
            _ => {
                info!(
                    "🪛️ VGW_WEBHOOK_URL and/or VGW_WEBHOOK_API_KEY are not set. The order-written webhook is \
                     disabled."
                );
                return None;
            },
        };
        let machine_number = env::var("VGW_WEBHOOK_MACHINE").ok().unwrap_or_else(|| {
            info!("🪛️ VGW_WEBHOOK_MACHINE not set. Using the default, {DEFAULT_WEBHOOK_MACHINE}");
            DEFAULT_WEBHOOK_MACHINE.to_string()
        });
        let product_label =
            env::var("VGW_WEBHOOK_PRODUCT_LABEL").ok().unwrap_or_else(|| DEFAULT_WEBHOOK_PRODUCT_LABEL.to_string());
        Some(Self { url, api_key, machine_number, product_label })
    }
}
