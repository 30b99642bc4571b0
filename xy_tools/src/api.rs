use std::time::Duration;

use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::Value;

use crate::{
    config::{XyApiConfig, XyCredentials},
    data_objects::{OrderPage, RawOrder, ScopeFilters},
    helpers::{format_query_time, hashed_password},
    XyApiError,
};

const SUCCESS_CODE: &str = "H0000";
const MAX_QUERY_ATTEMPTS: usize = 5;
/// Seconds. Attempt `n` sleeps `n * BASE_RETRY_DELAY_SECS` before retrying.
const BASE_RETRY_DELAY_SECS: u64 = 5;
/// Backoff schedule for the "success but zero rows" anomaly. The platform intermittently
/// under-reports under load, so an empty page is retried on this schedule before being believed.
const EMPTY_RETRY_DELAYS_SECS: [u64; 5] = [5, 10, 30, 30, 30];

const CHECK_CODE_TIMEOUT: Duration = Duration::from_secs(10);
const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the XY order-query API.
///
/// One instance serves one merchant account. The session key obtained from a successful login is
/// cached on the instance and attached to every subsequent request; re-authentication happens
/// only inside the query retry loop, when a call has not yet succeeded.
pub struct XyApi {
    config: XyApiConfig,
    credentials: XyCredentials,
    client: Client,
    session_key: Option<String>,
}

impl XyApi {
    pub fn new(credentials: XyCredentials, config: XyApiConfig) -> Result<Self, XyApiError> {
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert("Accept", HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json;charset=UTF-8"));
        let origin =
            HeaderValue::from_str(&config.origin).map_err(|e| XyApiError::Initialization(e.to_string()))?;
        headers.insert("Origin", origin.clone());
        headers.insert("Referer", origin);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| XyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, credentials, client, session_key: None })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Logs in and caches the session key. Returns `true` when a usable session exists.
    ///
    /// A cached session is reused as-is; the platform gives no expiry signal, so a stale session
    /// simply surfaces as a failed query and the retry loop comes back through here.
    pub async fn authenticate(&mut self) -> bool {
        if self.session_key.is_some() {
            return true;
        }
        match self.try_login().await {
            Ok(session_key) => {
                info!("🔑️ Authenticated as {}", self.credentials.username);
                self.session_key = Some(session_key);
                true
            },
            Err(e) => {
                warn!("🔑️ Authentication failed for {}: {e}", self.credentials.username);
                false
            },
        }
    }

    async fn try_login(&self) -> Result<String, XyApiError> {
        let check_code = self.fetch_check_code().await?;
        let hashed =
            hashed_password(&self.credentials.username, self.credentials.password.reveal(), &check_code);
        let payload = serde_json::json!({
            "password": hashed,
            "account": self.credentials.username,
            "checkCode": check_code,
            "language": "en",
            "channel": "1",
        });
        let response = self
            .client
            .post(self.url("/sram/comm/login/onLogin"))
            .timeout(LOGIN_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| XyApiError::RequestError(e.to_string()))?;
        let body: Value = response.json().await.map_err(|e| XyApiError::JsonError(e.to_string()))?;
        let code = body["code"].as_str().unwrap_or_default().to_string();
        if code == SUCCESS_CODE {
            if let Some(session_key) = body["data"]["session_key"].as_str() {
                return Ok(session_key.to_string());
            }
        }
        let message = body["msg"].as_str().unwrap_or("no message").to_string();
        Err(XyApiError::AuthFailed { code, message })
    }

    async fn fetch_check_code(&self) -> Result<String, XyApiError> {
        let response = self
            .client
            .get(self.url("/sram/comm/login/getCheckCode"))
            .timeout(CHECK_CODE_TIMEOUT)
            .send()
            .await
            .map_err(|e| XyApiError::RequestError(e.to_string()))?;
        let body: Value = response.json().await.map_err(|e| XyApiError::JsonError(e.to_string()))?;
        match &body["data"] {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(XyApiError::JsonError(format!("check code missing from response: {body}"))),
        }
    }

    /// Queries one page of orders for the given time window.
    ///
    /// Owns the hard-failure retry policy: up to 5 attempts, sleeping `5 * attempt` seconds after
    /// a failed login, an error status code, or a transport error. Exhaustion is an error; the
    /// caller decides whether to abandon the chunk or the cycle.
    pub async fn query_orders(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        page_size: u64,
        scope: &ScopeFilters,
    ) -> Result<OrderPage, XyApiError> {
        for attempt in 1..=MAX_QUERY_ATTEMPTS {
            if !self.authenticate().await {
                warn!("📡️ Auth failed, retrying... ({attempt}/{MAX_QUERY_ATTEMPTS})");
                self.backoff(attempt).await;
                continue;
            }
            match self.post_order_query(start, end, page, page_size, scope).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!("📡️ Order query failed: {e}. Retrying... ({attempt}/{MAX_QUERY_ATTEMPTS})");
                    if matches!(e, XyApiError::QueryError { .. }) {
                        // A rejected call is the only signal we get that the session may have
                        // lapsed. Drop it so the next attempt logs in afresh.
                        self.session_key = None;
                    }
                    self.backoff(attempt).await;
                },
            }
        }
        Err(XyApiError::RetriesExhausted(MAX_QUERY_ATTEMPTS))
    }

    /// [`Self::query_orders`], plus the empty-result mitigation: a successful call with zero rows
    /// is treated as suspect and retried with the same parameters on a 5s/10s/30s/30s/30s
    /// schedule. If every retry still comes back empty, the empty page is accepted as final.
    pub async fn query_orders_retrying_empty(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        page_size: u64,
        scope: &ScopeFilters,
    ) -> Result<OrderPage, XyApiError> {
        let result = self.query_orders(start, end, page, page_size, scope).await?;
        if !result.rows.is_empty() {
            return Ok(result);
        }
        let retries = EMPTY_RETRY_DELAYS_SECS.len();
        for (i, delay) in EMPTY_RETRY_DELAYS_SECS.iter().enumerate() {
            info!("📡️ Got 0 rows. Retrying {}/{retries} in {delay}s...", i + 1);
            tokio::time::sleep(Duration::from_secs(*delay)).await;
            let retry = self.query_orders(start, end, page, page_size, scope).await?;
            if !retry.rows.is_empty() {
                info!("📡️ Empty-result retry {} yielded {} rows", i + 1, retry.rows.len());
                return Ok(retry);
            }
        }
        debug!("📡️ Still 0 rows after {retries} retries. Accepting the empty page.");
        Ok(result)
    }

    async fn post_order_query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        page_size: u64,
        scope: &ScopeFilters,
    ) -> Result<OrderPage, XyApiError> {
        let mut payload = serde_json::json!({
            "jyz": -1, "ycd": -1, "orderBy": "cjsj desc",
            "pageNum": page, "pageSize": page_size,
            "shmc": "", "zjzt": "", "ywlx": "", "queryType": 0,
            "dsfshdh": "", "dsfjybh": "", "zfzt": "", "zffs": "", "zfzh": "",
            "chzt": "", "starttime": format_query_time(start), "endtime": format_query_time(end),
            "spxx": "", "language": "en", "channel": "1",
        });
        if let Some(shbh) = &scope.shbh {
            payload["shbh"] = Value::String(shbh.clone());
        }
        if let Some(userid) = &scope.userid {
            payload["userid"] = Value::String(userid.clone());
        }
        let mut request =
            self.client.post(self.url("/service-order/ddxx/queryDdxx")).timeout(QUERY_TIMEOUT).json(&payload);
        if let Some(session_key) = &self.session_key {
            request = request.header("Authorization", session_key);
        }
        let response = request.send().await.map_err(|e| XyApiError::RequestError(e.to_string()))?;
        let body: Value = response.json().await.map_err(|e| XyApiError::JsonError(e.to_string()))?;
        let code = body["code"].as_str().unwrap_or_default();
        if code != SUCCESS_CODE {
            let message = body["msg"].as_str().unwrap_or("no message").to_string();
            return Err(XyApiError::QueryError { code: code.to_string(), message });
        }
        Ok(parse_order_page(&body["data"]))
    }

    async fn backoff(&self, attempt: usize) {
        tokio::time::sleep(Duration::from_secs(BASE_RETRY_DELAY_SECS * attempt as u64)).await;
    }
}

/// Extracts rows and the reported total from the response's data block. Rows may arrive under
/// either the `data` or the `list` key; the subtotal pseudo-row is dropped here so callers only
/// ever see real orders. A missing total falls back to the observed row count.
fn parse_order_page(block: &Value) -> OrderPage {
    let raw_rows = block["data"].as_array().or_else(|| block["list"].as_array());
    let rows: Vec<RawOrder> = raw_rows
        .map(|rows| {
            rows.iter()
                .filter_map(|row| match RawOrder::from_value(row) {
                    Ok(order) if order.is_page_subtotal() => None,
                    Ok(order) => Some(order),
                    Err(e) => {
                        warn!("📡️ Dropping malformed row: {e}");
                        None
                    },
                })
                .collect()
        })
        .unwrap_or_default();
    let total = block["total"].as_u64().unwrap_or(rows.len() as u64);
    OrderPage { rows, total }
}
