use log::*;
use vgw_common::Secret;

const DEFAULT_BASE_URL: &str = "https://xcx.xynetweb.com";
const DEFAULT_ORIGIN: &str = "https://www.xynetweb.com";

/// Endpoint configuration for the XY platform. Credentials are supplied separately, per account.
#[derive(Debug, Clone)]
pub struct XyApiConfig {
    pub base_url: String,
    /// Sent as the `Origin` and `Referer` headers. The platform rejects requests without them.
    pub origin: String,
}

impl Default for XyApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), origin: DEFAULT_ORIGIN.to_string() }
    }
}

impl XyApiConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = std::env::var("XY_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ XY_BASE_URL not set. Using the default, {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let origin = std::env::var("XY_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
        Self { base_url, origin }
    }
}

/// Login credentials for a single merchant account on the platform.
#[derive(Debug, Clone, Default)]
pub struct XyCredentials {
    pub username: String,
    pub password: Secret<String>,
}

impl XyCredentials {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self { username: username.into(), password: Secret::new(password.into()) }
    }
}
