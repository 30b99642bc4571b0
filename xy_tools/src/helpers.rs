use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

/// The timestamp format the order-query endpoint expects for window bounds, and the format it
/// uses for the `zfsj` payment-time field.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The platform's two-stage login hash: `md5(username + md5(username + password) + challenge)`.
pub fn hashed_password(username: &str, password: &str, check_code: &str) -> String {
    let inner = md5_hex(&format!("{username}{password}"));
    md5_hex(&format!("{username}{inner}{check_code}"))
}

pub fn format_query_time(dt: DateTime<Utc>) -> String {
    dt.format(QUERY_TIME_FORMAT).to_string()
}
