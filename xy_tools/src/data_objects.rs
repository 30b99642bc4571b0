use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The label of the synthetic per-page subtotal pseudo-row the server embeds in query results.
const PAGE_SUBTOTAL_LABEL: &str = "本页小计";

/// Account-scoping identifiers attached to order queries. Both are optional; when present they
/// restrict results to a single merchant.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilters {
    pub shbh: Option<String>,
    pub userid: Option<String>,
}

impl ScopeFilters {
    pub fn new(shbh: Option<String>, userid: Option<String>) -> Self {
        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self { shbh: non_empty(shbh), userid: non_empty(userid) }
    }
}

/// One page of order rows, with the server-reported total row count for the window.
#[derive(Debug, Clone, Default)]
pub struct OrderPage {
    pub rows: Vec<RawOrder>,
    pub total: u64,
}

/// A single raw order record as returned by the order-query endpoint.
///
/// The platform is loose with types (numbers and strings are used interchangeably), so every
/// field is deserialized leniently. The verbatim JSON row is retained in `payload` for
/// debugging and re-mapping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOrder {
    /// Canonical provider-scoped identity. First choice for the identity key.
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: Option<String>,
    /// Third-party transaction reference. Second choice for the identity key.
    #[serde(default, deserialize_with = "lenient_string")]
    pub dsfjybh: Option<String>,
    /// Third-party merchant order reference. Third choice for the identity key.
    #[serde(default, deserialize_with = "lenient_string")]
    pub dsfshdh: Option<String>,
    /// Raw order number. Last-resort identity key and first choice for the source order number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub ddbh: Option<String>,
    /// Machine number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub jqbh: Option<String>,
    /// Machine display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub jqmc: Option<String>,
    /// Payment timestamp, `YYYY-MM-DD HH:MM:SS`. The only authoritative time field.
    #[serde(default, deserialize_with = "lenient_string")]
    pub zfsj: Option<String>,
    /// Compound `"<product>:<slot>"` field.
    #[serde(default, deserialize_with = "lenient_string")]
    pub extend2: Option<String>,
    /// Payment amount. Money fallback order is zfje, ddzj, spzj.
    #[serde(default, deserialize_with = "lenient_string")]
    pub zfje: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ddzj: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub spzj: Option<String>,
    /// Payment channel code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub zffs: Option<String>,
    /// Human-facing payment status indicator.
    #[serde(default, deserialize_with = "lenient_string")]
    pub showzfzt: Option<String>,
    /// Numeric payment status code.
    #[serde(default, deserialize_with = "lenient_string")]
    pub zfzt: Option<String>,
    /// Delivery state code, 0..=7.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub chzt: Option<i64>,
    /// Merchant name column. Carries the page-subtotal label on the pseudo-row.
    #[serde(default, deserialize_with = "lenient_string")]
    pub shmc: Option<String>,
    /// The verbatim source row. Not part of the wire format.
    #[serde(skip)]
    pub payload: Value,
}

impl RawOrder {
    /// Builds a typed record from a raw JSON row, retaining the row verbatim in `payload`.
    pub fn from_value(row: &Value) -> Result<Self, serde_json::Error> {
        let mut order: RawOrder = serde_json::from_value(row.clone())?;
        order.payload = row.clone();
        Ok(order)
    }

    pub fn is_page_subtotal(&self) -> bool {
        self.shmc.as_deref() == Some(PAGE_SUBTOTAL_LABEL)
    }
}

/// Accepts a string, a number, a bool, or null, and yields a trimmed non-empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let s = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    };
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// Accepts an integer directly or as a decimal string; anything else is `None`.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let n = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(n)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserializes_a_typical_row() {
        let row = serde_json::json!({
            "uuid": "X1",
            "jqbh": 2501000832i64,
            "jqmc": "Lobby machine",
            "zfsj": "2024-01-02 10:00:00",
            "extend2": "Cola:A3",
            "zfje": "9.99",
            "zffs": "UnionPay",
            "showzfzt": "Paid",
            "chzt": "4",
            "shmc": "Some Merchant"
        });
        let order = RawOrder::from_value(&row).unwrap();
        assert_eq!(order.uuid.as_deref(), Some("X1"));
        assert_eq!(order.jqbh.as_deref(), Some("2501000832"));
        assert_eq!(order.chzt, Some(4));
        assert!(!order.is_page_subtotal());
        assert_eq!(order.payload, row);
    }

    #[test]
    fn flags_the_subtotal_pseudo_row() {
        let row = serde_json::json!({ "shmc": "本页小计", "zfje": "120.00" });
        let order = RawOrder::from_value(&row).unwrap();
        assert!(order.is_page_subtotal());
    }

    #[test]
    fn empty_strings_become_none() {
        let row = serde_json::json!({ "uuid": "  ", "ddbh": "", "chzt": "junk" });
        let order = RawOrder::from_value(&row).unwrap();
        assert!(order.uuid.is_none());
        assert!(order.ddbh.is_none());
        assert!(order.chzt.is_none());
    }
}
