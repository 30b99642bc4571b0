//! Conversion of raw XY order rows into normalized [`NewOrder`] records.
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use vending_sync_engine::db_types::{DeliveryState, NewOrder, PaymentStatus, PaymentType};
use vgw_common::Money;
use xy_tools::{helpers::QUERY_TIME_FORMAT, RawOrder};

/// A row that cannot be normalized. Conversion failures are per-row: the caller logs the error
/// together with the offending payload and moves on to the next row.
#[derive(Debug, Clone, Error)]
pub enum OrderConversionError {
    #[error("The row carries no usable identity key")]
    MissingIdentity,
    #[error("The row carries no payment timestamp")]
    MissingPaymentTime,
    #[error("Unparseable payment timestamp: {0}")]
    InvalidPaymentTime(String),
}

/// Normalizes one raw platform row into a [`NewOrder`].
///
/// The payment timestamp and an identity key are mandatory; everything else degrades gracefully
/// to a default. The identity key is the first non-empty of uuid, dsfjybh, dsfshdh and ddbh, so
/// rows from older platform versions that predate the uuid column still reconcile stably.
pub fn normalize_order(row: &RawOrder) -> Result<NewOrder, OrderConversionError> {
    let payment_time = parse_payment_time(row)?;
    let uuid = [&row.uuid, &row.dsfjybh, &row.dsfshdh, &row.ddbh]
        .into_iter()
        .find_map(|f| f.clone())
        .ok_or(OrderConversionError::MissingIdentity)?;
    let mut order = NewOrder::new(uuid.into(), payment_time);
    order.machine_number = row.jqbh.clone();
    order.machine_name = row.jqmc.clone();
    (order.product_name, order.slot_number) = split_product_slot(row.extend2.as_deref());
    order.payment_amount = parse_amount(row);
    order.payment_type = payment_type(row.zffs.as_deref());
    order.payment_status = payment_status(row);
    order.delivery_state = DeliveryState::from_code(row.chzt);
    order.source_order_no = [&row.ddbh, &row.dsfjybh, &row.dsfshdh].into_iter().find_map(|f| f.clone());
    if !row.payload.is_null() {
        order.source_payload = Some(row.payload.clone());
    }
    Ok(order)
}

/// The platform intermittently appends fractional seconds to `zfsj`; they carry no information
/// and are stripped before parsing.
fn parse_payment_time(row: &RawOrder) -> Result<DateTime<Utc>, OrderConversionError> {
    let raw = row.zfsj.as_deref().ok_or(OrderConversionError::MissingPaymentTime)?;
    let trimmed = raw.split('.').next().unwrap_or(raw);
    NaiveDateTime::parse_from_str(trimmed, QUERY_TIME_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|_| OrderConversionError::InvalidPaymentTime(raw.to_string()))
}

/// `extend2` is a compound `"<product>:<slot>"` field. A row without the separator is all
/// product; a row without the field at all sells "Unknown".
fn split_product_slot(extend2: Option<&str>) -> (String, Option<String>) {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match extend2 {
        Some(value) => match value.split_once(':') {
            Some((product, slot)) => (non_empty(product).unwrap_or_else(|| "Unknown".to_string()), non_empty(slot)),
            None => (non_empty(value).unwrap_or_else(|| "Unknown".to_string()), None),
        },
        None => ("Unknown".to_string(), None),
    }
}

/// Money fallback order is zfje, ddzj, spzj. An absent or unparseable amount is zero; a bad
/// amount must never sink an otherwise-valid order.
fn parse_amount(row: &RawOrder) -> Money {
    [&row.zfje, &row.ddzj, &row.spzj]
        .into_iter()
        .find_map(|f| f.as_deref())
        .and_then(|s| s.parse::<Money>().ok())
        .unwrap_or_default()
}

fn payment_type(zffs: Option<&str>) -> Option<PaymentType> {
    zffs.map(|code| {
        if code.eq_ignore_ascii_case("unionpay") {
            PaymentType::Card
        } else {
            PaymentType::Cash
        }
    })
}

fn payment_status(row: &RawOrder) -> PaymentStatus {
    let shown_paid = row.showzfzt.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("paid"));
    let coded_paid = row.zfzt.as_deref().is_some_and(|s| s == "1" || s.eq_ignore_ascii_case("paid"));
    if shown_paid || coded_paid {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(json: serde_json::Value) -> RawOrder {
        RawOrder::from_value(&json).unwrap()
    }

    #[test]
    fn normalizes_a_complete_row() {
        let raw = row(serde_json::json!({
            "uuid": "u-123",
            "ddbh": "D-1",
            "jqbh": "M1",
            "jqmc": "Lobby machine",
            "zfsj": "2024-01-02 10:00:00",
            "extend2": "Cola:A3",
            "zfje": "12.50",
            "zffs": "UnionPay",
            "showzfzt": "Paid",
            "chzt": 4,
        }));
        let order = normalize_order(&raw).unwrap();
        assert_eq!(order.uuid.as_str(), "u-123");
        assert_eq!(order.machine_number.as_deref(), Some("M1"));
        assert_eq!(order.machine_name.as_deref(), Some("Lobby machine"));
        assert_eq!(order.product_name, "Cola");
        assert_eq!(order.slot_number.as_deref(), Some("A3"));
        assert_eq!(order.payment_amount.to_string(), "12.50");
        assert_eq!(order.payment_type, Some(PaymentType::Card));
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.delivery_state, DeliveryState::GoodsShipped);
        assert_eq!(order.source_order_no.as_deref(), Some("D-1"));
        assert!(order.source_payload.is_some());
    }

    #[test]
    fn identity_falls_back_through_the_reference_fields() {
        let raw = row(serde_json::json!({ "dsfshdh": "S-9", "zfsj": "2024-01-02 10:00:00" }));
        let order = normalize_order(&raw).unwrap();
        assert_eq!(order.uuid.as_str(), "S-9");
        assert_eq!(order.source_order_no.as_deref(), Some("S-9"));
    }

    #[test]
    fn a_row_with_no_identity_is_skipped() {
        let raw = row(serde_json::json!({ "zfsj": "2024-01-02 10:00:00", "zfje": "1.00" }));
        assert!(matches!(normalize_order(&raw), Err(OrderConversionError::MissingIdentity)));
    }

    #[test]
    fn a_row_with_no_timestamp_is_skipped() {
        let raw = row(serde_json::json!({ "uuid": "u-1" }));
        assert!(matches!(normalize_order(&raw), Err(OrderConversionError::MissingPaymentTime)));
        let raw = row(serde_json::json!({ "uuid": "u-1", "zfsj": "last tuesday" }));
        assert!(matches!(normalize_order(&raw), Err(OrderConversionError::InvalidPaymentTime(_))));
    }

    #[test]
    fn fractional_seconds_are_stripped_from_the_timestamp() {
        let raw = row(serde_json::json!({ "uuid": "u-1", "zfsj": "2024-01-02 10:00:00.123" }));
        let order = normalize_order(&raw).unwrap();
        assert_eq!(order.payment_time.to_string(), "2024-01-02 10:00:00 UTC");
    }

    #[test]
    fn amounts_parse_exactly_and_bad_amounts_become_zero() {
        let raw = row(serde_json::json!({ "uuid": "u-1", "zfsj": "2024-01-02 10:00:00", "zfje": "12.50" }));
        assert_eq!(normalize_order(&raw).unwrap().payment_amount, Money::from_cents(1250));
        let raw = row(serde_json::json!({ "uuid": "u-1", "zfsj": "2024-01-02 10:00:00", "zfje": "oops" }));
        assert_eq!(normalize_order(&raw).unwrap().payment_amount, Money::from_cents(0));
    }

    #[test]
    fn amount_falls_back_through_order_and_product_totals() {
        let raw = row(serde_json::json!({ "uuid": "u-1", "zfsj": "2024-01-02 10:00:00", "ddzj": "3.00" }));
        assert_eq!(normalize_order(&raw).unwrap().payment_amount, Money::from_cents(300));
        let raw = row(serde_json::json!({ "uuid": "u-1", "zfsj": "2024-01-02 10:00:00", "spzj": "2.00" }));
        assert_eq!(normalize_order(&raw).unwrap().payment_amount, Money::from_cents(200));
    }

    #[test]
    fn compound_product_field_splits_on_the_first_colon() {
        assert_eq!(split_product_slot(Some("Cola:A3")), ("Cola".to_string(), Some("A3".to_string())));
        assert_eq!(split_product_slot(Some("Iced Tea")), ("Iced Tea".to_string(), None));
        assert_eq!(split_product_slot(Some("Tea:A:1")), ("Tea".to_string(), Some("A:1".to_string())));
        assert_eq!(split_product_slot(Some(":A3")), ("Unknown".to_string(), Some("A3".to_string())));
        assert_eq!(split_product_slot(None), ("Unknown".to_string(), None));
    }

    #[test]
    fn payment_type_decodes_from_the_channel_code() {
        assert_eq!(payment_type(Some("UnionPay")), Some(PaymentType::Card));
        assert_eq!(payment_type(Some("unionpay")), Some(PaymentType::Card));
        assert_eq!(payment_type(Some("wechat")), Some(PaymentType::Cash));
        assert_eq!(payment_type(None), None);
    }

    #[test]
    fn paid_status_accepts_either_indicator() {
        let paid = row(serde_json::json!({ "uuid": "u", "zfsj": "2024-01-02 10:00:00", "showzfzt": "PAID" }));
        assert_eq!(normalize_order(&paid).unwrap().payment_status, PaymentStatus::Paid);
        let paid = row(serde_json::json!({ "uuid": "u", "zfsj": "2024-01-02 10:00:00", "zfzt": 1 }));
        assert_eq!(normalize_order(&paid).unwrap().payment_status, PaymentStatus::Paid);
        let pending = row(serde_json::json!({ "uuid": "u", "zfsj": "2024-01-02 10:00:00", "zfzt": "0" }));
        assert_eq!(normalize_order(&pending).unwrap().payment_status, PaymentStatus::Pending);
        let pending = row(serde_json::json!({ "uuid": "u", "zfsj": "2024-01-02 10:00:00" }));
        assert_eq!(normalize_order(&pending).unwrap().payment_status, PaymentStatus::Pending);
    }
}
