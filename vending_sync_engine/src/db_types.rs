use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use vgw_common::Money;

/// Tag identifying the source platform on every order row.
pub const PROVIDER_XY: &str = "xy";

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderId       ---------------------------------------------------------
/// The provider-scoped uuid of an order. This is the idempotency key for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for OrderId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     PaymentType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Card,
    Cash,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::Card => write!(f, "card"),
            PaymentType::Cash => write!(f, "cash"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            s => Err(ConversionError(format!("Invalid payment type: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Pending => write!(f, "pending"),
        }
    }
}

//--------------------------------------    DeliveryState    ---------------------------------------------------------
/// Delivery outcome, decoded from the platform's small-integer `chzt` code. Stored and displayed
/// as the human label; codes outside the 8-entry table decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DeliveryState {
    #[sqlx(rename = "Shipment Not Notified")]
    #[serde(rename = "Shipment Not Notified")]
    ShipmentNotNotified,
    #[sqlx(rename = "Shipment Notified")]
    #[serde(rename = "Shipment Notified")]
    ShipmentNotified,
    #[sqlx(rename = "Shipment Result Not Received")]
    #[serde(rename = "Shipment Result Not Received")]
    ShipmentResultNotReceived,
    #[sqlx(rename = "Partial shipment")]
    #[serde(rename = "Partial shipment")]
    PartialShipment,
    #[sqlx(rename = "Goods Shipped")]
    #[serde(rename = "Goods Shipped")]
    GoodsShipped,
    #[sqlx(rename = "Shipment failed")]
    #[serde(rename = "Shipment failed")]
    ShipmentFailed,
    #[sqlx(rename = "Notification Shipment Failure")]
    #[serde(rename = "Notification Shipment Failure")]
    NotificationShipmentFailure,
    #[sqlx(rename = "Shipment Timeout")]
    #[serde(rename = "Shipment Timeout")]
    ShipmentTimeout,
    Unknown,
}

impl DeliveryState {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::ShipmentNotNotified,
            Some(1) => Self::ShipmentNotified,
            Some(2) => Self::ShipmentResultNotReceived,
            Some(3) => Self::PartialShipment,
            Some(4) => Self::GoodsShipped,
            Some(5) => Self::ShipmentFailed,
            Some(6) => Self::NotificationShipmentFailure,
            Some(7) => Self::ShipmentTimeout,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ShipmentNotNotified => "Shipment Not Notified",
            Self::ShipmentNotified => "Shipment Notified",
            Self::ShipmentResultNotReceived => "Shipment Result Not Received",
            Self::PartialShipment => "Partial shipment",
            Self::GoodsShipped => "Goods Shipped",
            Self::ShipmentFailed => "Shipment failed",
            Self::NotificationShipmentFailure => "Notification Shipment Failure",
            Self::ShipmentTimeout => "Shipment Timeout",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

//--------------------------------------     SyncStatus      ---------------------------------------------------------
/// Outbound-delivery bookkeeping for the downstream webhook subsystem. The sync engine only ever
/// seeds new orders as `Pending`; the delivery subsystem owns the rest of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SyncStatus {
    Pending,
    Submitted,
    Failed,
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Pending => write!(f, "Pending"),
            SyncStatus::Submitted => write!(f, "Submitted"),
            SyncStatus::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------       Account       ---------------------------------------------------------
/// A merchant account on the remote platform. Edited by operators only; the sync engine reads
/// credentials and scope identifiers from here and never modifies the row.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub shbh: Option<String>,
    pub userid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Machine       ---------------------------------------------------------
/// A vending machine, created lazily the first time an order mentions its number.
#[derive(Debug, Clone, FromRow)]
pub struct Machine {
    pub id: i64,
    pub account_id: Option<i64>,
    /// Stable business key, unique across all accounts.
    pub number: String,
    pub name: String,
    /// Derived health flag: set when the machine has gone too long without a paid order,
    /// cleared the moment a fresh order reconciles against it.
    pub is_broken: bool,
    pub last_online: Option<DateTime<Utc>>,
    /// Timestamp of the most recent paid order seen for this machine.
    pub last_order: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub uuid: OrderId,
    pub provider: String,
    pub source_order_no: Option<String>,
    pub machine_id: Option<i64>,
    pub product_name: String,
    pub slot_number: Option<String>,
    pub payment_amount: Money,
    pub payment_time: DateTime<Utc>,
    pub payment_type: Option<PaymentType>,
    pub payment_status: PaymentStatus,
    pub delivery_state: DeliveryState,
    /// The verbatim remote row, retained for debugging and re-mapping.
    pub source_payload: Option<String>,
    pub sync_status: SyncStatus,
    pub attempts: i64,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// A fully normalized order, ready for reconciliation. Produced by the row normalizer; rows that
/// cannot yield a payment time and an identity key never become a `NewOrder`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub uuid: OrderId,
    pub provider: String,
    pub source_order_no: Option<String>,
    /// Business key of the owning machine, when the remote row carried one.
    pub machine_number: Option<String>,
    /// Display name to seed a newly sighted machine with.
    pub machine_name: Option<String>,
    pub product_name: String,
    pub slot_number: Option<String>,
    pub payment_amount: Money,
    pub payment_time: DateTime<Utc>,
    pub payment_type: Option<PaymentType>,
    pub payment_status: PaymentStatus,
    pub delivery_state: DeliveryState,
    pub source_payload: Option<serde_json::Value>,
}

impl NewOrder {
    pub fn new(uuid: OrderId, payment_time: DateTime<Utc>) -> Self {
        Self {
            uuid,
            provider: PROVIDER_XY.to_string(),
            source_order_no: None,
            machine_number: None,
            machine_name: None,
            product_name: "Unknown".to_string(),
            slot_number: None,
            payment_amount: Money::default(),
            payment_time,
            payment_type: None,
            payment_status: PaymentStatus::Pending,
            delivery_state: DeliveryState::Unknown,
            source_payload: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delivery_state_decodes_the_fixed_table() {
        assert_eq!(DeliveryState::from_code(Some(4)), DeliveryState::GoodsShipped);
        assert_eq!(DeliveryState::from_code(Some(4)).to_string(), "Goods Shipped");
        assert_eq!(DeliveryState::from_code(Some(0)), DeliveryState::ShipmentNotNotified);
        assert_eq!(DeliveryState::from_code(Some(7)), DeliveryState::ShipmentTimeout);
    }

    #[test]
    fn unmapped_delivery_codes_are_unknown() {
        assert_eq!(DeliveryState::from_code(Some(99)), DeliveryState::Unknown);
        assert_eq!(DeliveryState::from_code(Some(-1)), DeliveryState::Unknown);
        assert_eq!(DeliveryState::from_code(None), DeliveryState::Unknown);
        assert_eq!(DeliveryState::from_code(Some(99)).to_string(), "Unknown");
    }
}
