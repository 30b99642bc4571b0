//! Behaviour contracts for sync-gateway storage backends.
mod data_objects;
mod sync_gateway_database;

pub use data_objects::{InsertOrderResult, MachineHealthSummary};
pub use sync_gateway_database::{SyncGatewayDatabase, SyncGatewayError};
