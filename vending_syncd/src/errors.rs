use thiserror::Error;
use vending_sync_engine::SyncGatewayError;
use xy_tools::XyApiError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SyncGatewayError),
    #[error("XY client error: {0}")]
    ClientError(#[from] XyApiError),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}
