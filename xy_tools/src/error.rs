use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request failed: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Authentication failed: {message} (code={code})")]
    AuthFailed { code: String, message: String },
    #[error("Order query rejected: {message} (code={code})")]
    QueryError { code: String, message: String },
    #[error("Order query failed after {0} attempts")]
    RetriesExhausted(usize),
}
