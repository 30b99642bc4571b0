mod order_ingest_api;

pub use order_ingest_api::{OrderIngestApi, MACHINE_STALE_AFTER_DAYS};
