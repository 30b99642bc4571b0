use crate::db_types::Order;

/// Published whenever the reconciler writes an order row to storage.
///
/// `created` distinguishes a brand-new order from a future update; with the current create-only
/// upsert, events always carry `created = true`, but subscribers must not rely on that.
#[derive(Debug, Clone)]
pub struct OrderWrittenEvent {
    pub order: Order,
    /// Business key of the owning machine, when known. Carried separately so subscribers do not
    /// need a database lookup to apply machine-identity filters.
    pub machine_number: Option<String>,
    pub created: bool,
}

impl OrderWrittenEvent {
    pub fn new(order: Order, machine_number: Option<String>, created: bool) -> Self {
        Self { order, machine_number, created }
    }
}
