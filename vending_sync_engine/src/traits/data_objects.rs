use crate::db_types::Order;

/// Outcome of the create-only order upsert.
///
/// `AlreadyExists` means the identity key was seen before; the stored order is returned
/// untouched and no field was modified.
#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            InsertOrderResult::Inserted(order) | InsertOrderResult::AlreadyExists(order) => order,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, InsertOrderResult::Inserted(_))
    }
}

/// Counts reported by a machine-health pass, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineHealthSummary {
    /// Machines whose broken flag was switched on in this pass.
    pub newly_broken: usize,
    /// Machines whose broken flag was switched off in this pass.
    pub newly_cleared: usize,
}

impl MachineHealthSummary {
    pub fn has_changes(&self) -> bool {
        self.newly_broken > 0 || self.newly_cleared > 0
    }
}
