//! The vending order sync daemon.
//!
//! `vending_syncd` is the outermost layer of the sync gateway. It loads configuration, wires the
//! storage engine's event hooks to the webhook notifier, and then repeatedly walks every
//! configured merchant account through a sync cycle:
//!
//! 1. Machine-health pass (flag machines that have gone quiet, un-flag recovered ones).
//! 2. Plan the query window from the oldest healthy machine's last order.
//! 3. Split the window into 7-day chunks, newest first, and page through each chunk on the
//!    remote platform.
//! 4. Normalize every raw row and reconcile it into storage. Bad rows are logged and skipped;
//!    everything else must survive a crash mid-cycle, which is why reconciliation is
//!    create-only and idempotent.
pub mod cli;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod planner;
pub mod webhook;
pub mod xy_order;
