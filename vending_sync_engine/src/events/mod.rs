//! Events emitted by the sync engine.
//!
//! Whenever the reconciler writes an order, an [`OrderWrittenEvent`] is published. A simple
//! hook framework lets consumers (the webhook notifier, primarily) react to these events
//! without the engine knowing anything about them.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::OrderWrittenEvent;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
