//! Simple stateless pub-sub event plumbing.
//!
//! Handlers receive only the event itself; they have no access to engine state. Handlers may be
//! async, and each event is handled on its own task so a slow subscriber (a webhook POST, say)
//! never stalls the sync cycle.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, spawning one task per received event.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler started");
        // Drop our own sender so the loop ends once the last external producer goes away.
        drop(self.sender);
        while let Some(event) = self.listener.recv().await {
            trace!("📬️ Dispatching event");
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                (handler)(event).await;
                trace!("📬️ Event handled");
            });
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to publish event: {e}");
        }
    }
}
