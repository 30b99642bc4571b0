use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderWrittenEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_written_producer: Vec<EventProducer<OrderWrittenEvent>>,
}

pub struct EventHandlers {
    pub on_order_written: Option<EventHandler<OrderWrittenEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_written = hooks.on_order_written.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_written }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_written {
            result.order_written_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_written {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_written: Option<Handler<OrderWrittenEvent>>,
}

impl EventHooks {
    pub fn on_order_written<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderWrittenEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_written = Some(Arc::new(f));
        self
    }
}
