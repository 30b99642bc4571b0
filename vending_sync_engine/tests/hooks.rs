use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use log::*;
use vending_sync_engine::{
    db_types::{DeliveryState, NewOrder, PaymentStatus},
    events::{EventHandlers, EventHooks},
    OrderIngestApi,
};

mod support;
use support::{setup, tear_down, ts};

fn order(uuid: &str, machine: &str, when: &str) -> NewOrder {
    let mut order = NewOrder::new(uuid.into(), ts(when));
    order.machine_number = Some(machine.to_string());
    order.product_name = "Iced Tea".to_string();
    order.payment_amount = "3.50".parse().unwrap();
    order.payment_status = PaymentStatus::Paid;
    order.delivery_state = DeliveryState::from_code(Some(4));
    order
}

#[tokio::test]
async fn order_written_hook_fires_once_per_new_order() {
    let db = setup().await;
    let account = db.create_account("merchant", "pw", None, None).await.unwrap();

    let count = Arc::new(AtomicI32::new(0));
    let hook_count = Arc::clone(&count);
    let mut hooks = EventHooks::default();
    hooks.on_order_written(move |ev| {
        let hook_count = Arc::clone(&hook_count);
        Box::pin(async move {
            info!("🪝️ Order written hook fired for [{}]", ev.order.uuid);
            assert!(ev.created);
            assert_eq!(ev.machine_number.as_deref(), Some("M1"));
            hook_count.fetch_add(1, Ordering::SeqCst);
        })
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = OrderIngestApi::new(db.clone(), producers);
    let first = api.process_order(order("H1", "M1", "2024-03-01 09:00:00"), account.id).await.unwrap();
    assert!(first.was_created());
    let second = api.process_order(order("H2", "M1", "2024-03-01 09:05:00"), account.id).await.unwrap();
    assert!(second.was_created());
    // Same uuid again; the duplicate must not fire the hook.
    let dup = api.process_order(order("H1", "M1", "2024-03-01 09:00:00"), account.id).await.unwrap();
    assert!(!dup.was_created());

    // Drop the producers so the handler loop drains and exits, then give the spawned
    // handler tasks a beat to run.
    drop(api);
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    tear_down(db).await;
}
