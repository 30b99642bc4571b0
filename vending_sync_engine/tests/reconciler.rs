use chrono::{Duration, Utc};
use vending_sync_engine::{
    db_types::{DeliveryState, NewOrder, PaymentStatus, PaymentType},
    events::EventProducers,
    OrderIngestApi, SyncGatewayDatabase,
};

mod support;
use support::{setup, tear_down, ts};

fn sample_order(uuid: &str, machine: &str, when: &str) -> NewOrder {
    let mut order = NewOrder::new(uuid.into(), ts(when));
    order.machine_number = Some(machine.to_string());
    order.machine_name = Some(format!("Machine {machine}"));
    order.product_name = "Cola".to_string();
    order.slot_number = Some("A3".to_string());
    order.payment_amount = "9.99".parse().expect("bad amount");
    order.payment_type = Some(PaymentType::Card);
    order.payment_status = PaymentStatus::Paid;
    order.delivery_state = DeliveryState::from_code(Some(4));
    order.source_order_no = Some(format!("SRC-{uuid}"));
    order
}

#[tokio::test]
async fn reconciling_the_same_row_twice_creates_one_immutable_order() {
    let db = setup().await;
    let account = db.create_account("merchant", "pw", Some("SH1"), Some("U1")).await.unwrap();
    let api = OrderIngestApi::new(db.clone(), EventProducers::default());

    let order = sample_order("X1", "M1", "2024-01-02 10:00:00");
    let first = api.process_order(order.clone(), account.id).await.expect("first reconcile failed");
    assert!(first.was_created());
    assert_eq!(first.order().uuid.as_str(), "X1");
    assert_eq!(first.order().payment_amount.to_string(), "9.99");
    assert_eq!(first.order().delivery_state, DeliveryState::GoodsShipped);
    assert_eq!(first.order().payment_time, ts("2024-01-02 10:00:00"));

    // The second sighting carries a "correction"; create-only semantics must ignore it.
    let mut resighted = order.clone();
    resighted.product_name = "Changed".to_string();
    resighted.payment_amount = "1.00".parse().unwrap();
    let second = api.process_order(resighted, account.id).await.expect("second reconcile failed");
    assert!(!second.was_created());
    assert_eq!(second.order().id, first.order().id);
    assert_eq!(second.order().product_name, "Cola");
    assert_eq!(second.order().payment_amount.to_string(), "9.99");

    let stored = db.fetch_order_by_uuid(&"X1".into()).await.unwrap().expect("order missing");
    assert_eq!(stored.product_name, "Cola");
    tear_down(db).await;
}

#[tokio::test]
async fn machine_is_created_lazily_and_tracks_its_newest_order() {
    let db = setup().await;
    let account = db.create_account("merchant", "pw", None, None).await.unwrap();
    let api = OrderIngestApi::new(db.clone(), EventProducers::default());

    assert!(db.fetch_machine_by_number("M1").await.unwrap().is_none());
    api.process_order(sample_order("A", "M1", "2024-01-02 10:00:00"), account.id).await.unwrap();
    let machine = db.fetch_machine_by_number("M1").await.unwrap().expect("machine not created");
    assert_eq!(machine.name, "Machine M1");
    assert_eq!(machine.last_order, Some(ts("2024-01-02 10:00:00")));
    assert!(!machine.is_broken);

    // An older order must not move last_order backwards.
    api.process_order(sample_order("B", "M1", "2023-12-25 08:00:00"), account.id).await.unwrap();
    let machine = db.fetch_machine_by_number("M1").await.unwrap().unwrap();
    assert_eq!(machine.last_order, Some(ts("2024-01-02 10:00:00")));

    // A newer one does.
    api.process_order(sample_order("C", "M1", "2024-01-05 12:30:00"), account.id).await.unwrap();
    let machine = db.fetch_machine_by_number("M1").await.unwrap().unwrap();
    assert_eq!(machine.last_order, Some(ts("2024-01-05 12:30:00")));
    tear_down(db).await;
}

#[tokio::test]
async fn rows_without_a_machine_number_persist_with_no_machine() {
    let db = setup().await;
    let account = db.create_account("merchant", "pw", None, None).await.unwrap();
    let api = OrderIngestApi::new(db.clone(), EventProducers::default());

    let mut order = sample_order("NOMACH", "M9", "2024-01-02 10:00:00");
    order.machine_number = None;
    order.machine_name = None;
    let result = api.process_order(order, account.id).await.unwrap();
    assert!(result.was_created());
    assert!(result.order().machine_id.is_none());
    assert!(db.fetch_machine_by_number("M9").await.unwrap().is_none());
    tear_down(db).await;
}

#[tokio::test]
async fn stale_machines_break_and_fresh_orders_heal_them_immediately() {
    let db = setup().await;
    let account = db.create_account("merchant", "pw", None, None).await.unwrap();
    let api = OrderIngestApi::new(db.clone(), EventProducers::default());
    let now = Utc::now();

    // Seed a machine whose newest order is 40 days old — past the 30-day cutoff.
    let old = (now - Duration::days(40)).format("%Y-%m-%d %H:%M:%S").to_string();
    api.process_order(sample_order("OLD1", "M2", &old), account.id).await.unwrap();

    let summary = api.mark_stale_machines(account.id, now).await.unwrap();
    assert_eq!(summary.newly_broken, 1);
    assert_eq!(summary.newly_cleared, 0);
    let machine = db.fetch_machine_by_number("M2").await.unwrap().unwrap();
    assert!(machine.is_broken);

    // Broken machines do not contribute a resume point.
    assert!(api.resume_from(account.id).await.unwrap().is_none());

    // A fresh order heals the machine on the spot, before any health pass.
    let fresh = (now - Duration::days(1)).format("%Y-%m-%d %H:%M:%S").to_string();
    api.process_order(sample_order("NEW1", "M2", &fresh), account.id).await.unwrap();
    let machine = db.fetch_machine_by_number("M2").await.unwrap().unwrap();
    assert!(!machine.is_broken);

    let resume = api.resume_from(account.id).await.unwrap().expect("resume point missing");
    assert_eq!(resume, ts(&fresh));

    // The next health pass agrees and reports no further changes.
    let summary = api.mark_stale_machines(account.id, now).await.unwrap();
    assert!(!summary.has_changes());
    tear_down(db).await;
}

#[tokio::test]
async fn resume_point_is_the_oldest_healthy_machine() {
    let db = setup().await;
    let account = db.create_account("merchant", "pw", None, None).await.unwrap();
    let api = OrderIngestApi::new(db.clone(), EventProducers::default());

    api.process_order(sample_order("R1", "MA", "2024-01-10 09:00:00"), account.id).await.unwrap();
    api.process_order(sample_order("R2", "MB", "2024-01-04 15:00:00"), account.id).await.unwrap();
    let resume = api.resume_from(account.id).await.unwrap().expect("resume point missing");
    assert_eq!(resume, ts("2024-01-04 15:00:00"));
    tear_down(db).await;
}
