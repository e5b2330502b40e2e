//! Publish validation and the accept/deliver contract

use crate::prelude::*;

#[tokio::test]
async fn accepted_event_matching_one_rule_is_delivered_exactly_once() {
    let h = Harness::start();
    let rule = h.rule(json!({"source": ["orders"]}), "notify");

    h.bus.publish(order_event("evt-1", 10)).unwrap();

    let settled = h.audit.wait_settled("evt-1").await;
    assert_eq!(settled.matched, 1);
    assert_eq!(settled.delivered, 1);
    assert_eq!(h.invoker.call_count(&rule.target), 1);
    h.bus.shutdown().await;
}

#[tokio::test]
async fn publish_returns_on_acceptance_not_delivery() {
    let h = Harness::start();
    let rule = h.rule(json!({"source": ["orders"]}), "slow");
    // The only scripted call hangs past the delivery timeout; publish must
    // still return immediately with a receipt
    h.invoker.script(&rule.target, [FakeOutcome::Hang, FakeOutcome::Ok]);

    let receipt = h.bus.publish(order_event("evt-1", 10)).unwrap();
    assert_eq!(receipt.event_id, "evt-1");

    let settled = h.audit.wait_settled("evt-1").await;
    assert_eq!(settled.delivered, 1);
    h.bus.shutdown().await;
}

#[tokio::test]
async fn events_without_an_id_are_rejected() {
    let h = Harness::start();
    let result = h.bus.publish(order_event("", 10));
    assert_eq!(result, Err(PublishError::MissingId));
    h.bus.shutdown().await;
}

#[tokio::test]
async fn events_without_a_source_are_rejected() {
    let h = Harness::start();
    let mut event = order_event("evt-1", 10);
    event.source = String::new();
    assert_eq!(h.bus.publish(event), Err(PublishError::MissingSource));
    h.bus.shutdown().await;
}

#[tokio::test]
async fn duplicate_ids_are_rejected_within_the_dedup_window() {
    let h = Harness::start();
    h.rule(json!({"source": ["orders"]}), "notify");

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    assert_eq!(
        h.bus.publish(order_event("evt-1", 99)),
        Err(PublishError::DuplicateId("evt-1".into()))
    );

    // The duplicate was never dispatched
    let settled = h.audit.wait_settled("evt-1").await;
    assert_eq!(settled.delivered, 1);
    h.bus.shutdown().await;
}

#[tokio::test]
async fn delivery_failures_never_reach_the_publisher() {
    let h = Harness::start();
    let rule = h.rule(json!({"source": ["orders"]}), "broken");
    h.invoker.script(&rule.target, [FakeOutcome::Permanent]);

    // Accepted despite the target being guaranteed to fail
    assert!(h.bus.publish(order_event("evt-1", 10)).is_ok());

    let settled = h.audit.wait_settled("evt-1").await;
    assert_eq!(settled.failed, 1);
    h.bus.shutdown().await;
}
