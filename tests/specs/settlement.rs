//! Settlement accounting across fan-out

use crate::prelude::*;

#[tokio::test]
async fn non_matching_event_settles_with_zero_attempts() {
    let h = Harness::start();
    h.rule(json!({"source": ["billing"]}), "billing-sync");

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.matched, 0);
    assert_eq!(settled.delivered, 0);
    assert!(h.audit.attempts_for("evt-1").is_empty());
    assert!(h.invoker.calls().is_empty());
}

#[tokio::test]
async fn each_matching_rule_gets_an_independent_delivery() {
    let h = Harness::start();
    let rules: Vec<Rule> = (0..4)
        .map(|i| h.rule(json!({"source": ["orders"]}), &format!("consumer-{}", i)))
        .collect();

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.matched, 4);
    assert_eq!(settled.delivered, 4);
    for rule in &rules {
        assert_eq!(h.invoker.call_count(&rule.target), 1);
    }
}

#[tokio::test]
async fn failure_of_one_delivery_is_isolated_from_the_rest() {
    let h = Harness::start();
    let healthy_a = h.rule(json!({"source": ["orders"]}), "a");
    let broken = h.rule(json!({"source": ["orders"]}), "broken");
    let healthy_b = h.rule(json!({"source": ["orders"]}), "b");
    h.invoker.script(&broken.target, [FakeOutcome::Permanent]);

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.matched, 3);
    assert_eq!(settled.delivered, 2);
    assert_eq!(settled.failed, 1);
    assert_eq!(h.invoker.call_count(&healthy_a.target), 1);
    assert_eq!(h.invoker.call_count(&healthy_b.target), 1);
}

#[tokio::test]
async fn pattern_predicates_select_deliveries_per_event() {
    let h = Harness::start();
    let large = h.rule(
        json!({"source": ["orders"], "payload": {"total": [{"numeric": [">=", 100]}]}}),
        "large-orders",
    );
    let all = h.rule(json!({"source": ["orders"]}), "all-orders");

    h.bus.publish(order_event("evt-small", 10)).unwrap();
    h.bus.publish(order_event("evt-large", 250)).unwrap();

    let small = h.audit.wait_settled("evt-small").await;
    let big = h.audit.wait_settled("evt-large").await;

    assert_eq!(small.matched, 1);
    assert_eq!(big.matched, 2);
    assert_eq!(h.invoker.call_count(&large.target), 1);
    assert_eq!(h.invoker.call_count(&all.target), 2);
}

#[tokio::test]
async fn account_rule_delivers_for_its_account_only() {
    let h = Harness::start();
    let rule = h.rule(json!({"payload": {"account": ["123"]}}), "account-sync");

    let own = Event::new("e1", "app", "account.updated", json!({"account": "123"}));
    let other = Event::new("e2", "app", "account.updated", json!({"account": "999"}));
    h.bus.publish(own).unwrap();
    h.bus.publish(other).unwrap();

    assert_eq!(h.audit.wait_settled("e1").await.delivered, 1);
    let missed = h.audit.wait_settled("e2").await;
    assert_eq!(missed.matched, 0);
    assert!(h.audit.attempts_for("e2").is_empty());
    assert_eq!(h.invoker.call_count(&rule.target), 1);
}

#[tokio::test]
async fn envelope_account_matches_top_level_account_patterns() {
    let h = Harness::start();
    let rule = h.rule(json!({"account": ["123"]}), "account-sync");

    let own = Event::new("e1", "app", "account.updated", json!({})).with_account("123");
    let other = Event::new("e2", "app", "account.updated", json!({})).with_account("999");
    let unattributed = Event::new("e3", "app", "account.updated", json!({}));
    h.bus.publish(own).unwrap();
    h.bus.publish(other).unwrap();
    h.bus.publish(unattributed).unwrap();

    assert_eq!(h.audit.wait_settled("e1").await.delivered, 1);
    assert_eq!(h.audit.wait_settled("e2").await.matched, 0);
    // No envelope account at all: the field is absent, not empty
    assert_eq!(h.audit.wait_settled("e3").await.matched, 0);
    assert_eq!(h.invoker.call_count(&rule.target), 1);
}

#[tokio::test]
async fn every_accepted_event_reaches_a_terminal_settlement() {
    let h = Harness::start();
    let rule = h.rule(json!({"source": ["orders"]}), "consumer");
    // A mix of outcomes across events, including one that exhausts retries
    h.invoker.script(
        &rule.target,
        [FakeOutcome::Ok, FakeOutcome::Permanent, FakeOutcome::Transient],
    );

    for i in 0..5u64 {
        h.bus.publish(order_event(&format!("evt-{}", i), i)).unwrap();
    }

    for i in 0..5u64 {
        let settled = h.audit.wait_settled(&format!("evt-{}", i)).await;
        assert_eq!(settled.matched, 1);
        assert_eq!(settled.delivered + settled.failed + settled.cancelled, 1);
    }
}
