//! Retry/backoff walks observed end to end

use crate::prelude::*;

#[tokio::test]
async fn three_timeouts_then_success_delivers_on_the_fourth_attempt() {
    let config = DispatchConfig {
        max_attempts: 5,
        ..fast_config()
    };
    let h = Harness::start_with(config);
    let rule = h.rule(json!({"source": ["orders"]}), "flaky");
    h.invoker.script(
        &rule.target,
        [FakeOutcome::Hang, FakeOutcome::Hang, FakeOutcome::Hang],
    );

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.delivered, 1);
    assert_eq!(settled.failed, 0);

    let record = h.audit.outcome("evt-1", &rule.id).unwrap();
    assert_eq!(record.attempts, 4);
    assert_eq!(h.invoker.call_count(&rule.target), 4);
}

#[tokio::test]
async fn attempts_never_exceed_the_configured_maximum() {
    let config = DispatchConfig {
        max_attempts: 3,
        ..fast_config()
    };
    let h = Harness::start_with(config);
    let rule = h.rule(json!({"source": ["orders"]}), "dead");
    h.invoker.script(
        &rule.target,
        std::iter::repeat_n(FakeOutcome::Transient, 10),
    );

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.failed, 1);
    assert_eq!(h.invoker.call_count(&rule.target), 3);
    assert_eq!(h.audit.attempt_count("evt-1", &rule.id), 3);
}

#[tokio::test]
async fn transient_and_timeout_failures_both_walk_the_backoff() {
    let h = Harness::start();
    let rule = h.rule(json!({"source": ["orders"]}), "mixed");
    h.invoker
        .script(&rule.target, [FakeOutcome::Transient, FakeOutcome::Hang]);

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.delivered, 1);
    assert_eq!(h.audit.outcome("evt-1", &rule.id).unwrap().attempts, 3);
}

#[tokio::test]
async fn permanent_failures_skip_the_backoff_entirely() {
    let h = Harness::start();
    let rule = h.rule(json!({"source": ["orders"]}), "broken");
    h.invoker.script(&rule.target, [FakeOutcome::Permanent]);

    h.bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = h.audit.wait_settled("evt-1").await;

    assert_eq!(settled.failed, 1);
    assert_eq!(h.invoker.call_count(&rule.target), 1);
}
