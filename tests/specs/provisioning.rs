//! Admin provisioning wired to a live bus, including restart replay

use crate::prelude::*;
use relay_engine::Admin;

fn wal_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("relay.wal")
}

fn start_bus(
    registry: Arc<RuleRegistry>,
    invoker: &Arc<FakeInvoker>,
    audit: &Arc<AuditLog>,
) -> EventBus {
    let target_invoker: Arc<dyn TargetInvoker> = invoker.clone();
    EventBus::start(
        "default",
        BusDeps {
            registry,
            invoker: target_invoker,
            audit: Arc::clone(audit),
            config: fast_config(),
        },
    )
}

#[tokio::test]
async fn declared_rules_route_published_events() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(RuleRegistry::new());
    let admin = Admin::open(&wal_path(&dir), Arc::clone(&registry)).unwrap();

    admin.create_bus("default").unwrap();
    let id = admin
        .create_rule(
            "default",
            json!({"source": ["orders"]}),
            TargetRef::Function {
                name: "notify".into(),
            },
        )
        .unwrap();

    let invoker = Arc::new(FakeInvoker::new());
    let audit = Arc::new(AuditLog::new());
    let bus = start_bus(registry, &invoker, &audit);

    bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = audit.wait_settled("evt-1").await;
    assert_eq!(settled.delivered, 1);
    assert_eq!(audit.outcome("evt-1", &id).unwrap().attempts, 1);
    bus.shutdown().await;
}

#[tokio::test]
async fn redeclaring_a_rule_does_not_duplicate_deliveries() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(RuleRegistry::new());
    let admin = Admin::open(&wal_path(&dir), Arc::clone(&registry)).unwrap();

    admin.create_bus("default").unwrap();
    let target = TargetRef::Function {
        name: "notify".into(),
    };
    let first = admin
        .create_rule("default", json!({"source": ["orders"]}), target.clone())
        .unwrap();
    let second = admin
        .create_rule("default", json!({"source": ["orders"]}), target.clone())
        .unwrap();
    assert_eq!(first, second);

    let invoker = Arc::new(FakeInvoker::new());
    let audit = Arc::new(AuditLog::new());
    let bus = start_bus(registry, &invoker, &audit);

    bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = audit.wait_settled("evt-1").await;
    assert_eq!(settled.matched, 1);
    assert_eq!(invoker.call_count(&target), 1);
    bus.shutdown().await;
}

#[tokio::test]
async fn definitions_replayed_after_restart_still_route() {
    let dir = tempfile::tempdir().unwrap();
    {
        let registry = Arc::new(RuleRegistry::new());
        let admin = Admin::open(&wal_path(&dir), Arc::clone(&registry)).unwrap();
        admin.create_bus("default").unwrap();
        admin
            .create_rule(
                "default",
                json!({"source": ["orders"]}),
                TargetRef::Function {
                    name: "notify".into(),
                },
            )
            .unwrap();
    }

    // Fresh process: registry seeded purely from the operation log
    let registry = Arc::new(RuleRegistry::new());
    let _admin = Admin::open(&wal_path(&dir), Arc::clone(&registry)).unwrap();

    let invoker = Arc::new(FakeInvoker::new());
    let audit = Arc::new(AuditLog::new());
    let bus = start_bus(registry, &invoker, &audit);

    bus.publish(order_event("evt-1", 10)).unwrap();
    let settled = audit.wait_settled("evt-1").await;
    assert_eq!(settled.delivered, 1);
    bus.shutdown().await;
}

#[tokio::test]
async fn deleting_a_rule_stops_future_deliveries() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(RuleRegistry::new());
    let admin = Admin::open(&wal_path(&dir), Arc::clone(&registry)).unwrap();

    admin.create_bus("default").unwrap();
    let id = admin
        .create_rule(
            "default",
            json!({"source": ["orders"]}),
            TargetRef::Function {
                name: "notify".into(),
            },
        )
        .unwrap();

    let invoker = Arc::new(FakeInvoker::new());
    let audit = Arc::new(AuditLog::new());
    let bus = start_bus(registry, &invoker, &audit);

    bus.publish(order_event("evt-1", 10)).unwrap();
    assert_eq!(audit.wait_settled("evt-1").await.delivered, 1);

    admin.delete_rule(&id).unwrap();
    bus.publish(order_event("evt-2", 10)).unwrap();
    let settled = audit.wait_settled("evt-2").await;
    assert_eq!(settled.matched, 0);
    bus.shutdown().await;
}
