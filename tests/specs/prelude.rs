//! Shared harness for the behavioral specs

pub use relay_core::{DispatchConfig, Event, Pattern, Rule, TargetRef};
pub use relay_engine::{
    AuditLog, BusDeps, EventBus, FakeInvoker, FakeOutcome, PublishError, RuleRegistry,
    TargetInvoker,
};
pub use serde_json::json;
pub use std::sync::Arc;
pub use std::time::Duration;

/// A running bus plus handles to everything the specs observe
pub struct Harness {
    pub registry: Arc<RuleRegistry>,
    pub invoker: Arc<FakeInvoker>,
    pub audit: Arc<AuditLog>,
    pub bus: EventBus,
}

impl Harness {
    /// Start a bus named "default" with test-friendly timings
    pub fn start() -> Self {
        Self::start_with(fast_config())
    }

    pub fn start_with(config: DispatchConfig) -> Self {
        let registry = Arc::new(RuleRegistry::new());
        registry.ensure_bus("default");
        let invoker = Arc::new(FakeInvoker::new());
        let audit = Arc::new(AuditLog::new());
        // Widen the handle here; the fake stays reachable for scripting
        let target_invoker: Arc<dyn TargetInvoker> = invoker.clone();
        let bus = EventBus::start(
            "default",
            BusDeps {
                registry: Arc::clone(&registry),
                invoker: target_invoker,
                audit: Arc::clone(&audit),
                config,
            },
        );
        Self {
            registry,
            invoker,
            audit,
            bus,
        }
    }

    /// Register a rule on the default bus and return it
    pub fn rule(&self, pattern: serde_json::Value, target_name: &str) -> Rule {
        let rule = Rule::new(
            "default",
            Pattern::from_json(pattern).unwrap(),
            TargetRef::Function {
                name: target_name.into(),
            },
        );
        self.registry.add_rule(rule.clone());
        rule
    }
}

/// Small delays so retry walks finish in milliseconds
pub fn fast_config() -> DispatchConfig {
    DispatchConfig {
        base_delay: Duration::from_millis(1),
        delivery_timeout: Duration::from_millis(20),
        ..DispatchConfig::default()
    }
}

/// An order event from the "orders" service
pub fn order_event(id: &str, total: u64) -> Event {
    Event::new(id, "orders", "order.created", json!({"total": total}))
}
