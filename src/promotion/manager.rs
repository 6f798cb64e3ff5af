//! Promotion Manager
//!
//! Owns every rule registered for one model, the registry of promoted
//! properties and the accessor table. The manager never owns model data;
//! each operation borrows the model it works on.

use std::fmt;

use super::errors::{PromotionError, PromotionResult};
use super::naming::accessor_name;
use super::registry::{AccessorTable, PromotedRegistry};
use super::rule::{AttributeOptions, PromotionOutcome, PromotionRule};
use crate::config::PromotionConfig;
use crate::model::{Attributes, FetchFailure, Model};
use crate::observability::{log_event_with_fields, Event, MetricsSnapshot, PromotionMetrics};

/// Per-model promotion state
pub struct PromotionManager<M> {
    config: PromotionConfig,
    /// Rules keyed by target property, in registration order
    rules: Vec<PromotionRule<M>>,
    registry: PromotedRegistry,
    accessors: AccessorTable,
    metrics: PromotionMetrics,
}

impl<M: Model> PromotionManager<M> {
    /// Create an empty manager
    pub fn new(config: PromotionConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
            registry: PromotedRegistry::new(),
            accessors: AccessorTable::new(),
            metrics: PromotionMetrics::new(),
        }
    }

    /// Register a rule and promote immediately if the model is ready.
    ///
    /// A reserved accessor name is rejected before anything is stored.
    /// Re-registering a target property replaces its rule in place.
    pub fn register(
        &mut self,
        model: &mut M,
        source_key: &str,
        options: AttributeOptions<M>,
    ) -> PromotionResult<()> {
        let target = options.resolved_target(source_key).to_string();
        let accessor = accessor_name(&self.config.accessor_prefix, &target);

        if self.config.is_reserved(&accessor) {
            log_event_with_fields(
                Event::RuleRejected,
                &[("cid", model.cid()), ("target", target.as_str()), ("accessor", accessor.as_str())],
            );
            return Err(PromotionError::reserved_accessor(target, accessor));
        }

        let rule = PromotionRule::new(source_key, options);
        let ready = rule.ready(model);
        let index = self.upsert(rule);
        self.accessors.install(&accessor, &target);
        self.metrics.increment_rules_registered();

        log_event_with_fields(
            Event::RuleRegistered,
            &[
                ("cid", model.cid()),
                ("source", source_key),
                ("target", target.as_str()),
                ("accessor", accessor.as_str()),
            ],
        );

        if ready {
            apply(&self.rules[index], &mut self.registry, &self.metrics, model)?;
        }
        Ok(())
    }

    /// Re-run every rule in registration order
    pub fn run_all(&mut self, model: &mut M) -> PromotionResult<()> {
        for rule in &self.rules {
            apply(rule, &mut self.registry, &self.metrics, model)?;
        }
        Ok(())
    }

    /// Fold promoted values with a serialize capability into `base`
    pub fn serialize(&self, model: &M, mut base: Attributes) -> Attributes {
        for rule in &self.rules {
            let folded = model
                .properties()
                .get(rule.target_property())
                .and_then(|value| value.to_json());
            if let Some(json) = folded {
                base.insert(rule.serialized_key().to_string(), json);
            }
        }
        base
    }

    /// Rule registered under `target_property`
    pub fn rule(&self, target_property: &str) -> Option<&PromotionRule<M>> {
        self.rules
            .iter()
            .find(|rule| rule.target_property() == target_property)
    }

    /// Rules in registration order
    pub fn rules(&self) -> impl Iterator<Item = &PromotionRule<M>> {
        self.rules.iter()
    }

    /// True if a rule exists for `target_property` and its slot is non-null
    pub fn has_direct(&self, model: &M, target_property: &str) -> bool {
        self.rule(target_property).is_some() && model.properties().is_present(target_property)
    }

    /// Evaluate an installed accessor by name
    pub fn query(&self, model: &M, accessor: &str) -> Option<bool> {
        self.accessors
            .target_of(accessor)
            .map(|target| self.has_direct(model, target))
    }

    /// Target properties promoted at least once
    pub fn promoted_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn is_promoted(&self, target_property: &str) -> bool {
        self.registry.contains(target_property)
    }

    /// Installed accessor names
    pub fn accessor_names(&self) -> Vec<&str> {
        self.accessors.names()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Note a refresh that resolved and re-ran
    pub(crate) fn refresh_resolved(&self, model: &M) {
        self.metrics.increment_refreshes_resolved();
        let rules = self.rules.len().to_string();
        log_event_with_fields(
            Event::RefreshResolved,
            &[("cid", model.cid()), ("rules", rules.as_str())],
        );
    }

    /// Note a refresh that rejected
    pub(crate) fn refresh_rejected(&self, model: &M, reason: &str) {
        self.metrics.increment_refreshes_rejected();
        log_event_with_fields(
            Event::RefreshRejected,
            &[("cid", model.cid()), ("reason", reason)],
        );
    }

    pub(crate) fn fetch_rejected(&self, model: &M, failure: &FetchFailure) {
        self.refresh_rejected(model, &failure.to_string());
    }

    fn upsert(&mut self, rule: PromotionRule<M>) -> usize {
        match self
            .rules
            .iter()
            .position(|existing| existing.target_property() == rule.target_property())
        {
            Some(index) => {
                self.rules[index] = rule;
                index
            }
            None => {
                self.rules.push(rule);
                self.rules.len() - 1
            }
        }
    }
}

/// Run one rule and record the outcome
fn apply<M: Model>(
    rule: &PromotionRule<M>,
    registry: &mut PromotedRegistry,
    metrics: &PromotionMetrics,
    model: &mut M,
) -> PromotionResult<PromotionOutcome> {
    let outcome = rule.promote(model)?;
    let fields = [
        ("cid", model.cid()),
        ("source", rule.source_key()),
        ("target", rule.target_property()),
    ];

    match outcome {
        PromotionOutcome::Promoted => {
            registry.record(rule.target_property());
            metrics.increment_promotions();
            log_event_with_fields(Event::AttributePromoted, &fields);
        }
        PromotionOutcome::Skipped => {
            metrics.increment_skips();
            log_event_with_fields(Event::AttributeSkipped, &fields);
        }
    }
    Ok(outcome)
}

impl<M> fmt::Debug for PromotionManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromotionManager")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("registry", &self.registry)
            .field("accessors", &self.accessors)
            .field("metrics", &self.metrics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeStore, Document, MemorySource, PromotedValue, Serializable, WriteMode};
    use crate::promotion::rule::EntityConstructor;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::rc::Rc;

    #[derive(Debug, Deserialize)]
    struct Address {
        street: String,
    }

    impl PromotedValue for Address {
        fn to_json(&self) -> Option<Value> {
            Some(json!({ "street": self.street, "kind": "address" }))
        }
    }

    fn document(value: Value) -> Document {
        let attributes = match value {
            Value::Object(map) => map,
            _ => Attributes::new(),
        };
        Document::with_attributes(Rc::new(MemorySource::new()), attributes)
    }

    fn address_options() -> AttributeOptions<Document> {
        AttributeOptions::new().entity(EntityConstructor::deserialize::<Address>())
    }

    #[test]
    fn test_register_promotes_present_attribute() {
        let mut doc = document(json!({"address": {"street": "X"}}));
        let mut manager = PromotionManager::new(PromotionConfig::default());

        manager.register(&mut doc, "address", address_options()).unwrap();

        assert_eq!(manager.promoted_names(), vec!["address"]);
        assert!(manager.has_direct(&doc, "address"));
        assert_eq!(manager.query(&doc, "hasAddress"), Some(true));
        assert_eq!(manager.metrics().promotions, 1);
    }

    #[test]
    fn test_register_absent_attribute_arms_rule_only() {
        let mut doc = document(json!({}));
        let mut manager = PromotionManager::new(PromotionConfig::default());

        manager.register(&mut doc, "address", address_options()).unwrap();

        assert!(manager.promoted_names().is_empty());
        assert!(manager.rule("address").is_some());
        assert_eq!(manager.query(&doc, "hasAddress"), Some(false));
        assert_eq!(manager.metrics().skips, 0);
    }

    #[test]
    fn test_null_attribute_skipped_and_not_registered() {
        let mut doc = document(json!({"address": null}));
        let mut manager = PromotionManager::new(PromotionConfig::default());

        manager.register(&mut doc, "address", address_options()).unwrap();

        assert!(!manager.is_promoted("address"));
        assert_eq!(manager.metrics().skips, 1);
    }

    #[test]
    fn test_reserved_accessor_rejected_before_mutation() {
        let mut doc = document(json!({"changed": 1}));
        let mut manager = PromotionManager::new(PromotionConfig::default());

        let err = manager
            .register(&mut doc, "changed", AttributeOptions::new())
            .unwrap_err();

        assert_eq!(err, PromotionError::reserved_accessor("changed", "hasChanged"));
        assert!(manager.rule("changed").is_none());
        assert!(manager.accessor_names().is_empty());
        assert!(doc.has("changed"));
        assert_eq!(manager.metrics().rules_registered, 0);
    }

    #[test]
    fn test_reserved_check_uses_target_property() {
        let mut doc = document(json!({"flags": 1}));
        let mut manager = PromotionManager::new(PromotionConfig::default());

        let result = manager.register(
            &mut doc,
            "flags",
            AttributeOptions::new().target_property("own_property"),
        );

        assert!(matches!(result, Err(PromotionError::ReservedAccessor { .. })));
    }

    #[test]
    fn test_reregister_replaces_rule_in_place() {
        let mut doc = document(json!({}));
        let mut manager = PromotionManager::new(PromotionConfig::default());

        manager.register(&mut doc, "a", AttributeOptions::new()).unwrap();
        manager.register(&mut doc, "b", AttributeOptions::new()).unwrap();
        manager
            .register(&mut doc, "raw_a", AttributeOptions::new().target_property("a"))
            .unwrap();

        let order: Vec<_> = manager.rules().map(|r| r.target_property()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(manager.rule("a").unwrap().source_key(), "raw_a");
        assert_eq!(manager.accessor_names(), vec!["hasA", "hasB"]);
    }

    #[test]
    fn test_run_all_promotes_in_registration_order() {
        let mut doc = document(json!({}));
        let mut manager = PromotionManager::new(PromotionConfig::default());
        manager.register(&mut doc, "second", AttributeOptions::new()).unwrap();
        manager.register(&mut doc, "first", AttributeOptions::new()).unwrap();

        doc.set("first", json!(1), WriteMode::Quiet);
        doc.set("second", json!(2), WriteMode::Quiet);
        manager.run_all(&mut doc).unwrap();

        assert_eq!(manager.promoted_names(), vec!["second", "first"]);
    }

    #[test]
    fn test_serialize_folds_capable_values_only() {
        let mut doc = document(json!({
            "address": {"street": "X"},
            "meta": {"raw": true},
            "name": "ada"
        }));
        let mut manager = PromotionManager::new(PromotionConfig::default());
        manager
            .register(
                &mut doc,
                "address",
                address_options().serialized_key("home"),
            )
            .unwrap();
        manager.register(&mut doc, "meta", AttributeOptions::new()).unwrap();

        let out = manager.serialize(&doc, doc.serialize());

        assert_eq!(
            Value::Object(out),
            json!({
                "name": "ada",
                "home": {"street": "X", "kind": "address"}
            })
        );
    }

    #[test]
    fn test_has_direct_false_after_clear() {
        let mut doc = document(json!({"address": {"street": "X"}}));
        let mut manager = PromotionManager::new(PromotionConfig::default());
        manager.register(&mut doc, "address", address_options()).unwrap();

        doc.properties_mut().clear("address");

        assert!(!manager.has_direct(&doc, "address"));
        assert!(manager.is_promoted("address"));
    }

    #[test]
    fn test_has_direct_requires_rule() {
        let mut doc = document(json!({}));
        doc.properties_mut().set("loose", Box::new(json!(1)));
        let manager = PromotionManager::<Document>::new(PromotionConfig::default());

        assert!(!manager.has_direct(&doc, "loose"));
        assert_eq!(manager.query(&doc, "hasLoose"), None);
    }

    #[test]
    fn test_custom_prefix() {
        let config = PromotionConfig {
            accessor_prefix: "with".into(),
            ..PromotionConfig::default()
        };
        let mut doc = document(json!({}));
        let mut manager = PromotionManager::new(config);
        manager.register(&mut doc, "home_address", AttributeOptions::new()).unwrap();

        assert_eq!(manager.accessor_names(), vec!["withHomeAddress"]);
    }
}
