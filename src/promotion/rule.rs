//! Promotion Rules
//!
//! A rule describes one promotion: which raw attribute to read, which
//! property slot to write, and how to build the promoted value. Rules are
//! immutable once built and owned by the manager that registered them.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{PromotionError, PromotionResult};
use crate::model::{AttributeStore, Model, PromotedValue, WriteMode};

type BuildFn = dyn Fn(Option<Value>, &Value) -> Result<Box<dyn PromotedValue>, String>;

/// Builds a promoted value from `(raw, options)`
#[derive(Clone)]
pub struct EntityConstructor {
    type_name: &'static str,
    build: Rc<BuildFn>,
}

impl EntityConstructor {
    /// Wrap a constructor function
    pub fn new<T, E, F>(build: F) -> Self
    where
        T: PromotedValue,
        E: fmt::Display,
        F: Fn(Option<Value>, &Value) -> Result<T, E> + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            build: Rc::new(move |raw: Option<Value>, options: &Value| {
                build(raw, options)
                    .map(|value| Box::new(value) as Box<dyn PromotedValue>)
                    .map_err(|e| e.to_string())
            }),
        }
    }

    /// Constructor for an `Entity` type
    pub fn entity<T: Entity>() -> Self {
        Self::new::<T, T::Error, _>(T::construct)
    }

    /// Constructor that deserializes the raw value; absent becomes `null`
    pub fn deserialize<T>() -> Self
    where
        T: PromotedValue + DeserializeOwned,
    {
        Self::new::<T, serde_json::Error, _>(|raw: Option<Value>, _options: &Value| {
            serde_json::from_value::<T>(raw.unwrap_or(Value::Null))
        })
    }

    /// Name of the type this constructor produces
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Run the constructor
    pub fn construct(&self, raw: Option<Value>, options: &Value) -> Result<Box<dyn PromotedValue>, String> {
        (self.build)(raw, options)
    }
}

impl fmt::Debug for EntityConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityConstructor").field(&self.type_name).finish()
    }
}

/// A promoted type that knows how to build itself from a raw attribute
pub trait Entity: PromotedValue + Sized {
    type Error: fmt::Display;

    fn construct(raw: Option<Value>, options: &Value) -> Result<Self, Self::Error>;
}

/// Options handed to the entity constructor
pub enum ConstructionOptions<M> {
    /// Fixed value
    Static(Value),
    /// Computed from the model at promotion time
    Computed(Rc<dyn Fn(&M) -> Value>),
}

impl<M> ConstructionOptions<M> {
    /// Effective options for `model`
    pub fn resolve(&self, model: &M) -> Value {
        match self {
            Self::Static(value) => value.clone(),
            Self::Computed(compute) => compute(model),
        }
    }
}

impl<M> Default for ConstructionOptions<M> {
    fn default() -> Self {
        Self::Static(Value::Object(Default::default()))
    }
}

impl<M> Clone for ConstructionOptions<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(value) => Self::Static(value.clone()),
            Self::Computed(compute) => Self::Computed(Rc::clone(compute)),
        }
    }
}

impl<M> fmt::Debug for ConstructionOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// Callback run on the model after a promotion completes
pub type OnPromoted<M> = Rc<dyn Fn(&mut M)>;

/// Result of running one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// Property slot written; the target joins the registry
    Promoted,
    /// Nothing to promote
    Skipped,
}

/// Arguments handed to a custom strategy
pub struct StrategyArgs<'a, M> {
    pub source_key: &'a str,
    pub target_property: &'a str,
    pub entity_constructor: Option<&'a EntityConstructor>,
    pub on_promoted: Option<&'a OnPromoted<M>>,
}

impl<M> StrategyArgs<'_, M> {
    /// Run the completion callback, if any
    pub fn done(&self, model: &mut M) {
        if let Some(callback) = self.on_promoted {
            callback(model);
        }
    }
}

/// Replaces the default promotion algorithm wholesale
pub trait PromotionStrategy<M> {
    fn promote(&self, model: &mut M, args: &StrategyArgs<'_, M>) -> PromotionResult<PromotionOutcome>;
}

impl<M, F> PromotionStrategy<M> for F
where
    F: Fn(&mut M, &StrategyArgs<'_, M>) -> PromotionResult<PromotionOutcome>,
{
    fn promote(&self, model: &mut M, args: &StrategyArgs<'_, M>) -> PromotionResult<PromotionOutcome> {
        self(model, args)
    }
}

/// Options for `register_attribute`; unset fields take their defaults
pub struct AttributeOptions<M> {
    target_property: Option<String>,
    serialized_key: Option<String>,
    entity_constructor: Option<EntityConstructor>,
    construction_options: ConstructionOptions<M>,
    promote_if_absent: bool,
    on_promoted: Option<OnPromoted<M>>,
    strategy: Option<Rc<dyn PromotionStrategy<M>>>,
}

impl<M> Default for AttributeOptions<M> {
    fn default() -> Self {
        Self {
            target_property: None,
            serialized_key: None,
            entity_constructor: None,
            construction_options: ConstructionOptions::default(),
            promote_if_absent: false,
            on_promoted: None,
            strategy: None,
        }
    }
}

impl<M> AttributeOptions<M> {
    /// Start from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Property slot to write (default: the source key)
    pub fn target_property(mut self, name: impl Into<String>) -> Self {
        self.target_property = Some(name.into());
        self
    }

    /// Key used in serialized output (default: the source key)
    pub fn serialized_key(mut self, key: impl Into<String>) -> Self {
        self.serialized_key = Some(key.into());
        self
    }

    /// Constructor for the promoted value
    pub fn entity(mut self, constructor: EntityConstructor) -> Self {
        self.entity_constructor = Some(constructor);
        self
    }

    /// Fixed constructor options
    pub fn construction_options(mut self, options: Value) -> Self {
        self.construction_options = ConstructionOptions::Static(options);
        self
    }

    /// Constructor options computed from the model
    pub fn construction_options_with(mut self, compute: impl Fn(&M) -> Value + 'static) -> Self {
        self.construction_options = ConstructionOptions::Computed(Rc::new(compute));
        self
    }

    /// Promote even when the source attribute is absent or null
    pub fn promote_if_absent(mut self, enabled: bool) -> Self {
        self.promote_if_absent = enabled;
        self
    }

    /// Callback run after each promotion
    pub fn on_promoted(mut self, callback: impl Fn(&mut M) + 'static) -> Self {
        self.on_promoted = Some(Rc::new(callback));
        self
    }

    /// Replace the default promotion algorithm
    pub fn strategy(mut self, strategy: impl PromotionStrategy<M> + 'static) -> Self {
        self.strategy = Some(Rc::new(strategy));
        self
    }

    /// Target property these options resolve to for `source_key`
    pub(crate) fn resolved_target<'a>(&'a self, source_key: &'a str) -> &'a str {
        self.target_property.as_deref().unwrap_or(source_key)
    }
}

/// One registered promotion
pub struct PromotionRule<M> {
    source_key: String,
    target_property: String,
    serialized_key: String,
    entity_constructor: Option<EntityConstructor>,
    construction_options: ConstructionOptions<M>,
    promote_if_absent: bool,
    on_promoted: Option<OnPromoted<M>>,
    strategy: Option<Rc<dyn PromotionStrategy<M>>>,
}

impl<M: Model> PromotionRule<M> {
    /// Build a rule from options over the defaults
    pub fn new(source_key: &str, options: AttributeOptions<M>) -> Self {
        let target_property = options
            .target_property
            .unwrap_or_else(|| source_key.to_string());
        let serialized_key = options
            .serialized_key
            .unwrap_or_else(|| source_key.to_string());

        Self {
            source_key: source_key.to_string(),
            target_property,
            serialized_key,
            entity_constructor: options.entity_constructor,
            construction_options: options.construction_options,
            promote_if_absent: options.promote_if_absent,
            on_promoted: options.on_promoted,
            strategy: options.strategy,
        }
    }

    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn target_property(&self) -> &str {
        &self.target_property
    }

    pub fn serialized_key(&self) -> &str {
        &self.serialized_key
    }

    pub fn promotes_if_absent(&self) -> bool {
        self.promote_if_absent
    }

    pub fn has_custom_strategy(&self) -> bool {
        self.strategy.is_some()
    }

    /// Whether registration should promote right away
    pub fn ready(&self, model: &M) -> bool {
        model.has(&self.source_key) || self.promote_if_absent
    }

    /// Run the rule against `model`
    pub fn promote(&self, model: &mut M) -> PromotionResult<PromotionOutcome> {
        match &self.strategy {
            Some(strategy) => {
                let args = StrategyArgs {
                    source_key: &self.source_key,
                    target_property: &self.target_property,
                    entity_constructor: self.entity_constructor.as_ref(),
                    on_promoted: self.on_promoted.as_ref(),
                };
                strategy.promote(model, &args)
            }
            None => self.promote_default(model),
        }
    }

    fn promote_default(&self, model: &mut M) -> PromotionResult<PromotionOutcome> {
        if !model.has(&self.source_key) && !self.promote_if_absent {
            return Ok(PromotionOutcome::Skipped);
        }

        let raw = model.get(&self.source_key).cloned();
        let missing = matches!(raw, None | Some(Value::Null));
        if missing && !self.promote_if_absent {
            return Ok(PromotionOutcome::Skipped);
        }

        let options = self.construction_options.resolve(model);

        match &self.entity_constructor {
            Some(constructor) => {
                let value = constructor
                    .construct(raw, &options)
                    .map_err(|message| PromotionError::construction(&self.target_property, message))?;
                model.properties_mut().set(&self.target_property, value);
            }
            None if missing => model.properties_mut().clear(&self.target_property),
            None => {
                let value = raw.unwrap_or(Value::Null);
                model.properties_mut().set(&self.target_property, Box::new(value));
            }
        }
        model.unset(&self.source_key, WriteMode::Quiet);

        if let Some(callback) = &self.on_promoted {
            callback(model);
        }

        Ok(PromotionOutcome::Promoted)
    }
}

impl<M> fmt::Debug for PromotionRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromotionRule")
            .field("source_key", &self.source_key)
            .field("target_property", &self.target_property)
            .field("serialized_key", &self.serialized_key)
            .field("entity_constructor", &self.entity_constructor)
            .field("construction_options", &self.construction_options)
            .field("promote_if_absent", &self.promote_if_absent)
            .field("on_promoted", &self.on_promoted.is_some())
            .field("strategy", &self.strategy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Document, MemorySource};
    use serde::Deserialize;
    use serde_json::json;
    use std::cell::Cell;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Address {
        street: String,
    }

    impl PromotedValue for Address {
        fn to_json(&self) -> Option<Value> {
            Some(json!({ "street": self.street }))
        }
    }

    #[derive(Debug, PartialEq)]
    struct Labelled {
        raw: Option<Value>,
        label: Value,
    }

    impl PromotedValue for Labelled {}

    impl Entity for Labelled {
        type Error = String;

        fn construct(raw: Option<Value>, options: &Value) -> Result<Self, String> {
            Ok(Self {
                raw,
                label: options["label"].clone(),
            })
        }
    }

    fn document(value: Value) -> Document {
        let attributes = match value {
            Value::Object(map) => map,
            _ => Attributes::new(),
        };
        Document::with_attributes(Rc::new(MemorySource::new()), attributes)
    }

    #[test]
    fn test_defaults() {
        let rule = PromotionRule::<Document>::new("address", AttributeOptions::new());

        assert_eq!(rule.source_key(), "address");
        assert_eq!(rule.target_property(), "address");
        assert_eq!(rule.serialized_key(), "address");
        assert!(!rule.promotes_if_absent());
        assert!(!rule.has_custom_strategy());
    }

    #[test]
    fn test_serialized_key_defaults_to_source_not_target() {
        let rule = PromotionRule::<Document>::new(
            "addr",
            AttributeOptions::new().target_property("address"),
        );
        assert_eq!(rule.target_property(), "address");
        assert_eq!(rule.serialized_key(), "addr");
    }

    #[test]
    fn test_promote_with_constructor_moves_value() {
        let mut doc = document(json!({"address": {"street": "X"}}));
        let rule = PromotionRule::new(
            "address",
            AttributeOptions::new().entity(EntityConstructor::deserialize::<Address>()),
        );

        assert_eq!(rule.promote(&mut doc).unwrap(), PromotionOutcome::Promoted);

        let address = doc.properties().get("address").unwrap();
        assert_eq!(
            address.downcast_ref::<Address>(),
            Some(&Address { street: "X".into() })
        );
        assert!(!doc.has("address"));
    }

    #[test]
    fn test_promote_without_constructor_keeps_raw_value() {
        let mut doc = document(json!({"meta": {"k": 1}}));
        let rule = PromotionRule::new("meta", AttributeOptions::new());

        rule.promote(&mut doc).unwrap();

        let meta = doc.properties().get("meta").unwrap();
        assert_eq!(meta.downcast_ref::<Value>(), Some(&json!({"k": 1})));
    }

    #[test]
    fn test_raw_promotion_from_nothing_leaves_null_slot() {
        let mut doc = document(json!({"gone": null}));
        let absent = PromotionRule::new("tag", AttributeOptions::new().promote_if_absent(true));
        let null = PromotionRule::new("gone", AttributeOptions::new().promote_if_absent(true));

        assert_eq!(absent.promote(&mut doc).unwrap(), PromotionOutcome::Promoted);
        assert_eq!(null.promote(&mut doc).unwrap(), PromotionOutcome::Promoted);

        assert!(doc.properties().contains("tag"));
        assert!(!doc.properties().is_present("tag"));
        assert!(!doc.properties().is_present("gone"));
        assert!(!doc.has("gone"));
    }

    #[test]
    fn test_absent_source_is_skipped() {
        let mut doc = document(json!({}));
        let rule = PromotionRule::new("address", AttributeOptions::new());

        assert_eq!(rule.promote(&mut doc).unwrap(), PromotionOutcome::Skipped);
        assert!(!doc.properties().contains("address"));
    }

    #[test]
    fn test_null_source_is_skipped_and_left_in_store() {
        let mut doc = document(json!({"address": null}));
        let rule = PromotionRule::new("address", AttributeOptions::new());

        assert!(rule.ready(&doc));
        assert_eq!(rule.promote(&mut doc).unwrap(), PromotionOutcome::Skipped);
        assert!(doc.has("address"));
    }

    #[test]
    fn test_promote_if_absent_constructs_from_none() {
        let mut doc = document(json!({}));
        let rule = PromotionRule::new(
            "tag",
            AttributeOptions::new()
                .entity(EntityConstructor::entity::<Labelled>())
                .construction_options(json!({"label": "fresh"}))
                .promote_if_absent(true),
        );

        assert!(rule.ready(&doc));
        assert_eq!(rule.promote(&mut doc).unwrap(), PromotionOutcome::Promoted);

        let tag = doc.properties().get("tag").unwrap();
        assert_eq!(
            tag.downcast_ref::<Labelled>(),
            Some(&Labelled {
                raw: None,
                label: json!("fresh")
            })
        );
    }

    #[test]
    fn test_computed_options_see_the_model() {
        let mut doc = document(json!({"tag": 1, "locale": "fr"}));
        let rule = PromotionRule::new(
            "tag",
            AttributeOptions::new()
                .entity(EntityConstructor::entity::<Labelled>())
                .construction_options_with(|m: &Document| json!({ "label": m.get("locale") })),
        );

        rule.promote(&mut doc).unwrap();

        let tag = doc.properties().get("tag").unwrap();
        assert_eq!(tag.downcast_ref::<Labelled>().unwrap().label, json!("fr"));
    }

    #[test]
    fn test_on_promoted_runs_after_write() {
        let mut doc = document(json!({"flag": true}));
        let rule = PromotionRule::new(
            "flag",
            AttributeOptions::new().on_promoted(|m: &mut Document| {
                let seen = m.properties().is_present("flag");
                m.set("seen", json!(seen), WriteMode::Quiet);
            }),
        );

        rule.promote(&mut doc).unwrap();
        assert_eq!(doc.get("seen"), Some(&json!(true)));
    }

    #[test]
    fn test_constructor_error_propagates_without_mutation() {
        let mut doc = document(json!({"address": 42}));
        let rule = PromotionRule::new(
            "address",
            AttributeOptions::new().entity(EntityConstructor::deserialize::<Address>()),
        );

        let err = rule.promote(&mut doc).unwrap_err();
        assert!(matches!(err, PromotionError::Construction { ref target, .. } if target == "address"));
        assert!(doc.has("address"));
        assert!(!doc.properties().contains("address"));
    }

    #[test]
    fn test_custom_strategy_replaces_default() {
        let mut doc = document(json!({"count": 3}));
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let rule = PromotionRule::new(
            "count",
            AttributeOptions::new()
                .target_property("total")
                .on_promoted(move |_: &mut Document| seen.set(seen.get() + 1))
                .strategy(
                    |m: &mut Document,
                     args: &StrategyArgs<'_, Document>|
                     -> PromotionResult<PromotionOutcome> {
                        let doubled =
                            m.get(args.source_key).and_then(Value::as_i64).unwrap_or(0) * 2;
                        m.properties_mut()
                            .set(args.target_property, Box::new(json!(doubled)));
                        args.done(m);
                        Ok(PromotionOutcome::Promoted)
                    },
                ),
        );

        assert!(rule.has_custom_strategy());
        assert_eq!(rule.promote(&mut doc).unwrap(), PromotionOutcome::Promoted);

        let total = doc.properties().get("total").unwrap();
        assert_eq!(total.downcast_ref::<Value>(), Some(&json!(6)));
        // custom strategy chose not to unset the source
        assert!(doc.has("count"));
        assert_eq!(calls.get(), 1);
    }
}
