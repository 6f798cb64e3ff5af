//! Promoted Property Slots
//!
//! Typed values living directly on a model, outside its attribute store.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Object-safe access to `Any` for every `'static` type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value that can occupy a promoted property slot.
///
/// `to_json` is the serialize capability: values returning `Some` are folded
/// back into the owning model's serialized output. The default is `None`.
pub trait PromotedValue: AsAny + fmt::Debug {
    fn to_json(&self) -> Option<Value> {
        None
    }
}

/// Raw values promoted verbatim carry no serialize capability.
impl PromotedValue for Value {}

impl dyn PromotedValue {
    /// Downcast to a concrete promoted type
    pub fn downcast_ref<T: PromotedValue>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast mutably to a concrete promoted type
    pub fn downcast_mut<T: PromotedValue>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Named property slots on a model.
///
/// A slot is either absent, null, or holds a value.
#[derive(Debug, Default)]
pub struct Properties {
    slots: BTreeMap<String, Option<Box<dyn PromotedValue>>>,
}

impl Properties {
    /// Create empty slots
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `name`, replacing whatever was there
    pub fn set(&mut self, name: &str, value: Box<dyn PromotedValue>) {
        self.slots.insert(name.to_string(), Some(value));
    }

    /// Set the slot to null, keeping the name
    pub fn clear(&mut self, name: &str) {
        self.slots.insert(name.to_string(), None);
    }

    /// Drop the slot entirely
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn PromotedValue>> {
        self.slots.remove(name).flatten()
    }

    /// Non-null value under `name`
    pub fn get(&self, name: &str) -> Option<&(dyn PromotedValue + 'static)> {
        self.slots.get(name)?.as_deref()
    }

    /// Mutable non-null value under `name`
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn PromotedValue + 'static)> {
        self.slots.get_mut(name)?.as_deref_mut()
    }

    /// True if the slot holds a non-null value
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True if the slot exists, null or not
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Slot names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}
