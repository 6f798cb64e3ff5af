//! Generic Attribute Store
//!
//! The key/value data bag every model owns. Writes come in two modes:
//! `Notify` emits a change event to every listener, `Quiet` does not.
//! Quiet writes are used for internal bookkeeping moves that are not
//! semantic data changes.

use std::fmt;

use serde_json::{Map, Value};

/// Plain serialized form of a model: insertion-ordered key/value pairs
pub type Attributes = Map<String, Value>;

/// Whether a store write notifies listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Emit a change event
    Notify,
    /// Mutate without emitting anything
    Quiet,
}

/// Kind of change reported to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Unset,
}

/// A change notification emitted by a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Attribute key that changed
    pub key: String,
    /// What happened to it
    pub kind: ChangeKind,
}

/// Listener invoked for every notifying write
pub type ChangeListener = Box<dyn FnMut(&ChangeEvent)>;

/// Contract for the generic attribute store.
///
/// `get` returning `None` means the key is absent (undefined);
/// `Some(Value::Null)` means the key is present but null.
pub trait AttributeStore {
    /// Read an attribute
    fn get(&self, key: &str) -> Option<&Value>;

    /// Write an attribute
    fn set(&mut self, key: &str, value: Value, mode: WriteMode);

    /// Remove an attribute, returning the previous value
    fn unset(&mut self, key: &str, mode: WriteMode) -> Option<Value>;

    /// True if the key holds any value, null included
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory attribute store with change listeners
#[derive(Default)]
pub struct MemoryStore {
    attributes: Attributes,
    listeners: Vec<ChangeListener>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with attributes (no events emitted)
    pub fn with_attributes(attributes: Attributes) -> Self {
        Self {
            attributes,
            listeners: Vec::new(),
        }
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Borrow all attributes
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Number of stored attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    fn emit(&mut self, key: &str, kind: ChangeKind) {
        let event = ChangeEvent {
            key: key.to_string(),
            kind,
        };
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    fn set(&mut self, key: &str, value: Value, mode: WriteMode) {
        self.attributes.insert(key.to_string(), value);
        if mode == WriteMode::Notify {
            self.emit(key, ChangeKind::Set);
        }
    }

    fn unset(&mut self, key: &str, mode: WriteMode) -> Option<Value> {
        let previous = self.attributes.shift_remove(key);
        if previous.is_some() && mode == WriteMode::Notify {
            self.emit(key, ChangeKind::Unset);
        }
        previous
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("attributes", &self.attributes)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
