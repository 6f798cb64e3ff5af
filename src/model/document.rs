//! Document Model
//!
//! Reference model backed by a `MemoryStore` and any `RemoteSource`.

use std::fmt;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use uuid::Uuid;

use super::lifecycle::{Fetchable, RefreshOptions, Serializable};
use super::properties::Properties;
use super::source::{FetchFailure, FetchRequest, FetchResponse, RemoteSource};
use super::store::{AttributeStore, Attributes, ChangeEvent, MemoryStore, WriteMode};
use super::Model;

/// A refreshable, serializable record
pub struct Document {
    cid: String,
    id: Option<String>,
    attributes: MemoryStore,
    properties: Properties,
    source: Rc<dyn RemoteSource>,
}

impl Document {
    /// Create an empty document bound to `source`
    pub fn new(source: Rc<dyn RemoteSource>) -> Self {
        Self {
            cid: Uuid::new_v4().to_string(),
            id: None,
            attributes: MemoryStore::new(),
            properties: Properties::new(),
            source,
        }
    }

    /// Create a document with initial attributes (no change events)
    pub fn with_attributes(source: Rc<dyn RemoteSource>, attributes: Attributes) -> Self {
        Self {
            attributes: MemoryStore::with_attributes(attributes),
            ..Self::new(source)
        }
    }

    /// Set the server id used by refresh
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Server id, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Register a change listener on the attribute store
    pub fn on_change(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) {
        self.attributes.subscribe(listener);
    }

    /// Borrow the raw attributes
    pub fn attributes(&self) -> &Attributes {
        self.attributes.attributes()
    }
}

impl AttributeStore for Document {
    fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    fn set(&mut self, key: &str, value: Value, mode: WriteMode) {
        self.attributes.set(key, value, mode);
    }

    fn unset(&mut self, key: &str, mode: WriteMode) -> Option<Value> {
        self.attributes.unset(key, mode)
    }
}

impl Serializable for Document {
    fn serialize(&self) -> Attributes {
        self.attributes.attributes().clone()
    }
}

impl Fetchable for Document {
    type Error = FetchFailure;

    fn refresh(&mut self, options: RefreshOptions) -> LocalBoxFuture<'_, Result<FetchResponse, FetchFailure>> {
        let source = Rc::clone(&self.source);
        let request = FetchRequest {
            id: self.id.clone(),
            params: options.params,
        };
        let (success, error) = (options.success, options.error);

        Box::pin(async move {
            match source.read(request).await {
                Ok(response) => {
                    for (key, value) in &response.attributes {
                        self.attributes.set(key, value.clone(), WriteMode::Notify);
                    }
                    if let Some(callback) = success {
                        callback(&response);
                    }
                    Ok(response)
                }
                Err(failure) => {
                    if let Some(callback) = error {
                        callback(&failure);
                    }
                    Err(failure)
                }
            }
        })
    }
}

impl Model for Document {
    fn cid(&self) -> &str {
        &self.cid
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("cid", &self.cid)
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .field("properties", &self.properties)
            .finish()
    }
}
