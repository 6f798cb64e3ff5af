//! Managed Model
//!
//! Decorator that wraps a model and carries at most one promotion manager.
//! It implements the model's own lifecycle traits and routes refresh and
//! serialize through the manager while one is installed. Without a manager
//! every call goes straight to the wrapped model.

use futures_util::future::LocalBoxFuture;
use serde_json::Value;

use super::errors::{PromotionError, PromotionResult, RefreshError};
use super::manager::PromotionManager;
use super::rule::AttributeOptions;
use crate::config::{ConfigResult, PromotionConfig};
use crate::model::{
    AttributeStore, Attributes, FetchResponse, Fetchable, Model, PromotedValue, RefreshOptions,
    Serializable, WriteMode,
};
use crate::observability::{log_event_with_fields, Event, MetricsSnapshot};

/// A model with optional attribute promotion
#[derive(Debug)]
pub struct Managed<M: Model> {
    model: M,
    config: PromotionConfig,
    manager: Option<PromotionManager<M>>,
}

impl<M: Model> Managed<M> {
    /// Wrap a model without installing a manager
    pub fn new(model: M) -> Self {
        Self {
            model,
            config: PromotionConfig::default(),
            manager: None,
        }
    }

    /// Wrap a model with a custom configuration, rejecting an invalid one
    pub fn with_config(model: M, config: PromotionConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            manager: None,
        })
    }

    /// Wrap a model and install a manager
    pub fn installed(model: M) -> Self {
        let mut managed = Self::new(model);
        managed.install();
        managed
    }

    /// Attach a manager. A no-op when one is already installed.
    pub fn install(&mut self) {
        if self.manager.is_some() {
            log_event_with_fields(Event::ManagerInstallSkipped, &[("cid", self.model.cid())]);
            return;
        }

        self.manager = Some(PromotionManager::new(self.config.clone()));
        log_event_with_fields(Event::ManagerInstalled, &[("cid", self.model.cid())]);
    }

    /// Detach the manager, restoring the model's own refresh and serialize.
    ///
    /// Values already promoted stay in their property slots. A no-op when
    /// nothing is installed.
    pub fn remove(&mut self) {
        if self.manager.take().is_some() {
            log_event_with_fields(Event::ManagerRemoved, &[("cid", self.model.cid())]);
        }
    }

    pub fn is_installed(&self) -> bool {
        self.manager.is_some()
    }

    /// Register a promotion rule
    pub fn register_attribute(
        &mut self,
        source_key: &str,
        options: AttributeOptions<M>,
    ) -> PromotionResult<()> {
        let manager = self.manager.as_mut().ok_or(PromotionError::NotInstalled)?;
        manager.register(&mut self.model, source_key, options)
    }

    /// Target properties promoted at least once
    pub fn promoted_names(&self) -> Vec<&str> {
        self.manager
            .as_ref()
            .map(PromotionManager::promoted_names)
            .unwrap_or_default()
    }

    pub fn is_promoted(&self, target_property: &str) -> bool {
        self.manager
            .as_ref()
            .is_some_and(|manager| manager.is_promoted(target_property))
    }

    /// True if a rule exists for `target_property` and its slot is non-null
    pub fn has_direct(&self, target_property: &str) -> bool {
        self.manager
            .as_ref()
            .is_some_and(|manager| manager.has_direct(&self.model, target_property))
    }

    /// Evaluate a per-rule accessor such as `hasAddress`.
    ///
    /// `None` when no accessor by that name is installed.
    pub fn query(&self, accessor: &str) -> Option<bool> {
        self.manager
            .as_ref()
            .and_then(|manager| manager.query(&self.model, accessor))
    }

    /// Installed accessor names
    pub fn accessor_names(&self) -> Vec<&str> {
        self.manager
            .as_ref()
            .map(PromotionManager::accessor_names)
            .unwrap_or_default()
    }

    /// Counters of the installed manager
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.manager.as_ref().map(PromotionManager::metrics)
    }

    /// The installed manager
    pub fn manager(&self) -> Option<&PromotionManager<M>> {
        self.manager.as_ref()
    }

    /// Typed access to a promoted property
    pub fn property<T: PromotedValue>(&self, name: &str) -> Option<&T> {
        self.model.properties().get(name)?.downcast_ref::<T>()
    }

    /// Typed mutable access to a promoted property
    pub fn property_mut<T: PromotedValue>(&mut self, name: &str) -> Option<&mut T> {
        self.model.properties_mut().get_mut(name)?.downcast_mut::<T>()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Unwrap the model, dropping any manager
    pub fn into_inner(self) -> M {
        self.model
    }
}

impl<M: Model> AttributeStore for Managed<M> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.model.get(key)
    }

    fn set(&mut self, key: &str, value: Value, mode: WriteMode) {
        self.model.set(key, value, mode);
    }

    fn unset(&mut self, key: &str, mode: WriteMode) -> Option<Value> {
        self.model.unset(key, mode)
    }
}

impl<M: Model> Serializable for Managed<M> {
    fn serialize(&self) -> Attributes {
        let base = self.model.serialize();
        match &self.manager {
            Some(manager) => manager.serialize(&self.model, base),
            None => base,
        }
    }
}

impl<M: Model> Fetchable for Managed<M> {
    type Error = RefreshError;

    fn refresh(&mut self, mut options: RefreshOptions) -> LocalBoxFuture<'_, Result<FetchResponse, RefreshError>> {
        // Callbacks are held back so the base refresh cannot run them before
        // promotion has re-run.
        let (success, error) = if self.manager.is_some() {
            (options.success.take(), options.error.take())
        } else {
            (None, None)
        };

        Box::pin(async move {
            let outcome = self.model.refresh(options).await;

            let Some(manager) = self.manager.as_mut() else {
                return outcome.map_err(RefreshError::Fetch);
            };

            match outcome {
                Ok(response) => {
                    if let Err(err) = manager.run_all(&mut self.model) {
                        manager.refresh_rejected(&self.model, &err.to_string());
                        return Err(RefreshError::Promotion(err));
                    }
                    manager.refresh_resolved(&self.model);
                    if let Some(callback) = success {
                        callback(&response);
                    }
                    Ok(response)
                }
                Err(failure) => {
                    manager.fetch_rejected(&self.model, &failure);
                    if let Some(callback) = error {
                        callback(&failure);
                    }
                    Err(RefreshError::Fetch(failure))
                }
            }
        })
    }
}
