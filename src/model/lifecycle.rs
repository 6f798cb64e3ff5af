//! Lifecycle Interfaces
//!
//! The two model operations a promotion manager decorates: serialize and
//! refresh. Decorators implement the same traits and delegate to the
//! wrapped original.

use std::fmt;

use futures_util::future::LocalBoxFuture;

use super::source::{FetchFailure, FetchResponse};
use super::store::Attributes;

/// Callback run after a successful refresh
pub type SuccessCallback = Box<dyn FnOnce(&FetchResponse)>;

/// Callback run after a failed refresh
pub type ErrorCallback = Box<dyn FnOnce(&FetchFailure)>;

/// Options accepted by a refresh
#[derive(Default)]
pub struct RefreshOptions {
    /// Request parameters forwarded to the remote source
    pub params: Attributes,
    /// Invoked once on success
    pub success: Option<SuccessCallback>,
    /// Invoked once on failure
    pub error: Option<ErrorCallback>,
}

impl RefreshOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request parameter
    pub fn param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Set the success callback
    pub fn on_success(mut self, callback: impl FnOnce(&FetchResponse) + 'static) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    /// Set the failure callback
    pub fn on_error(mut self, callback: impl FnOnce(&FetchFailure) + 'static) -> Self {
        self.error = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for RefreshOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshOptions")
            .field("params", &self.params)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Something with a plain serialized form
pub trait Serializable {
    fn serialize(&self) -> Attributes;
}

/// Something that can repopulate itself from a remote source
pub trait Fetchable {
    /// Error the refresh future rejects with
    type Error;

    /// Refresh from the source
    fn refresh(&mut self, options: RefreshOptions) -> LocalBoxFuture<'_, Result<FetchResponse, Self::Error>>;
}
