//! Remote Source
//!
//! Where a model's refresh pulls its data from. The transport itself is not
//! part of this crate; `MemorySource` stands in for it.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use futures_util::future::{self, LocalBoxFuture};
use futures_util::FutureExt;
use thiserror::Error;

use super::store::Attributes;

/// A read request sent to a remote source
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Server id of the record, if the model has one
    pub id: Option<String>,
    /// Extra request parameters supplied by the caller
    pub params: Attributes,
}

/// Successful response from a remote source
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Status reported by the source
    pub status: u16,
    /// Raw attributes returned
    pub attributes: Attributes,
}

/// Failure reported by a remote source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed ({status}): {message}")]
pub struct FetchFailure {
    /// Status reported by the source
    pub status: u16,
    /// Human readable reason
    pub message: String,
}

impl FetchFailure {
    /// Create a failure
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Record was not found
    pub fn not_found(id: &str) -> Self {
        Self::new(404, format!("record {} not found", id))
    }
}

/// Trait for the remote data source behind a refresh
pub trait RemoteSource {
    /// Read one record
    fn read(&self, request: FetchRequest) -> LocalBoxFuture<'_, Result<FetchResponse, FetchFailure>>;
}

/// In-memory remote source for testing and local use
#[derive(Debug, Default)]
pub struct MemorySource {
    records: RefCell<HashMap<String, Attributes>>,
    failures: RefCell<VecDeque<FetchFailure>>,
    requests: Cell<usize>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace a record
    pub fn put(&self, id: &str, attributes: Attributes) {
        self.records.borrow_mut().insert(id.to_string(), attributes);
    }

    /// Make the next read fail with `failure`
    pub fn fail_next(&self, failure: FetchFailure) {
        self.failures.borrow_mut().push_back(failure);
    }

    /// Number of reads served so far
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    fn serve(&self, request: &FetchRequest) -> Result<FetchResponse, FetchFailure> {
        self.requests.set(self.requests.get() + 1);

        if let Some(failure) = self.failures.borrow_mut().pop_front() {
            return Err(failure);
        }

        let id = request
            .id
            .as_deref()
            .ok_or_else(|| FetchFailure::new(400, "model has no id"))?;

        self.records
            .borrow()
            .get(id)
            .cloned()
            .map(|attributes| FetchResponse {
                status: 200,
                attributes,
            })
            .ok_or_else(|| FetchFailure::not_found(id))
    }
}

impl RemoteSource for MemorySource {
    fn read(&self, request: FetchRequest) -> LocalBoxFuture<'_, Result<FetchResponse, FetchFailure>> {
        future::ready(self.serve(&request)).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(id: &str) -> FetchRequest {
        FetchRequest {
            id: Some(id.to_string()),
            ..FetchRequest::default()
        }
    }

    #[tokio::test]
    async fn test_read_existing_record() {
        let source = MemorySource::new();
        let mut attrs = Attributes::new();
        attrs.insert("name".into(), json!("ada"));
        source.put("1", attrs.clone());

        let response = source.read(request("1")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.attributes, attrs);
        assert_eq!(source.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let source = MemorySource::new();
        let failure = source.read(request("nope")).await.unwrap_err();
        assert_eq!(failure.status, 404);
    }

    #[tokio::test]
    async fn test_missing_id_is_rejected() {
        let source = MemorySource::new();
        let failure = source.read(FetchRequest::default()).await.unwrap_err();
        assert_eq!(failure.status, 400);
    }

    #[tokio::test]
    async fn test_queued_failure_served_once() {
        let source = MemorySource::new();
        source.put("1", Attributes::new());
        source.fail_next(FetchFailure::new(503, "unavailable"));

        let first = source.read(request("1")).await;
        let second = source.read(request("1")).await;

        assert_eq!(first.unwrap_err(), FetchFailure::new(503, "unavailable"));
        assert!(second.is_ok());
        assert_eq!(source.request_count(), 2);
    }
}
