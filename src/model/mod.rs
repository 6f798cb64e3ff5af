//! # Model Contracts
//!
//! The collaborator a promotion manager decorates. A model owns:
//!
//! - a generic attribute store (`AttributeStore`) with a quiet write mode
//! - promoted property slots (`Properties`) living outside that store
//! - a serialize operation (`Serializable`)
//! - an asynchronous refresh from a remote source (`Fetchable`)
//!
//! `Document` is the in-memory reference model used by tests and examples.

mod document;
mod lifecycle;
mod properties;
mod source;
mod store;

pub use document::Document;
pub use lifecycle::{ErrorCallback, Fetchable, RefreshOptions, Serializable, SuccessCallback};
pub use properties::{AsAny, Properties, PromotedValue};
pub use source::{FetchFailure, FetchRequest, FetchResponse, MemorySource, RemoteSource};
pub use store::{
    AttributeStore, Attributes, ChangeEvent, ChangeKind, ChangeListener, MemoryStore, WriteMode,
};

/// A model that promotion can be attached to
pub trait Model: AttributeStore + Serializable + Fetchable<Error = FetchFailure> {
    /// Client-side identifier, used in log fields
    fn cid(&self) -> &str;

    /// Promoted property slots
    fn properties(&self) -> &Properties;

    /// Mutable promoted property slots
    fn properties_mut(&mut self) -> &mut Properties;
}
