//! aeromodel - typed attribute promotion for refreshable models
//!
//! Raw attributes become typed properties, re-promoted after every refresh
//! and folded back into the serialized form.

pub mod config;
pub mod model;
pub mod observability;
pub mod promotion;

pub use config::PromotionConfig;
pub use model::{AttributeStore, Document, Fetchable, Model, RefreshOptions, Serializable};
pub use promotion::{AttributeOptions, EntityConstructor, Managed, PromotionError, RefreshError};
