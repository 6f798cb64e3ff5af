//! Attribute Promotion
//!
//! Moves raw values out of a model's generic attribute store into typed
//! property slots, and keeps them there across refreshes.
//!
//! - A `PromotionRule` describes one promotion
//! - A `PromotionManager` owns the rules for one model
//! - `Managed` wraps the model, holds at most one manager, and decorates
//!   the model's refresh and serialize
//!
//! # Usage
//!
//! ```ignore
//! let mut model = Managed::installed(document);
//! model.register_attribute(
//!     "address",
//!     AttributeOptions::new().entity(EntityConstructor::deserialize::<Address>()),
//! )?;
//!
//! model.refresh(RefreshOptions::new()).await?;
//! assert_eq!(model.query("hasAddress"), Some(true));
//! ```

mod errors;
mod managed;
mod manager;
mod naming;
mod registry;
mod rule;

pub use errors::{PromotionError, PromotionResult, RefreshError};
pub use managed::Managed;
pub use manager::PromotionManager;
pub use naming::{accessor_name, to_class_case};
pub use registry::{AccessorTable, PromotedRegistry};
pub use rule::{
    AttributeOptions, ConstructionOptions, Entity, EntityConstructor, OnPromoted,
    PromotionOutcome, PromotionRule, PromotionStrategy, StrategyArgs,
};
