//! Promotion Configuration
//!
//! Naming rules for capability-query accessors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Accessor prefix must not be empty")]
    EmptyPrefix,
}

/// Configuration for a promotion manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Prefix of derived accessor names (default: "has")
    #[serde(default = "default_accessor_prefix")]
    pub accessor_prefix: String,

    /// Accessor names that clash with the model's own queries
    /// (default: ["hasChanged", "hasOwnProperty"])
    #[serde(default = "default_reserved_accessors")]
    pub reserved_accessors: Vec<String>,
}

fn default_accessor_prefix() -> String {
    "has".to_string()
}

fn default_reserved_accessors() -> Vec<String> {
    vec![
        "hasChanged".to_string(),     // change-tracking query
        "hasOwnProperty".to_string(), // own-property query
    ]
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            accessor_prefix: default_accessor_prefix(),
            reserved_accessors: default_reserved_accessors(),
        }
    }
}

impl PromotionConfig {
    /// Load configuration from a JSON document, filling in defaults
    pub fn from_json(input: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    pub fn validate(&self) -> ConfigResult<()> {
        if self.accessor_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }

    /// Add a reserved accessor name
    pub fn reserve(mut self, accessor: impl Into<String>) -> Self {
        self.reserved_accessors.push(accessor.into());
        self
    }

    /// Check whether an accessor name is reserved
    pub fn is_reserved(&self, accessor: &str) -> bool {
        self.reserved_accessors.iter().any(|name| name == accessor)
    }
}
