//! Promotion Error Types

use thiserror::Error;

use crate::model::FetchFailure;

/// Result type for promotion operations
pub type PromotionResult<T> = Result<T, PromotionError>;

/// Promotion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionError {
    #[error("Can't use `{target}` with `{accessor}` method")]
    ReservedAccessor { target: String, accessor: String },

    #[error("No promotion manager installed on this model")]
    NotInstalled,

    #[error("Failed to construct `{target}`: {message}")]
    Construction { target: String, message: String },

    #[error("Promotion strategy for `{target}` failed: {message}")]
    Strategy { target: String, message: String },
}

impl PromotionError {
    /// Create a reserved accessor error
    pub fn reserved_accessor(target: impl Into<String>, accessor: impl Into<String>) -> Self {
        Self::ReservedAccessor {
            target: target.into(),
            accessor: accessor.into(),
        }
    }

    /// Create a construction error
    pub fn construction(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a strategy error
    pub fn strategy(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReservedAccessor { .. } => "AERO_PROMOTION_RESERVED_ACCESSOR",
            Self::NotInstalled => "AERO_PROMOTION_NOT_INSTALLED",
            Self::Construction { .. } => "AERO_PROMOTION_CONSTRUCTION_FAILED",
            Self::Strategy { .. } => "AERO_PROMOTION_STRATEGY_FAILED",
        }
    }

    /// Configuration errors must be fixed by the caller, not retried
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ReservedAccessor { .. } | Self::NotInstalled)
    }
}

/// Errors a decorated refresh rejects with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The underlying refresh failed; passed through unchanged
    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    /// Re-running a rule after a successful refresh failed
    #[error(transparent)]
    Promotion(#[from] PromotionError),
}

impl RefreshError {
    /// The original fetch failure, if that is what this is
    pub fn as_fetch(&self) -> Option<&FetchFailure> {
        match self {
            Self::Fetch(failure) => Some(failure),
            Self::Promotion(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_accessor_message() {
        let err = PromotionError::reserved_accessor("changed", "hasChanged");
        assert_eq!(err.to_string(), "Can't use `changed` with `hasChanged` method");
        assert_eq!(err.code(), "AERO_PROMOTION_RESERVED_ACCESSOR");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_construction_is_not_configuration() {
        let err = PromotionError::construction("address", "bad street");
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("bad street"));
    }

    #[test]
    fn test_refresh_error_passes_fetch_through() {
        let failure = FetchFailure::new(500, "boom");
        let err = RefreshError::from(failure.clone());

        assert_eq!(err.as_fetch(), Some(&failure));
        assert_eq!(err.to_string(), failure.to_string());
    }
}
