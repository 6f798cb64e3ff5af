//! Promotion metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Live as long as the manager that owns them

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by one promotion manager
#[derive(Debug, Default)]
pub struct PromotionMetrics {
    /// Rules accepted by register
    rules_registered: AtomicU64,
    /// Successful promotions
    promotions: AtomicU64,
    /// Promotions short-circuited
    skips: AtomicU64,
    /// Refreshes that resolved
    refreshes_resolved: AtomicU64,
    /// Refreshes that rejected
    refreshes_rejected: AtomicU64,
}

impl PromotionMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment rules registered
    pub fn increment_rules_registered(&self) {
        self.rules_registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment promotions
    pub fn increment_promotions(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment skips
    pub fn increment_skips(&self) {
        self.skips.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment resolved refreshes
    pub fn increment_refreshes_resolved(&self) {
        self.refreshes_resolved.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected refreshes
    pub fn increment_refreshes_rejected(&self) {
        self.refreshes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rules_registered: self.rules_registered.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            skips: self.skips.load(Ordering::Relaxed),
            refreshes_resolved: self.refreshes_resolved.load(Ordering::Relaxed),
            refreshes_rejected: self.refreshes_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub rules_registered: u64,
    pub promotions: u64,
    pub skips: u64,
    pub refreshes_resolved: u64,
    pub refreshes_rejected: u64,
}
