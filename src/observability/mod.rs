//! Observability for the promotion engine
//!
//! - Structured logging (JSON-rendered fields, via `tracing`)
//! - Per-manager counters
//! - Typed lifecycle events
//!
//! # Usage
//!
//! ```ignore
//! use aeromodel::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::AttributePromoted, &[("target", "address")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, PromotionMetrics};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::RuleRegistered, &[("target", "address")]);
    }
}
