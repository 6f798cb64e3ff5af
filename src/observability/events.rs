//! Observable promotion events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in the promotion lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Manager lifecycle
    /// Manager attached to a model
    ManagerInstalled,
    /// Install called on an already managed model
    ManagerInstallSkipped,
    /// Manager detached, original behaviour restored
    ManagerRemoved,

    // Registration
    /// Rule stored and accessor installed
    RuleRegistered,
    /// Rule refused (reserved accessor name)
    RuleRejected,

    // Promotion
    /// Raw attribute moved into its property slot
    AttributePromoted,
    /// Promotion short-circuited, nothing to promote
    AttributeSkipped,

    // Refresh
    /// Refresh resolved and rules re-ran
    RefreshResolved,
    /// Refresh rejected
    RefreshRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ManagerInstalled => "MANAGER_INSTALLED",
            Event::ManagerInstallSkipped => "MANAGER_INSTALL_SKIPPED",
            Event::ManagerRemoved => "MANAGER_REMOVED",
            Event::RuleRegistered => "RULE_REGISTERED",
            Event::RuleRejected => "RULE_REJECTED",
            Event::AttributePromoted => "ATTRIBUTE_PROMOTED",
            Event::AttributeSkipped => "ATTRIBUTE_SKIPPED",
            Event::RefreshResolved => "REFRESH_RESOLVED",
            Event::RefreshRejected => "REFRESH_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::AttributeSkipped | Event::ManagerInstallSkipped => Severity::Trace,
            Event::RuleRejected | Event::RefreshRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
