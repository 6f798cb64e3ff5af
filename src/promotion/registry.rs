//! Promotion bookkeeping
//!
//! `PromotedRegistry` remembers which target properties have been promoted
//! at least once. `AccessorTable` maps derived accessor names back to the
//! target property they query. Both keep insertion order.

/// Ordered set of target properties promoted at least once
#[derive(Debug, Default, Clone)]
pub struct PromotedRegistry {
    names: Vec<String>,
}

impl PromotedRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a promotion; returns false if the name was already present
    pub fn record(&mut self, target_property: &str) -> bool {
        if self.contains(target_property) {
            return false;
        }
        self.names.push(target_property.to_string());
        true
    }

    /// Check membership
    pub fn contains(&self, target_property: &str) -> bool {
        self.names.iter().any(|name| name == target_property)
    }

    /// Names in first-promotion order
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Installed capability-query accessors
#[derive(Debug, Default, Clone)]
pub struct AccessorTable {
    entries: Vec<(String, String)>,
}

impl AccessorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `accessor` for `target_property`.
    ///
    /// An accessor already installed keeps its position and now queries
    /// `target_property`.
    pub fn install(&mut self, accessor: &str, target_property: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == accessor) {
            Some((_, target)) => *target = target_property.to_string(),
            None => self
                .entries
                .push((accessor.to_string(), target_property.to_string())),
        }
    }

    /// Target property queried by `accessor`
    pub fn target_of(&self, accessor: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == accessor)
            .map(|(_, target)| target.as_str())
    }

    /// Accessor names in installation order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
