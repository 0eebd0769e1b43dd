//! Per-session accumulators: discovered tokens and runtime references

use crate::types::ElementReference;
use indexmap::IndexSet;

/// Distinct tokens seen during a session, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ClassSet {
    tokens: IndexSet<String>,
}

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the token was not seen before.
    pub fn insert(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() || self.tokens.contains(token) {
            return false;
        }
        self.tokens.insert(token.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

/// References that need runtime script support.
///
/// Filled while classifying tokens and scanning class attributes, read once by
/// the script renderer, then cleared before the next session.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
    element_references: IndexSet<ElementReference>,
    class_copies: IndexSet<String>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element_reference(&mut self, element_id: &str, property: &str) {
        let reference = ElementReference::new(element_id, property);
        if self.element_references.insert(reference) {
            log::debug!("Registered element reference #{}:{}", element_id, property);
        }
    }

    pub fn add_class_copy(&mut self, element_id: &str) {
        if self.class_copies.insert(element_id.to_string()) {
            log::debug!("Registered class copy reference #{}.classes", element_id);
        }
    }

    pub fn element_references(&self) -> impl Iterator<Item = &ElementReference> {
        self.element_references.iter()
    }

    pub fn class_copies(&self) -> impl Iterator<Item = &str> {
        self.class_copies.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.element_references.is_empty() && self.class_copies.is_empty()
    }

    pub fn clear(&mut self) {
        self.element_references.clear();
        self.class_copies.clear();
    }
}
