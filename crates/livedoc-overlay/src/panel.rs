#![forbid(unsafe_code)]

//! Content panels and the ordered, keyed collection an overlay pages through.
//!
//! # Invariants
//!
//! - Keys are unique within a [`PanelSet`].
//! - `index` is the insertion position and never changes; panels are never
//!   removed for the life of a page.

use std::borrow::Borrow;
use std::fmt;

use ahash::AHashMap;

use crate::colorize::ColorizeOptions;

/// Stable identity of a content panel within its overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelKey(String);

impl PanelKey {
    /// Create a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PanelKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PanelKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for PanelKey {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for PanelKey {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// One unit of content that can be displayed in an overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPanel {
    key: PanelKey,
    index: usize,
    theme_hint: ColorizeOptions,
}

impl ContentPanel {
    /// The panel key.
    pub fn key(&self) -> &PanelKey {
        &self.key
    }

    /// Insertion position, used only for paging arithmetic.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declarative theme read when the panel becomes current.
    pub fn theme_hint(&self) -> &ColorizeOptions {
        &self.theme_hint
    }
}

/// Ordered collection of panels, addressable by key and by position.
#[derive(Debug, Clone, Default)]
pub struct PanelSet {
    panels: Vec<ContentPanel>,
    indices: AHashMap<PanelKey, usize>,
}

impl PanelSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered panels.
    #[inline]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    /// Whether no panel has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Append a panel. Returns `None` when `key` is already registered.
    pub fn insert(&mut self, key: PanelKey, theme_hint: ColorizeOptions) -> Option<&ContentPanel> {
        if self.indices.contains_key(&key) {
            return None;
        }
        let index = self.panels.len();
        self.indices.insert(key.clone(), index);
        self.panels.push(ContentPanel {
            key,
            index,
            theme_hint,
        });
        self.panels.last()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.indices.contains_key(key)
    }

    /// Look a panel up by key.
    pub fn get(&self, key: &str) -> Option<&ContentPanel> {
        self.index_of(key).and_then(|index| self.panels.get(index))
    }

    /// Position of `key` in paging order.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.indices.get(key).copied()
    }

    /// Panel at `index`.
    pub fn at(&self, index: usize) -> Option<&ContentPanel> {
        self.panels.get(index)
    }

    /// Key at `index`.
    pub fn key_at(&self, index: usize) -> Option<&PanelKey> {
        self.panels.get(index).map(ContentPanel::key)
    }

    /// Most recently registered panel.
    pub fn last(&self) -> Option<&ContentPanel> {
        self.panels.last()
    }

    /// Iterate panels in paging order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentPanel> {
        self.panels.iter()
    }

    /// Iterate keys in paging order.
    pub fn keys(&self) -> impl Iterator<Item = &PanelKey> {
        self.panels.iter().map(ContentPanel::key)
    }

    /// Position reached by moving `delta` steps from `current`, wrapping in
    /// both directions. `None` when the set is empty.
    pub fn wrap_index(&self, current: usize, delta: i64) -> Option<usize> {
        if self.panels.is_empty() {
            return None;
        }
        let len = self.panels.len() as i64;
        let start = (current as i64).rem_euclid(len);
        let step = delta.rem_euclid(len);
        Some(((start + step) % len) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(keys: &[&str]) -> PanelSet {
        let mut set = PanelSet::new();
        for key in keys {
            set.insert(PanelKey::from(*key), ColorizeOptions::default())
                .expect("unique key");
        }
        set
    }

    #[test]
    fn insert_assigns_positions_in_order() {
        let set = set_of(&["a", "b", "c"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.index_of("b"), Some(1));
        assert_eq!(set.key_at(2).map(PanelKey::as_str), Some("c"));
        assert_eq!(set.last().map(|p| p.key().as_str()), Some("c"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut set = set_of(&["a"]);
        assert!(set.insert("a".into(), ColorizeOptions::default()).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn wrap_index_handles_both_directions() {
        let set = set_of(&["a", "b", "c"]);
        assert_eq!(set.wrap_index(0, 1), Some(1));
        assert_eq!(set.wrap_index(2, 1), Some(0));
        assert_eq!(set.wrap_index(0, -1), Some(2));
        assert_eq!(set.wrap_index(1, -7), Some(0));
        assert_eq!(set.wrap_index(1, 3), Some(1));
        // i64::MIN ≡ 1 (mod 3)
        assert_eq!(set.wrap_index(1, i64::MIN), Some(2));
    }

    #[test]
    fn wrap_index_on_empty_set_is_none() {
        assert_eq!(PanelSet::new().wrap_index(0, 1), None);
    }

    #[test]
    fn timestamps_convert_to_keys() {
        assert_eq!(PanelKey::from(1_732_000_000_i64).as_str(), "1732000000");
    }
}
