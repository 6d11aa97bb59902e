#![forbid(unsafe_code)]

//! Durable persistence of the open overlay and its visible panel.
//!
//! Two entries are kept: [`OVERLAY_ID_KEY`] names the overlay that should be
//! reopened after a reload and [`OVERLAY_KEY_KEY`] names the panel within it.
//! Restoration requires both to be present.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::panel::PanelKey;

/// Storage entry holding the id of the overlay to restore.
pub const OVERLAY_ID_KEY: &str = "overlayId";
/// Storage entry holding the key of the panel to restore.
pub const OVERLAY_KEY_KEY: &str = "overlayKey";

/// Synchronous key/value store that survives a page reload.
pub trait OverlayStorage {
    /// Read an entry.
    fn get(&self, name: &str) -> Option<String>;
    /// Write an entry.
    fn set(&mut self, name: &str, value: &str);
    /// Delete an entry.
    fn remove(&mut self, name: &str);
}

/// The persisted `(overlay id, panel key)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSelection {
    pub overlay_id: String,
    pub key: PanelKey,
}

impl PersistedSelection {
    /// Read the pair from `storage`. `None` unless both entries exist.
    pub fn load(storage: &impl OverlayStorage) -> Option<Self> {
        let overlay_id = storage.get(OVERLAY_ID_KEY)?;
        let key = storage.get(OVERLAY_KEY_KEY)?;
        if overlay_id.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self {
            overlay_id,
            key: PanelKey::new(key),
        })
    }

    /// Write both entries.
    pub fn store(&self, storage: &mut impl OverlayStorage) {
        storage.set(OVERLAY_ID_KEY, &self.overlay_id);
        storage.set(OVERLAY_KEY_KEY, self.key.as_str());
    }

    /// Remove both entries.
    pub fn clear(storage: &mut impl OverlayStorage) {
        storage.remove(OVERLAY_KEY_KEY);
        storage.remove(OVERLAY_ID_KEY);
    }
}

/// In-memory storage shared between clones.
///
/// Clones observe the same entries, which lets a test drop an overlay,
/// "reload", and construct a new one against the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<AHashMap<String, String>>>,
    writes: Rc<RefCell<usize>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`remove` calls observed across all clones.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl OverlayStorage for MemoryStorage {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.borrow().get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        *self.writes.borrow_mut() += 1;
        self.entries
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove(&mut self, name: &str) {
        *self.writes.borrow_mut() += 1;
        self.entries.borrow_mut().remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_requires_both_entries() {
        let mut storage = MemoryStorage::new();
        storage.set(OVERLAY_ID_KEY, "renders");
        assert_eq!(PersistedSelection::load(&storage), None);

        storage.set(OVERLAY_KEY_KEY, "17");
        assert_eq!(
            PersistedSelection::load(&storage),
            Some(PersistedSelection {
                overlay_id: "renders".into(),
                key: PanelKey::new("17"),
            })
        );
    }

    #[test]
    fn clones_share_entries() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        PersistedSelection {
            overlay_id: "x".into(),
            key: "k".into(),
        }
        .store(&mut a);
        assert_eq!(b.get(OVERLAY_KEY_KEY).as_deref(), Some("k"));
        assert_eq!(b.write_count(), 2);

        PersistedSelection::clear(&mut a);
        assert!(b.is_empty());
    }
}
