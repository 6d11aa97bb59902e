#![forbid(unsafe_code)]

//! `window.localStorage` as overlay persistence.

use livedoc_overlay::OverlayStorage;
use tracing::warn;
use web_sys::Storage;

/// Overlay storage over `localStorage`. When storage is unavailable (for
/// example disabled by the browser) reads miss and writes are dropped.
#[derive(Debug, Clone)]
pub(crate) struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub(crate) fn open() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            warn!(message = "storage.unavailable");
        }
        Self { storage }
    }
}

impl OverlayStorage for LocalStorage {
    fn get(&self, name: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(name).ok().flatten()
    }

    fn set(&mut self, name: &str, value: &str) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(err) = storage.set_item(name, value) {
            warn!(message = "storage.set.failed", name, err = ?err);
        }
    }

    fn remove(&mut self, name: &str) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(err) = storage.remove_item(name) {
            warn!(message = "storage.remove.failed", name, err = ?err);
        }
    }
}
