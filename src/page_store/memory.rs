//! In-memory page store used by unit tests.

use super::{PageEntry, PageStore, StoreError};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryPageStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    pages: BTreeMap<String, Vec<u8>>,
    quarantined: Vec<(String, Vec<u8>)>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            for (name, content) in pages {
                inner
                    .pages
                    .insert(name.to_string(), content.as_bytes().to_vec());
            }
        }
        store
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().unwrap().pages.contains_key(name)
    }

    /// Names of pages moved into quarantine, in deletion order.
    pub fn quarantined_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .quarantined
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl PageStore for MemoryPageStore {
    fn list(&self) -> Result<Vec<PageEntry>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .pages
            .keys()
            .map(|name| PageEntry {
                name: name.clone(),
                modified: Utc::now(),
            })
            .collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .pages
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pages.insert(name.to_string(), content.to_vec());
        Ok(())
    }

    fn soft_delete(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.pages.remove(name) {
            Some(content) => {
                inner.quarantined.push((name.to_string(), content));
                Ok(())
            }
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }
}
