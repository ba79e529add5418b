//! Filesystem page store.
//!
//! Pages live as flat `<name>.md` files under one root directory. Soft
//! deletes move files into a timestamped subdirectory of `__deleted__/`
//! so no page text is ever destroyed.

use super::{PageEntry, PageStore, StoreError, QUARANTINE_DIR};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const PAGE_EXTENSION: &str = "md";

pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn page_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{PAGE_EXTENSION}"))
    }
}

impl PageStore for FsPageStore {
    fn list(&self) -> Result<Vec<PageEntry>, StoreError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let modified = DateTime::<Utc>::from(entry.metadata()?.modified()?);
            entries.push(PageEntry {
                name: name.to_string(),
                modified,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.page_path(name)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError> {
        fs::write(self.page_path(name), content)?;
        Ok(())
    }

    fn soft_delete(&self, name: &str) -> Result<(), StoreError> {
        let source = self.page_path(name);
        if !source.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let stamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
        let quarantine = self.root.join(QUARANTINE_DIR).join(stamp);
        fs::create_dir_all(&quarantine)?;
        fs::rename(&source, quarantine.join(format!("{name}.{PAGE_EXTENSION}")))?;

        debug!("Quarantined page {} under {:?}", name, quarantine);
        Ok(())
    }
}
