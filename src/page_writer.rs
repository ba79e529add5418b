//! The normal page write path.
//!
//! Every page mutation flows through [`PageWriter`]: the store is updated
//! under a short write lock, then the matching index apply is queued. Index
//! enqueueing is best effort; a save or delete never fails because the
//! dispatcher refused a worker.

use crate::index::{apply_job_name, IndexCoordinator, IndexOperation};
use crate::jobs::JobErrorReporter;
use crate::page_store::{PageStore, StoreError};
use std::sync::{Arc, Mutex};

pub struct PageWriter {
    store: Arc<dyn PageStore>,
    index: Arc<IndexCoordinator>,
    reporter: Arc<dyn JobErrorReporter>,
    write_lock: Mutex<()>,
}

impl PageWriter {
    pub fn new(
        store: Arc<dyn PageStore>,
        index: Arc<IndexCoordinator>,
        reporter: Arc<dyn JobErrorReporter>,
    ) -> Self {
        Self {
            store,
            index,
            reporter,
            write_lock: Mutex::new(()),
        }
    }

    /// Persist a page and queue its reindex.
    pub fn save(&self, page_id: &str, content: &[u8]) -> Result<(), StoreError> {
        {
            let _guard = self.write_lock.lock().unwrap();
            self.store.write(page_id, content)?;
        }
        if let Err(err) = self.index.enqueue(page_id, IndexOperation::Add) {
            self.reporter
                .enqueue_rejected(&apply_job_name(IndexOperation::Add, page_id), &err);
        }
        Ok(())
    }

    /// Quarantine a page and queue its removal from the indexes.
    pub fn delete(&self, page_id: &str) -> Result<(), StoreError> {
        {
            let _guard = self.write_lock.lock().unwrap();
            self.store.soft_delete(page_id)?;
        }
        if let Err(err) = self.index.enqueue(page_id, IndexOperation::Remove) {
            self.reporter
                .enqueue_rejected(&apply_job_name(IndexOperation::Remove, page_id), &err);
        }
        Ok(())
    }
}
