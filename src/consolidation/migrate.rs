//! Per-page legacy migration.

use super::resolver::{ConflictResolver, ConflictWinner};
use crate::jobs::{Job, JobError};
use crate::metrics;
use crate::page_store::{PageStore, StoreError};
use crate::page_writer::PageWriter;
use std::sync::Arc;
use tracing::info;

/// Moves one logical page's legacy names onto its canonical identifier.
///
/// For each legacy name: read both sides, let the resolver pick a winner
/// when the canonical page already exists, then quarantine the legacy file
/// and persist the winner through the normal write path so the indexes drop
/// the legacy name and pick up the canonical one.
pub struct MigrateJob {
    canonical_id: String,
    legacy_names: Vec<String>,
    store: Arc<dyn PageStore>,
    writer: Arc<PageWriter>,
    resolver: Arc<dyn ConflictResolver>,
    name: String,
}

impl MigrateJob {
    pub fn new(
        canonical_id: String,
        legacy_names: Vec<String>,
        store: Arc<dyn PageStore>,
        writer: Arc<PageWriter>,
        resolver: Arc<dyn ConflictResolver>,
    ) -> Self {
        let name = format!("consolidate {canonical_id}");
        Self {
            canonical_id,
            legacy_names,
            store,
            writer,
            resolver,
            name,
        }
    }

    fn migrate_one(&self, legacy_name: &str) -> Result<(), JobError> {
        let legacy_content = match self.store.read(legacy_name) {
            Ok(content) => content,
            Err(StoreError::NotFound(_)) => {
                return Err(JobError::MissingLegacyPage(legacy_name.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let canonical_content = match self.store.read(&self.canonical_id) {
            Ok(content) => Some(content),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let winner = match &canonical_content {
            None => legacy_content,
            Some(canonical) => match self.resolver.resolve(&legacy_content, canonical) {
                ConflictWinner::Legacy => {
                    info!(
                        "Conflict on {}: text from {} wins",
                        self.canonical_id, legacy_name
                    );
                    legacy_content
                }
                ConflictWinner::Canonical => {
                    info!(
                        "Conflict on {}: canonical text wins, discarding {}",
                        self.canonical_id, legacy_name
                    );
                    canonical.clone()
                }
            },
        };

        self.writer.delete(legacy_name)?;
        self.writer.save(&self.canonical_id, &winner)?;

        metrics::record_page_migrated();
        info!("Migrated {} -> {}", legacy_name, self.canonical_id);
        Ok(())
    }
}

impl Job for MigrateJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<(), JobError> {
        for legacy_name in &self.legacy_names {
            self.migrate_one(legacy_name)?;
        }
        Ok(())
    }
}
