//! Legacy identifier scan.

use super::migrate::MigrateJob;
use super::resolver::ConflictResolver;
use crate::ident::canonicalize;
use crate::jobs::{Job, JobError, JobErrorReporter, JobQueueCoordinator};
use crate::page_store::{PageEntry, PageStore};
use crate::page_writer::PageWriter;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Queue the scan itself runs on.
pub const SCAN_QUEUE: &str = "legacy_scan";

/// Group store entries whose stored name differs from its canonical form,
/// keyed by canonical identifier. The comparison is case sensitive, so a
/// page already stored under its canonical name is never flagged. Names
/// made of nothing but separators canonicalize to the empty string, which
/// is not a usable identifier; those pages are left alone.
pub fn find_legacy_groups(entries: &[PageEntry]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let canonical = canonicalize(&entry.name);
        if canonical.is_empty() || canonical == entry.name {
            continue;
        }
        groups.entry(canonical).or_default().push(entry.name.clone());
    }
    groups
}

/// Walks the whole store and queues one migration per logical page that
/// still has legacy-named files.
///
/// Re-running the scan on an already consolidated store finds nothing and
/// queues nothing.
pub struct ScanJob {
    store: Arc<dyn PageStore>,
    queues: Arc<JobQueueCoordinator>,
    writer: Arc<PageWriter>,
    resolver: Arc<dyn ConflictResolver>,
    reporter: Arc<dyn JobErrorReporter>,
}

impl ScanJob {
    pub fn new(
        store: Arc<dyn PageStore>,
        queues: Arc<JobQueueCoordinator>,
        writer: Arc<PageWriter>,
        resolver: Arc<dyn ConflictResolver>,
        reporter: Arc<dyn JobErrorReporter>,
    ) -> Self {
        Self {
            store,
            queues,
            writer,
            resolver,
            reporter,
        }
    }

    /// Name of the queue migrations for `canonical` run on.
    pub fn migration_queue(canonical: &str) -> String {
        format!("consolidate/{canonical}")
    }
}

impl Job for ScanJob {
    fn name(&self) -> &str {
        "legacy_scan"
    }

    fn execute(&self) -> Result<(), JobError> {
        let entries = self.store.list()?;
        let groups = find_legacy_groups(&entries);

        if groups.is_empty() {
            info!(
                "Legacy scan found nothing to consolidate ({} pages checked)",
                entries.len()
            );
            return Ok(());
        }

        let legacy_total: usize = groups.values().map(Vec::len).sum();
        info!(
            "Legacy scan found {} legacy names across {} logical pages",
            legacy_total,
            groups.len()
        );

        for (canonical, legacy_names) in groups {
            let queue = Self::migration_queue(&canonical);
            let job = MigrateJob::new(
                canonical,
                legacy_names,
                Arc::clone(&self.store),
                Arc::clone(&self.writer),
                Arc::clone(&self.resolver),
            );
            let job_name = job.name().to_string();
            if let Err(err) = self.queues.enqueue(&queue, Box::new(job)) {
                self.reporter.enqueue_rejected(&job_name, &err);
            }
        }
        Ok(())
    }
}
