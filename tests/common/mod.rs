//! Common test infrastructure
//!
//! Builds the full maintenance stack on a temporary page store. Each test
//! gets an isolated store directory and its own sqlite index databases.

use fernwiki_maintenance::consolidation::{LongerTextWins, ScanJob, SCAN_QUEUE};
use fernwiki_maintenance::index::{
    FrontmatterIndex, FulltextIndex, IndexCoordinator, IndexOperator,
};
use fernwiki_maintenance::jobs::{
    JobErrorReporter, JobQueueCoordinator, TokioDispatcher, TracingErrorReporter,
};
use fernwiki_maintenance::page_store::{FsPageStore, PageStore, QUARANTINE_DIR};
use fernwiki_maintenance::page_writer::PageWriter;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The full maintenance stack on a temporary page store.
///
/// Temp resources are cleaned up on drop.
pub struct TestWiki {
    pub store: Arc<FsPageStore>,
    pub queues: Arc<JobQueueCoordinator>,
    pub index: Arc<IndexCoordinator>,
    pub writer: Arc<PageWriter>,
    pub frontmatter: Arc<FrontmatterIndex>,
    pub fulltext: Arc<FulltextIndex>,
    reporter: Arc<dyn JobErrorReporter>,
    store_dir: TempDir,
}

impl TestWiki {
    /// Builds an isolated stack:
    /// 1. A temp dir as the page store root
    /// 2. Both sqlite indexes under `<root>/.index`
    /// 3. A queue coordinator on the test runtime
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let store_dir = TempDir::new().expect("Failed to create temp store dir");
        let store = Arc::new(FsPageStore::new(store_dir.path()));

        let index_db_dir = store_dir.path().join(".index");
        fs::create_dir_all(&index_db_dir).expect("Failed to create index dir");
        let frontmatter = Arc::new(
            FrontmatterIndex::new(store.clone(), &index_db_dir.join("frontmatter.db"))
                .expect("Failed to open frontmatter index"),
        );
        let fulltext = Arc::new(
            FulltextIndex::new(store.clone(), &index_db_dir.join("fulltext.db"))
                .expect("Failed to open fulltext index"),
        );
        let backends: Vec<Arc<dyn IndexOperator>> = vec![frontmatter.clone(), fulltext.clone()];

        let reporter: Arc<dyn JobErrorReporter> = Arc::new(TracingErrorReporter);
        let queues = Arc::new(JobQueueCoordinator::new(
            Arc::new(TokioDispatcher::new()),
            reporter.clone(),
        ));
        let index = Arc::new(IndexCoordinator::new(
            queues.clone(),
            backends,
            reporter.clone(),
        ));
        let writer = Arc::new(PageWriter::new(
            store.clone(),
            index.clone(),
            reporter.clone(),
        ));

        Self {
            store,
            queues,
            index,
            writer,
            frontmatter,
            fulltext,
            reporter,
            store_dir,
        }
    }

    /// Write a page directly into the store, bypassing indexing. This is how
    /// legacy files got there in the first place.
    pub fn write_raw_page(&self, name: &str, content: &str) {
        self.store
            .write(name, content.as_bytes())
            .expect("Failed to write page");
    }

    /// Run a legacy scan and wait for every queue and the indexes to settle.
    pub async fn consolidate(&self) {
        let scan = ScanJob::new(
            self.store.clone(),
            self.queues.clone(),
            self.writer.clone(),
            Arc::new(LongerTextWins),
            self.reporter.clone(),
        );
        self.queues
            .enqueue(SCAN_QUEUE, Box::new(scan))
            .expect("Failed to enqueue the scan");

        self.wait_for_queues().await;
        self.wait_for_index().await;
    }

    /// Poll until every queue has retired its worker.
    pub async fn wait_for_queues(&self) {
        for _ in 0..500 {
            if self.queues.active_queues().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "Queues still active after 5s: {:?}",
            self.queues.active_queues()
        );
    }

    /// Wait for all outstanding index work to drain.
    pub async fn wait_for_index(&self) {
        let outcome = self
            .index
            .wait_for_drain(&CancellationToken::new(), DRAIN_TIMEOUT)
            .await;
        assert!(outcome.completed(), "Index queue did not drain: {outcome:?}");
    }

    /// Names of every live page, sorted.
    pub fn page_names(&self) -> Vec<String> {
        self.store
            .list()
            .expect("Failed to list the store")
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    pub fn page_text(&self, name: &str) -> String {
        let bytes = self.store.read(name).expect("Failed to read page");
        String::from_utf8(bytes).expect("Page is not UTF-8")
    }

    /// File names found under `__deleted__/<timestamp>/`, sorted.
    pub fn quarantined_files(&self) -> Vec<String> {
        let quarantine = self.store_dir.path().join(QUARANTINE_DIR);
        if !quarantine.exists() {
            return Vec::new();
        }
        let mut files = Vec::new();
        for stamp_dir in fs::read_dir(&quarantine).expect("Failed to read quarantine") {
            let stamp_dir = stamp_dir.expect("Failed to read quarantine entry");
            for file in fs::read_dir(stamp_dir.path()).expect("Failed to read stamp dir") {
                let file = file.expect("Failed to read quarantined file");
                files.push(file.file_name().to_string_lossy().to_string());
            }
        }
        files.sort();
        files
    }
}
