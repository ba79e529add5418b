use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fernwiki_maintenance::config::{CliConfig, FileConfig, MaintenanceConfig};
use fernwiki_maintenance::consolidation::{find_legacy_groups, LongerTextWins, ScanJob, SCAN_QUEUE};
use fernwiki_maintenance::index::{
    DrainOutcome, FrontmatterIndex, FulltextIndex, IndexCoordinator, IndexOperation, IndexOperator,
};
use fernwiki_maintenance::jobs::{
    JobErrorReporter, JobQueueCoordinator, TokioDispatcher, TracingErrorReporter,
};
use fernwiki_maintenance::page_store::{FsPageStore, PageStore};
use fernwiki_maintenance::page_writer::PageWriter;
use fernwiki_maintenance::{metrics, ConflictResolver};
use tokio_util::sync::CancellationToken;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the wiki page store directory.
    #[clap(value_parser = parse_path)]
    pub store_dir: Option<PathBuf>,

    /// Directory for the index databases. Defaults to <store_dir>/.index.
    #[clap(long, value_parser = parse_path)]
    pub index_db_dir: Option<PathBuf>,

    /// Path to a TOML config file. File values override CLI values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Maximum seconds to wait for queued work to finish.
    #[clap(long, default_value_t = 300)]
    pub drain_timeout_sec: u64,

    /// List legacy page names without migrating anything.
    #[clap(long, default_value_t = false)]
    pub dry_run: bool,

    /// Rebuild both indexes for every page instead of consolidating.
    #[clap(long, default_value_t = false)]
    pub reindex: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "fernwiki-maintenance {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        store_dir: cli_args.store_dir.clone(),
        index_db_dir: cli_args.index_db_dir.clone(),
        drain_timeout_sec: cli_args.drain_timeout_sec,
    };
    let config = MaintenanceConfig::resolve(&cli_config, file_config)?;

    info!("Opening page store at {:?}", config.store_dir);
    let store: Arc<dyn PageStore> = Arc::new(FsPageStore::new(&config.store_dir));

    if cli_args.dry_run {
        return run_dry_run(store.as_ref());
    }

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();

    std::fs::create_dir_all(&config.index_db_dir)
        .with_context(|| format!("Failed to create index directory: {:?}", config.index_db_dir))?;
    let frontmatter = Arc::new(FrontmatterIndex::new(
        store.clone(),
        &config.frontmatter_db_path(),
    )?);
    let fulltext = Arc::new(FulltextIndex::new(
        store.clone(),
        &config.fulltext_db_path(),
    )?);
    let backends: Vec<Arc<dyn IndexOperator>> = vec![frontmatter, fulltext];

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

    let cancel = CancellationToken::new();
    let interrupt_token = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping");
        interrupt_token.cancel();
    })
    .context("Failed to install interrupt handler")?;

    let budget = Duration::from_secs(config.drain_timeout_sec);

    if cli_args.reindex {
        run_reindex(store.as_ref(), &index, &cancel, budget).await?;
    } else {
        let resolver: Arc<dyn ConflictResolver> = Arc::new(LongerTextWins);
        run_consolidation(
            store,
            queues.clone(),
            writer,
            resolver,
            reporter,
            &index,
            &cancel,
            budget,
        )
        .await?;
    }

    let used = queues.all_queues();
    info!(
        "Maintenance run complete, {} queues used: {}",
        used.len(),
        serde_json::to_string(&used).unwrap_or_else(|_| "<unserializable>".to_string())
    );
    Ok(())
}

/// List legacy page names without touching anything.
fn run_dry_run(store: &dyn PageStore) -> Result<()> {
    let entries = store.list().context("Failed to list the page store")?;
    let groups = find_legacy_groups(&entries);

    if groups.is_empty() {
        info!(
            "No legacy page names found ({} pages checked)",
            entries.len()
        );
        return Ok(());
    }

    for (canonical, legacy) in &groups {
        info!("Would consolidate {} <- {}", canonical, legacy.join(", "));
    }
    info!("{} logical pages need consolidation", groups.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_consolidation(
    store: Arc<dyn PageStore>,
    queues: Arc<JobQueueCoordinator>,
    writer: Arc<PageWriter>,
    resolver: Arc<dyn ConflictResolver>,
    reporter: Arc<dyn JobErrorReporter>,
    index: &IndexCoordinator,
    cancel: &CancellationToken,
    budget: Duration,
) -> Result<()> {
    let scan = ScanJob::new(store, queues.clone(), writer, resolver, reporter);
    queues
        .enqueue(SCAN_QUEUE, Box::new(scan))
        .context("Failed to enqueue the legacy scan")?;

    let started = Instant::now();
    wait_until_idle(&queues, cancel, budget).await?;

    // Indexing settles last, after every migration has written its pages.
    // Both waits share the one drain budget.
    let remaining = budget.saturating_sub(started.elapsed());
    match index.wait_for_drain(cancel, remaining).await {
        DrainOutcome::Completed => Ok(()),
        DrainOutcome::TimedOut => bail!("Index queue did not drain within {:?}", budget),
        DrainOutcome::Cancelled => bail!("Cancelled while waiting for the index queue"),
    }
}

async fn run_reindex(
    store: &dyn PageStore,
    index: &IndexCoordinator,
    cancel: &CancellationToken,
    budget: Duration,
) -> Result<()> {
    let entries = store.list().context("Failed to list the page store")?;
    let page_ids: Vec<String> = entries.into_iter().map(|e| e.name).collect();
    info!("Reindexing {} pages", page_ids.len());

    index
        .enqueue_bulk_with_completion(
            &page_ids,
            IndexOperation::Add,
            Box::new(|| info!("Reindex batch complete")),
        )
        .context("Failed to enqueue the reindex batch")?;

    match index.wait_for_drain(cancel, budget).await {
        DrainOutcome::Completed => Ok(()),
        DrainOutcome::TimedOut => bail!("Reindex did not finish within {:?}", budget),
        DrainOutcome::Cancelled => bail!("Reindex cancelled"),
    }
}

/// Poll until every queue has retired its worker.
async fn wait_until_idle(
    queues: &JobQueueCoordinator,
    cancel: &CancellationToken,
    budget: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        let active = queues.active_queues();
        if active.is_empty() {
            return Ok(());
        }
        if started.elapsed() > budget {
            let detail = serde_json::to_string(&active)
                .unwrap_or_else(|_| format!("{} queues", active.len()));
            bail!("Queues still active after {:?}: {}", budget, detail);
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            _ = cancel.cancelled() => bail!("Cancelled while queues were still active"),
        }
    }
}
