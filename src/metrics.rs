use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};
use std::time::Duration;

/// Metric name prefix for all fernwiki maintenance metrics
const PREFIX: &str = "fernwiki";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Job queue metrics
    pub static ref JOB_QUEUES_ACTIVE: Gauge = Gauge::new(
        format!("{PREFIX}_job_queues_active"),
        "Number of job queues with a live worker"
    ).expect("Failed to create job_queues_active metric");

    pub static ref JOBS_EXECUTED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_jobs_executed_total"), "Jobs executed by queue and outcome"),
        &["queue", "status"]
    ).expect("Failed to create jobs_executed_total metric");

    pub static ref JOB_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_job_duration_seconds"),
            "Job execution duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["queue"]
    ).expect("Failed to create job_duration_seconds metric");

    // Index metrics
    pub static ref INDEX_BACKEND_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_index_backend_errors_total"), "Index apply failures by backend"),
        &["backend"]
    ).expect("Failed to create index_backend_errors_total metric");

    // Consolidation metrics
    pub static ref PAGES_MIGRATED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_pages_migrated_total"),
        "Legacy page names consolidated onto canonical identifiers"
    ).expect("Failed to create pages_migrated_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(JOB_QUEUES_ACTIVE.clone()));
    let _ = REGISTRY.register(Box::new(JOBS_EXECUTED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(JOB_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(INDEX_BACKEND_ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PAGES_MIGRATED_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Update the active queue gauge
pub fn set_active_queues(count: usize) {
    JOB_QUEUES_ACTIVE.set(count as f64);
}

/// Record one finished job execution
pub fn record_job_execution(queue: &str, status: &str, duration: Duration) {
    JOBS_EXECUTED_TOTAL
        .with_label_values(&[queue, status])
        .inc();

    JOB_DURATION_SECONDS
        .with_label_values(&[queue])
        .observe(duration.as_secs_f64());
}

/// Record a failed index backend apply
pub fn record_index_backend_error(backend: &str) {
    INDEX_BACKEND_ERRORS_TOTAL
        .with_label_values(&[backend])
        .inc();
}

/// Record a legacy page name consolidated onto its canonical identifier
pub fn record_page_migrated() {
    PAGES_MIGRATED_TOTAL.inc();
}
