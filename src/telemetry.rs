//! Telemetry related to cursor usage.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of queries served from a cache instead of a cursor.
pub static CACHE_HITS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "odm_cursor_cache_hits",
            "Number of queries served from a cache instead of a cursor",
        ),
        &["cache"],
    )
    .expect("failed to initialise CACHE_HITS counter")
});

/// Total number of cursors opened.
pub static CURSOR_OPEN_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new("odm_cursor_open_count", "Total number of cursors opened"),
        &["namespace"],
    )
    .expect("failed to initialise CURSOR_OPEN_COUNT counter")
});

/// Number of cursor open attempts that resulted in error.
pub static CURSOR_OPEN_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "odm_cursor_open_error",
            "Number of cursor open attempts that resulted in error",
        ),
        &["namespace"],
    )
    .expect("failed to initialise CURSOR_OPEN_ERR counter")
});

/// Total number of raw documents fetched from cursors.
pub static DOCUMENTS_FETCHED: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "odm_cursor_documents_fetched",
            "Total number of raw documents fetched from cursors",
        ),
        &["namespace"],
    )
    .expect("failed to initialise DOCUMENTS_FETCHED counter")
});

/// Number of documents that failed conversion to a projection model.
pub static VALIDATION_ERRORS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "odm_cursor_validation_errors",
        "Number of documents that failed conversion to a projection model",
    )
    .expect("failed to initialise VALIDATION_ERRORS counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the cursor metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    // Skip registration if already done before.
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(CACHE_HITS.clone()),
        Box::new(CURSOR_OPEN_COUNT.clone()),
        Box::new(CURSOR_OPEN_ERR.clone()),
        Box::new(DOCUMENTS_FETCHED.clone()),
        Box::new(VALIDATION_ERRORS.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
