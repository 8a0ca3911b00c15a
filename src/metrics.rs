// Performance metrics module
//
// Lightweight counters for the render pipeline and export path

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session-wide render and export counters.
///
/// Uses atomic operations so render tasks can record outcomes from worker threads
/// without taking locks. Logged on shutdown via [`log_summary`](Self::log_summary).
#[derive(Debug)]
pub struct Metrics {
    /// Configuration updates that changed at least one field
    config_updates: AtomicU64,

    /// Renders handed to the encoder
    renders_started: AtomicU64,

    /// Configuration changes ignored because the content was blank
    renders_skipped_empty: AtomicU64,

    /// Renders whose surface became the committed one
    renders_committed: AtomicU64,

    /// Renders that completed after being superseded
    renders_discarded: AtomicU64,

    /// Current renders that failed in the encoder
    renders_failed: AtomicU64,

    /// Total encode time of committed renders in milliseconds
    total_render_time_ms: AtomicU64,

    exports_completed: AtomicU64,
    exports_rejected: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            config_updates: AtomicU64::new(0),
            renders_started: AtomicU64::new(0),
            renders_skipped_empty: AtomicU64::new(0),
            renders_committed: AtomicU64::new(0),
            renders_discarded: AtomicU64::new(0),
            renders_failed: AtomicU64::new(0),
            total_render_time_ms: AtomicU64::new(0),
            exports_completed: AtomicU64::new(0),
            exports_rejected: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_config_update(&self) {
        self.config_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_started(&self) {
        self.renders_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_skipped_empty(&self) {
        self.renders_skipped_empty.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed render and the time it spent in the encoder
    pub fn record_render_committed(&self, duration: Duration) {
        self.renders_committed.fetch_add(1, Ordering::Relaxed);
        self.total_render_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_render_discarded(&self) {
        self.renders_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_failed(&self) {
        self.renders_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export_completed(&self) {
        self.exports_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export_rejected(&self) {
        self.exports_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn config_updates(&self) -> u64 {
        self.config_updates.load(Ordering::Relaxed)
    }

    pub fn renders_started(&self) -> u64 {
        self.renders_started.load(Ordering::Relaxed)
    }

    pub fn renders_skipped_empty(&self) -> u64 {
        self.renders_skipped_empty.load(Ordering::Relaxed)
    }

    pub fn renders_committed(&self) -> u64 {
        self.renders_committed.load(Ordering::Relaxed)
    }

    pub fn renders_discarded(&self) -> u64 {
        self.renders_discarded.load(Ordering::Relaxed)
    }

    pub fn renders_failed(&self) -> u64 {
        self.renders_failed.load(Ordering::Relaxed)
    }

    pub fn exports_completed(&self) -> u64 {
        self.exports_completed.load(Ordering::Relaxed)
    }

    pub fn exports_rejected(&self) -> u64 {
        self.exports_rejected.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average encode time per committed render in milliseconds
    pub fn avg_render_time_ms(&self) -> f64 {
        let total = self.total_render_time_ms.load(Ordering::Relaxed);
        let count = self.renders_committed();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Render Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!("Configuration updates: {}", self.config_updates());
        tracing::info!(
            "Renders: {} started, {} committed, {} discarded, {} failed, {} skipped (empty)",
            self.renders_started(),
            self.renders_committed(),
            self.renders_discarded(),
            self.renders_failed(),
            self.renders_skipped_empty()
        );
        tracing::info!("Average render time: {:.2}ms", self.avg_render_time_ms());
        tracing::info!(
            "Exports: {} completed, {} rejected",
            self.exports_completed(),
            self.exports_rejected()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
