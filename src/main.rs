//! QR Studio - headless host.
//!
//! # Execution Flow
//!
//! 1. Load `qrstudio.yaml` from the working directory (defaults if absent)
//! 2. Initialize logging → `<logging.directory>/<logging.prefix>.<date>`
//! 3. Create a tokio runtime; renders run on its blocking pool
//! 4. Start a [`Session`] seeded from `defaults` and wait for the first render
//! 5. Export the committed surface into `export.directory`
//! 6. Log the metrics summary and shut the runtime down with a 5s timeout

use anyhow::Result;
use qrstudio::{APP_NAME, DirectorySink, Metrics, QrEncoder, Session, SettingsManager, VERSION};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let settings = SettingsManager::new(".")?.load_settings()?;

    // Held until the end of main so buffered log lines are flushed
    let _guard = qrstudio::logging::init_logging(&settings.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("qrstudio-worker")
        .build()?;

    let metrics = Arc::new(Metrics::new());
    let session = Session::new(
        settings.defaults,
        Arc::new(QrEncoder::new()),
        Arc::new(DirectorySink::new(&settings.export.directory)),
        runtime.handle().clone(),
        metrics.clone(),
    );

    let state = runtime.block_on(session.settled());
    tracing::info!("Initial render settled: {:?}", state);

    match session.request_export() {
        Ok(path) => tracing::info!("Saved {}", path),
        Err(e) if e.is_rejection() => tracing::warn!("Export rejected: {}", e),
        Err(e) => tracing::error!("Export failed: {}", e),
    }

    metrics.log_summary();

    drop(session);
    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Shutdown complete");
    Ok(())
}
