// Session facade
//
// One editing session: the configuration store, the render pipeline listening to it, and
// export of whatever the pipeline last committed.

use crate::metrics::Metrics;
use crate::models::{QrConfig, QrConfigPatch, dimensions_label};
use crate::pipeline::{CommittedRender, RenderPipeline, RenderState};
use crate::services::{Artifact, ArtifactSink, Encoder, ExportError, ExportManager, SizeEstimate};
use crate::state::{ConfigChange, ConfigStore};
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Snapshot of what a preview panel shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewStatus {
    /// e.g. `512 × 512px`, from the current configuration
    pub dimensions_label: String,
    /// Estimate for the committed surface, if there is one
    pub file_size: Option<SizeEstimate>,
    pub is_generating: bool,
    pub committed_generation: Option<u64>,
    pub density_label: String,
}

/// Host-facing entry point tying configuration, rendering and export together.
///
/// Creating a session registers the pipeline with the store and issues the first render for
/// the initial configuration. From then on every effective [`update()`](Self::update) issues
/// a new render.
pub struct Session {
    store: ConfigStore,
    pipeline: RenderPipeline,
    export: ExportManager,
    sink: Arc<dyn ArtifactSink>,
    metrics: Arc<Metrics>,
}

impl Session {
    /// Start a session. Background renders are spawned on `runtime`.
    pub fn new(
        initial: QrConfig,
        encoder: Arc<dyn Encoder>,
        sink: Arc<dyn ArtifactSink>,
        runtime: tokio::runtime::Handle,
        metrics: Arc<Metrics>,
    ) -> Self {
        let store = ConfigStore::new(initial, metrics.clone());
        let pipeline = RenderPipeline::new(encoder, runtime, metrics.clone());
        store.add_listener(Arc::new(pipeline.clone()));

        let first = pipeline.schedule(store.current());
        tracing::info!("Session started (initial render: {:?})", first);

        Self {
            store,
            export: ExportManager::new(metrics.clone()),
            pipeline,
            sink,
            metrics,
        }
    }

    /// Replace the export manager, e.g. to pin its clock
    pub fn with_export_manager(mut self, export: ExportManager) -> Self {
        self.export = export;
        self
    }

    pub fn config(&self) -> Arc<QrConfig> {
        self.store.current()
    }

    /// Apply `patch` to the configuration. See [`ConfigStore::update`].
    pub fn update(&self, patch: QrConfigPatch) -> Arc<QrConfig> {
        self.store.update(patch)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.store.subscribe()
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn committed(&self) -> Option<Arc<CommittedRender>> {
        self.pipeline.committed()
    }

    /// Encode the committed surface as a PNG artifact without delivering it.
    ///
    /// Uses the surface as it is right now; an in-flight render is not awaited.
    pub fn export_current(&self) -> Result<Artifact, ExportError> {
        let config = self.store.current();
        let committed = self.pipeline.committed();
        self.export
            .export_current(&config, committed.as_ref().map(|c| &c.surface))
    }

    /// Export the committed surface and hand it to the sink. Returns where it was delivered.
    pub fn request_export(&self) -> Result<Utf8PathBuf, ExportError> {
        let artifact = self.export_current()?;
        self.sink.deliver(&artifact).inspect_err(|e| {
            tracing::error!("Failed to deliver {}: {}", artifact.file_name, e);
        })
    }

    pub fn preview(&self) -> PreviewStatus {
        let config = self.store.current();
        let committed = self.pipeline.committed();

        PreviewStatus {
            dimensions_label: dimensions_label(config.size),
            file_size: committed.as_ref().and_then(|c| c.size_estimate),
            is_generating: self.pipeline.state().is_rendering(),
            committed_generation: committed.as_ref().map(|c| c.generation()),
            density_label: config.density_label(),
        }
    }

    /// Wait for the pipeline to stop rendering
    pub async fn settled(&self) -> RenderState {
        self.pipeline.settled().await
    }
}
