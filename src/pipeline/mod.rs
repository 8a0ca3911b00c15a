// Render pipeline
//
// Keeps the committed surface in step with the latest configuration. Every configuration
// change is tagged with a new generation id; encoder results are committed only while
// their generation is still the most recent one issued.

use crate::metrics::Metrics;
use crate::models::{QrConfig, RenderedSurface};
use crate::services::{EncodeError, EncodeRequest, Encoder, SizeEstimate, estimate};
use crate::state::ConfigListener;
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Published pipeline state.
///
/// `Idle -> Rendering -> {Committed | Failed}`. A configuration change while `Rendering`
/// moves straight to `Rendering` with the next generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Rendering { generation: u64 },
    Committed { generation: u64 },
    Failed { generation: u64, message: String },
}

impl RenderState {
    pub fn is_rendering(&self) -> bool {
        matches!(self, Self::Rendering { .. })
    }

    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Rendering { generation }
            | Self::Committed { generation }
            | Self::Failed { generation, .. } => Some(*generation),
        }
    }
}

/// A render that has been issued but not yet completed
#[derive(Debug, Clone)]
pub struct RenderTicket {
    generation: u64,
    config: Arc<QrConfig>,
    request: EncodeRequest,
    issued_at: Instant,
}

impl RenderTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &Arc<QrConfig> {
        &self.config
    }

    pub fn request(&self) -> &EncodeRequest {
        &self.request
    }
}

/// The surface currently on display, with the configuration that produced it
#[derive(Debug)]
pub struct CommittedRender {
    pub surface: RenderedSurface,
    pub config: Arc<QrConfig>,
    /// `None` when the estimate could not be computed
    pub size_estimate: Option<SizeEstimate>,
    pub render_time: Duration,
}

impl CommittedRender {
    pub fn generation(&self) -> u64 {
        self.surface.generation()
    }
}

/// What happened to a completed render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Committed { generation: u64 },
    /// A newer generation was issued before this one completed
    Discarded { generation: u64 },
    Failed { generation: u64, error: EncodeError },
}

struct PipelineInner {
    encoder: Arc<dyn Encoder>,
    runtime: tokio::runtime::Handle,
    metrics: Arc<Metrics>,

    /// Most recently issued generation id
    latest: AtomicU64,

    /// Guards commit/publish so state transitions are observed in generation order
    committed: Mutex<Option<Arc<CommittedRender>>>,

    state_tx: watch::Sender<RenderState>,
}

/// Drives the encoder from configuration changes and owns the committed surface.
///
/// Register it with [`ConfigStore::add_listener`](crate::state::ConfigStore::add_listener);
/// each change is handed to [`schedule()`](Self::schedule), which issues a generation id and
/// runs the encoder on the tokio blocking pool. Results come back through
/// [`complete()`](Self::complete), where the generation id is compared against the latest one
/// issued: only the newest render is ever committed, so completions that arrive out of order
/// are dropped rather than shown.
///
/// The encoder call itself is never cancelled. Superseded renders run to completion and are
/// ignored.
#[derive(Clone)]
pub struct RenderPipeline {
    inner: Arc<PipelineInner>,
}

impl RenderPipeline {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        runtime: tokio::runtime::Handle,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (state_tx, _) = watch::channel(RenderState::Idle);
        Self {
            inner: Arc::new(PipelineInner {
                encoder,
                runtime,
                metrics,
                latest: AtomicU64::new(0),
                committed: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Issue a render for `config` and run it in the background.
    ///
    /// Returns the generation id, or `None` when the content is blank (nothing is issued and
    /// the committed surface stays as it is).
    pub fn schedule(&self, config: Arc<QrConfig>) -> Option<u64> {
        let ticket = self.begin(config)?;
        let generation = ticket.generation();
        self.spawn_render(ticket);
        Some(generation)
    }

    /// Issue the next generation for `config` without running the encoder.
    pub fn begin(&self, config: Arc<QrConfig>) -> Option<RenderTicket> {
        if !config.has_content() {
            self.inner.metrics.record_render_skipped_empty();
            tracing::debug!("Content is empty - keeping the current surface");
            return None;
        }

        let generation = {
            let _guard = self.lock_committed();
            let generation = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner
                .state_tx
                .send_replace(RenderState::Rendering { generation });
            generation
        };

        self.inner.metrics.record_render_started();
        tracing::debug!(
            "Render generation {} issued ({}px, level {})",
            generation,
            config.size,
            config.error_correction_level
        );

        Some(RenderTicket {
            generation,
            request: EncodeRequest::from_config(&config),
            config,
            issued_at: Instant::now(),
        })
    }

    /// Apply the encoder result for `ticket`.
    ///
    /// Commits the surface only if `ticket` is still the latest generation. A failure of the
    /// latest generation is logged and published as [`RenderState::Failed`]; the previously
    /// committed surface is kept either way.
    pub fn complete(
        &self,
        ticket: RenderTicket,
        result: Result<RgbaImage, EncodeError>,
    ) -> CompletionOutcome {
        let generation = ticket.generation;
        if !self.is_current(generation) {
            return self.discard(generation);
        }

        let expected = ticket.config.size;
        let result = result.and_then(|image| {
            let (width, height) = image.dimensions();
            if (width, height) == (expected, expected) {
                Ok(image)
            } else {
                Err(EncodeError::UnexpectedDimensions {
                    expected,
                    width,
                    height,
                })
            }
        });

        match result {
            Ok(image) => {
                let surface = RenderedSurface::new(generation, image);
                let size_estimate = match estimate(&surface) {
                    Ok(estimate) => Some(estimate),
                    Err(e) => {
                        tracing::warn!("Size estimate failed for generation {}: {}", generation, e);
                        None
                    }
                };

                self.commit(CommittedRender {
                    surface,
                    config: ticket.config,
                    size_estimate,
                    render_time: ticket.issued_at.elapsed(),
                })
            }
            Err(error) => self.fail(generation, error),
        }
    }

    /// The last committed render, if any
    pub fn committed(&self) -> Option<Arc<CommittedRender>> {
        self.lock_committed().clone()
    }

    pub fn state(&self) -> RenderState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RenderState> {
        self.inner.state_tx.subscribe()
    }

    pub fn latest_generation(&self) -> u64 {
        self.inner.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.inner.latest.load(Ordering::SeqCst) == generation
    }

    /// Wait until no render is in flight and return the resulting state
    pub async fn settled(&self) -> RenderState {
        let mut rx = self.subscribe_state();
        let settled = rx.wait_for(|state| !state.is_rendering()).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    fn spawn_render(&self, ticket: RenderTicket) {
        let pipeline = self.clone();

        self.inner.runtime.spawn(async move {
            let generation = ticket.generation();
            let encoder = Arc::clone(&pipeline.inner.encoder);
            let request = ticket.request().clone();

            let result = tokio::task::spawn_blocking(move || encoder.encode(&request))
                .await
                .unwrap_or_else(|e| Err(EncodeError::TaskFailed(e.to_string())));

            // PNG size estimation is CPU bound as well
            let finisher = pipeline.clone();
            if let Err(e) =
                tokio::task::spawn_blocking(move || finisher.complete(ticket, result)).await
            {
                tracing::error!("Completing render generation {} panicked: {}", generation, e);
            }
        });
    }

    fn commit(&self, render: CommittedRender) -> CompletionOutcome {
        let generation = render.generation();
        let mut committed = self.lock_committed();

        if !self.is_current(generation) {
            drop(committed);
            return self.discard(generation);
        }

        self.inner.metrics.record_render_committed(render.render_time);
        tracing::info!(
            "Render generation {} committed ({}px, {} in {:?})",
            generation,
            render.surface.size(),
            render
                .size_estimate
                .map(|e| e.label())
                .unwrap_or_else(|| "unknown size".to_string()),
            render.render_time
        );

        *committed = Some(Arc::new(render));
        self.inner
            .state_tx
            .send_replace(RenderState::Committed { generation });

        CompletionOutcome::Committed { generation }
    }

    fn fail(&self, generation: u64, error: EncodeError) -> CompletionOutcome {
        let _committed = self.lock_committed();

        if !self.is_current(generation) {
            drop(_committed);
            return self.discard(generation);
        }

        self.inner.metrics.record_render_failed();
        tracing::warn!("Render generation {} failed: {}", generation, error);

        self.inner.state_tx.send_replace(RenderState::Failed {
            generation,
            message: error.to_string(),
        });

        CompletionOutcome::Failed { generation, error }
    }

    fn discard(&self, generation: u64) -> CompletionOutcome {
        self.inner.metrics.record_render_discarded();
        tracing::debug!(
            "Discarding render generation {} (latest is {})",
            generation,
            self.latest_generation()
        );
        CompletionOutcome::Discarded { generation }
    }

    fn lock_committed(&self) -> std::sync::MutexGuard<'_, Option<Arc<CommittedRender>>> {
        self.inner
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigListener for RenderPipeline {
    fn config_changed(&self, config: &Arc<QrConfig>) {
        self.schedule(Arc::clone(config));
    }
}
