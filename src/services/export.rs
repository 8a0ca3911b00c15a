use crate::metrics::Metrics;
use crate::models::{QrConfig, RenderedSurface};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// A named, encoded image ready to be handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Generation of the render the artifact was produced from
    pub generation: u64,
}

/// Errors that can occur while exporting
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("content required")]
    ContentRequired,

    #[error("No rendered QR code is available to export")]
    NothingRendered,

    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write {path}: {source}")]
    Delivery {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Whether this is a precondition rejection meant to be shown to the user as-is
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ContentRequired | Self::NothingRendered)
    }
}

/// `qr-code-<unix-timestamp-ms>.png`
pub fn artifact_file_name(timestamp_ms: u128) -> String {
    format!("qr-code-{timestamp_ms}.png")
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Serializes the last committed surface into a PNG artifact.
///
/// Export is a synchronous read: it never starts a render, so the artifact always matches the
/// surface that is currently shown.
pub struct ExportManager {
    metrics: Arc<Metrics>,
    clock: fn() -> u128,
}

impl ExportManager {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            clock: unix_millis,
        }
    }

    /// Replace the millisecond clock used for artifact names
    pub fn with_clock(mut self, clock: fn() -> u128) -> Self {
        self.clock = clock;
        self
    }

    /// Build an artifact from `surface`, the last committed render for `config`'s session.
    ///
    /// # Errors
    /// - [`ExportError::ContentRequired`] when `config` has blank content
    /// - [`ExportError::NothingRendered`] when no render has been committed yet
    /// - [`ExportError::Encode`] when PNG serialization fails
    pub fn export_current(
        &self,
        config: &QrConfig,
        surface: Option<&RenderedSurface>,
    ) -> Result<Artifact, ExportError> {
        if !config.has_content() {
            self.metrics.record_export_rejected();
            tracing::info!("Export rejected: content is empty");
            return Err(ExportError::ContentRequired);
        }

        let Some(surface) = surface else {
            self.metrics.record_export_rejected();
            tracing::info!("Export rejected: nothing has been rendered yet");
            return Err(ExportError::NothingRendered);
        };

        let bytes = surface.to_png()?;
        let artifact = Artifact {
            file_name: artifact_file_name((self.clock)()),
            bytes,
            generation: surface.generation(),
        };

        self.metrics.record_export_completed();
        tracing::info!(
            "Exported {} ({} bytes, generation {})",
            artifact.file_name,
            artifact.bytes.len(),
            artifact.generation
        );

        Ok(artifact)
    }
}

/// Where exported artifacts are delivered (a download, a save dialog, a directory...)
pub trait ArtifactSink: Send + Sync {
    /// Deliver `artifact` and return where it ended up
    fn deliver(&self, artifact: &Artifact) -> Result<Utf8PathBuf, ExportError>;
}

/// Delivers artifacts as files in a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: Utf8PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Utf8Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&self, artifact: &Artifact) -> Result<Utf8PathBuf, ExportError> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).map_err(|source| ExportError::Delivery {
                path: self.directory.clone(),
                source,
            })?;
        }

        let path = self.directory.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes).map_err(|source| ExportError::Delivery {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Delivered artifact to {}", path);
        Ok(path)
    }
}
