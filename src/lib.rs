// QR Studio - live QR code rendering with latest-wins preview and PNG export
//
// This is the library crate containing the configuration store, render pipeline and export.
// The binary crate (main.rs) provides a headless host.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use config::SettingsManager;
pub use metrics::Metrics;
pub use models::{AppSettings, ErrorCorrectionLevel, QrConfig, QrConfigPatch, RenderedSurface};
pub use pipeline::{CompletionOutcome, RenderPipeline, RenderState};
pub use services::{DirectorySink, Encoder, ExportError, QrEncoder};
pub use session::{PreviewStatus, Session};
pub use state::{ConfigChange, ConfigListener, ConfigStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
