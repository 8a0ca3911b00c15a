//! Data models for QrStudio.
//!
//! - [`QrConfig`]: the immutable configuration value a session renders from, plus
//!   [`QrConfigPatch`] for partial updates
//! - [`RenderedSurface`]: the square RGBA raster produced by a render
//! - [`AppSettings`]: host settings loaded from `qrstudio.yaml`
//! - [`parse_hex_color`]: color validation used at the encoder boundary
//!
//! # Architecture Note
//!
//! `QrConfig` values are shared as `Arc<QrConfig>` and never mutated. The only way to obtain a
//! new one is [`ConfigStore::update`](crate::state::ConfigStore::update).

pub mod color;
pub mod qr_config;
pub mod settings;
pub mod surface;

pub use color::{ColorError, TRANSPARENT, parse_hex_color};
pub use qr_config::{
    ConfigField, ErrorCorrectionLevel, PIXEL_DENSITY_RANGE, QUIET_ZONE_MODULES, QrConfig,
    QrConfigPatch, SUPPORTED_SIZES, SizeOption, dimensions_label,
};
pub use settings::{AppSettings, ExportSettings, LoggingSettings};
pub use surface::RenderedSurface;
