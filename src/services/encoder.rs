use crate::models::{
    ColorError, ErrorCorrectionLevel, PIXEL_DENSITY_RANGE, QUIET_ZONE_MODULES, QrConfig,
    SUPPORTED_SIZES, TRANSPARENT, parse_hex_color,
};
use image::RgbaImage;
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Background treatment requested from the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// Light modules use this hex color
    Color(String),
    /// Light modules are fully transparent
    Transparent,
}

/// Everything an encoder needs to produce one raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub payload: String,
    /// Edge length of the output raster in pixels
    pub dimension: u32,
    pub quiet_zone_modules: u32,
    pub error_correction: ErrorCorrectionLevel,
    pub foreground: String,
    pub background: Background,
    /// Desired pixels per module. Advisory only; `dimension` always wins.
    pub module_px_hint: u32,
}

impl EncodeRequest {
    pub fn from_config(config: &QrConfig) -> Self {
        let background = if config.transparent_background {
            Background::Transparent
        } else {
            Background::Color(config.light_color.clone())
        };

        Self {
            payload: config.content.clone(),
            dimension: config.size,
            quiet_zone_modules: QUIET_ZONE_MODULES,
            error_correction: config.error_correction_level,
            foreground: config.dark_color.clone(),
            background,
            module_px_hint: config.pixel_density,
        }
    }
}

/// Errors that can occur while encoding a configuration into a raster
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error(transparent)]
    InvalidColor(#[from] ColorError),

    #[error("Unsupported size {0}px (expected 256, 512, 1024 or 2048)")]
    UnsupportedSize(u32),

    #[error("Cannot encode payload: {0}")]
    Symbol(String),

    #[error("Symbol needs at least {required}px but only {dimension}px are available")]
    DimensionTooSmall { dimension: u32, required: u32 },

    #[error("Encoder produced a {width}x{height} raster, expected {expected}x{expected}")]
    UnexpectedDimensions {
        expected: u32,
        width: u32,
        height: u32,
    },

    #[error("Encoder task failed: {0}")]
    TaskFailed(String),
}

/// Turns an [`EncodeRequest`] into a fully rendered `dimension × dimension` raster.
///
/// Implementations are synchronous and may be CPU heavy; the render pipeline runs them on
/// the blocking pool. An encoder is never retried by the pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait Encoder: Send + Sync {
    fn encode(&self, request: &EncodeRequest) -> Result<RgbaImage, EncodeError>;
}

impl From<ErrorCorrectionLevel> for EcLevel {
    fn from(level: ErrorCorrectionLevel) -> Self {
        match level {
            ErrorCorrectionLevel::L => EcLevel::L,
            ErrorCorrectionLevel::M => EcLevel::M,
            ErrorCorrectionLevel::Q => EcLevel::Q,
            ErrorCorrectionLevel::H => EcLevel::H,
        }
    }
}

/// Default encoder built on the `qrcode` symbol encoder.
///
/// The module matrix (plus quiet zone) is stretched over the whole raster with a fractional
/// scale, so the output is exactly `dimension` pixels wide regardless of symbol version.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder;

impl QrEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for QrEncoder {
    fn encode(&self, request: &EncodeRequest) -> Result<RgbaImage, EncodeError> {
        let dark = parse_hex_color(&request.foreground)?;
        let light = match &request.background {
            Background::Color(hex) => parse_hex_color(hex)?,
            Background::Transparent => TRANSPARENT,
        };

        if !SUPPORTED_SIZES.contains(&request.dimension) {
            return Err(EncodeError::UnsupportedSize(request.dimension));
        }

        let code = QrCode::with_error_correction_level(
            request.payload.as_bytes(),
            request.error_correction.into(),
        )
        .map_err(|e| EncodeError::Symbol(e.to_string()))?;

        let modules = code.width() as u32;
        let margin = request.quiet_zone_modules;
        let total = modules + 2 * margin;
        if request.dimension < total {
            return Err(EncodeError::DimensionTooSmall {
                dimension: request.dimension,
                required: total,
            });
        }

        let effective_px = request.dimension as f64 / total as f64;
        if PIXEL_DENSITY_RANGE.contains(&request.module_px_hint) {
            tracing::debug!(
                "Encoding {} modules at {:.2}px per module (hint {}px)",
                modules,
                effective_px,
                request.module_px_hint
            );
        } else {
            tracing::debug!(
                "Ignoring out-of-range module size hint {}px; using {:.2}px",
                request.module_px_hint,
                effective_px
            );
        }

        let colors = code.to_colors();
        let dimension = u64::from(request.dimension);
        let to_module = |px: u32| -> Option<usize> {
            // floor(px / scale) - margin, with scale = dimension / total
            let cell = (u64::from(px) * u64::from(total) / dimension) as u32;
            cell.checked_sub(margin)
                .filter(|m| *m < modules)
                .map(|m| m as usize)
        };

        let image = RgbaImage::from_fn(request.dimension, request.dimension, |x, y| {
            match (to_module(x), to_module(y)) {
                (Some(mx), Some(my)) if colors[my * modules as usize + mx] == Color::Dark => dark,
                _ => light,
            }
        });

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QrConfigPatch;
    use image::Rgba;

    fn request(patch: QrConfigPatch) -> EncodeRequest {
        EncodeRequest::from_config(&QrConfig::default().merged(&patch))
    }

    #[test]
    fn test_request_from_config() {
        let req = request(QrConfigPatch::new().dark_color("#112233"));

        assert_eq!(req.payload, "https://example.com");
        assert_eq!(req.dimension, 256);
        assert_eq!(req.quiet_zone_modules, 2);
        assert_eq!(req.error_correction, ErrorCorrectionLevel::M);
        assert_eq!(req.foreground, "#112233");
        assert_eq!(req.background, Background::Color("#FFFFFF".to_string()));
        assert_eq!(req.module_px_hint, 8);
    }

    #[test]
    fn test_request_transparent_background() {
        let req = request(QrConfigPatch::new().transparent_background(true));
        assert_eq!(req.background, Background::Transparent);
    }

    #[test]
    fn test_encode_exact_dimensions() {
        for size in SUPPORTED_SIZES {
            let image = QrEncoder::new()
                .encode(&request(QrConfigPatch::new().size(size)))
                .unwrap();
            assert_eq!(image.dimensions(), (size, size));
        }
    }

    #[test]
    fn test_quiet_zone_is_light() {
        let image = QrEncoder::new().encode(&request(QrConfigPatch::new())).unwrap();

        // The corners sit inside the quiet zone
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(255, 255), Rgba([255, 255, 255, 255]));
        assert!(image.pixels().any(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_transparency_changes_only_background_alpha() {
        let encoder = QrEncoder::new();
        let opaque = encoder.encode(&request(QrConfigPatch::new())).unwrap();
        let clear = encoder
            .encode(&request(QrConfigPatch::new().transparent_background(true)))
            .unwrap();

        for (a, b) in opaque.pixels().zip(clear.pixels()) {
            assert_eq!(a.0[..3], b.0[..3]);
            if a.0[3] != b.0[3] {
                assert_eq!(*a, Rgba([255, 255, 255, 255]));
                assert_eq!(b.0[3], 0);
            }
        }
    }

    #[test]
    fn test_custom_colors_are_used() {
        let image = QrEncoder::new()
            .encode(&request(
                QrConfigPatch::new().dark_color("#ff0000").light_color("#00f"),
            ))
            .unwrap();

        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert!(image.pixels().any(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_invalid_color_fails() {
        let err = QrEncoder::new()
            .encode(&request(QrConfigPatch::new().dark_color("black")))
            .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidColor(_)));
    }

    #[test]
    fn test_invalid_light_color_ignored_when_transparent() {
        let result = QrEncoder::new().encode(&request(
            QrConfigPatch::new()
                .light_color("nope")
                .transparent_background(true),
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn test_unsupported_size_fails() {
        let err = QrEncoder::new()
            .encode(&request(QrConfigPatch::new().size(300)))
            .unwrap_err();
        assert_eq!(err, EncodeError::UnsupportedSize(300));
    }

    #[test]
    fn test_payload_too_long_fails() {
        let err = QrEncoder::new()
            .encode(&request(
                QrConfigPatch::new()
                    .content("x".repeat(4000))
                    .error_correction_level(ErrorCorrectionLevel::H),
            ))
            .unwrap_err();
        assert!(matches!(err, EncodeError::Symbol(_)));
    }

    #[test]
    fn test_level_changes_layout() {
        let encoder = QrEncoder::new();
        let low = encoder
            .encode(&request(QrConfigPatch::new().error_correction_level(ErrorCorrectionLevel::L)))
            .unwrap();
        let high = encoder
            .encode(&request(QrConfigPatch::new().error_correction_level(ErrorCorrectionLevel::H)))
            .unwrap();
        assert_ne!(low, high);
    }
}
