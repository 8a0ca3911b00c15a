use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Raster dimensions (in pixels) the renderer accepts.
pub const SUPPORTED_SIZES: [u32; 4] = [256, 512, 1024, 2048];

/// Bounds of the module-size hint, in pixels per module.
pub const PIXEL_DENSITY_RANGE: RangeInclusive<u32> = 4..=12;

/// Quiet-zone width around the symbol, in modules. Not user-configurable.
pub const QUIET_ZONE_MODULES: u32 = 2;

pub const DEFAULT_CONTENT: &str = "https://example.com";
pub const DEFAULT_DARK_COLOR: &str = "#000000";
pub const DEFAULT_LIGHT_COLOR: &str = "#FFFFFF";

/// Error-correction tier of the encoded symbol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [Self::L, Self::M, Self::Q, Self::H];

    /// Approximate share of damaged modules the symbol survives, in percent.
    pub fn recovery_percent(self) -> u8 {
        match self {
            Self::L => 7,
            Self::M => 15,
            Self::Q => 25,
            Self::H => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::L => "Low (L)",
            Self::M => "Medium (M)",
            Self::Q => "Quartile (Q)",
            Self::H => "High (H)",
        }
    }

    /// The level suggested to users who have no reason to pick another.
    pub fn is_recommended(self) -> bool {
        self == Self::L
    }
}

impl fmt::Display for ErrorCorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(symbol)
    }
}

/// One of the selectable output resolutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeOption {
    pub pixels: u32,
    pub label: &'static str,
}

impl SizeOption {
    pub const ALL: [SizeOption; 4] = [
        SizeOption { pixels: 256, label: "Small" },
        SizeOption { pixels: 512, label: "Medium" },
        SizeOption { pixels: 1024, label: "Large" },
        SizeOption { pixels: 2048, label: "Extra Large" },
    ];

    pub fn for_pixels(pixels: u32) -> Option<SizeOption> {
        Self::ALL.into_iter().find(|o| o.pixels == pixels)
    }

    pub fn dimensions_label(self) -> String {
        dimensions_label(self.pixels)
    }
}

/// `"256 × 256px"`
pub fn dimensions_label(pixels: u32) -> String {
    format!("{pixels} × {pixels}px")
}

/// Identifies a single field of [`QrConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Content,
    Size,
    ErrorCorrectionLevel,
    PixelDensity,
    TransparentBackground,
    DarkColor,
    LightColor,
}

/// The complete, immutable description of the code to render.
///
/// A `QrConfig` is never edited in place. Every change goes through
/// [`QrConfig::merged`] (usually via [`ConfigStore::update`](crate::state::ConfigStore::update)),
/// which produces a new value and leaves the previous one untouched.
///
/// Fields are stored as supplied. Colors in particular are kept as raw strings and are only
/// validated where they are used, at the encoder boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrConfig {
    pub content: String,
    pub size: u32,
    pub error_correction_level: ErrorCorrectionLevel,
    pub pixel_density: u32,
    pub transparent_background: bool,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            content: DEFAULT_CONTENT.to_string(),
            size: 256,
            error_correction_level: ErrorCorrectionLevel::M,
            pixel_density: 8,
            transparent_background: false,
            dark_color: DEFAULT_DARK_COLOR.to_string(),
            light_color: DEFAULT_LIGHT_COLOR.to_string(),
        }
    }
}

impl QrConfig {
    /// Whether there is anything to encode. Blank content suppresses rendering and export.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn is_supported_size(&self) -> bool {
        SUPPORTED_SIZES.contains(&self.size)
    }

    pub fn density_label(&self) -> String {
        format!("{}px modules", self.pixel_density)
    }

    /// Return a copy of `self` with every field present in `patch` replaced.
    pub fn merged(&self, patch: &QrConfigPatch) -> QrConfig {
        QrConfig {
            content: patch.content.clone().unwrap_or_else(|| self.content.clone()),
            size: patch.size.unwrap_or(self.size),
            error_correction_level: patch
                .error_correction_level
                .unwrap_or(self.error_correction_level),
            pixel_density: patch.pixel_density.unwrap_or(self.pixel_density),
            transparent_background: patch
                .transparent_background
                .unwrap_or(self.transparent_background),
            dark_color: patch
                .dark_color
                .clone()
                .unwrap_or_else(|| self.dark_color.clone()),
            light_color: patch
                .light_color
                .clone()
                .unwrap_or_else(|| self.light_color.clone()),
        }
    }

    /// Fields whose values differ between `self` and `other`.
    pub fn diff(&self, other: &QrConfig) -> Vec<ConfigField> {
        let mut changed = Vec::new();

        if self.content != other.content {
            changed.push(ConfigField::Content);
        }
        if self.size != other.size {
            changed.push(ConfigField::Size);
        }
        if self.error_correction_level != other.error_correction_level {
            changed.push(ConfigField::ErrorCorrectionLevel);
        }
        if self.pixel_density != other.pixel_density {
            changed.push(ConfigField::PixelDensity);
        }
        if self.transparent_background != other.transparent_background {
            changed.push(ConfigField::TransparentBackground);
        }
        if self.dark_color != other.dark_color {
            changed.push(ConfigField::DarkColor);
        }
        if self.light_color != other.light_color {
            changed.push(ConfigField::LightColor);
        }

        changed
    }
}

/// A partial configuration: only the fields that are `Some` are applied by a merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QrConfigPatch {
    pub content: Option<String>,
    pub size: Option<u32>,
    pub error_correction_level: Option<ErrorCorrectionLevel>,
    pub pixel_density: Option<u32>,
    pub transparent_background: Option<bool>,
    pub dark_color: Option<String>,
    pub light_color: Option<String>,
}

impl QrConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn error_correction_level(mut self, level: ErrorCorrectionLevel) -> Self {
        self.error_correction_level = Some(level);
        self
    }

    pub fn pixel_density(mut self, density: u32) -> Self {
        self.pixel_density = Some(density);
        self
    }

    pub fn transparent_background(mut self, transparent: bool) -> Self {
        self.transparent_background = Some(transparent);
        self
    }

    pub fn dark_color(mut self, color: impl Into<String>) -> Self {
        self.dark_color = Some(color.into());
        self
    }

    pub fn light_color(mut self, color: impl Into<String>) -> Self {
        self.light_color = Some(color.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
