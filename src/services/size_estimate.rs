use crate::models::RenderedSurface;
use std::fmt;

const KIB: usize = 1024;

/// Approximate size of the exported artifact.
///
/// Display only. The exported file is encoded again at export time and may differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    bytes: usize,
}

impl SizeEstimate {
    pub fn from_byte_len(bytes: usize) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Whole kilobytes, rounded up. `None` below one kilobyte.
    pub fn kilobytes(&self) -> Option<usize> {
        if self.bytes < KIB {
            None
        } else {
            Some(self.bytes.div_ceil(KIB))
        }
    }

    /// Approximate label, e.g. `~3 KB` or `~< 1 KB`.
    pub fn label(&self) -> String {
        format!("~{self}")
    }
}

impl fmt::Display for SizeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kilobytes() {
            Some(kb) => write!(f, "{kb} KB"),
            None => f.write_str("< 1 KB"),
        }
    }
}

/// Encode `surface` the way export does and measure the payload.
pub fn estimate(surface: &RenderedSurface) -> Result<SizeEstimate, image::ImageError> {
    let png = surface.to_png()?;
    Ok(SizeEstimate::from_byte_len(png.len()))
}
