use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// A committed-or-committable raster of a rendered code.
///
/// The surface is always square. It carries the generation id of the render that produced it,
/// so consumers can tell which configuration they are looking at.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedSurface {
    generation: u64,
    image: RgbaImage,
}

impl RenderedSurface {
    pub fn new(generation: u64, image: RgbaImage) -> Self {
        Self { generation, image }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Serialize the surface as a PNG byte stream.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}
