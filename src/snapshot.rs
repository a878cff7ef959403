//! Captured raster snapshots

use crate::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat, RgbImage, RgbaImage};

/// An immutable captured bitmap
///
/// `width` and `height` are pixel dimensions with the capture scale already
/// applied. Pixels are kept PNG-encoded, the lossless format the capture
/// engine hands to the exporter.
#[derive(Debug, Clone)]
pub struct RasterSnapshot {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub png_data: Vec<u8>,
}

impl RasterSnapshot {
    /// Encode an RGBA bitmap into a snapshot
    pub fn from_image(image: &RgbaImage, scale: u32) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::CaptureError(format!(
                "empty raster ({}x{})",
                width, height
            )));
        }
        let mut png_data = Vec::new();
        PngEncoder::new(&mut png_data).write_image(image.as_raw(), width, height, ColorType::Rgba8)?;
        Ok(Self {
            width,
            height,
            scale,
            png_data,
        })
    }

    /// Decode the pixels as 8-bit RGB, dropping alpha.
    pub fn decode_rgb(&self) -> Result<RgbImage> {
        let img = image::load_from_memory_with_format(&self.png_data, ImageFormat::Png)?;
        let rgb = img.to_rgb8();
        if rgb.dimensions() != (self.width, self.height) {
            return Err(Error::EncodingError(format!(
                "snapshot claims {}x{} but pixel data is {}x{}",
                self.width,
                self.height,
                rgb.width(),
                rgb.height()
            )));
        }
        Ok(rgb)
    }

    /// Width of the captured surface before scaling, in CSS pixels
    pub fn css_width(&self) -> u32 {
        self.width / self.scale.max(1)
    }

    /// Height of the captured surface before scaling, in CSS pixels
    pub fn css_height(&self) -> u32 {
        self.height / self.scale.max(1)
    }
}
