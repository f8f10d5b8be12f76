//! RGBA raster buffers at the three supported bit depths.
//!
//! Sources are decoded into the shallowest depth that holds them without
//! loss. Within one channel every buffer is widened to the deepest source
//! depth before pixels are copied, so values never lose precision.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Rgba, Rgba32FImage, RgbaImage};
use udimpack_spec::BitDepth;

/// 16-bit RGBA image.
pub type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// An RGBA image at 8, 16 or 32-bit float precision.
#[derive(Debug, Clone, PartialEq)]
pub enum TileRaster {
    Rgba8(RgbaImage),
    Rgba16(Rgba16Image),
    Rgba32F(Rgba32FImage),
}

impl TileRaster {
    /// Converts a decoded image, keeping its sample precision.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let color = image.color();
        let bytes_per_sample = color.bytes_per_pixel() / color.channel_count().max(1);
        match bytes_per_sample {
            0 | 1 => TileRaster::Rgba8(image.into_rgba8()),
            2 => TileRaster::Rgba16(image.into_rgba16()),
            _ => TileRaster::Rgba32F(image.into_rgba32f()),
        }
    }

    /// A buffer of one color; `fill` is normalized RGBA.
    pub fn filled(width: u32, height: u32, depth: BitDepth, fill: [f32; 4]) -> Self {
        match depth {
            BitDepth::U8 => {
                let px = Rgba(fill.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
                TileRaster::Rgba8(ImageBuffer::from_pixel(width, height, px))
            }
            BitDepth::U16 => {
                let px = Rgba(fill.map(|c| (c.clamp(0.0, 1.0) * 65535.0).round() as u16));
                TileRaster::Rgba16(ImageBuffer::from_pixel(width, height, px))
            }
            BitDepth::F32 => {
                TileRaster::Rgba32F(ImageBuffer::from_pixel(width, height, Rgba(fill)))
            }
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            TileRaster::Rgba8(img) => img.width(),
            TileRaster::Rgba16(img) => img.width(),
            TileRaster::Rgba32F(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            TileRaster::Rgba8(img) => img.height(),
            TileRaster::Rgba16(img) => img.height(),
            TileRaster::Rgba32F(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            TileRaster::Rgba8(_) => BitDepth::U8,
            TileRaster::Rgba16(_) => BitDepth::U16,
            TileRaster::Rgba32F(_) => BitDepth::F32,
        }
    }

    /// Returns this raster at `depth` if that is deeper, else unchanged.
    ///
    /// 8 to 16-bit multiplies by 257 and integer to float divides by the
    /// type's maximum, so every value maps back exactly.
    pub fn widened(&self, depth: BitDepth) -> TileRaster {
        if depth <= self.bit_depth() {
            return self.clone();
        }
        self.to_depth_lossy(depth)
    }

    /// Lanczos3 resample to an exact size; a same-size request is a plain copy.
    pub fn resized(&self, width: u32, height: u32) -> TileRaster {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        match self {
            TileRaster::Rgba8(img) => {
                TileRaster::Rgba8(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
            TileRaster::Rgba16(img) => {
                TileRaster::Rgba16(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
            TileRaster::Rgba32F(img) => {
                TileRaster::Rgba32F(imageops::resize(img, width, height, FilterType::Lanczos3))
            }
        }
    }

    /// Copies `top` into this raster with its top-left corner at `(x, y)`.
    ///
    /// `top` is converted to this raster's depth first; the compositor only
    /// ever pastes equal or shallower sources, which widen without loss.
    pub fn paste(&mut self, top: &TileRaster, x: u32, y: u32) {
        let (x, y) = (i64::from(x), i64::from(y));
        match self {
            TileRaster::Rgba8(dst) => imageops::replace(dst, &top.to_rgba8(), x, y),
            TileRaster::Rgba16(dst) => imageops::replace(dst, &top.to_rgba16(), x, y),
            TileRaster::Rgba32F(dst) => imageops::replace(dst, &top.to_rgba32f(), x, y),
        }
    }

    fn to_rgba8(&self) -> RgbaImage {
        match self {
            TileRaster::Rgba8(img) => img.clone(),
            other => other.to_dynamic().into_rgba8(),
        }
    }

    fn to_rgba16(&self) -> Rgba16Image {
        match self {
            TileRaster::Rgba16(img) => img.clone(),
            other => other.to_dynamic().into_rgba16(),
        }
    }

    fn to_rgba32f(&self) -> Rgba32FImage {
        match self {
            TileRaster::Rgba32F(img) => img.clone(),
            other => other.to_dynamic().into_rgba32f(),
        }
    }

    /// Normalized RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        match self {
            TileRaster::Rgba8(img) => img.get_pixel(x, y).0.map(|c| c as f32 / 255.0),
            TileRaster::Rgba16(img) => img.get_pixel(x, y).0.map(|c| c as f32 / 65535.0),
            TileRaster::Rgba32F(img) => img.get_pixel(x, y).0,
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            TileRaster::Rgba8(img) => DynamicImage::ImageRgba8(img.clone()),
            TileRaster::Rgba16(img) => DynamicImage::ImageRgba16(img.clone()),
            TileRaster::Rgba32F(img) => DynamicImage::ImageRgba32F(img.clone()),
        }
    }

    /// Converts to any depth, rounding when narrowing.
    pub fn to_depth_lossy(&self, depth: BitDepth) -> TileRaster {
        match depth {
            BitDepth::U8 => TileRaster::Rgba8(self.to_rgba8()),
            BitDepth::U16 => TileRaster::Rgba16(self.to_rgba16()),
            BitDepth::F32 => TileRaster::Rgba32F(self.to_rgba32f()),
        }
    }
}
