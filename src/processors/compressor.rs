// assetprep/src/processors/compressor.rs
use crate::core::{AssetError, Result};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, RgbImage};
use oxipng::{optimize_from_memory, Options};
use std::io::Cursor;
use std::path::Path;

/// libwebp effort, 0 (fastest) to 6 (smallest).
const WEBP_METHOD: i32 = 6;

pub struct Compressor {
    quality: u8,
    png_compression: u8,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            png_compression: crate::core::DEFAULT_PNG_COMPRESSION,
        }
    }

    /// zlib-style level, 0 (fastest) to 9 (smallest).
    pub fn with_png_compression(mut self, level: u8) -> Self {
        self.png_compression = level.min(9);
        self
    }

    /// Encodes and overwrites `path`. Encoding finishes before the file is
    /// touched, so a failed encode leaves the original intact.
    pub fn save(&self, image: &DynamicImage, path: &Path, format: ImageFormat) -> Result<u64> {
        let data = self.encode(image, format)?;
        std::fs::write(path, &data)?;

        log::debug!("Saved image: {} ({} bytes)", path.display(), data.len());
        Ok(data.len() as u64)
    }

    pub fn encode(&self, image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
        log::debug!("Encoding {:?}, quality: {}", format, self.quality);

        match format {
            ImageFormat::Jpeg => self.encode_jpeg(image),
            ImageFormat::Png => self.encode_png(image),
            ImageFormat::Gif => self.encode_gif(image),
            ImageFormat::WebP => self.encode_webp(image),
            other => Err(AssetError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    /// Progressive JPEG with optimised Huffman tables.
    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let prepared = prepare_for_jpeg(image);
        let (width, height) = prepared.dimensions();
        let (width, height) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(AssetError::InvalidParameter(format!(
                    "{}x{} exceeds the JPEG size limit",
                    width, height
                )))
            }
        };

        let (pixels, color) = match &prepared {
            DynamicImage::ImageLuma8(gray) => (gray.as_raw().as_slice(), jpeg_encoder::ColorType::Luma),
            DynamicImage::ImageRgb8(rgb) => (rgb.as_raw().as_slice(), jpeg_encoder::ColorType::Rgb),
            _ => return Err(AssetError::ProcessingError("Unexpected JPEG pixel layout".to_string())),
        };

        let mut buffer = Vec::new();
        let mut encoder = jpeg_encoder::Encoder::new(&mut buffer, self.quality);
        encoder.set_progressive(true);
        encoder.set_optimized_huffman_tables(true);
        encoder
            .encode(pixels, width, height, color)
            .map_err(|e| AssetError::ProcessingError(format!("JPEG encoding failed: {}", e)))?;
        Ok(buffer)
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let prepared = png_compatible(image);
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buffer, self.compression_type(), PngFilter::Adaptive);
        prepared.write_with_encoder(encoder)?;

        match optimize_from_memory(&buffer, &Options::from_preset(self.oxipng_preset())) {
            Ok(optimized) if optimized.len() < buffer.len() => Ok(optimized),
            Ok(_) => Ok(buffer),
            Err(e) => {
                log::debug!("oxipng pass skipped: {}", e);
                Ok(buffer)
            }
        }
    }

    fn encode_gif(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let prepared = DynamicImage::ImageRgba8(image.to_rgba8());
        let mut buffer = Cursor::new(Vec::new());
        prepared.write_to(&mut buffer, ImageFormat::Gif)?;
        Ok(buffer.into_inner())
    }

    /// Lossy WebP at the configured quality. Falls back to the lossless
    /// encoder when libwebp rejects the input.
    fn encode_webp(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let prepared = if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.to_rgb8())
        };

        match self.encode_webp_lossy(&prepared) {
            Ok(data) => Ok(data),
            Err(e) => {
                log::debug!("Lossy WebP failed ({}), writing lossless", e);
                let mut buffer = Vec::new();
                prepared.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))?;
                Ok(buffer)
            }
        }
    }

    fn encode_webp_lossy(&self, image: &DynamicImage) -> std::result::Result<Vec<u8>, String> {
        let encoder = webp::Encoder::from_image(image).map_err(|e| e.to_string())?;
        let mut config = webp::WebPConfig::new().map_err(|_| "invalid libwebp config".to_string())?;
        config.lossless = 0;
        config.quality = f32::from(self.quality);
        config.method = WEBP_METHOD;

        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| format!("{:?}", e))?;
        Ok(memory.to_vec())
    }

    fn compression_type(&self) -> CompressionType {
        match self.png_compression {
            0..=2 => CompressionType::Fast,
            3..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }

    fn oxipng_preset(&self) -> u8 {
        match self.png_compression {
            0..=3 => 1,
            4..=6 => 2,
            _ => 4,
        }
    }
}

/// JPEG has no alpha: transparent pixels are composited onto white.
pub fn flatten_onto_white(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let mut flat = RgbImage::new(rgba.width(), rgba.height());

    for (dst, src) in flat.pixels_mut().zip(rgba.pixels()) {
        let alpha = u32::from(src[3]);
        for c in 0..3 {
            let blended = (u32::from(src[c]) * alpha + 255 * (255 - alpha) + 127) / 255;
            dst[c] = blended as u8;
        }
    }

    DynamicImage::ImageRgb8(flat)
}

fn prepare_for_jpeg(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        return flatten_onto_white(image);
    }
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image.clone(),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

// PNG takes 8 and 16 bit integer samples; float buffers are narrowed.
fn png_compatible(image: &DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => image.clone(),
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => image.clone(),
        c if c.has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}
