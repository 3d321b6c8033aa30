// assetprep/src/processors/loader.rs
use crate::core::{AssetError, Result};
use crate::utils::get_file_extension;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::path::Path;

/// Largest decoded size accepted on either axis.
const MAX_DECODE_DIMENSION: u32 = 100_000;

#[derive(Clone)]
pub struct Loader {
    max_dimensions: (u32, u32),
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: (MAX_DECODE_DIMENSION, MAX_DECODE_DIMENSION),
        }
    }

    pub fn load(&self, path: &Path) -> Result<DynamicImage> {
        log::debug!("Loading image from: {}", path.display());

        self.validate_path(path)?;

        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| AssetError::ProcessingError(format!("Failed to decode image: {}", e)))?;

        let (width, height) = image.dimensions();
        let (max_w, max_h) = self.max_dimensions;
        if width > max_w || height > max_h {
            return Err(AssetError::InvalidParameter(format!(
                "Image dimensions {}x{} exceed maximum {}x{}",
                width, height, max_w, max_h
            )));
        }

        log::debug!(
            "Loaded image: {}x{} pixels, color: {:?}",
            width,
            height,
            image.color()
        );

        Ok(image)
    }

    /// Width and height from the header alone, without decoding pixels.
    pub fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        let dimensions = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(dimensions)
    }

    /// Target encoding, chosen from the file extension since files are
    /// rewritten under their own name.
    pub fn detect_format(&self, path: &Path) -> Result<ImageFormat> {
        match get_file_extension(path).as_deref() {
            Some("jpg") | Some("jpeg") => Ok(ImageFormat::Jpeg),
            Some("png") => Ok(ImageFormat::Png),
            Some("gif") => Ok(ImageFormat::Gif),
            Some("webp") => Ok(ImageFormat::WebP),
            _ => Err(AssetError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        let metadata = path.metadata()?;
        if metadata.len() == 0 {
            return Err(AssetError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
