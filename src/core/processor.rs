// assetprep/src/core/processor.rs
use super::{ImageStats, OptimizeConfig, Result};
use crate::processors::{Compressor, Loader, MetadataProcessor, Resizer};
use crate::utils::modified_time;
use image::{GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};

/// Optimises one image in place: orient, flatten, shrink, re-encode and
/// optionally write a WebP sibling.
pub struct ImageProcessor {
    generate_webp: bool,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
    metadata_processor: MetadataProcessor,
}

impl ImageProcessor {
    pub fn new(config: &OptimizeConfig) -> Self {
        Self {
            generate_webp: config.generate_webp,
            loader: Loader::new(),
            resizer: Resizer::new(config.max_width, config.max_height),
            compressor: Compressor::new(config.quality).with_png_compression(config.png_compression),
            metadata_processor: MetadataProcessor::new(),
        }
    }

    /// Under `dry_run` every decision is made but nothing is written, and
    /// the new size is reported as the original size.
    pub fn optimize_image(&self, path: &Path, dry_run: bool) -> Result<ImageStats> {
        let mut stats = ImageStats {
            original_size: std::fs::metadata(path)?.len(),
            ..Default::default()
        };

        let target = self.loader.detect_format(path)?;
        let mut image = self.loader.load(path)?;
        stats.original_dimensions = image.dimensions();

        self.metadata_processor.exif_transpose(&mut image, path);

        if let Some(resized) = self.resizer.resize(&image) {
            image = resized;
            stats.resized = true;
        }
        stats.new_dimensions = image.dimensions();

        if dry_run {
            stats.new_size = stats.original_size;
            return Ok(stats);
        }

        stats.new_size = self.compressor.save(&image, path, target)?;

        if self.generate_webp && !matches!(target, ImageFormat::WebP | ImageFormat::Gif) {
            let webp_path = webp_sibling(path);
            if webp_is_stale(&webp_path, path)? {
                stats.webp_size = self.compressor.save(&image, &webp_path, ImageFormat::WebP)?;
            } else {
                log::debug!("{} is up to date", webp_path.display());
            }
        }

        Ok(stats)
    }
}

pub fn webp_sibling(path: &Path) -> PathBuf {
    path.with_extension("webp")
}

fn webp_is_stale(webp_path: &Path, source: &Path) -> Result<bool> {
    if !webp_path.exists() {
        return Ok(true);
    }
    Ok(modified_time(webp_path)? < modified_time(source)?)
}
