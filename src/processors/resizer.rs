// assetprep/src/processors/resizer.rs
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Shrinks images into a bounding box, keeping their aspect ratio.
pub struct Resizer {
    max_width: u32,
    max_height: u32,
    filter: FilterType,
}

impl Resizer {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            filter: FilterType::Lanczos3,
        }
    }

    /// Returns the resized image, or `None` when it already fits.
    pub fn resize(&self, image: &DynamicImage) -> Option<DynamicImage> {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = Self::fit_within(width, height, self.max_width, self.max_height)?;

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            width,
            height,
            new_width,
            new_height
        );

        Some(image.resize_exact(new_width, new_height, self.filter))
    }

    /// Target size for a `width`x`height` image inside `max_w`x`max_h`.
    ///
    /// The limiting axis lands exactly on its bound and the other is
    /// truncated, never below one pixel. `None` if no resize is needed.
    pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 || (width <= max_w && height <= max_h) {
            return None;
        }

        let (w, h) = (u64::from(width), u64::from(height));
        let (mw, mh) = (u64::from(max_w), u64::from(max_h));

        // Compare max_w / w against max_h / h without floating point.
        let (new_w, new_h) = if mw * h <= mh * w {
            (mw, h * mw / w)
        } else {
            (w * mh / h, mh)
        };

        Some((new_w.max(1) as u32, new_h.max(1) as u32))
    }
}
