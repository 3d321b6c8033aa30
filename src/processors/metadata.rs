// assetprep/src/processors/metadata.rs
use crate::core::{AssetError, Result};
use exif::{Exif, In, Reader, Tag};
use image::metadata::Orientation;
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn read_metadata(&self, path: &Path) -> Result<Option<Exif>> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(&file);

        match Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => {
                log::debug!("Found EXIF data in {}", path.display());
                Ok(Some(exif))
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found in {}", path.display());
                Ok(None)
            }
            Err(e) => Err(AssetError::Exif(e.to_string())),
        }
    }

    /// EXIF orientation of the primary image, if the file carries one.
    ///
    /// Unreadable or malformed EXIF is treated as "no orientation" so a
    /// broken tag never stops an otherwise decodable image.
    pub fn orientation(&self, path: &Path) -> Option<Orientation> {
        let exif = match self.read_metadata(path) {
            Ok(Some(exif)) => exif,
            Ok(None) => return None,
            Err(e) => {
                log::debug!("Ignoring EXIF of {}: {}", path.display(), e);
                return None;
            }
        };

        let value = exif
            .get_field(Tag::Orientation, In::PRIMARY)?
            .value
            .get_uint(0)?;
        u8::try_from(value).ok().and_then(Orientation::from_exif)
    }

    /// Rotates/flips pixels so the image displays upright without its tag.
    pub fn apply_orientation(&self, image: &mut DynamicImage, orientation: Orientation) {
        if orientation != Orientation::NoTransforms {
            log::debug!("Applying EXIF orientation {:?}", orientation);
            image.apply_orientation(orientation);
        }
    }

    /// Reads the tag from `path` and normalises `image` accordingly.
    pub fn exif_transpose(&self, image: &mut DynamicImage, path: &Path) {
        if let Some(orientation) = self.orientation(path) {
            self.apply_orientation(image, orientation);
        }
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn files_without_exif_have_no_orientation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        image::RgbImage::new(4, 2).save(&path).unwrap();

        let processor = MetadataProcessor::new();
        assert!(processor.read_metadata(&path).unwrap().is_none());
        assert_eq!(processor.orientation(&path), None);
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let processor = MetadataProcessor::new();
        let mut image = DynamicImage::new_rgb8(4, 2);
        processor.apply_orientation(&mut image, Orientation::Rotate90);
        assert_eq!(image.dimensions(), (2, 4));

        processor.apply_orientation(&mut image, Orientation::NoTransforms);
        assert_eq!(image.dimensions(), (2, 4));
    }
}
