pub mod cli;
mod converter;
mod core;
mod processors;
mod utils;

pub use cli::{ConvertCli, OptimizeCli};
pub use converter::{
    find_source_files, get_converted_path, needs_conversion, ConversionBatch, ConversionReason,
    SourceKind, ToolCommand, ToolOutput, SOURCE_EXTENSIONS,
};
pub use crate::core::processor::{webp_sibling, ImageProcessor};
pub use crate::core::{
    default_scripts_dir, AssetError, BatchSummary, ConvertConfig, Decision, ImageStats,
    OptimizeConfig, Result,
};
pub use processors::{
    find_images, flatten_onto_white, needs_optimization, CacheEntry, Compressor, Loader,
    MetadataProcessor, OptimizationBatch, OptimizationCache, OptimizationReason, Resizer,
    CACHE_FILE_NAME, IMAGE_EXTENSIONS,
};
pub use utils::{display_relative, file_hash, format_size, mtime_string};

pub mod prelude {
    pub use crate::processors::prelude::*;
    pub use crate::{ConversionBatch, ConvertConfig, ImageProcessor, OptimizeConfig, ToolCommand};
}

// Re-export commonly used types
pub use image::DynamicImage;
