// assetprep/src/processors/mod.rs
mod batch;
mod cache;
mod compressor;
mod loader;
mod metadata;
mod resizer;

pub use batch::{find_images, needs_optimization, OptimizationBatch, OptimizationReason, IMAGE_EXTENSIONS};
pub use cache::{CacheEntry, OptimizationCache, CACHE_FILE_NAME};
pub use compressor::{flatten_onto_white, Compressor};
pub use loader::Loader;
pub use metadata::MetadataProcessor;
pub use resizer::Resizer;

pub mod prelude {
    pub use super::{Compressor, Loader, MetadataProcessor, OptimizationBatch, OptimizationCache, Resizer};
}
