// assetprep/src/processors/batch.rs
use super::cache::{CacheEntry, OptimizationCache};
use super::Loader;
use crate::core::processor::ImageProcessor;
use crate::core::{BatchSummary, Decision, ImageStats, OptimizeConfig, Result};
use crate::utils::{
    banner, create_progress_bar, display_relative, file_hash, format_size, get_file_extension,
    report, savings_percent,
};
use indicatif::ProgressBar;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Backup copies are named `<stem>.original.<ext>`.
const BACKUP_MARKER: &str = ".original";
const OUTPUT_MARKER: &str = ".optimized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationReason {
    Forced,
    AlreadyOptimized,
    Unreadable,
    Oversized(u32, u32),
    /// File size in bytes.
    LargeFile(u64),
    NotInCache,
    /// A cache entry exists but no longer matches the file.
    Changed,
}

impl OptimizationReason {
    pub fn needs_optimization(self) -> bool {
        !matches!(self, Self::AlreadyOptimized | Self::Unreadable)
    }
}

impl fmt::Display for OptimizationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced => f.write_str("forced"),
            Self::AlreadyOptimized => f.write_str("already optimized"),
            Self::Unreadable => f.write_str("cannot read image"),
            Self::Oversized(w, h) => write!(f, "oversized ({}x{})", w, h),
            Self::LargeFile(bytes) => write!(f, "large file ({:.0}KB)", *bytes as f64 / 1024.0),
            Self::NotInCache => f.write_str("not in cache"),
            Self::Changed => f.write_str("changed since last optimization"),
        }
    }
}

/// Size above which a file is recompressed regardless of its dimensions.
fn size_threshold_kb(path: &Path) -> Option<f64> {
    match get_file_extension(path)?.as_str() {
        "jpg" | "jpeg" => Some(500.0),
        "png" => Some(1000.0),
        "gif" => Some(2000.0),
        _ => None,
    }
}

fn is_generated_artifact(path: &Path) -> bool {
    let lossy = path.to_string_lossy();
    if lossy.contains(OUTPUT_MARKER) {
        return true;
    }

    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase().ends_with(BACKUP_MARKER))
        .unwrap_or(false)
}

/// Every optimisable image under `dir`, sorted, minus backups and outputs.
pub fn find_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            get_file_extension(entry.path())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .filter(|path| !is_generated_artifact(path))
        .collect();

    images.sort();
    images.dedup();
    images
}

/// Policy, first match wins: force, cache hit, unreadable, oversized,
/// over the per-format size threshold, absent from cache, stale entry.
pub fn needs_optimization(
    path: &Path,
    cache: &OptimizationCache,
    force: bool,
    max_width: u32,
    max_height: u32,
) -> Result<OptimizationReason> {
    if force {
        return Ok(OptimizationReason::Forced);
    }

    let hash = file_hash(path)?;
    if cache.matches(path, &hash) {
        return Ok(OptimizationReason::AlreadyOptimized);
    }

    let (width, height) = match Loader::new().dimensions(path) {
        Ok(dimensions) => dimensions,
        Err(e) => {
            log::debug!("Cannot read {}: {}", path.display(), e);
            return Ok(OptimizationReason::Unreadable);
        }
    };
    if width > max_width || height > max_height {
        return Ok(OptimizationReason::Oversized(width, height));
    }

    let size = std::fs::metadata(path)?.len();
    if let Some(threshold) = size_threshold_kb(path) {
        if size as f64 / 1024.0 > threshold {
            return Ok(OptimizationReason::LargeFile(size));
        }
    }

    if !cache.contains(path) {
        return Ok(OptimizationReason::NotInCache);
    }

    Ok(OptimizationReason::Changed)
}

pub struct OptimizationBatch {
    config: OptimizeConfig,
    processor: ImageProcessor,
}

impl OptimizationBatch {
    pub fn new(config: OptimizeConfig) -> Self {
        let processor = ImageProcessor::new(&config);
        Self { config, processor }
    }

    /// Optimises every image that needs it and persists the cache once at
    /// the end (never under dry-run).
    pub fn run(&self) -> Result<BatchSummary> {
        self.config.validate()?;
        let assets_dir = &self.config.assets_dir;

        banner("Image Optimizer");
        println!("Assets directory: {}", assets_dir.display());
        println!("Max dimensions: {}x{}", self.config.max_width, self.config.max_height);
        println!("Quality: {}", self.config.quality);
        println!("Generate WebP: {}", self.config.generate_webp);
        println!("Force mode: {}", self.config.force);
        println!("Dry run: {}", self.config.dry_run);
        println!();

        let mut cache = OptimizationCache::load(assets_dir);

        let images = find_images(assets_dir);
        if images.is_empty() {
            println!("No images found to optimize.");
            let formats: Vec<String> = IMAGE_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect();
            println!("Supported formats: {}", formats.join(", "));
            return Ok(BatchSummary::default());
        }

        println!("Found {} image(s)", images.len());
        println!();

        let pb = create_progress_bar(images.len(), self.config.show_progress);
        let mut summary = BatchSummary::default();

        for image in &images {
            self.process_one(image, &mut cache, &pb, &mut summary);
            pb.inc(1);
        }
        pb.finish_and_clear();

        if !self.config.dry_run {
            cache.save()?;
            log::debug!("Saved {} cache entries to {}", cache.len(), cache.file_path().display());
        }

        self.print_summary(&summary);
        Ok(summary)
    }

    fn process_one(
        &self,
        path: &Path,
        cache: &mut OptimizationCache,
        pb: &ProgressBar,
        summary: &mut BatchSummary,
    ) {
        let rel_path = display_relative(path, self.config.repo_root());

        let reason = match needs_optimization(
            path,
            cache,
            self.config.force,
            self.config.max_width,
            self.config.max_height,
        ) {
            Ok(reason) => reason,
            Err(e) => {
                report(pb, format!("[ERROR] {} ({})", rel_path.display(), e));
                summary.failed += 1;
                summary.errors.push((path.to_path_buf(), e.to_string()));
                return;
            }
        };

        summary.decisions.push(Decision {
            path: path.to_path_buf(),
            process: reason.needs_optimization(),
            reason: reason.to_string(),
        });

        if !reason.needs_optimization() {
            report(pb, format!("[SKIP] {} ({})", rel_path.display(), reason));
            summary.skipped += 1;
            return;
        }

        report(pb, format!("[OPTIMIZE] {} ({})", rel_path.display(), reason));
        pb.set_message(rel_path.display().to_string());

        let stats = match self.processor.optimize_image(path, self.config.dry_run) {
            Ok(stats) => stats,
            Err(e) => {
                report(pb, format!("  ERROR: {}", e));
                summary.failed += 1;
                summary.errors.push((path.to_path_buf(), e.to_string()));
                return;
            }
        };

        summary.processed += 1;
        summary.bytes_saved += stats.bytes_saved();

        if !self.config.dry_run {
            match CacheEntry::for_file(path) {
                Ok(entry) => cache.insert(path, entry),
                Err(e) => log::warn!("Not caching {}: {}", path.display(), e),
            }
        }

        self.print_stats(pb, &stats);
    }

    fn print_stats(&self, pb: &ProgressBar, stats: &ImageStats) {
        let mut size_info = format!(
            "{} -> {}",
            format_size(stats.original_size),
            format_size(stats.new_size)
        );
        if stats.bytes_saved() > 0 {
            size_info.push_str(&format!(
                " (saved {:.1}%)",
                savings_percent(stats.original_size, stats.new_size)
            ));
        }
        report(pb, format!("  {}", size_info));

        if stats.resized {
            let (ow, oh) = stats.original_dimensions;
            let (nw, nh) = stats.new_dimensions;
            report(pb, format!("  Resized: {}x{} -> {}x{}", ow, oh, nw, nh));
        }

        if stats.webp_size > 0 {
            report(pb, format!("  WebP: {}", format_size(stats.webp_size)));
        }
    }

    fn print_summary(&self, summary: &BatchSummary) {
        println!();
        banner("Summary");
        println!("  Optimized: {}", summary.processed);
        println!("  Skipped:   {}", summary.skipped);
        println!("  Failed:    {}", summary.failed);
        if summary.bytes_saved > 0 {
            println!("  Total saved: {}", format_size(summary.bytes_saved));
        }

        if self.config.dry_run {
            println!();
            println!("(Dry run - no files were actually modified)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_read_like_the_report() {
        assert_eq!(OptimizationReason::Oversized(4000, 3000).to_string(), "oversized (4000x3000)");
        assert_eq!(OptimizationReason::LargeFile(2 * 1024 * 1024).to_string(), "large file (2048KB)");
        assert!(!OptimizationReason::Unreadable.needs_optimization());
        assert!(OptimizationReason::Changed.needs_optimization());
    }

    #[test]
    fn thresholds_are_per_format() {
        assert_eq!(size_threshold_kb(Path::new("a.JPG")), Some(500.0));
        assert_eq!(size_threshold_kb(Path::new("a.png")), Some(1000.0));
        assert_eq!(size_threshold_kb(Path::new("a.gif")), Some(2000.0));
        assert_eq!(size_threshold_kb(Path::new("a.webp")), None);
    }

    #[test]
    fn backups_and_outputs_are_excluded() {
        assert!(is_generated_artifact(Path::new("img/photo.original.jpg")));
        assert!(is_generated_artifact(Path::new("img/photo.ORIGINAL.png")));
        assert!(is_generated_artifact(Path::new("img/.optimized/photo.jpg")));
        assert!(is_generated_artifact(Path::new("img/photo.optimized.png")));
        assert!(!is_generated_artifact(Path::new("img/original-photo.jpg")));
    }

    #[test]
    fn discovery_matches_extensions_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        for name in ["b.PNG", "a.jpg", "sub/c.Gif", "x.original.jpg", "notes.md", "d.webp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found: Vec<PathBuf> = find_images(dir.path())
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("b.PNG"),
                PathBuf::from("d.webp"),
                PathBuf::from("sub/c.Gif"),
            ]
        );
    }
}
