// assetprep/src/cli.rs
use crate::core::{
    default_scripts_dir, ConvertConfig, OptimizeConfig, DEFAULT_INTERPRETER, DEFAULT_MAX_HEIGHT,
    DEFAULT_MAX_WIDTH, DEFAULT_PNG_COMPRESSION, DEFAULT_QUALITY,
};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "convert-assets")]
#[command(about = "Batch convert CAD and SPICE sources to web-viewable formats (glTF, SVG)")]
pub struct ConvertCli {
    /// Force reconversion of all files, ignoring timestamps
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be converted without converting
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Path to assets directory
    #[arg(long, default_value = "assets")]
    pub assets_dir: PathBuf,

    /// Program used to run the converter scripts
    #[arg(long, default_value = DEFAULT_INTERPRETER)]
    pub interpreter: PathBuf,

    /// Directory containing spice_to_svg.py and cad_to_gltf.py (default: <assets>/../scripts)
    #[arg(long)]
    pub scripts_dir: Option<PathBuf>,

    /// Per-file converter timeout in seconds (default: 60 for SPICE, 300 for CAD)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Never draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertCli {
    pub fn into_config(self) -> ConvertConfig {
        let assets_dir = resolve(&self.assets_dir);
        let scripts_dir = self
            .scripts_dir
            .map(|dir| resolve(&dir))
            .unwrap_or_else(|| default_scripts_dir(&assets_dir));

        ConvertConfig {
            assets_dir,
            force: self.force,
            dry_run: self.dry_run,
            interpreter: self.interpreter,
            scripts_dir,
            timeout: self.timeout.map(Duration::from_secs),
            show_progress: show_progress(self.no_progress),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "optimize-images")]
#[command(about = "Optimize images in place for web viewing")]
pub struct OptimizeCli {
    /// Force re-optimization of all images
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be optimized without processing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Generate WebP versions alongside originals
    #[arg(long)]
    pub webp: bool,

    /// Maximum image width
    #[arg(long, default_value_t = DEFAULT_MAX_WIDTH)]
    pub max_width: u32,

    /// Maximum image height
    #[arg(long, default_value_t = DEFAULT_MAX_HEIGHT)]
    pub max_height: u32,

    /// JPEG quality 1-100
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// PNG compression level 0-9
    #[arg(long, default_value_t = DEFAULT_PNG_COMPRESSION, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub png_compression: u8,

    /// Path to assets directory
    #[arg(long, default_value = "assets")]
    pub assets_dir: PathBuf,

    /// Never draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl OptimizeCli {
    pub fn into_config(self) -> OptimizeConfig {
        OptimizeConfig {
            assets_dir: resolve(&self.assets_dir),
            force: self.force,
            dry_run: self.dry_run,
            generate_webp: self.webp,
            max_width: self.max_width,
            max_height: self.max_height,
            quality: self.quality,
            png_compression: self.png_compression,
            show_progress: show_progress(self.no_progress),
        }
    }
}

/// Absolute form of `path` when it exists; left as given otherwise so the
/// missing-directory error names what the user typed.
fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn show_progress(disabled: bool) -> bool {
    !disabled && std::io::stdout().is_terminal()
}
