// assetprep/src/core/mod.rs
pub mod processor;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: u8 = 85;
/// zlib level, 0-9
pub const DEFAULT_PNG_COMPRESSION: u8 = 6;
pub const DEFAULT_INTERPRETER: &str = "python3";

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub assets_dir: PathBuf,
    pub force: bool,
    pub dry_run: bool,
    /// Program used to launch the converter scripts.
    pub interpreter: PathBuf,
    /// Directory holding `spice_to_svg.py` and `cad_to_gltf.py`.
    pub scripts_dir: PathBuf,
    /// Replaces the per-format converter budget when set.
    pub timeout: Option<Duration>,
    pub show_progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        let assets_dir = PathBuf::from("assets");
        Self {
            scripts_dir: default_scripts_dir(&assets_dir),
            assets_dir,
            force: false,
            dry_run: false,
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            timeout: None,
            show_progress: true,
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_assets_dir(&self.assets_dir)?;

        if self.interpreter.as_os_str().is_empty() {
            return Err(AssetError::InvalidParameter(
                "Interpreter must not be empty".to_string(),
            ));
        }

        if self.timeout == Some(Duration::ZERO) {
            return Err(AssetError::InvalidParameter(
                "Converter timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Parent of the assets directory; report paths are shown relative to it.
    pub fn repo_root(&self) -> &Path {
        repo_root_of(&self.assets_dir)
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeConfig {
    pub assets_dir: PathBuf,
    pub force: bool,
    pub dry_run: bool,
    pub generate_webp: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
    pub png_compression: u8,
    pub show_progress: bool,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            force: false,
            dry_run: false,
            generate_webp: false,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            png_compression: DEFAULT_PNG_COMPRESSION,
            show_progress: true,
        }
    }
}

impl OptimizeConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_assets_dir(&self.assets_dir)?;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(AssetError::InvalidParameter(
                "Maximum dimensions must be greater than zero".to_string(),
            ));
        }

        if self.max_width > 100_000 || self.max_height > 100_000 {
            return Err(AssetError::InvalidParameter(
                "Dimensions too large (max 100,000 pixels)".to_string(),
            ));
        }

        if self.quality == 0 || self.quality > 100 {
            return Err(AssetError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        if self.png_compression > 9 {
            return Err(AssetError::InvalidParameter(
                "PNG compression level must be between 0 and 9".to_string(),
            ));
        }

        Ok(())
    }

    pub fn repo_root(&self) -> &Path {
        repo_root_of(&self.assets_dir)
    }
}

pub fn default_scripts_dir(assets_dir: &Path) -> PathBuf {
    repo_root_of(assets_dir).join("scripts")
}

fn repo_root_of(assets_dir: &Path) -> &Path {
    match assets_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn ensure_assets_dir(assets_dir: &Path) -> Result<()> {
    if !assets_dir.is_dir() {
        return Err(AssetError::AssetsDirNotFound(assets_dir.to_path_buf()));
    }
    Ok(())
}

/// Outcome of one optimisation; only used for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageStats {
    pub original_size: u64,
    pub new_size: u64,
    pub webp_size: u64,
    pub resized: bool,
    pub original_dimensions: (u32, u32),
    pub new_dimensions: (u32, u32),
}

impl ImageStats {
    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.new_size)
    }
}

/// Skip/process classification of one file, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub path: PathBuf,
    pub process: bool,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files converted or optimised (simulated ones count under dry-run).
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_saved: u64,
    pub decisions: Vec<Decision>,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn exit_code(&self) -> u8 {
        if self.failed > 0 {
            1
        } else {
            0
        }
    }
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("EXIF error: {0}")]
    Exif(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Assets directory not found: {}", .0.display())]
    AssetsDirNotFound(PathBuf),

    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimize_config_rejects_bad_quality() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OptimizeConfig {
            assets_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.quality = 0;
        assert!(config.validate().is_err());

        config.quality = 101;
        assert!(config.validate().is_err());

        config.quality = 85;
        config.max_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_assets_dir_is_an_environment_error() {
        let config = ConvertConfig {
            assets_dir: PathBuf::from("/definitely/not/here/assets"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AssetError::AssetsDirNotFound(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig {
            assets_dir: dir.path().to_path_buf(),
            timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AssetError::InvalidParameter(_))
        ));
    }

    #[test]
    fn scripts_dir_sits_next_to_assets() {
        assert_eq!(
            default_scripts_dir(Path::new("/repo/assets")),
            PathBuf::from("/repo/scripts")
        );
        assert_eq!(default_scripts_dir(Path::new("assets")), PathBuf::from("./scripts"));
    }

    #[test]
    fn exit_code_reflects_failures() {
        let mut summary = BatchSummary::default();
        assert_eq!(summary.exit_code(), 0);
        summary.failed = 2;
        assert_eq!(summary.exit_code(), 1);
    }
}
