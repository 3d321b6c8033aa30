// assetprep/src/converter/mod.rs
//! CAD and schematic conversion: which sources exist, where their web
//! counterparts live, and whether those counterparts are stale.

mod batch;
mod command;

pub use batch::ConversionBatch;
pub use command::{ToolCommand, ToolOutput};

use crate::core::Result;
use crate::utils::{get_file_extension, modified_time};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Every source extension the converter understands, with its dot.
pub const SOURCE_EXTENSIONS: [&str; 4] = [".cir", ".stl", ".step", ".stp"];

/// One row of the extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// SPICE netlist, rendered to `<name>.cir.svg`.
    Schematic,
    /// STL/STEP model, rendered to `<stem>.gltf`.
    Cad,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match get_file_extension(path)?.as_str() {
            "cir" => Some(Self::Schematic),
            "stl" | "step" | "stp" => Some(Self::Cad),
            _ => None,
        }
    }

    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Schematic => "svg",
            Self::Cad => "gltf",
        }
    }

    /// File name of the converter script, looked up in the scripts directory.
    pub fn converter_script(self) -> &'static str {
        match self {
            Self::Schematic => "spice_to_svg.py",
            Self::Cad => "cad_to_gltf.py",
        }
    }

    pub fn timeout(self) -> Duration {
        match self {
            Self::Schematic => Duration::from_secs(60),
            Self::Cad => Duration::from_secs(300),
        }
    }

    /// Converter arguments following the script path.
    pub fn converter_args(self, source: &Path, output: &Path) -> Vec<String> {
        let source = source.to_string_lossy().into_owned();
        let output = output.to_string_lossy().into_owned();
        match self {
            Self::Schematic => vec![source, output],
            Self::Cad => vec!["-i".to_string(), source, "-o".to_string(), output],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionReason {
    Forced,
    ConvertedMissing,
    SourceNewer,
    UpToDate,
}

impl ConversionReason {
    pub fn needs_conversion(self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

impl fmt::Display for ConversionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Forced => "forced",
            Self::ConvertedMissing => "converted file missing",
            Self::SourceNewer => "source file newer",
            Self::UpToDate => "up to date",
        };
        f.write_str(text)
    }
}

/// All convertible files under `dir`, sorted by path.
pub fn find_source_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| SourceKind::from_path(entry.path()).is_some())
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expected output path: `schema.cir` -> `schema.cir.svg`, `part.step` -> `part.gltf`.
///
/// Paths with an unknown extension are returned unchanged.
pub fn get_converted_path(source: &Path) -> PathBuf {
    match SourceKind::from_path(source) {
        Some(SourceKind::Schematic) => {
            let mut name = source.as_os_str().to_os_string();
            name.push(".");
            name.push(SourceKind::Schematic.output_extension());
            PathBuf::from(name)
        }
        Some(kind @ SourceKind::Cad) => source.with_extension(kind.output_extension()),
        None => source.to_path_buf(),
    }
}

/// Timestamp-only staleness check, evaluated in order: force, missing
/// output, strictly newer source.
pub fn needs_conversion(source: &Path, converted: &Path, force: bool) -> Result<ConversionReason> {
    if force {
        return Ok(ConversionReason::Forced);
    }

    if !converted.exists() {
        return Ok(ConversionReason::ConvertedMissing);
    }

    if modified_time(source)? > modified_time(converted)? {
        return Ok(ConversionReason::SourceNewer);
    }

    Ok(ConversionReason::UpToDate)
}
