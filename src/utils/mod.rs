// assetprep/src/utils/mod.rs
use crate::core::Result;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use indicatif::{ProgressBar, ProgressStyle};

pub const RULE_WIDTH: usize = 60;

/// Human-readable size: `512B`, `12.3KB`, `4.56MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2}MB", bytes as f64 / MB as f64)
    }
}

pub fn savings_percent(original_size: u64, new_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let saved = original_size.saturating_sub(new_size);
    saved as f64 / original_size as f64 * 100.0
}

/// Seconds since the epoch, negative for pre-epoch timestamps.
pub fn epoch_seconds(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

pub fn modified_time(path: &Path) -> Result<SystemTime> {
    Ok(std::fs::metadata(path)?.modified()?)
}

/// Fractional epoch seconds of the file's mtime, e.g. `1700000000.25` or
/// `1700000000.0`.
pub fn mtime_string(path: &Path) -> Result<String> {
    let secs = epoch_seconds(modified_time(path)?);
    Ok(format!("{:?}", secs))
}

/// Change signal used by the optimisation cache: `<size>_<mtime>`.
pub fn file_hash(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path)?;
    let secs = epoch_seconds(metadata.modified()?);
    Ok(format!("{}_{:?}", metadata.len(), secs))
}

/// `path` relative to `root` when it lives under it, unchanged otherwise.
pub fn display_relative(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Lower-cased extension, without the dot.
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

pub fn create_progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Prints a report line without tearing an active progress bar.
pub fn report(pb: &ProgressBar, line: impl Display) {
    pb.suspend(|| println!("{}", line));
}

pub fn banner(title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("{}", rule);
    println!("{}", title);
    println!("{}", rule);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sizes_are_formatted_by_magnitude() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.00MB");
    }

    #[test]
    fn savings_never_negative() {
        assert_eq!(savings_percent(100, 150), 0.0);
        assert_eq!(savings_percent(0, 0), 0.0);
        assert!((savings_percent(200, 50) - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn epoch_seconds_keep_fraction() {
        let t = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(epoch_seconds(t), 1.5);
        assert_eq!(format!("{:?}", epoch_seconds(UNIX_EPOCH + Duration::from_secs(7))), "7.0");
    }

    #[test]
    fn relative_display_falls_back_to_full_path() {
        let root = Path::new("/repo");
        assert_eq!(
            display_relative(Path::new("/repo/assets/a.png"), root),
            PathBuf::from("assets/a.png")
        );
        assert_eq!(
            display_relative(Path::new("/elsewhere/a.png"), root),
            PathBuf::from("/elsewhere/a.png")
        );
    }

    #[test]
    fn file_hash_tracks_size_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"abcd").unwrap();

        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(1_000)).unwrap();
        drop(file);

        assert_eq!(file_hash(&path).unwrap(), "4_1000.0");
        assert_eq!(mtime_string(&path).unwrap(), "1000.0");
    }
}
