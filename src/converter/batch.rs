// assetprep/src/converter/batch.rs
use super::command::ToolCommand;
use super::{find_source_files, get_converted_path, needs_conversion, SourceKind, SOURCE_EXTENSIONS};
use crate::core::{AssetError, BatchSummary, ConvertConfig, Decision, Result};
use crate::utils::{banner, create_progress_bar, display_relative, report};
use indicatif::ProgressBar;
use std::path::Path;

pub struct ConversionBatch {
    config: ConvertConfig,
}

impl ConversionBatch {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Converts every missing or stale output under the assets directory.
    ///
    /// Only a missing assets directory is fatal. Per-file failures are
    /// reported, counted in the summary and the batch moves on.
    pub fn run(&self) -> Result<BatchSummary> {
        self.config.validate()?;

        let assets_dir = &self.config.assets_dir;

        banner("Asset Converter");
        println!("Assets directory: {}", assets_dir.display());
        println!("Force mode: {}", self.config.force);
        println!("Dry run: {}", self.config.dry_run);
        println!();

        let sources = find_source_files(assets_dir);
        if sources.is_empty() {
            println!("No source files found to convert.");
            println!("Supported formats: {}", SOURCE_EXTENSIONS.join(", "));
            return Ok(BatchSummary::default());
        }

        println!("Found {} source file(s)", sources.len());
        println!();

        let pb = create_progress_bar(sources.len(), self.config.show_progress);
        let mut summary = BatchSummary::default();

        for source in &sources {
            self.process_one(source, &pb, &mut summary);
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.print_summary(&summary);
        Ok(summary)
    }

    fn process_one(&self, source: &Path, pb: &ProgressBar, summary: &mut BatchSummary) {
        let root = self.config.repo_root();
        let converted = get_converted_path(source);
        let rel_source = display_relative(source, root);
        let rel_converted = display_relative(&converted, root);

        let reason = match needs_conversion(source, &converted, self.config.force) {
            Ok(reason) => reason,
            Err(e) => {
                report(pb, format!("[ERROR] {} ({})", rel_source.display(), e));
                summary.failed += 1;
                summary.errors.push((source.to_path_buf(), e.to_string()));
                return;
            }
        };

        summary.decisions.push(Decision {
            path: source.to_path_buf(),
            process: reason.needs_conversion(),
            reason: reason.to_string(),
        });

        if !reason.needs_conversion() {
            report(pb, format!("[SKIP] {} ({})", rel_source.display(), reason));
            summary.skipped += 1;
            return;
        }

        let converted_name = converted
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        report(
            pb,
            format!("[CONVERT] {} -> {} ({})", rel_source.display(), converted_name, reason),
        );
        pb.set_message(converted_name);

        if self.config.dry_run {
            summary.processed += 1;
            return;
        }

        match self.convert(source, &converted) {
            Ok(()) => {
                if !converted.exists() {
                    log::warn!(
                        "Converter exited cleanly but {} was not created",
                        converted.display()
                    );
                }
                report(pb, format!("  OK: Created {}", rel_converted.display()));
                summary.processed += 1;
            }
            Err(e) => {
                let text = failure_text(&e);
                report(pb, format!("  ERROR: {}", text));
                summary.failed += 1;
                summary.errors.push((source.to_path_buf(), text));
            }
        }
    }

    fn convert(&self, source: &Path, output: &Path) -> Result<()> {
        match SourceKind::from_path(source) {
            Some(SourceKind::Schematic) => self.convert_spice(source, output),
            Some(SourceKind::Cad) => self.convert_cad(source, output),
            None => Err(AssetError::UnsupportedFormat(source.display().to_string())),
        }
    }

    /// `<interpreter> spice_to_svg.py <source> <output>`, 60s budget unless
    /// overridden.
    pub fn convert_spice(&self, source: &Path, output: &Path) -> Result<()> {
        self.run_converter(SourceKind::Schematic, source, output)
    }

    /// `<interpreter> cad_to_gltf.py -i <source> -o <output>`, 300s budget
    /// unless overridden.
    pub fn convert_cad(&self, source: &Path, output: &Path) -> Result<()> {
        self.run_converter(SourceKind::Cad, source, output)
    }

    fn run_converter(&self, kind: SourceKind, source: &Path, output: &Path) -> Result<()> {
        let script = self.config.scripts_dir.join(kind.converter_script());

        let result = ToolCommand::new(self.config.interpreter.clone())
            .arg(script.to_string_lossy())
            .args(kind.converter_args(source, output))
            .timeout(self.config.timeout.unwrap_or_else(|| kind.timeout()))
            .execute()?;

        if !result.stdout.trim().is_empty() {
            log::debug!("{}", result.stdout.trim());
        }
        Ok(())
    }

    fn print_summary(&self, summary: &BatchSummary) {
        println!();
        banner("Summary");
        println!("  Converted: {}", summary.processed);
        println!("  Skipped:   {}", summary.skipped);
        println!("  Failed:    {}", summary.failed);

        if self.config.dry_run {
            println!();
            println!("(Dry run - no files were actually converted)");
        }
    }
}

fn failure_text(error: &AssetError) -> String {
    match error {
        AssetError::Tool { message, .. } if message.starts_with("timed out") => {
            "Conversion timed out".to_string()
        }
        AssetError::Tool { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
