#[cfg(all(test, unix))]
mod tests {
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use assetprep::{AssetError, ConversionBatch, ConvertConfig};
    use std::fs::File;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    const SPICE_STUB: &str = "cp \"$1\" \"$2\"\n";
    const CAD_STUB: &str = "[ \"$1\" = -i ] && [ \"$3\" = -o ] && cp \"$2\" \"$4\"\n";

    /// `<tmp>/assets` plus a `<tmp>/scripts` holding shell stand-ins for the
    /// converter scripts, run through `sh`.
    fn repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        temp.child("assets").create_dir_all().unwrap();
        temp.child("scripts/spice_to_svg.py").write_str(SPICE_STUB).unwrap();
        temp.child("scripts/cad_to_gltf.py").write_str(CAD_STUB).unwrap();
        temp
    }

    fn config(temp: &TempDir) -> ConvertConfig {
        ConvertConfig {
            assets_dir: temp.path().join("assets"),
            scripts_dir: temp.path().join("scripts"),
            interpreter: "sh".into(),
            show_progress: false,
            ..Default::default()
        }
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn converts_missing_and_skips_up_to_date() {
        let temp = repo();
        let assets = temp.child("assets");
        assets.child("a.cir").write_str("* netlist\nR1 1 0 1k\n").unwrap();
        assets.child("models/b.stl").write_str("solid b\nendsolid b\n").unwrap();
        assets.child("models/b.gltf").write_str("{}").unwrap();

        let now = SystemTime::now();
        set_mtime(assets.child("models/b.stl").path(), now - Duration::from_secs(3600));
        set_mtime(assets.child("models/b.gltf").path(), now);

        let summary = ConversionBatch::new(config(&temp)).run().unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.exit_code(), 0);
        assert!(assets.child("a.cir.svg").path().exists());
        assert_eq!(std::fs::read_to_string(assets.child("models/b.gltf").path()).unwrap(), "{}");
    }

    #[test]
    fn second_run_is_a_no_op() {
        let temp = repo();
        let assets = temp.child("assets");
        assets.child("x.cir").write_str("* x\n").unwrap();
        assets.child("y.step").write_str("ISO-10303-21;\n").unwrap();

        let batch = ConversionBatch::new(config(&temp));
        let first = batch.run().unwrap();
        assert_eq!(first.processed, 2);
        assert!(assets.child("y.gltf").path().exists());

        let second = batch.run().unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 2);
        assert!(second.decisions.iter().all(|d| d.reason == "up to date"));
    }

    #[test]
    fn stale_output_is_regenerated() {
        let temp = repo();
        let assets = temp.child("assets");
        assets.child("part.stp").write_str("new geometry").unwrap();
        assets.child("part.gltf").write_str("old").unwrap();

        let now = SystemTime::now();
        set_mtime(assets.child("part.gltf").path(), now - Duration::from_secs(600));
        set_mtime(assets.child("part.stp").path(), now);

        let summary = ConversionBatch::new(config(&temp)).run().unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.decisions[0].reason, "source file newer");
        assert_eq!(
            std::fs::read_to_string(assets.child("part.gltf").path()).unwrap(),
            "new geometry"
        );
    }

    #[test]
    fn dry_run_classifies_like_a_real_run_without_writing() {
        let temp = repo();
        let assets = temp.child("assets");
        assets.child("a.cir").write_str("* a\n").unwrap();
        assets.child("b.stl").write_str("solid\n").unwrap();
        assets.child("c.stl").write_str("solid\n").unwrap();
        assets.child("c.gltf").write_str("{}").unwrap();
        set_mtime(assets.child("c.stl").path(), SystemTime::now() - Duration::from_secs(60));

        let dry = ConversionBatch::new(ConvertConfig {
            dry_run: true,
            ..config(&temp)
        })
        .run()
        .unwrap();

        assert!(!assets.child("a.cir.svg").path().exists());
        assert!(!assets.child("b.gltf").path().exists());
        assert_eq!(dry.processed, 2);
        assert_eq!(dry.skipped, 1);

        let real = ConversionBatch::new(config(&temp)).run().unwrap();
        assert_eq!(dry.decisions, real.decisions);
    }

    #[test]
    fn failing_converter_does_not_stop_the_batch() {
        let temp = repo();
        temp.child("scripts/spice_to_svg.py")
            .write_str("echo 'unknown element Q9' >&2\nexit 2\n")
            .unwrap();
        let assets = temp.child("assets");
        assets.child("bad.cir").write_str("Q9\n").unwrap();
        assets.child("good.stl").write_str("solid\n").unwrap();

        let summary = ConversionBatch::new(config(&temp)).run().unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.exit_code(), 1);
        assert!(summary.errors[0].1.contains("unknown element Q9"));
        assert!(assets.child("good.gltf").path().exists());
    }

    #[test]
    fn hung_converter_times_out_and_batch_continues() {
        let temp = repo();
        temp.child("scripts/spice_to_svg.py").write_str("sleep 10\n").unwrap();
        let assets = temp.child("assets");
        assets.child("slow.cir").write_str("* slow\n").unwrap();
        assets.child("part.stl").write_str("solid\n").unwrap();

        let summary = ConversionBatch::new(ConvertConfig {
            timeout: Some(Duration::from_millis(300)),
            ..config(&temp)
        })
        .run()
        .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.errors[0].1, "Conversion timed out");
        assert!(!assets.child("slow.cir.svg").path().exists());
        assert!(assets.child("part.gltf").path().exists());
    }

    #[test]
    fn missing_interpreter_counts_as_failure() {
        let temp = repo();
        temp.child("assets/a.cir").write_str("* a\n").unwrap();

        let summary = ConversionBatch::new(ConvertConfig {
            interpreter: "no-such-interpreter-xyz".into(),
            ..config(&temp)
        })
        .run()
        .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn force_reconverts_everything() {
        let temp = repo();
        let assets = temp.child("assets");
        assets.child("a.cir").write_str("* a\n").unwrap();

        let batch = ConversionBatch::new(config(&temp));
        batch.run().unwrap();

        let forced = ConversionBatch::new(ConvertConfig {
            force: true,
            ..config(&temp)
        })
        .run()
        .unwrap();
        assert_eq!(forced.processed, 1);
        assert_eq!(forced.decisions[0].reason, "forced");
    }

    #[test]
    fn empty_assets_dir_succeeds() {
        let temp = repo();
        temp.child("assets/readme.txt").write_str("nothing here").unwrap();

        let summary = ConversionBatch::new(config(&temp)).run().unwrap();
        assert_eq!(summary.processed + summary.skipped + summary.failed, 0);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn missing_assets_dir_is_fatal() {
        let temp = TempDir::new().unwrap();
        let result = ConversionBatch::new(config(&temp)).run();
        assert!(matches!(result, Err(AssetError::AssetsDirNotFound(_))));
    }
}
