//! Error Recovery Integration Tests
//!
//! Malformed inputs are skipped, unusable directories and unwritable outputs
//! fail the run, and bundles that cannot be finalized are reported without
//! losing the rest of the build.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use concat_stats::output::{extract_summary, validate_html, ReportBuilder, StatsWriter};
use concat_stats::registry::{NotificationSink, Registry};
use concat_stats::stats::{RecordKind, StatsError};

fn run_concat_stats(temp_dir: &TempDir, target: &Path) -> Output {
    let config_file = temp_dir.path().join("config.toml");
    fs::write(&config_file, "").unwrap();

    Command::new(env!("CARGO_BIN_EXE_concat-stats"))
        .arg("--config-file")
        .arg(&config_file)
        .arg(target)
        .output()
        .expect("Failed to run concat-stats")
}

#[test]
fn test_malformed_inputs_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let stats_dir = temp_dir.path().join("stats");
    fs::create_dir(&stats_dir).unwrap();
    fs::write(stats_dir.join("app.js.json"), r#"{"sizes": {"app/main.js": 42}}"#).unwrap();
    fs::write(stats_dir.join("broken.js.json"), "{ \"sizes\": ").unwrap();
    fs::write(stats_dir.join("bad*name.js.json"), r#"{"sizes": {"x.js": 1}}"#).unwrap();

    let output = run_concat_stats(&temp_dir, &stats_dir);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Skipping input"), "stderr: {}", stderr);

    assert!(stats_dir.join("app.js.out.json").exists());
    assert!(!stats_dir.join("broken.js.out.json").exists());

    let html = fs::read_to_string(stats_dir.join("index.html")).unwrap();
    let summary = extract_summary(&html).unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary.bundles()["app.js"].total, 42);
}

#[test]
fn test_target_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("not-a-dir");
    fs::write(&file, "").unwrap();

    let output = run_concat_stats(&temp_dir, &file);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a directory"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("visit file://"));
}

#[test]
fn test_unwritable_document_fails_run() {
    let temp_dir = TempDir::new().unwrap();
    let stats_dir = temp_dir.path().join("stats");
    fs::create_dir(&stats_dir).unwrap();
    fs::write(stats_dir.join("app.js.json"), r#"{"sizes": {"a.js": 1}}"#).unwrap();
    // A directory where the document should go cannot be overwritten
    fs::create_dir(stats_dir.join("app.js.out.json")).unwrap();

    let output = run_concat_stats(&temp_dir, &stats_dir);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to write bundle statistics"));
    assert!(!stats_dir.join("index.html").exists());
}

#[test]
fn test_missing_config_file_fails_run() {
    let temp_dir = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_concat-stats"))
        .arg("--config-file")
        .arg(temp_dir.path().join("absent.toml"))
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_record_after_finalize_is_rejected() {
    let registry = Registry::new();
    registry.notify("app.js", "a.js", 10, RecordKind::Add).unwrap();
    let outcome = registry.finalize_all();
    assert!(outcome.is_complete());

    let err = registry.notify("app.js", "b.js", 5, RecordKind::Add).unwrap_err();
    assert!(matches!(err, StatsError::AlreadyFinalized { .. }));
    assert_eq!(outcome.snapshots[0].total_bytes(), 10);
}

#[test]
fn test_partial_finalization_keeps_other_bundles() {
    let temp_dir = TempDir::new().unwrap();
    let registry = Registry::new();
    registry.notify("a.js", "a/one.js", 100, RecordKind::Add).unwrap();
    registry.notify("b.css", "b/one.css", 50, RecordKind::Add).unwrap();
    registry.notify("c.js", "c/one.js", 25, RecordKind::Add).unwrap();

    // Finalized early by its own pipeline
    registry.track("b.css").unwrap().finalize().unwrap();

    let outcome = registry.finalize_all();
    assert_eq!(outcome.failed_bundles(), vec!["b.css".to_string()]);
    assert!(matches!(
        outcome.partial_error(),
        Some(StatsError::PartialFinalization { ref failed }) if failed == &vec!["b.css".to_string()]
    ));

    StatsWriter::new(temp_dir.path()).write_all(&outcome.snapshots).unwrap();
    let report = ReportBuilder::new(temp_dir.path())
        .build_with_incomplete(&outcome.snapshots, &outcome.failed_bundles())
        .unwrap();

    let html = fs::read_to_string(report).unwrap();
    validate_html(&html).unwrap();
    assert!(html.contains("Incomplete build"));

    let summary = extract_summary(&html).unwrap();
    let ids: Vec<&str> = summary.bundles().keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["a.js", "c.js"]);
    assert!(temp_dir.path().join("a.js.out.json").exists());
    assert!(!temp_dir.path().join("b.css.out.json").exists());
}
