//! End-to-End Integration Tests
//!
//! Runs the `concat-stats` binary against a stats directory holding the
//! documents of a small application build (an app bundle, a vendor
//! stylesheet and an empty test-support stylesheet) and checks the
//! per-bundle documents and the summary report it leaves behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use concat_stats::output::{extract_summary, read_document, validate_html, FileEntry};

const APP_JS: &str = r#"{
  "outputFile": "assets/test-app.js",
  "sizes": { "app/app.js": 500 }
}"#;

const VENDOR_CSS: &str = r#"{
  "outputFile": "assets/vendor.css",
  "sizes": { "vendor/theme.css": 300, "vendor/normalize.css": 200 }
}"#;

const TEST_SUPPORT_CSS: &str = r#"{
  "outputFile": "assets/test-support.css",
  "sizes": {}
}"#;

/// Stats directory seeded with the three build documents, plus an empty config file
fn create_build_stats() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let stats_dir = temp_dir.path().join("concat-stats-for");
    fs::create_dir(&stats_dir).expect("Failed to create stats dir");

    fs::write(stats_dir.join("1-test-app.js.json"), APP_JS).unwrap();
    fs::write(stats_dir.join("3-vendor.css.json"), VENDOR_CSS).unwrap();
    fs::write(stats_dir.join("8-test-support.css.json"), TEST_SUPPORT_CSS).unwrap();

    let config_file = temp_dir.path().join("config.toml");
    fs::write(&config_file, "").unwrap();

    (temp_dir, stats_dir, config_file)
}

fn run_concat_stats(stats_dir: &Path, config_file: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_concat-stats"))
        .arg("--config-file")
        .arg(config_file)
        .args(extra)
        .arg(stats_dir)
        .output()
        .expect("Failed to run concat-stats")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is not UTF-8")
}

#[test]
fn test_build_produces_documents_and_report() {
    let (_temp_dir, stats_dir, config_file) = create_build_stats();

    let output = run_concat_stats(&stats_dir, &config_file, &[]);
    assert!(
        output.status.success(),
        "concat-stats failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let real_dir = stats_dir.canonicalize().unwrap();
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains(&format!("visit file://{}/index.html", real_dir.display())),
        "unexpected stdout: {}",
        stdout
    );

    for bundle in ["1-test-app.js", "3-vendor.css", "8-test-support.css"] {
        assert!(stats_dir.join(format!("{}.out.json", bundle)).is_file(), "missing document for {}", bundle);
    }

    let app = read_document(&stats_dir.join("1-test-app.js.out.json")).unwrap();
    assert_eq!(app.output, "1-test-app.js");
    assert_eq!(app.total, 500);

    let vendor = read_document(&stats_dir.join("3-vendor.css.out.json")).unwrap();
    assert_eq!(vendor.total, 500);
    assert_eq!(
        vendor.files,
        vec![
            FileEntry { path: "vendor/theme.css".to_string(), bytes: 300 },
            FileEntry { path: "vendor/normalize.css".to_string(), bytes: 200 },
        ]
    );

    let support = read_document(&stats_dir.join("8-test-support.css.out.json")).unwrap();
    assert_eq!(support.total, 0);
    assert!(support.files.is_empty());
}

#[test]
fn test_report_embeds_summary_and_validates() {
    let (_temp_dir, stats_dir, config_file) = create_build_stats();
    let output = run_concat_stats(&stats_dir, &config_file, &[]);
    assert!(output.status.success());

    let html = fs::read_to_string(stats_dir.join("index.html")).unwrap();
    assert!(html.contains("var SUMMARY = {"));
    validate_html(&html).expect("report is not valid HTML");

    let summary = extract_summary(&html).unwrap();
    let ids: Vec<&str> = summary.bundles().keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["1-test-app.js", "3-vendor.css", "8-test-support.css"]);
    assert_eq!(summary.bundles()["3-vendor.css"].total, 500);
    assert_eq!(summary.bundles()["3-vendor.css"].file_count, 2);
    assert_eq!(summary.bundles()["8-test-support.css"].total, 0);
    assert_eq!(summary.total_bytes(), 1000);
}

#[test]
fn test_rerun_is_byte_identical() {
    let (_temp_dir, stats_dir, config_file) = create_build_stats();

    assert!(run_concat_stats(&stats_dir, &config_file, &[]).status.success());
    let first_report = fs::read(stats_dir.join("index.html")).unwrap();
    let first_vendor = fs::read(stats_dir.join("3-vendor.css.out.json")).unwrap();

    assert!(run_concat_stats(&stats_dir, &config_file, &[]).status.success());
    assert_eq!(fs::read(stats_dir.join("index.html")).unwrap(), first_report);
    assert_eq!(fs::read(stats_dir.join("3-vendor.css.out.json")).unwrap(), first_vendor);
}

#[test]
fn test_empty_stats_directory() {
    let temp_dir = TempDir::new().unwrap();
    let stats_dir = temp_dir.path().join("empty");
    let config_file = temp_dir.path().join("config.toml");
    fs::write(&config_file, "").unwrap();

    let output = run_concat_stats(&stats_dir, &config_file, &[]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("visit file://"));

    let html = fs::read_to_string(stats_dir.join("index.html")).unwrap();
    validate_html(&html).unwrap();
    assert!(extract_summary(&html).unwrap().is_empty());
    assert!(html.contains("No bundles were tracked."));
}

#[test]
fn test_summary_flag_and_title() {
    let (_temp_dir, stats_dir, config_file) = create_build_stats();

    let output = run_concat_stats(&stats_dir, &config_file, &["--summary", "--title", "Release Build"]);
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    assert!(stdout.contains("3-vendor.css"));
    assert!(stdout.contains("3 bundle(s)"));

    let html = fs::read_to_string(stats_dir.join("index.html")).unwrap();
    assert!(html.contains("<title>Release Build</title>"));
}

#[test]
fn test_report_settings_from_config_file() {
    let (temp_dir, stats_dir, _) = create_build_stats();
    let config_file = temp_dir.path().join("report.toml");
    fs::write(&config_file, "[report]\ntitle = \"Configured Title\"\nsummary = true\n").unwrap();

    let output = run_concat_stats(&stats_dir, &config_file, &[]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("3 bundle(s)"));

    let html = fs::read_to_string(stats_dir.join("index.html")).unwrap();
    assert!(html.contains("<title>Configured Title</title>"));
}

#[test]
fn test_log_file_only_keeps_stderr_clean() {
    let (temp_dir, stats_dir, config_file) = create_build_stats();
    let log_file = temp_dir.path().join("run.log");

    let output = run_concat_stats(
        &stats_dir,
        &config_file,
        &["--log-file", log_file.to_str().unwrap(), "--log-file-only"],
    );
    assert!(
        output.status.success(),
        "concat-stats failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stderr.is_empty(), "unexpected stderr: {}", String::from_utf8_lossy(&output.stderr));

    let log = fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("[INFO] Wrote report for 3 bundle(s)"), "unexpected log: {}", log);
}
