//! Summary report generation
//!
//! Renders `index.html` from the finalized snapshots of a build run. The page
//! embeds the summary as `var SUMMARY = {...};` for scripts and also renders
//! the same data as a plain table.

use super::validate::validate_html;
use crate::stats::{format_bytes, CollectorSnapshot, StatsError, StatsResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

const TEMPLATE: &str = include_str!("assets/index.html");

/// File name of the generated report
pub const REPORT_FILE: &str = "index.html";

/// Default report heading
pub const DEFAULT_TITLE: &str = "Concat Stats";

/// Summary of one bundle as embedded in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    pub total: u64,
    pub file_count: usize,
    /// Per-bundle document, relative to the report
    pub output_path: String,
}

/// Cross-bundle summary keyed by bundle id, in lexical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary {
    bundles: BTreeMap<String, BundleSummary>,
}

impl Summary {
    pub fn from_snapshots(snapshots: &[CollectorSnapshot]) -> Self {
        let bundles = snapshots
            .iter()
            .map(|snapshot| {
                (
                    snapshot.bundle_id().to_string(),
                    BundleSummary {
                        total: snapshot.total_bytes(),
                        file_count: snapshot.file_count(),
                        output_path: snapshot.bundle_id().document_name(),
                    },
                )
            })
            .collect();
        Self { bundles }
    }

    pub fn bundles(&self) -> &BTreeMap<String, BundleSummary> {
        &self.bundles
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.bundles.values().fold(0u64, |total, b| total.saturating_add(b.total))
    }

    /// JSON safe to embed inside a `<script>` element
    pub fn to_script_json(&self) -> StatsResult<String> {
        let json = serde_json::to_string_pretty(&self.bundles)?;
        Ok(json
            .replace('<', "\\u003c")
            .replace('>', "\\u003e")
            .replace('&', "\\u0026")
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029"))
    }
}

/// Parse the `SUMMARY` object back out of a rendered report
pub fn extract_summary(html: &str) -> StatsResult<Summary> {
    const MARKER: &str = "var SUMMARY = ";

    let start = html
        .find(MARKER)
        .ok_or_else(|| StatsError::validation(1, "report does not define SUMMARY"))?;
    let rest = &html[start + MARKER.len()..];

    serde_json::Deserializer::from_str(rest)
        .into_iter::<Summary>()
        .next()
        .ok_or_else(|| StatsError::validation(1, "SUMMARY has no value"))?
        .map_err(StatsError::from)
}

/// Percent-encode the characters that would break a relative link
fn encode_href(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            ' ' => encoded.push_str("%20"),
            '#' => encoded.push_str("%23"),
            '"' => encoded.push_str("%22"),
            '\'' => encoded.push_str("%27"),
            _ => encoded.push(c),
        }
    }
    encoded
}

/// Template engine holding the compiled-in report page
fn engine() -> StatsResult<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template(REPORT_FILE, TEMPLATE)?;
    tera.register_filter("href", |value: &tera::Value, _: &HashMap<String, tera::Value>| match value.as_str() {
        Some(path) => Ok(tera::Value::String(encode_href(path))),
        None => Err(tera::Error::msg(format!("href filter expects a string, got {}", value))),
    });
    Ok(tera)
}

/// Builds the HTML summary report
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    output_dir: PathBuf,
    title: String,
}

impl ReportBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = title;
        }
        self
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    /// Render and write the report for a complete build
    pub fn build(&self, snapshots: &[CollectorSnapshot]) -> StatsResult<PathBuf> {
        self.build_with_incomplete(snapshots, &[])
    }

    /// Render and write the report, listing bundles that failed to finalize
    pub fn build_with_incomplete(&self, snapshots: &[CollectorSnapshot], incomplete: &[String]) -> StatsResult<PathBuf> {
        let summary = Summary::from_snapshots(snapshots);
        let html = self.render(&summary, incomplete)?;
        validate_html(&html)?;

        fs::create_dir_all(&self.output_dir).map_err(|e| StatsError::io(&self.output_dir, e))?;
        let path = self.report_path();
        fs::write(&path, &html).map_err(|e| StatsError::io(&path, e))?;

        info!("Wrote report for {} bundle(s) to {}", summary.len(), path.display());
        Ok(path)
    }

    /// Render the report document without writing it
    pub fn render(&self, summary: &Summary, incomplete: &[String]) -> StatsResult<String> {
        let total = summary.total_bytes();

        let mut context = Context::new();
        context.insert("title", &self.title);
        context.insert("bundle_count", &summary.len());
        context.insert("total_label", &format!("{} ({} bytes)", format_bytes(total), total));
        context.insert("incomplete", incomplete);
        context.insert("bundles", summary.bundles());
        context.insert("summary_json", &summary.to_script_json()?);

        let html = engine()?.render(REPORT_FILE, &context)?;
        debug!("Rendered report with {} bundle(s)", summary.len());
        Ok(html)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{NotificationSink, Registry};
    use crate::stats::RecordKind;
    use tempfile::TempDir;

    fn sample_snapshots() -> Vec<CollectorSnapshot> {
        let registry = Registry::new();
        registry.notify("1-test-app.js", "app/app.js", 500, RecordKind::Add).unwrap();
        registry.notify("3-vendor.css", "vendor/a.css", 200, RecordKind::Add).unwrap();
        registry.notify("3-vendor.css", "vendor/b.css", 300, RecordKind::Add).unwrap();
        registry.track_bundle("8-test-support.css").unwrap();
        registry.finalize_all().snapshots
    }

    #[test]
    fn test_summary_from_snapshots() {
        let summary = Summary::from_snapshots(&sample_snapshots());
        let keys: Vec<&String> = summary.bundles().keys().collect();
        assert_eq!(keys, vec!["1-test-app.js", "3-vendor.css", "8-test-support.css"]);

        let vendor = &summary.bundles()["3-vendor.css"];
        assert_eq!(vendor.total, 500);
        assert_eq!(vendor.file_count, 2);
        assert_eq!(vendor.output_path, "3-vendor.css.out.json");
        assert_eq!(summary.total_bytes(), 1000);
    }

    #[test]
    fn test_summary_total_saturates() {
        let huge = |name: &str| {
            (
                name.to_string(),
                BundleSummary {
                    total: u64::MAX,
                    file_count: 1,
                    output_path: format!("{}.out.json", name),
                },
            )
        };
        let summary = Summary {
            bundles: [huge("a.js"), huge("b.js")].into_iter().collect(),
        };
        assert_eq!(summary.total_bytes(), u64::MAX);
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = Summary::from_snapshots(&sample_snapshots());
        let value: serde_json::Value = serde_json::from_str(&summary.to_script_json().unwrap()).unwrap();
        assert_eq!(value["1-test-app.js"]["total"], 500);
        assert_eq!(value["1-test-app.js"]["fileCount"], 1);
        assert_eq!(value["8-test-support.css"]["total"], 0);
    }

    #[test]
    fn test_script_json_is_escaped() {
        let mut bundles = BTreeMap::new();
        bundles.insert(
            "</script>&.js".to_string(),
            BundleSummary {
                total: 1,
                file_count: 1,
                output_path: "x.out.json".to_string(),
            },
        );
        let summary = Summary { bundles };

        let json = summary.to_script_json().unwrap();
        assert!(!json.contains('<'));
        assert!(json.contains("\\u003c/script\\u003e\\u0026.js"));

        let parsed: BTreeMap<String, BundleSummary> = serde_json::from_str(&json).unwrap();
        assert!(parsed.contains_key("</script>&.js"));
    }

    #[test]
    fn test_render_is_valid_and_round_trips() {
        let builder = ReportBuilder::new("unused");
        let summary = Summary::from_snapshots(&sample_snapshots());
        let html = builder.render(&summary, &[]).unwrap();

        validate_html(&html).unwrap();
        assert!(html.contains("var SUMMARY = {"));
        assert!(html.contains("<td>3-vendor.css</td>"));
        assert!(!html.contains("{{") && !html.contains("{%"));
        assert_eq!(extract_summary(&html).unwrap(), summary);
    }

    #[test]
    fn test_empty_report() {
        let temp_dir = TempDir::new().unwrap();
        let builder = ReportBuilder::new(temp_dir.path());
        let path = builder.build(&[]).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("var SUMMARY = {};"));
        assert!(html.contains("No bundles were tracked."));
        validate_html(&html).unwrap();
        assert!(extract_summary(&html).unwrap().is_empty());
    }

    #[test]
    fn test_incomplete_notice() {
        let builder = ReportBuilder::new("unused");
        let summary = Summary::from_snapshots(&sample_snapshots());
        let html = builder.render(&summary, &["9-broken.js".to_string()]).unwrap();

        validate_html(&html).unwrap();
        assert!(html.contains("1 bundle(s) could not be finalized"));
        assert!(html.contains("9-broken.js"));
    }

    #[test]
    fn test_title_is_escaped() {
        let builder = ReportBuilder::new("unused").with_title("Stats <dev> & \"prod\"");
        let html = builder.render(&Summary::default(), &[]).unwrap();
        assert!(html.contains("<title>Stats &lt;dev&gt; &amp; &quot;prod&quot;</title>"));
        validate_html(&html).unwrap();
    }

    #[test]
    fn test_blank_title_keeps_default() {
        let builder = ReportBuilder::new("unused").with_title("   ");
        let html = builder.render(&Summary::default(), &[]).unwrap();
        assert!(html.contains("<title>Concat Stats</title>"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let builder = ReportBuilder::new(temp_dir.path());

        let path = builder.build(&sample_snapshots()).unwrap();
        let first = fs::read(&path).unwrap();
        builder.build(&sample_snapshots()).unwrap();
        assert_eq!(first, fs::read(&path).unwrap());
    }

    #[test]
    fn test_bundle_ids_are_escaped_in_rows_and_notice() {
        let mut bundles = BTreeMap::new();
        bundles.insert(
            "a&b.js".to_string(),
            BundleSummary {
                total: 7,
                file_count: 1,
                output_path: "a&b.js.out.json".to_string(),
            },
        );
        let summary = Summary { bundles };

        let html = ReportBuilder::new("unused")
            .render(&summary, &["<x>.js".to_string()])
            .unwrap();
        assert!(html.contains("<td>a&amp;b.js</td>"));
        assert!(html.contains("href=\"a&amp;b.js.out.json\""));
        assert!(html.contains("not included: &lt;x&gt;.js</p>"));
        validate_html(&html).unwrap();
    }

    #[test]
    fn test_template_compiles() {
        let tera = engine().unwrap();
        assert!(tera.get_template_names().any(|name| name == REPORT_FILE));
    }

    #[test]
    fn test_href_encoding() {
        assert_eq!(encode_href("my bundle#1.js.out.json"), "my%20bundle%231.js.out.json");
        assert_eq!(encode_href("100%.js"), "100%25.js");
    }
}
