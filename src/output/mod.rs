//! Output generation: per-bundle documents, the HTML report and the console summary

pub mod console;
pub mod report;
pub mod validate;
pub mod writer;

pub use console::{format_compact_table, format_summary};
pub use report::{extract_summary, BundleSummary, ReportBuilder, Summary, REPORT_FILE};
pub use validate::validate_html;
pub use writer::{read_document, BundleDocument, FileEntry, StatsWriter};
