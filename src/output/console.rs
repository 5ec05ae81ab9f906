//! Console summary of a build run

use super::report::Summary;
use crate::stats::format_bytes;
use prettytable::{format, Cell, Row, Table};

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    table.add_row(Row::new(headers.iter().map(|header| Cell::new(header)).collect()));
    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    // 2-space indent
    table
        .to_string()
        .lines()
        .map(|line| format!("  {}\n", line))
        .collect()
}

/// Per-bundle table followed by a totals line
pub fn format_summary(summary: &Summary) -> String {
    if summary.is_empty() {
        return "  No bundles were tracked.\n".to_string();
    }

    let rows: Vec<Vec<String>> = summary
        .bundles()
        .iter()
        .map(|(bundle, stats)| {
            vec![
                bundle.clone(),
                stats.file_count.to_string(),
                stats.total.to_string(),
                format_bytes(stats.total),
            ]
        })
        .collect();

    let mut output = format_compact_table(&["Bundle", "Files", "Bytes", "Size"], &rows);
    output.push_str(&format!(
        "\n  {} bundle(s), {} total\n",
        summary.len(),
        format_bytes(summary.total_bytes())
    ));
    output
}
