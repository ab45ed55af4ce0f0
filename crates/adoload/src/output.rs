//! Output formatting helpers for the `adoload` CLI.

use adoload_core::loader::{CreationResult, RunReport};
use serde::Serialize;
use std::io::{self, Write};

/// A view model for one creation result in JSON output.
#[derive(Serialize)]
pub struct ResultView {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultView {
    pub fn from_result(result: &CreationResult) -> Self {
        Self {
            kind: result.kind.as_str().to_owned(),
            title: result.title.clone(),
            status: result.outcome().as_str().to_owned(),
            id: result.created_id,
            parent: result.parent_id,
            error: result.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            if i < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{}", cell);
            }
        }
        let _ = writeln!(handle);
    }
}

/// Render a run report as a table plus per-failure detail and a count line.
pub fn print_report(report: &RunReport) {
    let headers = &["TYPE", "ID", "PARENT", "STATUS", "TITLE"];
    let rows: Vec<Vec<String>> = report
        .results
        .iter()
        .map(|r| {
            vec![
                r.kind.as_str().to_owned(),
                r.created_id.map(|id| id.to_string()).unwrap_or_default(),
                r.parent_id.map(|id| id.to_string()).unwrap_or_default(),
                r.outcome().as_str().to_owned(),
                r.title.clone(),
            ]
        })
        .collect();
    output_table(headers, &rows);

    for result in &report.results {
        if let Some(ref error) = result.error {
            println!("  {} '{}': {}", result.kind, result.title, error);
        }
    }

    println!(
        "\n{} created, {} failed, {} skipped",
        report.created_count(),
        report.failed_count(),
        report.skipped_count()
    );
}

/// Indent helper for node rows in `check` output.
pub fn indent_for(kind: adoload_core::client::WorkItemKind) -> &'static str {
    match kind {
        adoload_core::client::WorkItemKind::Feature => "",
        adoload_core::client::WorkItemKind::UserStory => "  ",
        adoload_core::client::WorkItemKind::Task => "    ",
    }
}
