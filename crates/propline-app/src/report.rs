// Rendering of ranked comparison results.

use chrono::{DateTime, Utc};
use propline_core::compare::UNAVAILABLE;
use propline_core::ComparisonResult;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

const RULE_WIDTH: usize = 30;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write report to {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Render results in the requested format. `generated` adds a timestamp
/// line to the text report only.
pub fn render(
    results: &[ComparisonResult],
    format: ReportFormat,
    generated: Option<DateTime<Utc>>,
) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(render_text(results, generated)),
        ReportFormat::Json => render_json(results),
        ReportFormat::Csv => render_csv(results),
    }
}

/// Write a rendered report to `path`, or to stdout when no path is given.
pub fn write(rendered: &str, path: Option<&Path>) -> Result<(), ReportError> {
    match path {
        Some(path) => std::fs::write(path, rendered).map_err(|e| ReportError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

fn number_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{v:?}"))
}

fn render_text(results: &[ComparisonResult], generated: Option<DateTime<Utc>>) -> String {
    let mut out = String::new();
    if let Some(ts) = generated {
        let _ = writeln!(out, "Generated: {}", ts.to_rfc3339());
    }
    let _ = writeln!(out, "Comparison Results (Sorted by Delta):");
    for r in results {
        let projected = r
            .projected_yards
            .map_or_else(|| UNAVAILABLE.to_string(), |v| v.to_string());
        let delta = r
            .delta
            .map_or_else(|| UNAVAILABLE.to_string(), |d| format!("{d:.2}"));
        let _ = writeln!(out, "Player: {}", r.name);
        let _ = writeln!(out, "  Position: {}", r.position);
        let _ = writeln!(out, "  Projected Yards: {projected}");
        let _ = writeln!(out, "  Line: {}", number_or_na(r.line));
        let _ = writeln!(out, "  Delta: {delta}");
        let _ = writeln!(out, "  Suggestion: {}", r.suggestion);
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    }
    out
}

fn render_json(results: &[ComparisonResult]) -> Result<String, ReportError> {
    let mut json = serde_json::to_string_pretty(results)?;
    json.push('\n');
    Ok(json)
}

fn render_csv(results: &[ComparisonResult]) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if results.is_empty() {
        writer.write_record([
            "name",
            "position",
            "projected_yards",
            "line",
            "delta",
            "suggestion",
        ])?;
    }
    for r in results {
        writer.serialize(r)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use propline_core::{StatValue, Suggestion};

    fn sample() -> Vec<ComparisonResult> {
        vec![
            ComparisonResult {
                name: "Amon-Ra St. Brown".into(),
                position: "WR".into(),
                projected_yards: Some(StatValue::Int(82)),
                line: Some(70.5),
                delta: Some(11.5),
                suggestion: Suggestion::Over,
            },
            ComparisonResult {
                name: "Jane Doe".into(),
                position: "RB".into(),
                projected_yards: None,
                line: Some(55.0),
                delta: None,
                suggestion: Suggestion::MissingProjection,
            },
        ]
    }

    #[test]
    fn text_report_block_layout() {
        let text = render(&sample(), ReportFormat::Text, None).unwrap();
        let expected = "\
Comparison Results (Sorted by Delta):
Player: Amon-Ra St. Brown
  Position: WR
  Projected Yards: 82
  Line: 70.5
  Delta: 11.50
  Suggestion: Over
------------------------------
Player: Jane Doe
  Position: RB
  Projected Yards: N/A
  Line: 55.0
  Delta: N/A
  Suggestion: MissingProjection
------------------------------
";
        assert_eq!(text, expected);
    }

    #[test]
    fn text_report_timestamp_header() {
        let ts = Utc.with_ymd_and_hms(2024, 11, 28, 12, 0, 0).unwrap();
        let text = render(&[], ReportFormat::Text, Some(ts)).unwrap();
        assert_eq!(
            text,
            "Generated: 2024-11-28T12:00:00+00:00\nComparison Results (Sorted by Delta):\n"
        );
    }

    #[test]
    fn json_report_has_exact_fields() {
        let json = render(&sample(), ReportFormat::Json, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = value[0].as_object().unwrap();
        let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["delta", "line", "name", "position", "projected_yards", "suggestion"]
        );
        assert_eq!(value[0]["projected_yards"], 82);
        assert_eq!(value[1]["delta"], "N/A");
    }

    #[test]
    fn csv_report_rows() {
        let csv = render(&sample(), ReportFormat::Csv, None).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "name,position,projected_yards,line,delta,suggestion");
        assert_eq!(lines[1], "Amon-Ra St. Brown,WR,82,70.5,11.5,Over");
        assert_eq!(lines[2], "Jane Doe,RB,N/A,55.0,N/A,MissingProjection");
    }

    #[test]
    fn empty_csv_still_has_header() {
        let csv = render(&[], ReportFormat::Csv, None).unwrap();
        assert_eq!(csv, "name,position,projected_yards,line,delta,suggestion\n");
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        write("hello\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
