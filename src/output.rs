//! Output formatting for diff results.
//!
//! This module renders a [`Diff`] as colored terminal output, plain text or
//! JSON, and provides [`describe`], the one-line message used for a single
//! comparison.
//!
//! # Examples
//!
//! ```
//! use xmldiff_rs::{compute_diff, format_diff, DiffConfig, Node, OutputFormat, OutputOptions};
//!
//! let control: Node = Node::element("a").text("1").into();
//! let test: Node = Node::element("a").text("2").into();
//! let diff = compute_diff(&control, &test, &DiffConfig::default());
//!
//! let output = format_diff(&diff, &OutputFormat::Plain, &OutputOptions::default()).unwrap();
//! assert!(output.contains("/a[1]/text()[1]"));
//! ```

use crate::comparison::{Comparison, ComparisonType, Detail, Severity};
use crate::diff::{Diff, DiffStats, Difference};
use crate::error::OutputError;
use crate::tree::truncate;
use colored::*;
use serde_json::json;

const NULL: &str = "<NULL>";
const PREVIEW_LENGTH: usize = 40;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored terminal output with ANSI escape codes
    Terminal,
    /// JSON representation of the diff
    Json,
    /// Plain text, no colors (suitable for piping)
    Plain,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            "plain" => Ok(OutputFormat::Plain),
            _ => Err(OutputError::UnknownFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Options for controlling output formatting.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Maximum length for displayed values (truncate if longer)
    pub max_value_length: usize,
    /// Print the full comparison message under each difference
    pub show_descriptions: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            max_value_length: 80,
            show_descriptions: false,
        }
    }
}

/// Formats a diff according to the specified format and options.
///
/// # Arguments
///
/// * `diff` - The diff to format
/// * `format` - The output format (Terminal, JSON, or Plain)
/// * `options` - Formatting options
///
/// # Returns
///
/// Returns the formatted string on success, or an OutputError on failure.
pub fn format_diff(
    diff: &Diff<'_>,
    format: &OutputFormat,
    options: &OutputOptions,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Terminal => Ok(format_text(diff, options, true)),
        OutputFormat::Json => format_json(diff),
        OutputFormat::Plain => Ok(format_text(diff, options, false)),
    }
}

/// Describes a comparison in one line:
///
/// `Expected <what> '<control>' but was '<test>' - comparing <node> at <location> to <node> at <location>`
pub fn describe(comparison: &Comparison<'_>) -> String {
    let control = comparison.control();
    let test = comparison.test();
    format!(
        "Expected {} '{}' but was '{}' - comparing {} at {} to {} at {}",
        comparison.comparison_type().description(),
        value_text(control, usize::MAX),
        value_text(test, usize::MAX),
        target_text(control),
        location(control),
        target_text(test),
        location(test),
    )
}

fn value_text(detail: &Detail<'_>, max_len: usize) -> String {
    match &detail.value {
        Some(v) => truncate(v.to_string(), max_len),
        None => NULL.to_string(),
    }
}

fn target_text(detail: &Detail<'_>) -> String {
    match &detail.target {
        Some(t) => t.preview(PREVIEW_LENGTH),
        None => NULL.to_string(),
    }
}

/// Location of a detail; a missing node is located at its parent.
fn location<'d>(detail: &'d Detail<'_>) -> &'d str {
    detail
        .xpath
        .as_deref()
        .or(detail.parent_xpath.as_deref())
        .unwrap_or("/")
}

/// How a difference is presented in line-oriented output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    /// Only the control side has the item
    Missing,
    /// Only the test side has the item
    Extra,
    Different,
    Similar,
}

impl Marker {
    fn of(difference: &Difference<'_>) -> Self {
        let comparison = difference.comparison();
        let lookup = matches!(
            comparison.comparison_type(),
            ComparisonType::ChildLookup | ComparisonType::AttrNameLookup
        );
        if lookup && comparison.test().value.is_none() {
            Marker::Missing
        } else if lookup && comparison.control().value.is_none() {
            Marker::Extra
        } else if difference.severity() == Severity::Similar {
            Marker::Similar
        } else {
            Marker::Different
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Marker::Missing => "-",
            Marker::Extra => "+",
            Marker::Different => "•",
            Marker::Similar => "~",
        }
    }
}

fn format_text(diff: &Diff<'_>, options: &OutputOptions, colored: bool) -> String {
    if !diff.has_differences() {
        let message = "No differences found.";
        return if colored {
            message.dimmed().to_string()
        } else {
            message.to_string()
        };
    }

    let mut output = String::new();
    for difference in diff.differences() {
        output.push_str(&format_difference(difference, options, colored));
        output.push('\n');
        if options.show_descriptions {
            output.push_str("    ");
            output.push_str(&describe(difference.comparison()));
            output.push('\n');
        }
    }

    output.push('\n');
    output.push_str(&format_summary(&diff.stats()));
    if diff.halted() {
        output.push_str(" (stopped at first difference)");
    }
    output
}

fn format_difference(difference: &Difference<'_>, options: &OutputOptions, colored: bool) -> String {
    let comparison = difference.comparison();
    let control = comparison.control();
    let test = comparison.test();
    let what = comparison.comparison_type().description();
    let max = options.max_value_length;
    let marker = Marker::of(difference);

    let (path, body) = match marker {
        Marker::Missing => (
            location(control),
            format!("{} '{}' missing in test", what, value_text(control, max)),
        ),
        Marker::Extra => (
            location(test),
            format!("{} '{}' only in test", what, value_text(test, max)),
        ),
        Marker::Different | Marker::Similar => (
            location(control),
            format!(
                "{} '{}' → '{}'",
                what,
                value_text(control, max),
                value_text(test, max)
            ),
        ),
    };

    if !colored {
        return format!("{} {}: {}", marker.symbol(), path, body);
    }

    match marker {
        Marker::Missing => format!(
            "{} {}: {}",
            marker.symbol().bright_red(),
            path.red(),
            body.red()
        ),
        Marker::Extra => format!(
            "{} {}: {}",
            marker.symbol().bright_green(),
            path.green(),
            body.green()
        ),
        Marker::Different => format!(
            "{} {}: {}",
            marker.symbol().bright_yellow(),
            path.yellow(),
            body.yellow()
        ),
        Marker::Similar => format!(
            "{} {}: {}",
            marker.symbol().cyan(),
            path.cyan(),
            body.dimmed()
        ),
    }
}

/// Formats a diff as JSON.
///
/// The JSON structure includes the differences and statistics.
fn format_json(diff: &Diff<'_>) -> Result<String, OutputError> {
    let differences: Vec<serde_json::Value> = diff
        .differences()
        .iter()
        .map(|d| {
            let comparison = d.comparison();
            json!({
                "type": comparison.comparison_type(),
                "severity": d.severity(),
                "description": describe(comparison),
                "control": detail_to_json(comparison.control()),
                "test": detail_to_json(comparison.test()),
            })
        })
        .collect();

    let stats = diff.stats();
    let output = json!({
        "identical": !diff.has_differences(),
        "halted": diff.halted(),
        "differences": differences,
        "stats": {
            "different": stats.different,
            "similar": stats.similar,
            "comparisons": diff.comparison_count(),
        }
    });

    serde_json::to_string_pretty(&output)
        .map_err(|e| OutputError::JsonSerializationError { source: e })
}

fn detail_to_json(detail: &Detail<'_>) -> serde_json::Value {
    json!({
        "xpath": detail.xpath,
        "parent_xpath": detail.parent_xpath,
        "node_type": detail.target.map(|t| t.node_type()),
        "value": detail.value.as_ref().map(|v| v.to_string()),
    })
}

/// Formats summary statistics.
fn format_summary(stats: &DiffStats) -> String {
    if stats.is_empty() {
        return "Summary: No differences".to_string();
    }

    let mut parts = Vec::new();
    if stats.different > 0 {
        parts.push(format!("{} different", stats.different));
    }
    if stats.similar > 0 {
        parts.push(format!("{} similar", stats.similar));
    }
    format!("Summary: {}", parts.join(", "))
}
