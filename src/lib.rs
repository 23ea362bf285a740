//! xmldiff - Explainable comparison of XML documents.
//!
//! This library compares a control tree with a test tree and reports every
//! difference as a typed [`Comparison`] with a [`Severity`] and XPath-like
//! locations on both sides. Child nodes are paired by pluggable element
//! selectors, outcomes can be re-graded by difference evaluators, and a
//! controller can stop the walk at the first difference.
//!
//! # Example
//!
//! ```no_run
//! use xmldiff_rs::{parse_file, compute_diff, DiffConfig, format_diff, OutputFormat, OutputOptions, ParseOptions};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Parse two files
//! let control = parse_file(Path::new("expected.xml"), &ParseOptions::default())?;
//! let test = parse_file(Path::new("actual.xml"), &ParseOptions::default())?;
//!
//! // Compare them
//! let config = DiffConfig::default().check_for_similar();
//! let diff = compute_diff(&control, &test, &config);
//!
//! // Format the output
//! let output = format_diff(&diff, &OutputFormat::Terminal, &OutputOptions::default())?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod comparison;
pub mod config;
pub mod diff;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod selector;
pub mod tree;
pub mod xpath;

// Re-export commonly used types for convenience
pub use comparison::{CheckFor, Comparison, ComparisonType, Detail, Severity, SeverityFilter};
pub use diff::{compute_diff, compute_diff_with_listeners, Diff, DiffConfig, DiffStats, Difference};
pub use error::{ConfigError, OutputError, ParseError, XmlDiffError};
pub use evaluator::{
    ComparisonController, ComparisonListener, DifferenceEvaluator, Nevermind, StopWhenDifferent,
    StopWhenSimilar,
};
pub use matcher::{DefaultNodeMatcher, Matching, NodeMatcher};
pub use output::{describe, format_diff, OutputFormat, OutputOptions};
pub use parser::{parse_file, parse_str, ParseOptions};
pub use selector::ElementSelector;
pub use tree::{Attribute, Document, DocumentType, Element, Node, QName};
pub use xpath::XPathContext;
