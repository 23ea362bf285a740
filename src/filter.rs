//! Filters deciding what takes part in a comparison.
//!
//! Node and attribute filters are predicates consulted by the walk before
//! children are counted and matched, or before attributes are compared.
//! [`PathPattern`]s select locations of the comparison result and back the
//! `ignore_paths` evaluator.
//!
//! # Pattern Syntax
//!
//! - `a` - matches an `a` step at any sibling index
//! - `a[2]` - matches only the second `a` sibling
//! - `@id` - matches an attribute step
//! - `*` - matches any single step
//! - `**` - matches any number of steps (including zero)
//!
//! Patterns are always anchored at the root; the leading `/` is optional.
//!
//! # Examples
//!
//! ```
//! use xmldiff_rs::filter::PathPattern;
//!
//! let pattern = PathPattern::parse("/order/item/@id");
//! assert!(pattern.matches_xpath("/order[1]/item[3]/@id"));
//!
//! let pattern = PathPattern::parse("**/timestamp");
//! assert!(pattern.matches_xpath("/log[1]/entry[2]/timestamp[1]"));
//! assert!(pattern.covers_xpath("/log[1]/entry[2]/timestamp[1]/text()[1]"));
//! ```

use crate::tree::{Attribute, Node, QName};
use std::sync::Arc;

/// Predicate selecting the children that take part in a comparison.
pub type NodeFilter = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// Predicate selecting the attributes that take part in a comparison.
pub type AttributeFilter = Arc<dyn Fn(&Attribute) -> bool + Send + Sync>;

/// A single step in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches a step by name, with or without sibling index
    Literal(String),
    /// Matches any single step (*)
    SingleWildcard,
    /// Matches any number of steps (**)
    DoubleWildcard,
}

/// A compiled pattern for matching result locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_steps(pattern)
            .map(|s| match s {
                "**" => PatternSegment::DoubleWildcard,
                "*" => PatternSegment::SingleWildcard,
                _ => PatternSegment::Literal(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Matches a rendered location such as `/a[1]/b[2]/@x`.
    pub fn matches_xpath(&self, xpath: &str) -> bool {
        let steps: Vec<&str> = split_steps(xpath).collect();
        self.matches_steps(&self.segments, &steps)
    }

    /// Matches the location itself or any of its ancestors.
    pub fn covers_xpath(&self, xpath: &str) -> bool {
        let steps: Vec<&str> = split_steps(xpath).collect();
        (0..=steps.len()).any(|len| self.matches_steps(&self.segments, &steps[..len]))
    }

    fn matches_steps(&self, pattern: &[PatternSegment], path: &[&str]) -> bool {
        match (pattern.first(), path.first()) {
            (None, None) => true,
            (None, Some(_)) => false,
            (Some(_seg), None) => pattern
                .iter()
                .all(|s| matches!(s, PatternSegment::DoubleWildcard)),
            (Some(seg), Some(step)) => match seg {
                PatternSegment::Literal(lit) => {
                    step_matches(lit, step) && self.matches_steps(&pattern[1..], &path[1..])
                }
                PatternSegment::SingleWildcard => self.matches_steps(&pattern[1..], &path[1..]),
                PatternSegment::DoubleWildcard => {
                    self.matches_steps(&pattern[1..], path)
                        || self.matches_steps(pattern, &path[1..])
                }
            },
        }
    }
}

fn split_steps(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A literal without index matches every sibling index.
fn step_matches(literal: &str, step: &str) -> bool {
    if literal == step {
        return true;
    }
    if literal.contains('[') {
        return false;
    }
    match step.split_once('[') {
        Some((name, _)) => name == literal,
        None => false,
    }
}

/// Compares every child except document type declarations, which are
/// compared through the document instead.
pub fn default_node_filter() -> NodeFilter {
    Arc::new(|node: &Node| !matches!(node, Node::DocumentType(_)))
}

/// Like [`default_node_filter`], additionally skipping comments.
pub fn ignore_comments() -> NodeFilter {
    Arc::new(|node: &Node| !matches!(node, Node::DocumentType(_) | Node::Comment(_)))
}

/// Like [`default_node_filter`], additionally skipping elements with the
/// given local names.
pub fn ignore_elements_named<I, S>(names: I) -> NodeFilter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    Arc::new(move |node: &Node| match node {
        Node::DocumentType(_) => false,
        Node::Element(e) => !names.contains(&e.name.local_name),
        _ => true,
    })
}

pub fn accept_all_attributes() -> AttributeFilter {
    Arc::new(|_: &Attribute| true)
}

/// Skips attributes with the given qualified names.
pub fn ignore_attributes<I: IntoIterator<Item = QName>>(names: I) -> AttributeFilter {
    let names: Vec<QName> = names.into_iter().collect();
    Arc::new(move |attr: &Attribute| !names.contains(&attr.name))
}
