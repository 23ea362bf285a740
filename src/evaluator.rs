//! Hooks of the evaluation pipeline.
//!
//! Every comparison emitted by the walk goes through three stages:
//!
//! 1. a [`DifferenceEvaluator`] may override the default severity,
//! 2. every registered [`ComparisonListener`] sees the final severity,
//! 3. a [`ComparisonController`] decides whether the walk stops right away.
//!
//! Evaluators compose by function composition (see [`chain`] and [`first`]).

use crate::comparison::{Comparison, ComparisonType, Severity};
use crate::filter::PathPattern;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Turns a comparison and its default severity into the final severity.
pub trait DifferenceEvaluator: Send + Sync {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: Severity) -> Severity;
}

impl<F> DifferenceEvaluator for F
where
    F: Fn(&Comparison<'_>, Severity) -> Severity + Send + Sync,
{
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: Severity) -> Severity {
        self(comparison, outcome)
    }
}

pub type SharedEvaluator = Arc<dyn DifferenceEvaluator>;

/// Observes every comparison together with its final severity.
pub trait ComparisonListener {
    fn comparison_performed(&mut self, comparison: &Comparison<'_>, outcome: Severity);
}

impl<F> ComparisonListener for F
where
    F: FnMut(&Comparison<'_>, Severity),
{
    fn comparison_performed(&mut self, comparison: &Comparison<'_>, outcome: Severity) {
        self(comparison, outcome)
    }
}

/// Decides whether the walk halts after a comparison.
pub trait ComparisonController: Send + Sync {
    fn should_halt(&self, outcome: Severity, has_differences: bool) -> bool;
}

pub type SharedController = Arc<dyn ComparisonController>;

/// Never halts: every comparison is performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nevermind;

impl ComparisonController for Nevermind {
    fn should_halt(&self, _outcome: Severity, _has_differences: bool) -> bool {
        false
    }
}

/// Halts on the first DIFFERENT outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopWhenDifferent;

impl ComparisonController for StopWhenDifferent {
    fn should_halt(&self, outcome: Severity, _has_differences: bool) -> bool {
        outcome == Severity::Different
    }
}

/// Halts on the first outcome that is not EQUAL.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopWhenSimilar;

impl ComparisonController for StopWhenSimilar {
    fn should_halt(&self, outcome: Severity, _has_differences: bool) -> bool {
        outcome.is_difference()
    }
}

/// Returns the default severity unchanged.
pub fn identity() -> SharedEvaluator {
    Arc::new(|_: &Comparison<'_>, outcome: Severity| outcome)
}

/// Feeds the outcome of each evaluator into the next one.
pub fn chain<I: IntoIterator<Item = SharedEvaluator>>(evaluators: I) -> SharedEvaluator {
    let evaluators: Vec<SharedEvaluator> = evaluators.into_iter().collect();
    Arc::new(move |comparison: &Comparison<'_>, outcome: Severity| {
        evaluators
            .iter()
            .fold(outcome, |acc, e| e.evaluate(comparison, acc))
    })
}

/// Uses the first evaluator that changes the outcome.
pub fn first<I: IntoIterator<Item = SharedEvaluator>>(evaluators: I) -> SharedEvaluator {
    let evaluators: Vec<SharedEvaluator> = evaluators.into_iter().collect();
    Arc::new(move |comparison: &Comparison<'_>, outcome: Severity| {
        evaluators
            .iter()
            .map(|e| e.evaluate(comparison, outcome))
            .find(|&evaluated| evaluated != outcome)
            .unwrap_or(outcome)
    })
}

/// Replaces outcomes for the given comparison types.
///
/// Only outcomes listed as keys of `replacements` are touched; `None` for
/// `types` applies the replacement to every comparison type.
fn replace_outcomes(
    types: Option<HashSet<ComparisonType>>,
    replacements: BTreeMap<Severity, Severity>,
) -> SharedEvaluator {
    Arc::new(move |comparison: &Comparison<'_>, outcome: Severity| {
        let applies = types
            .as_ref()
            .map_or(true, |t| t.contains(&comparison.comparison_type()));
        match replacements.get(&outcome) {
            Some(&replacement) if applies => replacement,
            _ => outcome,
        }
    })
}

fn type_set<I: IntoIterator<Item = ComparisonType>>(types: I) -> Option<HashSet<ComparisonType>> {
    let set: HashSet<ComparisonType> = types.into_iter().collect();
    (!set.is_empty()).then_some(set)
}

/// Downgrades DIFFERENT to SIMILAR for the given types (all types when empty).
pub fn downgrade_to_similar<I: IntoIterator<Item = ComparisonType>>(types: I) -> SharedEvaluator {
    replace_outcomes(
        type_set(types),
        BTreeMap::from([(Severity::Different, Severity::Similar)]),
    )
}

/// Downgrades SIMILAR and DIFFERENT to EQUAL for the given types (all types when empty).
pub fn downgrade_to_equal<I: IntoIterator<Item = ComparisonType>>(types: I) -> SharedEvaluator {
    replace_outcomes(
        type_set(types),
        BTreeMap::from([
            (Severity::Similar, Severity::Equal),
            (Severity::Different, Severity::Equal),
        ]),
    )
}

/// Upgrades SIMILAR to DIFFERENT for the given types (all types when empty).
pub fn upgrade_to_different<I: IntoIterator<Item = ComparisonType>>(types: I) -> SharedEvaluator {
    replace_outcomes(
        type_set(types),
        BTreeMap::from([(Severity::Similar, Severity::Different)]),
    )
}

/// Treats every difference in the XML declaration and doctype as EQUAL.
pub fn ignore_prolog_differences() -> SharedEvaluator {
    Arc::new(|comparison: &Comparison<'_>, outcome: Severity| {
        if comparison.comparison_type().is_prolog() {
            Severity::Equal
        } else {
            outcome
        }
    })
}

/// Treats comparisons located at or below any of the given path patterns as
/// EQUAL.
///
/// Either side's location counts; a missing node is located at its parent.
pub fn ignore_paths(patterns: Vec<PathPattern>) -> SharedEvaluator {
    Arc::new(move |comparison: &Comparison<'_>, outcome: Severity| {
        let located = [comparison.control(), comparison.test()]
            .into_iter()
            .filter_map(|d| d.xpath.as_deref().or(d.parent_xpath.as_deref()))
            .any(|xpath| patterns.iter().any(|p| p.covers_xpath(xpath)));
        if located {
            Severity::Equal
        } else {
            outcome
        }
    })
}

/// Counts comparisons per final severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonCounter {
    pub equal: usize,
    pub similar: usize,
    pub different: usize,
}

impl ComparisonCounter {
    pub fn total(&self) -> usize {
        self.equal + self.similar + self.different
    }
}

impl ComparisonListener for ComparisonCounter {
    fn comparison_performed(&mut self, _comparison: &Comparison<'_>, outcome: Severity) {
        match outcome {
            Severity::Equal => self.equal += 1,
            Severity::Similar => self.similar += 1,
            Severity::Different => self.different += 1,
        }
    }
}
