//! Property-based tests for the comparison engine
//!
//! These tests use proptest to verify:
//! 1. Reflexivity: a tree compared with itself has no differences
//! 2. Completeness: unequal trees always produce at least one difference
//! 3. The matcher partitions both child lists deterministically

use proptest::prelude::*;
use std::collections::BTreeMap;
use xmldiff_rs::evaluator::{self, ComparisonCounter};
use xmldiff_rs::filter::PathPattern;
use xmldiff_rs::{
    compute_diff, compute_diff_with_listeners, CheckFor, DefaultNodeMatcher, DiffConfig, Node,
    NodeMatcher, SeverityFilter, StopWhenDifferent,
};

fn build(name: &str, attributes: BTreeMap<String, String>, children: Vec<Node>) -> Node {
    let mut element = Node::element(name);
    for (key, value) in attributes {
        element = element.attr(key, value);
    }
    for child in children {
        element = element.child(child);
    }
    Node::Element(element)
}

fn name_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "c"])
}

fn attributes_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[xy]", "[0-2]", 0..3)
}

/// Strategy for arbitrary element subtrees with text and comment leaves
fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        "[ab ]{0,3}".prop_map(|s| Node::text(s)),
        "[ab]{0,2}".prop_map(|s| Node::comment(s)),
        (name_strategy(), attributes_strategy()).prop_map(|(n, a)| build(n, a, Vec::new())),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            name_strategy(),
            attributes_strategy(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(n, a, c)| build(n, a, c))
    })
}

fn element_strategy() -> impl Strategy<Value = Node> {
    (
        name_strategy(),
        attributes_strategy(),
        prop::collection::vec(node_strategy(), 0..4),
    )
        .prop_map(|(n, a, c)| build(n, a, c))
}

proptest! {
    #[test]
    fn prop_tree_equals_itself(tree in element_strategy()) {
        let diff = compute_diff(&tree, &tree, &DiffConfig::default());
        prop_assert!(!diff.has_differences(), "unexpected differences: {:?}", diff.differences());
        prop_assert!(diff.comparison_count() > 0);
        prop_assert!(!diff.halted());
    }

    #[test]
    fn prop_differences_iff_unequal(control in element_strategy(), test in element_strategy()) {
        let diff = compute_diff(&control, &test, &DiffConfig::default());
        prop_assert_eq!(diff.has_differences(), control != test);
    }

    #[test]
    fn prop_fail_fast_keeps_at_most_one(control in element_strategy(), test in element_strategy()) {
        let config = DiffConfig::default().with_controller(StopWhenDifferent);
        let diff = compute_diff(&control, &test, &config);
        let expected = usize::from(control != test);
        prop_assert_eq!(diff.differences().len(), expected);
        prop_assert_eq!(diff.halted(), control != test);
    }

    #[test]
    fn prop_listener_sees_every_comparison(control in element_strategy(), test in element_strategy()) {
        let mut counter = ComparisonCounter::default();
        let diff = compute_diff_with_listeners(
            &control,
            &test,
            &DiffConfig::default(),
            &mut [&mut counter],
        );
        prop_assert_eq!(counter.total(), diff.comparison_count());
        prop_assert_eq!(counter.different, diff.stats().different);
        prop_assert_eq!(counter.similar, diff.stats().similar);
    }

    #[test]
    fn prop_ignoring_everything_hides_all(control in element_strategy(), test in element_strategy()) {
        let config = DiffConfig::default()
            .with_evaluator(evaluator::ignore_paths(vec![PathPattern::parse("**")]));
        let diff = compute_diff(&control, &test, &config);
        prop_assert!(!diff.has_differences());
    }

    #[test]
    fn prop_matcher_partitions_children(control in element_strategy(), test in element_strategy()) {
        let control_children: Vec<&Node> = control.children().iter().collect();
        let test_children: Vec<&Node> = test.children().iter().collect();
        let matcher = DefaultNodeMatcher::default();

        let matching = matcher.match_nodes(&control_children, &test_children);
        prop_assert_eq!(&matching, &matcher.match_nodes(&control_children, &test_children));

        let mut control_seen: Vec<usize> = matching.pairs.iter().map(|&(c, _)| c).collect();
        prop_assert!(control_seen.windows(2).all(|w| w[0] < w[1]));
        control_seen.extend(&matching.unmatched_control);
        control_seen.sort_unstable();
        prop_assert_eq!(control_seen, (0..control_children.len()).collect::<Vec<_>>());

        let mut test_seen: Vec<usize> = matching.pairs.iter().map(|&(_, t)| t).collect();
        test_seen.extend(&matching.unmatched_test);
        test_seen.sort_unstable();
        prop_assert_eq!(test_seen, (0..test_children.len()).collect::<Vec<_>>());
    }
}

proptest! {
    #[test]
    fn prop_severity_filter_is_idempotent(control in element_strategy(), test in element_strategy()) {
        let full = compute_diff(&control, &test, &DiffConfig::default());
        let similar = compute_diff(&control, &test, &DiffConfig::default().check_for_similar());
        let filter = SeverityFilter::from(CheckFor::Similar);

        let once = full.filter(&filter);
        let twice = once.filter(&filter);
        let kinds = |diff: &xmldiff_rs::Diff<'_>| {
            diff.differences()
                .iter()
                .map(|d| (d.comparison().comparison_type(), d.severity()))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(kinds(&once), kinds(&twice));
        prop_assert_eq!(kinds(&once), kinds(&similar));
    }
}
