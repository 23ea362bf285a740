//! Pairing of control children with test children.
//!
//! The default matcher is greedy and first-fit: control children are visited
//! in order, and each takes the earliest still-unmatched test child it may be
//! paired with. There is no backtracking, so the result is deterministic and
//! costs at most `O(n * m)` selector calls.

use crate::selector::{self, SharedSelector};
use crate::tree::{Node, NodeType};
use std::fmt;

/// The outcome of matching two ordered child sequences.
///
/// `pairs` holds `(control_index, test_index)` in control order; the
/// remaining lists hold indices without counterpart, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    pub pairs: Vec<(usize, usize)>,
    pub unmatched_control: Vec<usize>,
    pub unmatched_test: Vec<usize>,
}

impl Matching {
    /// Position of each pair's test index among all matched test indices.
    ///
    /// Pairs are in control order, so a pair is "in sequence" when its test
    /// rank equals its position in `pairs`.
    pub fn test_ranks(&self) -> Vec<usize> {
        let mut matched_test: Vec<usize> = self.pairs.iter().map(|&(_, t)| t).collect();
        matched_test.sort_unstable();
        self.pairs
            .iter()
            .map(|&(_, t)| matched_test.partition_point(|&x| x < t))
            .collect()
    }
}

/// Aligns two ordered child sequences.
pub trait NodeMatcher: Send + Sync {
    fn match_nodes(&self, control: &[&Node], test: &[&Node]) -> Matching;
}

/// Greedy first-fit matcher driven by element selectors.
///
/// Elements pair if any of the selectors accepts them. Other nodes pair
/// with nodes of the same kind, where Text and CDATA count as one kind.
#[derive(Clone)]
pub struct DefaultNodeMatcher {
    selectors: Vec<SharedSelector>,
}

impl DefaultNodeMatcher {
    pub fn new<I: IntoIterator<Item = SharedSelector>>(selectors: I) -> Self {
        Self {
            selectors: selectors.into_iter().collect(),
        }
    }

    fn nodes_match(&self, control: &Node, test: &Node) -> bool {
        match (control, test) {
            (Node::Element(c), Node::Element(t)) => {
                self.selectors.iter().any(|s| s.can_be_compared(c, t))
            }
            _ => node_types_compatible(control.node_type(), test.node_type()),
        }
    }
}

impl Default for DefaultNodeMatcher {
    fn default() -> Self {
        Self::new([selector::by_name()])
    }
}

impl fmt::Debug for DefaultNodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultNodeMatcher")
            .field("selectors", &self.selectors.len())
            .finish()
    }
}

impl NodeMatcher for DefaultNodeMatcher {
    fn match_nodes(&self, control: &[&Node], test: &[&Node]) -> Matching {
        let mut test_taken = vec![false; test.len()];
        let mut matching = Matching::default();

        for (ci, c) in control.iter().enumerate() {
            let found = test
                .iter()
                .enumerate()
                .find(|&(ti, t)| !test_taken[ti] && self.nodes_match(c, t))
                .map(|(ti, _)| ti);
            match found {
                Some(ti) => {
                    test_taken[ti] = true;
                    matching.pairs.push((ci, ti));
                }
                None => matching.unmatched_control.push(ci),
            }
        }

        matching.unmatched_test = test_taken
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(|(ti, _)| ti)
            .collect();
        matching
    }
}

fn node_types_compatible(control: NodeType, test: NodeType) -> bool {
    control == test || (control.is_character_data() && test.is_character_data())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(names: &[&str]) -> Vec<Node> {
        names.iter().map(|n| Node::element(*n).into()).collect()
    }

    fn run(matcher: &DefaultNodeMatcher, control: &[Node], test: &[Node]) -> Matching {
        let c: Vec<&Node> = control.iter().collect();
        let t: Vec<&Node> = test.iter().collect();
        matcher.match_nodes(&c, &t)
    }

    #[test]
    fn test_greedy_first_fit() {
        let m = run(
            &DefaultNodeMatcher::default(),
            &elements(&["A", "A", "B"]),
            &elements(&["B", "A"]),
        );
        assert_eq!(m.pairs, vec![(0, 1), (2, 0)]);
        assert_eq!(m.unmatched_control, vec![1]);
        assert!(m.unmatched_test.is_empty());
    }

    #[test]
    fn test_unmatched_test_nodes() {
        let m = run(
            &DefaultNodeMatcher::default(),
            &elements(&["a"]),
            &elements(&["x", "a", "y"]),
        );
        assert_eq!(m.pairs, vec![(0, 1)]);
        assert_eq!(m.unmatched_test, vec![0, 2]);
    }

    #[test]
    fn test_text_pairs_with_cdata() {
        let m = run(
            &DefaultNodeMatcher::default(),
            &[Node::text("a"), Node::comment("c")],
            &[Node::comment("c"), Node::cdata("a")],
        );
        assert_eq!(m.pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_element_never_pairs_with_comment() {
        let m = run(
            &DefaultNodeMatcher::default(),
            &elements(&["a"]),
            &[Node::comment("a")],
        );
        assert!(m.pairs.is_empty());
        assert_eq!(m.unmatched_control, vec![0]);
        assert_eq!(m.unmatched_test, vec![0]);
    }

    #[test]
    fn test_multiple_selectors() {
        let matcher = DefaultNodeMatcher::new([
            selector::by_name_and_text(),
            selector::by_name(),
        ]);
        let control: Vec<Node> = vec![Node::element("a").text("x").into()];
        let test: Vec<Node> = vec![Node::element("a").text("y").into()];
        let m = run(&matcher, &control, &test);
        assert_eq!(m.pairs, vec![(0, 0)]);
    }

    #[test]
    fn test_ranks() {
        let m = Matching {
            pairs: vec![(0, 5), (1, 2), (3, 7)],
            unmatched_control: vec![2],
            unmatched_test: vec![],
        };
        assert_eq!(m.test_ranks(), vec![1, 0, 2]);
    }
}
