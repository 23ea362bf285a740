//! Integration tests for the comparison engine.

use std::sync::Arc;
use xmldiff_rs::evaluator::{self, ComparisonCounter};
use xmldiff_rs::selector::SharedSelector;
use xmldiff_rs::{
    compute_diff, compute_diff_with_listeners, parse_str, Attribute, CheckFor, Comparison,
    ComparisonType, Diff, DiffConfig, Element, Matching, Node, NodeMatcher, ParseOptions, QName,
    Severity, StopWhenDifferent,
};

fn xml(content: &str) -> Node {
    parse_str(content, &ParseOptions::default()).unwrap()
}

fn kinds(diff: &Diff<'_>) -> Vec<(ComparisonType, Severity)> {
    diff.differences()
        .iter()
        .map(|d| (d.comparison().comparison_type(), d.severity()))
        .collect()
}

fn control_xpath(diff: &Diff<'_>, index: usize) -> String {
    diff.differences()[index]
        .comparison()
        .control()
        .xpath
        .clone()
        .unwrap_or_default()
}

/// Pairs children by position, whatever their kind.
struct PositionalMatcher;

impl NodeMatcher for PositionalMatcher {
    fn match_nodes(&self, control: &[&Node], test: &[&Node]) -> Matching {
        let shared = control.len().min(test.len());
        Matching {
            pairs: (0..shared).map(|i| (i, i)).collect(),
            unmatched_control: (shared..control.len()).collect(),
            unmatched_test: (shared..test.len()).collect(),
        }
    }
}

#[test]
fn test_identical_documents() {
    let doc = xml(
        r#"<?xml version="1.0"?>
        <!DOCTYPE order SYSTEM "order.dtd">
        <o:order xmlns:o="urn:orders" id="7">
            <!-- generated -->
            <?render fast?>
            <o:item sku="a">one &amp; two</o:item>
            <o:note><![CDATA[<raw>]]></o:note>
        </o:order>"#,
    );
    let copy = doc.clone();
    let diff = compute_diff(&doc, &copy, &DiffConfig::default());
    assert!(!diff.has_differences());
    assert!(diff.comparison_count() > 10);
    assert_eq!(diff.to_string(), "[identical]");
}

#[test]
fn test_root_kind_mismatch_stops() {
    let control: Node = Node::element("a").child(Node::element("b")).into();
    let test = Node::comment("a");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(kinds(&diff), vec![(ComparisonType::NodeType, Severity::Different)]);
    assert_eq!(diff.comparison_count(), 1);
}

#[test]
fn test_child_kind_mismatch_does_not_recurse() {
    let control = xml("<a><b><c/></b></a>");
    let test = xml("<a><!--b--></a>");
    let config = DiffConfig::default().with_node_matcher(PositionalMatcher);
    let diff = compute_diff(&control, &test, &config);
    assert_eq!(kinds(&diff), vec![(ComparisonType::NodeType, Severity::Different)]);
    assert_eq!(control_xpath(&diff, 0), "/a[1]/b[1]");
    assert_eq!(
        diff.differences()[0].comparison().test().xpath.as_deref(),
        Some("/a[1]/comment()[1]")
    );
}

#[test]
fn test_length_reported_before_lookup() {
    let control = xml("<a><b/><b/></a>");
    let test = xml("<a><b/></a>");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![
            (ComparisonType::ChildNodelistLength, Severity::Different),
            (ComparisonType::ChildLookup, Severity::Different),
        ]
    );
    assert_eq!(control_xpath(&diff, 0), "/a[1]");
    assert_eq!(control_xpath(&diff, 1), "/a[1]/b[2]");
}

#[test]
fn test_reordered_children_by_name() {
    let control = xml("<a><b>1</b><c/></a>");
    let test = xml("<a><c/><b>1</b></a>");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![
            (ComparisonType::ChildNodelistSequence, Severity::Different),
            (ComparisonType::ChildNodelistSequence, Severity::Different),
        ]
    );
    let first = diff.differences()[0].comparison();
    assert_eq!(first.control().xpath.as_deref(), Some("/a[1]/b[1]"));
    assert_eq!(first.test().xpath.as_deref(), Some("/a[1]/b[1]"));
}

#[test]
fn test_reordered_children_by_name_and_text_with_sequence_ignored() {
    let control = xml("<a><b>1</b><c/></a>");
    let test = xml("<a><c/><b>1</b></a>");
    let config = DiffConfig::default()
        .with_selectors([xmldiff_rs::selector::by_name_and_text()])
        .with_evaluator(evaluator::downgrade_to_equal([
            ComparisonType::ChildNodelistSequence,
        ]));
    let diff = compute_diff(&control, &test, &config);
    assert!(!diff.has_differences());

    let similar = DiffConfig::default().with_evaluator(evaluator::downgrade_to_similar([
        ComparisonType::ChildNodelistSequence,
    ]));
    let diff = compute_diff(&control, &test, &similar);
    assert_eq!(diff.stats().similar, 2);
    assert!(!diff.filter(&CheckFor::Similar.into()).has_differences());
}

#[test]
fn test_attribute_path_rendering() {
    let control = xml(r#"<a><b/><b x="1"/><c/></a>"#);
    let test = xml(r#"<a><b/><b x="2"/><c/></a>"#);
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(kinds(&diff), vec![(ComparisonType::AttrValue, Severity::Different)]);
    let comparison = diff.differences()[0].comparison();
    assert_eq!(comparison.control().xpath.as_deref(), Some("/a[1]/b[2]/@x"));
    assert_eq!(comparison.control().parent_xpath.as_deref(), Some("/a[1]/b[2]"));
}

#[test]
fn test_early_halt_performs_fewer_comparisons() {
    let control = xml("<a><x>1</x><y>2</y><z>3</z></a>");
    let test = xml("<b><x>1</x><y>2</y><z>4</z></b>");

    let full = compute_diff(&control, &test, &DiffConfig::default());
    let halted = compute_diff(
        &control,
        &test,
        &DiffConfig::default().with_controller(StopWhenDifferent),
    );

    assert!(halted.halted());
    assert!(!full.halted());
    assert!(halted.comparison_count() < full.comparison_count());
    assert_eq!(halted.differences().len(), 1);
}

#[test]
fn test_namespace_prefix_is_similar() {
    let control = xml(r#"<p:a xmlns:p="urn:x"/>"#);
    let test = xml(r#"<q:a xmlns:q="urn:x"/>"#);
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::NamespacePrefix, Severity::Similar)]
    );

    let diff = compute_diff(&control, &test, &DiffConfig::default().check_for_similar());
    assert!(!diff.has_differences());
}

#[test]
fn test_namespace_uri_is_different() {
    let control = xml(r#"<a xmlns="urn:one"/>"#);
    let test = xml(r#"<a xmlns="urn:two"/>"#);
    let by_local_name: SharedSelector =
        Arc::new(|c: &Element, t: &Element| c.name.local_name == t.name.local_name);
    let config = DiffConfig::default().with_selectors([by_local_name]);
    let diff = compute_diff(&control, &test, &config);
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::NamespaceUri, Severity::Different)]
    );
}

#[test]
fn test_namespace_context_in_locations() {
    let control = xml(r#"<s:env xmlns:s="urn:soap"><s:body v="1"/></s:env>"#);
    let test = xml(r#"<env xmlns="urn:soap"><body v="2"/></env>"#);
    let config = DiffConfig::default()
        .with_namespace("soap", "urn:soap")
        .check_for_similar();
    let diff = compute_diff(&control, &test, &config);
    assert_eq!(control_xpath(&diff, 0), "/soap:env[1]/soap:body[1]/@v");
}

#[test]
fn test_doctype_comparisons() {
    let with_doctype = xml(r#"<!DOCTYPE a SYSTEM "a.dtd"><a/>"#);
    let other_system = xml(r#"<!DOCTYPE a SYSTEM "b.dtd"><a/>"#);
    let other_name = xml(r#"<!DOCTYPE b SYSTEM "a.dtd"><a/>"#);
    let without = xml("<a/>");

    let diff = compute_diff(&with_doctype, &without, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::HasDoctypeDeclaration, Severity::Similar)]
    );
    assert_eq!(control_xpath(&diff, 0), "/");

    let diff = compute_diff(&with_doctype, &other_system, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::DoctypeSystemId, Severity::Similar)]
    );

    let diff = compute_diff(&with_doctype, &other_name, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::DoctypeName, Severity::Different)]
    );
}

#[test]
fn test_xml_declaration_toggle() {
    let control = xml(r#"<?xml version="1.0" encoding="UTF-8"?><a/>"#);
    let test = xml(r#"<?xml version="1.1" encoding="ISO-8859-1"?><a/>"#);

    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert!(!diff.has_differences());

    let config = DiffConfig::default().with_xml_declaration(true);
    let diff = compute_diff(&control, &test, &config);
    assert_eq!(
        kinds(&diff),
        vec![
            (ComparisonType::XmlVersion, Severity::Different),
            (ComparisonType::XmlEncoding, Severity::Similar),
        ]
    );

    let config = config.with_evaluator(evaluator::ignore_prolog_differences());
    assert!(!compute_diff(&control, &test, &config).has_differences());
}

#[test]
fn test_schema_location_is_split_out() {
    let xsi = "http://www.w3.org/2001/XMLSchema-instance";
    let control = xml(&format!(
        r#"<a xmlns:xsi="{}" xsi:schemaLocation="urn:a a.xsd" id="1"/>"#,
        xsi
    ));
    let test = xml(&format!(
        r#"<a xmlns:xsi="{}" xsi:schemaLocation="urn:a b.xsd" id="1"/>"#,
        xsi
    ));
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::SchemaLocation, Severity::Similar)]
    );
    assert_eq!(control_xpath(&diff, 0), "/a[1]");
}

#[test]
fn test_text_and_cdata_with_same_content_are_similar() {
    let control = xml("<a>x</a>");
    let test = xml("<a><![CDATA[x]]></a>");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(kinds(&diff), vec![(ComparisonType::NodeType, Severity::Similar)]);

    let test = xml("<a><![CDATA[y]]></a>");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(kinds(&diff), vec![(ComparisonType::NodeType, Severity::Different)]);
}

#[test]
fn test_defaulted_attribute_is_similar() {
    let control: Node = Node::element("a").attr("x", "1").into();
    let test: Node = Node::element("a")
        .with_attribute(Attribute::new(QName::local("x"), "1").defaulted())
        .into();
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::AttrValueExplicitlySpecified, Severity::Similar)]
    );
}

#[test]
fn test_evaluator_can_upgrade() {
    let control = xml(r#"<p:a xmlns:p="urn:x"/>"#);
    let test = xml(r#"<q:a xmlns:q="urn:x"/>"#);
    let config = DiffConfig::default()
        .with_evaluator(evaluator::upgrade_to_different([ComparisonType::NamespacePrefix]))
        .check_for_similar();
    let diff = compute_diff(&control, &test, &config);
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::NamespacePrefix, Severity::Different)]
    );
}

#[test]
fn test_node_and_attribute_filters() {
    let control = xml(r#"<a stamp="1"><!-- one --><b/></a>"#);
    let test = xml(r#"<a stamp="2"><!-- two --><b/></a>"#);
    let config = DiffConfig::default()
        .with_node_filter(|n: &Node| !matches!(n, Node::Comment(_) | Node::DocumentType(_)))
        .with_attribute_filter(|a: &Attribute| a.name.local_name != "stamp");
    assert!(!compute_diff(&control, &test, &config).has_differences());
}

#[test]
fn test_listeners_observe_every_comparison_in_order() {
    let control = xml("<a><b>1</b><c x='1'/></a>");
    let test = xml("<a><b>2</b><c x='2'/><d/></a>");

    let mut seen = Vec::new();
    let mut counter = ComparisonCounter::default();
    let mut collect = |c: &Comparison<'_>, outcome: Severity| {
        if outcome.is_difference() {
            seen.push(c.comparison_type());
        }
    };
    let diff = compute_diff_with_listeners(
        &control,
        &test,
        &DiffConfig::default(),
        &mut [&mut collect, &mut counter],
    );

    let kept: Vec<ComparisonType> = diff
        .differences()
        .iter()
        .map(|d| d.comparison().comparison_type())
        .collect();
    assert_eq!(seen, kept);
    assert_eq!(counter.total(), diff.comparison_count());
    assert_eq!(counter.different, 4);
}

#[test]
fn test_missing_and_extra_children() {
    let control = xml("<a><b/><c/></a>");
    let test = xml("<a><c/><d/></a>");
    let diff = compute_diff(&control, &test, &DiffConfig::default());
    let lookups: Vec<_> = diff
        .differences()
        .iter()
        .map(|d| d.comparison())
        .filter(|c| c.comparison_type() == ComparisonType::ChildLookup)
        .collect();
    assert_eq!(lookups.len(), 2);
    assert_eq!(lookups[0].control().xpath.as_deref(), Some("/a[1]/b[1]"));
    assert!(lookups[0].test().is_absent());
    assert!(lookups[1].control().is_absent());
    assert_eq!(lookups[1].test().xpath.as_deref(), Some("/a[1]/d[1]"));
}

#[test]
fn test_config_shared_between_threads() {
    let config = DiffConfig::default().check_for_similar();
    let control = xml("<a><b>1</b></a>");
    let test = xml("<a><b>2</b></a>");

    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| compute_diff(&control, &test, &config).differences().len())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![1; 4]);
}
