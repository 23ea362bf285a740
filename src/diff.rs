//! Core XML difference engine.
//!
//! The engine walks a control tree and a test tree side by side and emits an
//! atomic [`Comparison`] for every structural or value fact it checks. Each
//! comparison receives a default [`Severity`], is run through the configured
//! evaluator, shown to listeners and to the controller (which may halt the
//! walk), and is finally kept in the [`Diff`] if its severity passes the
//! configured [`SeverityFilter`].
//!
//! Children of two paired nodes are aligned by a [`NodeMatcher`]; paired
//! children are compared recursively, unpaired ones are reported as
//! `CHILD_LOOKUP` differences.
//!
//! # Examples
//!
//! ```
//! use xmldiff_rs::{compute_diff, ComparisonType, DiffConfig, Node};
//!
//! let control: Node = Node::element("a").attr("x", "1").into();
//! let test: Node = Node::element("a").attr("x", "2").into();
//!
//! let diff = compute_diff(&control, &test, &DiffConfig::default());
//!
//! assert!(diff.has_differences());
//! let first = &diff.differences()[0];
//! assert_eq!(first.comparison().comparison_type(), ComparisonType::AttrValue);
//! assert_eq!(first.comparison().control().xpath.as_deref(), Some("/a[1]/@x"));
//! ```

use crate::comparison::{
    default_severity, CheckFor, Comparison, ComparisonType, Detail, Severity, SeverityFilter,
    Target, Value,
};
use crate::evaluator::{
    self, ComparisonController, ComparisonListener, Nevermind, SharedController, SharedEvaluator,
};
use crate::filter::{self, AttributeFilter, NodeFilter};
use crate::matcher::{DefaultNodeMatcher, NodeMatcher};
use crate::selector::SharedSelector;
use crate::tree::{Attribute, Document, Element, Node, QName, XSI_NAMESPACE};
use crate::xpath::{NamespaceContext, NodeInfo, XPathContext};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A comparison that survived the severity filter.
///
/// The severity is the final one, after the configured evaluator ran; it is
/// never `Equal` for a kept difference unless the filter asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference<'a> {
    /// The fact that was checked, with both sides
    comparison: Comparison<'a>,
    /// Outcome after evaluation
    severity: Severity,
}

impl<'a> Difference<'a> {
    /// Returns the comparison this difference was recorded for.
    pub fn comparison(&self) -> &Comparison<'a> {
        &self.comparison
    }

    /// Returns the final severity of the comparison.
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

/// Number of kept differences per severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of SIMILAR differences
    pub similar: usize,
    /// Number of DIFFERENT differences
    pub different: usize,
}

impl DiffStats {
    /// Returns the total number of kept differences.
    pub fn total(&self) -> usize {
        self.similar + self.different
    }

    /// Returns true if nothing was kept.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The immutable result of one comparison run.
///
/// A diff borrows both input trees, so every [`Detail`] can point back at the
/// node it describes. It can be read from several threads at once.
#[derive(Debug, Clone)]
pub struct Diff<'a> {
    /// Root of the control tree
    control: &'a Node,
    /// Root of the test tree
    test: &'a Node,
    /// Kept differences in emission order
    differences: Vec<Difference<'a>>,
    /// Comparisons performed, including dropped ones
    comparisons: usize,
    /// Whether the controller stopped the walk
    halted: bool,
}

impl<'a> Diff<'a> {
    /// Returns true if at least one difference passed the severity filter.
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    /// Kept differences in emission (depth-first document) order.
    pub fn differences(&self) -> &[Difference<'a>] {
        &self.differences
    }

    /// Returns the control root the diff was computed from.
    pub fn control(&self) -> &'a Node {
        self.control
    }

    /// Returns the test root the diff was computed from.
    pub fn test(&self) -> &'a Node {
        self.test
    }

    /// Number of comparisons performed, kept or not.
    pub fn comparison_count(&self) -> usize {
        self.comparisons
    }

    /// True if the controller stopped the walk early.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Counts the kept differences per severity.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for d in &self.differences {
            match d.severity {
                Severity::Similar => stats.similar += 1,
                Severity::Different => stats.different += 1,
                Severity::Equal => {}
            }
        }
        stats
    }

    /// Returns a copy keeping only differences whose severity `filter` accepts.
    ///
    /// Filtering is idempotent, and filtering with a narrower filter after a
    /// wider one gives the same result as the narrower filter alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldiff_rs::{compute_diff, DiffConfig, Node, SeverityFilter};
    ///
    /// let control: Node = Node::element("a").text("x").into();
    /// let test: Node = Node::element("a").child(Node::cdata("x")).into();
    ///
    /// let diff = compute_diff(&control, &test, &DiffConfig::default());
    /// assert!(diff.has_differences());
    /// assert!(!diff.filter(&SeverityFilter::similar()).has_differences());
    /// ```
    pub fn filter(&self, filter: &SeverityFilter) -> Diff<'a> {
        Diff {
            differences: self
                .differences
                .iter()
                .filter(|d| filter.accepts(d.severity))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

/// Shows the first difference, or `[identical]`.
impl fmt::Display for Diff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.differences.first() {
            Some(d) => f.write_str(&crate::output::describe(d.comparison())),
            None => f.write_str("[identical]"),
        }
    }
}

/// Configuration of a comparison run.
///
/// A config is immutable while in use and can be shared between threads;
/// every run builds its own path trackers and pipeline state.
#[derive(Clone)]
pub struct DiffConfig {
    /// Pairs the children of two compared nodes.
    pub node_matcher: Arc<dyn NodeMatcher>,
    /// Overrides the default severity of each comparison.
    pub difference_evaluator: SharedEvaluator,
    /// Decides after each comparison whether the walk stops.
    pub controller: SharedController,
    /// Decides which children take part in the comparison.
    pub node_filter: NodeFilter,
    /// Decides which attributes take part in the comparison.
    pub attribute_filter: AttributeFilter,
    /// Prefixes used to render namespaced names in locations.
    pub namespace_context: NamespaceContext,
    /// Compare XML version, encoding and standalone of documents. Off by default.
    pub compare_xml_declaration: bool,
    /// Severities kept in the result.
    pub severity_filter: SeverityFilter,
}

impl DiffConfig {
    /// Pairs children with a [`DefaultNodeMatcher`] over `selectors`.
    ///
    /// A pair of elements matches if any selector accepts it. Non-element
    /// children are paired by node type regardless of the selectors.
    ///
    /// # Arguments
    ///
    /// * `selectors` - Element selectors, tried in order
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldiff_rs::{compute_diff, parse_str, selector, DiffConfig, ParseOptions};
    ///
    /// let options = ParseOptions::default();
    /// let control = parse_str(r#"<a><b id="1"/><b id="2"/></a>"#, &options).unwrap();
    /// let test = parse_str(r#"<a><b id="2"/><b id="1"/></a>"#, &options).unwrap();
    ///
    /// let config = DiffConfig::default()
    ///     .with_selectors([selector::by_name_and_attributes(["id"])]);
    /// let diff = compute_diff(&control, &test, &config);
    ///
    /// // only the order of the children differs
    /// assert!(diff
    ///     .differences()
    ///     .iter()
    ///     .all(|d| d.comparison().control().xpath.as_deref() != Some("/a[1]/b[1]/@id")));
    /// ```
    pub fn with_selectors<I: IntoIterator<Item = SharedSelector>>(mut self, selectors: I) -> Self {
        self.node_matcher = Arc::new(DefaultNodeMatcher::new(selectors));
        self
    }

    /// Replaces the matcher with a custom one.
    pub fn with_node_matcher(mut self, matcher: impl NodeMatcher + 'static) -> Self {
        self.node_matcher = Arc::new(matcher);
        self
    }

    /// Replaces the evaluator; see [`crate::evaluator`] for stock ones.
    pub fn with_evaluator(mut self, evaluator: SharedEvaluator) -> Self {
        self.difference_evaluator = evaluator;
        self
    }

    /// Replaces the controller, e.g. with [`crate::StopWhenDifferent`].
    pub fn with_controller(mut self, controller: impl ComparisonController + 'static) -> Self {
        self.controller = Arc::new(controller);
        self
    }

    /// Only children for which `filter` returns true take part in the walk.
    ///
    /// Replacing the filter also replaces the default one, which keeps
    /// document type nodes out of the child lists.
    pub fn with_node_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Node) -> bool + Send + Sync + 'static,
    {
        self.node_filter = Arc::new(filter);
        self
    }

    /// Only attributes for which `filter` returns true are compared.
    pub fn with_attribute_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Attribute) -> bool + Send + Sync + 'static,
    {
        self.attribute_filter = Arc::new(filter);
        self
    }

    /// Renders names in namespace `uri` as `prefix:local` in locations.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespace_context.insert(prefix.into(), uri.into());
        self
    }

    /// Turns comparison of the XML declaration on or off.
    pub fn with_xml_declaration(mut self, compare: bool) -> Self {
        self.compare_xml_declaration = compare;
        self
    }

    /// Sets the severity filter from what the caller checks for.
    pub fn check_for(mut self, check: CheckFor) -> Self {
        self.severity_filter = check.into();
        self
    }

    /// Keep only DIFFERENT outcomes.
    pub fn check_for_similar(self) -> Self {
        self.check_for(CheckFor::Similar)
    }

    /// Keep SIMILAR and DIFFERENT outcomes.
    pub fn check_for_identical(self) -> Self {
        self.check_for(CheckFor::Identical)
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            node_matcher: Arc::new(DefaultNodeMatcher::default()),
            difference_evaluator: evaluator::identity(),
            controller: Arc::new(Nevermind),
            node_filter: filter::default_node_filter(),
            attribute_filter: filter::accept_all_attributes(),
            namespace_context: NamespaceContext::new(),
            compare_xml_declaration: false,
            severity_filter: SeverityFilter::identical(),
        }
    }
}

impl fmt::Debug for DiffConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffConfig")
            .field("namespace_context", &self.namespace_context)
            .field("compare_xml_declaration", &self.compare_xml_declaration)
            .field("severity_filter", &self.severity_filter)
            .finish_non_exhaustive()
    }
}

/// Compares two trees.
///
/// This is the main entry point of the engine. It walks both trees depth-first
/// and returns every comparison that passed the configured severity filter.
/// Both roots may be documents or any other node; a non-document root is
/// located as the single child of an implicit document (`/a[1]`).
///
/// # Arguments
///
/// * `control` - The expected tree
/// * `test` - The tree checked against it
/// * `config` - Matching, evaluation and filtering options
///
/// # Returns
///
/// Returns a [`Diff`] borrowing both trees. The comparison cannot fail.
pub fn compute_diff<'a>(control: &'a Node, test: &'a Node, config: &DiffConfig) -> Diff<'a> {
    compute_diff_with_listeners(control, test, config, &mut [])
}

/// Compares two trees, reporting every comparison to `listeners` in order.
///
/// Listeners see each comparison with its final severity, whether or not the
/// severity filter keeps it.
///
/// # Examples
///
/// ```
/// use xmldiff_rs::evaluator::ComparisonCounter;
/// use xmldiff_rs::{compute_diff_with_listeners, DiffConfig, Node};
///
/// let control: Node = Node::element("a").into();
/// let test: Node = Node::element("b").into();
///
/// let mut counter = ComparisonCounter::default();
/// let diff = compute_diff_with_listeners(
///     &control,
///     &test,
///     &DiffConfig::default(),
///     &mut [&mut counter],
/// );
///
/// assert_eq!(counter.total(), diff.comparison_count());
/// ```
pub fn compute_diff_with_listeners<'a>(
    control: &'a Node,
    test: &'a Node,
    config: &DiffConfig,
    listeners: &mut [&mut dyn ComparisonListener],
) -> Diff<'a> {
    debug!(
        control = control.type_name(),
        test = test.type_name(),
        "starting comparison"
    );

    let mut session = Session::new(config, listeners);
    let halted = session.compare_roots(control, test).is_err();

    debug!(
        comparisons = session.comparisons,
        differences = session.differences.len(),
        halted,
        "comparison finished"
    );

    Diff {
        control,
        test,
        differences: session.differences,
        comparisons: session.comparisons,
        halted,
    }
}

/// Signals that the controller stopped the walk.
struct Halted;

type Walk = Result<(), Halted>;

/// State of one comparison run.
struct Session<'a, 's, 'm> {
    config: &'s DiffConfig,
    listeners: &'s mut [&'m mut dyn ComparisonListener],
    control_ctx: XPathContext,
    test_ctx: XPathContext,
    differences: Vec<Difference<'a>>,
    comparisons: usize,
    has_differences: bool,
}

impl<'a, 's, 'm> Session<'a, 's, 'm> {
    fn new(config: &'s DiffConfig, listeners: &'s mut [&'m mut dyn ComparisonListener]) -> Self {
        Self {
            config,
            listeners,
            control_ctx: XPathContext::with_namespaces(&config.namespace_context),
            test_ctx: XPathContext::with_namespaces(&config.namespace_context),
            differences: Vec::new(),
            comparisons: 0,
            has_differences: false,
        }
    }

    fn compare_roots(&mut self, control: &'a Node, test: &'a Node) -> Walk {
        enter_root(&mut self.control_ctx, control);
        enter_root(&mut self.test_ctx, test);
        self.compare_nodes(control, test)
    }

    /// Runs one comparison through the evaluation pipeline.
    fn emit(&mut self, comparison: Comparison<'a>) -> Walk {
        let outcome = default_severity(&comparison, comparison.raw_outcome());
        let outcome = self
            .config
            .difference_evaluator
            .evaluate(&comparison, outcome);
        self.comparisons += 1;

        trace!(
            comparison = ?comparison.comparison_type(),
            xpath = comparison.control().xpath.as_deref().or(comparison.test().xpath.as_deref()),
            %outcome,
            "comparison performed"
        );

        for listener in self.listeners.iter_mut() {
            listener.comparison_performed(&comparison, outcome);
        }

        self.has_differences |= outcome.is_difference();
        let halt = self
            .config
            .controller
            .should_halt(outcome, self.has_differences);

        if self.config.severity_filter.accepts(outcome) {
            self.differences.push(Difference {
                comparison,
                severity: outcome,
            });
        }

        if halt {
            Err(Halted)
        } else {
            Ok(())
        }
    }

    /// Emits a comparison between the current positions of both sides.
    fn compare(
        &mut self,
        comparison_type: ComparisonType,
        control: Target<'a>,
        control_value: Option<Value>,
        test: Target<'a>,
        test_value: Option<Value>,
    ) -> Walk {
        let control = Detail::new(
            control,
            self.control_ctx.xpath(),
            self.control_ctx.parent_xpath(),
            control_value,
        );
        let test = Detail::new(
            test,
            self.test_ctx.xpath(),
            self.test_ctx.parent_xpath(),
            test_value,
        );
        self.emit(Comparison::new(comparison_type, control, test))
    }

    fn compare_nodes(&mut self, control: &'a Node, test: &'a Node) -> Walk {
        self.compare(
            ComparisonType::NodeType,
            Target::Node(control),
            Some(control.node_type().into()),
            Target::Node(test),
            Some(test.node_type().into()),
        )?;
        if control.node_type() != test.node_type() {
            return Ok(());
        }

        match control {
            Node::Document(c) => {
                let Node::Document(t) = test else {
                    return Ok(());
                };
                self.compare_documents(control, c, test, t)?;
                self.compare_children(control, test)
            }
            Node::Element(c) => {
                let Node::Element(t) = test else {
                    return Ok(());
                };
                self.compare_elements(control, c, test, t)?;
                self.compare_children(control, test)
            }
            Node::Text(c) => self.compare_text(ComparisonType::TextValue, control, c, test),
            Node::CData(c) => self.compare_text(ComparisonType::CdataValue, control, c, test),
            Node::Comment(c) => self.compare_text(ComparisonType::CommentValue, control, c, test),
            Node::ProcessingInstruction(c) => {
                let Node::ProcessingInstruction(t) = test else {
                    return Ok(());
                };
                self.compare(
                    ComparisonType::ProcessingInstructionTarget,
                    Target::Node(control),
                    Some(c.target.as_str().into()),
                    Target::Node(test),
                    Some(t.target.as_str().into()),
                )?;
                self.compare(
                    ComparisonType::ProcessingInstructionData,
                    Target::Node(control),
                    Some(c.data.as_str().into()),
                    Target::Node(test),
                    Some(t.data.as_str().into()),
                )
            }
            Node::DocumentType(_) => self.compare_doctypes(control, test),
        }
    }

    fn compare_text(
        &mut self,
        comparison_type: ComparisonType,
        control: &'a Node,
        control_text: &str,
        test: &'a Node,
    ) -> Walk {
        let test_text = match test {
            Node::Text(t) | Node::CData(t) | Node::Comment(t) => t.as_str(),
            _ => return Ok(()),
        };
        self.compare(
            comparison_type,
            Target::Node(control),
            Some(control_text.into()),
            Target::Node(test),
            Some(test_text.into()),
        )
    }

    fn compare_documents(
        &mut self,
        control_node: &'a Node,
        control: &'a Document,
        test_node: &'a Node,
        test: &'a Document,
    ) -> Walk {
        let control_doctype = doctype_node(control);
        let test_doctype = doctype_node(test);
        self.compare(
            ComparisonType::HasDoctypeDeclaration,
            Target::Node(control_node),
            Some(control_doctype.is_some().into()),
            Target::Node(test_node),
            Some(test_doctype.is_some().into()),
        )?;
        if let (Some(c), Some(t)) = (control_doctype, test_doctype) {
            self.compare_doctypes(c, t)?;
        }

        if self.config.compare_xml_declaration {
            self.compare(
                ComparisonType::XmlVersion,
                Target::Node(control_node),
                Some(control.version.as_str().into()),
                Target::Node(test_node),
                Some(test.version.as_str().into()),
            )?;
            self.compare(
                ComparisonType::XmlStandalone,
                Target::Node(control_node),
                Some(control.standalone.into()),
                Target::Node(test_node),
                Some(test.standalone.into()),
            )?;
            self.compare(
                ComparisonType::XmlEncoding,
                Target::Node(control_node),
                control.encoding.as_deref().map(Value::from),
                Target::Node(test_node),
                test.encoding.as_deref().map(Value::from),
            )?;
        }
        Ok(())
    }

    fn compare_doctypes(&mut self, control: &'a Node, test: &'a Node) -> Walk {
        let (Node::DocumentType(c), Node::DocumentType(t)) = (control, test) else {
            return Ok(());
        };
        self.compare(
            ComparisonType::DoctypeName,
            Target::Node(control),
            Some(c.name.as_str().into()),
            Target::Node(test),
            Some(t.name.as_str().into()),
        )?;
        self.compare(
            ComparisonType::DoctypePublicId,
            Target::Node(control),
            c.public_id.as_deref().map(Value::from),
            Target::Node(test),
            t.public_id.as_deref().map(Value::from),
        )?;
        self.compare(
            ComparisonType::DoctypeSystemId,
            Target::Node(control),
            c.system_id.as_deref().map(Value::from),
            Target::Node(test),
            t.system_id.as_deref().map(Value::from),
        )
    }

    fn compare_elements(
        &mut self,
        control_node: &'a Node,
        control: &'a Element,
        test_node: &'a Node,
        test: &'a Element,
    ) -> Walk {
        let c = Target::Node(control_node);
        let t = Target::Node(test_node);

        self.compare(
            ComparisonType::ElementTagName,
            c,
            Some(control.name.local_name.as_str().into()),
            t,
            Some(test.name.local_name.as_str().into()),
        )?;
        self.compare(
            ComparisonType::NamespaceUri,
            c,
            control.name.namespace_uri().map(Value::from),
            t,
            test.name.namespace_uri().map(Value::from),
        )?;
        self.compare(
            ComparisonType::NamespacePrefix,
            c,
            non_empty(&control.name.prefix).map(Value::from),
            t,
            non_empty(&test.name.prefix).map(Value::from),
        )?;

        let control_attrs = self.split_attributes(control);
        let test_attrs = self.split_attributes(test);

        self.compare(
            ComparisonType::ElementNumAttributes,
            c,
            Some(control_attrs.ordinary.len().into()),
            t,
            Some(test_attrs.ordinary.len().into()),
        )?;

        for &attr in &control_attrs.ordinary {
            match test_attrs.find(&attr.name) {
                Some(test_attr) => self.compare_attributes(attr, test_attr)?,
                None => {
                    self.control_ctx.navigate_to_attribute(&attr.name);
                    let result = self.compare(
                        ComparisonType::AttrNameLookup,
                        Target::Attribute(attr),
                        Some(attr.name.clone().into()),
                        t,
                        None,
                    );
                    self.control_ctx.navigate_to_parent();
                    result?;
                }
            }
        }

        self.compare(
            ComparisonType::SchemaLocation,
            c,
            control_attrs.schema_location.map(|a| a.value.as_str().into()),
            t,
            test_attrs.schema_location.map(|a| a.value.as_str().into()),
        )?;
        self.compare(
            ComparisonType::NoNamespaceSchemaLocation,
            c,
            control_attrs
                .no_namespace_schema_location
                .map(|a| a.value.as_str().into()),
            t,
            test_attrs
                .no_namespace_schema_location
                .map(|a| a.value.as_str().into()),
        )?;

        for &attr in &test_attrs.ordinary {
            if control_attrs.find(&attr.name).is_none() {
                self.test_ctx.navigate_to_attribute(&attr.name);
                let result = self.compare(
                    ComparisonType::AttrNameLookup,
                    c,
                    None,
                    Target::Attribute(attr),
                    Some(attr.name.clone().into()),
                );
                self.test_ctx.navigate_to_parent();
                result?;
            }
        }
        Ok(())
    }

    fn compare_attributes(&mut self, control: &'a Attribute, test: &'a Attribute) -> Walk {
        self.control_ctx.navigate_to_attribute(&control.name);
        self.test_ctx.navigate_to_attribute(&test.name);
        let result = self
            .compare(
                ComparisonType::AttrValueExplicitlySpecified,
                Target::Attribute(control),
                Some(control.specified.into()),
                Target::Attribute(test),
                Some(test.specified.into()),
            )
            .and_then(|()| {
                self.compare(
                    ComparisonType::AttrValue,
                    Target::Attribute(control),
                    Some(control.value.as_str().into()),
                    Target::Attribute(test),
                    Some(test.value.as_str().into()),
                )
            });
        self.control_ctx.navigate_to_parent();
        self.test_ctx.navigate_to_parent();
        result
    }

    fn split_attributes(&self, element: &'a Element) -> SplitAttributes<'a> {
        let mut split = SplitAttributes::default();
        for attr in &element.attributes {
            if attr.name.is_namespace_declaration() || !(self.config.attribute_filter)(attr) {
                continue;
            }
            match (attr.name.namespace_uri(), attr.name.local_name.as_str()) {
                (Some(XSI_NAMESPACE), "schemaLocation") => split.schema_location = Some(attr),
                (Some(XSI_NAMESPACE), "noNamespaceSchemaLocation") => {
                    split.no_namespace_schema_location = Some(attr)
                }
                _ => split.ordinary.push(attr),
            }
        }
        split
    }

    fn compare_children(&mut self, control: &'a Node, test: &'a Node) -> Walk {
        let control_children = self.filtered_children(control);
        let test_children = self.filtered_children(test);

        self.compare(
            ComparisonType::ChildNodelistLength,
            Target::Node(control),
            Some(control_children.len().into()),
            Target::Node(test),
            Some(test_children.len().into()),
        )?;

        self.control_ctx
            .register_children(control_children.iter().map(|&n| NodeInfo::from(n)));
        self.test_ctx
            .register_children(test_children.iter().map(|&n| NodeInfo::from(n)));

        let matching = self
            .config
            .node_matcher
            .match_nodes(&control_children, &test_children);
        let test_ranks = matching.test_ranks();

        for (position, (&(ci, ti), &test_rank)) in
            matching.pairs.iter().zip(&test_ranks).enumerate()
        {
            let c = control_children[ci];
            let t = test_children[ti];
            self.in_children(Some(ci), Some(ti), |s| {
                s.compare(
                    ComparisonType::ChildNodelistSequence,
                    Target::Node(c),
                    Some(position.into()),
                    Target::Node(t),
                    Some(test_rank.into()),
                )?;
                s.compare_nodes(c, t)
            })?;
        }

        for &ci in &matching.unmatched_control {
            let c = control_children[ci];
            self.in_children(Some(ci), None, |s| {
                let control = Detail::new(
                    Target::Node(c),
                    s.control_ctx.xpath(),
                    s.control_ctx.parent_xpath(),
                    Some(lookup_value(c)),
                );
                let test = Detail::absent(s.test_ctx.xpath());
                s.emit(Comparison::new(ComparisonType::ChildLookup, control, test))
            })?;
        }

        for &ti in &matching.unmatched_test {
            let t = test_children[ti];
            self.in_children(None, Some(ti), |s| {
                let control = Detail::absent(s.control_ctx.xpath());
                let test = Detail::new(
                    Target::Node(t),
                    s.test_ctx.xpath(),
                    s.test_ctx.parent_xpath(),
                    Some(lookup_value(t)),
                );
                s.emit(Comparison::new(ComparisonType::ChildLookup, control, test))
            })?;
        }

        Ok(())
    }

    /// Descends into the given children for the duration of `f`; the path
    /// trackers are restored on every exit, including a halt.
    fn in_children<F>(&mut self, control: Option<usize>, test: Option<usize>, f: F) -> Walk
    where
        F: FnOnce(&mut Self) -> Walk,
    {
        if let Some(i) = control {
            self.control_ctx.navigate_to_child(i);
        }
        if let Some(i) = test {
            self.test_ctx.navigate_to_child(i);
        }
        let result = f(self);
        if control.is_some() {
            self.control_ctx.navigate_to_parent();
        }
        if test.is_some() {
            self.test_ctx.navigate_to_parent();
        }
        result
    }

    fn filtered_children(&self, node: &'a Node) -> Vec<&'a Node> {
        node.children()
            .iter()
            .filter(|&n| (self.config.node_filter)(n))
            .collect()
    }
}

#[derive(Default)]
struct SplitAttributes<'a> {
    ordinary: Vec<&'a Attribute>,
    schema_location: Option<&'a Attribute>,
    no_namespace_schema_location: Option<&'a Attribute>,
}

impl<'a> SplitAttributes<'a> {
    fn find(&self, name: &QName) -> Option<&'a Attribute> {
        self.ordinary.iter().copied().find(|a| &a.name == name)
    }
}

fn enter_root(ctx: &mut XPathContext, root: &Node) {
    if !matches!(root, Node::Document(_)) {
        ctx.register_children([NodeInfo::from(root)]);
        ctx.navigate_to_child(0);
    }
}

fn doctype_node(document: &Document) -> Option<&Node> {
    document
        .children
        .iter()
        .find(|n| matches!(n, Node::DocumentType(_)))
}

fn lookup_value(node: &Node) -> Value {
    match node.qname() {
        Some(name) => Value::QName(name.clone()),
        None => Value::NodeType(node.node_type()),
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}
