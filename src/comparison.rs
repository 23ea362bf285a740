//! The comparison taxonomy: what was compared, where, and how it came out.

use crate::tree::{Attribute, Node, NodeType, QName};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// The kind of fact a [`Comparison`] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonType {
    /// Do both documents declare a document type?
    HasDoctypeDeclaration,
    DoctypeName,
    DoctypePublicId,
    DoctypeSystemId,
    /// `xsi:schemaLocation` of an element.
    SchemaLocation,
    /// `xsi:noNamespaceSchemaLocation` of an element.
    NoNamespaceSchemaLocation,
    NodeType,
    NamespacePrefix,
    NamespaceUri,
    TextValue,
    CdataValue,
    CommentValue,
    ProcessingInstructionTarget,
    ProcessingInstructionData,
    ElementTagName,
    ElementNumAttributes,
    AttrValue,
    /// Was the attribute specified in the document rather than defaulted?
    AttrValueExplicitlySpecified,
    /// Does an attribute of one element exist on the other?
    AttrNameLookup,
    ChildNodelistLength,
    /// Relative position of a matched child among the matched siblings.
    ChildNodelistSequence,
    /// Does a child of one node have a counterpart on the other side?
    ChildLookup,
    XmlVersion,
    XmlStandalone,
    XmlEncoding,
}

impl ComparisonType {
    pub const ALL: [ComparisonType; 25] = [
        ComparisonType::HasDoctypeDeclaration,
        ComparisonType::DoctypeName,
        ComparisonType::DoctypePublicId,
        ComparisonType::DoctypeSystemId,
        ComparisonType::SchemaLocation,
        ComparisonType::NoNamespaceSchemaLocation,
        ComparisonType::NodeType,
        ComparisonType::NamespacePrefix,
        ComparisonType::NamespaceUri,
        ComparisonType::TextValue,
        ComparisonType::CdataValue,
        ComparisonType::CommentValue,
        ComparisonType::ProcessingInstructionTarget,
        ComparisonType::ProcessingInstructionData,
        ComparisonType::ElementTagName,
        ComparisonType::ElementNumAttributes,
        ComparisonType::AttrValue,
        ComparisonType::AttrValueExplicitlySpecified,
        ComparisonType::AttrNameLookup,
        ComparisonType::ChildNodelistLength,
        ComparisonType::ChildNodelistSequence,
        ComparisonType::ChildLookup,
        ComparisonType::XmlVersion,
        ComparisonType::XmlStandalone,
        ComparisonType::XmlEncoding,
    ];

    /// Human readable description used in difference messages.
    pub fn description(&self) -> &'static str {
        match self {
            ComparisonType::HasDoctypeDeclaration => "has doctype declaration",
            ComparisonType::DoctypeName => "doctype name",
            ComparisonType::DoctypePublicId => "doctype public id",
            ComparisonType::DoctypeSystemId => "doctype system id",
            ComparisonType::SchemaLocation => "schema location",
            ComparisonType::NoNamespaceSchemaLocation => "no namespace schema location",
            ComparisonType::NodeType => "node type",
            ComparisonType::NamespacePrefix => "namespace prefix",
            ComparisonType::NamespaceUri => "namespace URI",
            ComparisonType::TextValue => "text value",
            ComparisonType::CdataValue => "CDATA value",
            ComparisonType::CommentValue => "comment value",
            ComparisonType::ProcessingInstructionTarget => "processing instruction target",
            ComparisonType::ProcessingInstructionData => "processing instruction data",
            ComparisonType::ElementTagName => "element tag name",
            ComparisonType::ElementNumAttributes => "number of attributes",
            ComparisonType::AttrValue => "attribute value",
            ComparisonType::AttrValueExplicitlySpecified => "attribute value explicitly specified",
            ComparisonType::AttrNameLookup => "attribute name",
            ComparisonType::ChildNodelistLength => "child nodelist length",
            ComparisonType::ChildNodelistSequence => "child nodelist sequence",
            ComparisonType::ChildLookup => "child",
            ComparisonType::XmlVersion => "xml version",
            ComparisonType::XmlStandalone => "xml standalone",
            ComparisonType::XmlEncoding => "xml encoding",
        }
    }

    /// Types that describe the document prolog rather than its content.
    pub fn is_prolog(&self) -> bool {
        matches!(
            self,
            ComparisonType::HasDoctypeDeclaration
                | ComparisonType::DoctypeName
                | ComparisonType::DoctypePublicId
                | ComparisonType::DoctypeSystemId
                | ComparisonType::XmlVersion
                | ComparisonType::XmlStandalone
                | ComparisonType::XmlEncoding
        )
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of a comparison, ordered by gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Equal,
    /// Different, but conventionally tolerable.
    Similar,
    Different,
}

impl Severity {
    pub fn is_difference(&self) -> bool {
        *self != Severity::Equal
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Equal => "EQUAL",
            Severity::Similar => "SIMILAR",
            Severity::Different => "DIFFERENT",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of severities a result retains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityFilter(BTreeSet<Severity>);

impl SeverityFilter {
    /// Keeps only real differences: a "similar" check.
    pub fn similar() -> Self {
        Self::of([Severity::Different])
    }

    /// Keeps every discrepancy: an "identical" check.
    pub fn identical() -> Self {
        Self::of([Severity::Similar, Severity::Different])
    }

    pub fn of<I: IntoIterator<Item = Severity>>(severities: I) -> Self {
        Self(severities.into_iter().collect())
    }

    pub fn accepts(&self, severity: Severity) -> bool {
        self.0.contains(&severity)
    }

    pub fn severities(&self) -> impl Iterator<Item = &Severity> {
        self.0.iter()
    }
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self::identical()
    }
}

/// What a run checks for: similarity keeps DIFFERENT outcomes only,
/// identity keeps SIMILAR ones too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckFor {
    Similar,
    #[default]
    Identical,
}

impl From<CheckFor> for SeverityFilter {
    fn from(check: CheckFor) -> Self {
        match check {
            CheckFor::Similar => SeverityFilter::similar(),
            CheckFor::Identical => SeverityFilter::identical(),
        }
    }
}

/// A compared value. `None` on a [`Detail`] means "nothing on this side".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(usize),
    Bool(bool),
    NodeType(NodeType),
    QName(QName),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::NodeType(t) => f.write_str(t.name()),
            Value::QName(q) => write!(f, "{}", q.prefixed()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NodeType> for Value {
    fn from(t: NodeType) -> Self {
        Value::NodeType(t)
    }
}

impl From<QName> for Value {
    fn from(q: QName) -> Self {
        Value::QName(q)
    }
}

/// What a detail points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    Node(&'a Node),
    Attribute(&'a Attribute),
}

impl Target<'_> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Target::Node(n) => n.node_type(),
            Target::Attribute(_) => NodeType::Attribute,
        }
    }

    pub fn preview(&self, max_len: usize) -> String {
        match self {
            Target::Node(n) => n.preview(max_len),
            Target::Attribute(a) => format!("{}=\"{}\"", a.name.prefixed(), a.value),
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail<'a> {
    pub target: Option<Target<'a>>,
    pub xpath: Option<String>,
    pub parent_xpath: Option<String>,
    pub value: Option<Value>,
}

impl<'a> Detail<'a> {
    pub fn new(target: Target<'a>, xpath: String, parent_xpath: String, value: Option<Value>) -> Self {
        Self {
            target: Some(target),
            xpath: Some(xpath),
            parent_xpath: Some(parent_xpath),
            value,
        }
    }

    /// A side where no node exists; only the parent location is known.
    pub fn absent(parent_xpath: String) -> Self {
        Self {
            target: None,
            xpath: None,
            parent_xpath: Some(parent_xpath),
            value: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.target.is_none()
    }
}

/// An atomic fact checked between a control location and a test location.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison<'a> {
    comparison_type: ComparisonType,
    control: Detail<'a>,
    test: Detail<'a>,
}

impl<'a> Comparison<'a> {
    pub fn new(comparison_type: ComparisonType, control: Detail<'a>, test: Detail<'a>) -> Self {
        Self {
            comparison_type,
            control,
            test,
        }
    }

    pub fn comparison_type(&self) -> ComparisonType {
        self.comparison_type
    }

    pub fn control(&self) -> &Detail<'a> {
        &self.control
    }

    pub fn test(&self) -> &Detail<'a> {
        &self.test
    }

    /// Plain value equality of both sides.
    pub fn raw_outcome(&self) -> Severity {
        if self.control.value == self.test.value {
            Severity::Equal
        } else {
            Severity::Different
        }
    }
}

/// The fixed per-type tolerance rule applied before any caller override.
///
/// Some discrepancies are conventionally tolerable and are reported as
/// [`Severity::Similar`] instead of [`Severity::Different`].
pub fn default_severity(comparison: &Comparison<'_>, outcome: Severity) -> Severity {
    if outcome != Severity::Different {
        return outcome;
    }
    match comparison.comparison_type() {
        ComparisonType::NodeType if is_text_cdata_with_equal_content(comparison) => {
            Severity::Similar
        }
        ComparisonType::HasDoctypeDeclaration
        | ComparisonType::DoctypeSystemId
        | ComparisonType::SchemaLocation
        | ComparisonType::NoNamespaceSchemaLocation
        | ComparisonType::NamespacePrefix
        | ComparisonType::AttrValueExplicitlySpecified
        | ComparisonType::XmlEncoding => Severity::Similar,
        _ => outcome,
    }
}

fn is_text_cdata_with_equal_content(comparison: &Comparison<'_>) -> bool {
    match (comparison.control().target, comparison.test().target) {
        (Some(Target::Node(c)), Some(Target::Node(t))) => {
            c.node_type() != t.node_type()
                && c.node_type().is_character_data()
                && t.node_type().is_character_data()
                && c.character_data() == t.character_data()
        }
        _ => false,
    }
}
