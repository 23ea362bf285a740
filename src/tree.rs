//! Tree representation for XML documents.
//!
//! Trees are plain owned values: containers own their children, so a tree is
//! always finite and acyclic and stays immutable while it is being compared.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace URI bound to the `xmlns` attribute family.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Namespace URI of the `xsi:` attributes (schema locations).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A qualified name: local name plus optional namespace URI and prefix.
///
/// Two names are equal when their namespace URI and local name are equal;
/// the prefix is presentation only and does not take part in equality.
#[derive(Debug, Clone, Eq)]
pub struct QName {
    pub local_name: String,
    pub namespace_uri: Option<String>,
    pub prefix: Option<String>,
}

impl QName {
    /// Creates a name without namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            namespace_uri: None,
            prefix: None,
        }
    }

    /// Creates a namespaced name without prefix.
    pub fn ns(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            namespace_uri: Some(namespace_uri.into()),
            prefix: None,
        }
    }

    /// Sets the prefix used when the name is serialized.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns the name as written in a document (`prefix:local` or `local`).
    pub fn prefixed(&self) -> String {
        match &self.prefix {
            Some(p) if !p.is_empty() => format!("{}:{}", p, self.local_name),
            _ => self.local_name.clone(),
        }
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref().filter(|uri| !uri.is_empty())
    }

    pub fn is_namespace_declaration(&self) -> bool {
        self.namespace_uri() == Some(XMLNS_NAMESPACE)
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local_name == other.local_name && self.namespace_uri() == other.namespace_uri()
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_name.hash(state);
        self.namespace_uri().hash(state);
    }
}

/// Clark notation: `{uri}local`, or just `local` without namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace_uri() {
            Some(uri) => write!(f, "{{{}}}{}", uri, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// An attribute of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
    /// False when the value was supplied by a DTD default rather than the document.
    pub specified: bool,
}

impl Attribute {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            specified: true,
        }
    }

    /// Marks the attribute as defaulted (not explicitly specified).
    pub fn defaulted(mut self) -> Self {
        self.specified = false;
        self
    }
}

/// An element with its attributes and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute without namespace.
    pub fn attr(mut self, local_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push(Attribute::new(QName::local(local_name), value));
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn attribute(&self, name: &QName) -> Option<&Attribute> {
        self.attributes.iter().find(|a| &a.name == name)
    }

    /// Concatenated content of the direct Text and CDATA children.
    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter_map(Node::character_data)
            .collect()
    }

    /// Element children, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }
}

/// A processing instruction `<?target data?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub target: String,
    pub data: String,
}

/// A document type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentType {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// A document node with its XML declaration and top-level children.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: bool,
    pub children: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: None,
            standalone: false,
            children: Vec::new(),
        }
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn doctype(&self) -> Option<&DocumentType> {
        self.children.iter().find_map(|n| match n {
            Node::DocumentType(dt) => Some(dt),
            _ => None,
        })
    }

    pub fn root_element(&self) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of a node, used for NODE_TYPE comparisons and path rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
    DocumentType,
}

impl NodeType {
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Document => "document",
            NodeType::Element => "element",
            NodeType::Attribute => "attribute",
            NodeType::Text => "text",
            NodeType::CData => "cdata",
            NodeType::Comment => "comment",
            NodeType::ProcessingInstruction => "processing instruction",
            NodeType::DocumentType => "document type",
        }
    }

    /// Text and CDATA both carry character data.
    pub fn is_character_data(&self) -> bool {
        matches!(self, NodeType::Text | NodeType::CData)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of an XML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Document(Document),
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(ProcessingInstruction),
    DocumentType(DocumentType),
}

impl Node {
    /// Shorthand for an element without namespace.
    pub fn element(local_name: impl Into<String>) -> Element {
        Element::new(QName::local(local_name))
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(text.into())
    }

    pub fn cdata(text: impl Into<String>) -> Node {
        Node::CData(text.into())
    }

    pub fn comment(text: impl Into<String>) -> Node {
        Node::Comment(text.into())
    }

    pub fn processing_instruction(target: impl Into<String>, data: impl Into<String>) -> Node {
        Node::ProcessingInstruction(ProcessingInstruction {
            target: target.into(),
            data: data.into(),
        })
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Document(_) => NodeType::Document,
            Node::Element(_) => NodeType::Element,
            Node::Text(_) => NodeType::Text,
            Node::CData(_) => NodeType::CData,
            Node::Comment(_) => NodeType::Comment,
            Node::ProcessingInstruction(_) => NodeType::ProcessingInstruction,
            Node::DocumentType(_) => NodeType::DocumentType,
        }
    }

    pub fn type_name(&self) -> &str {
        self.node_type().name()
    }

    /// The qualified name of elements, `None` for every other kind.
    pub fn qname(&self) -> Option<&QName> {
        match self {
            Node::Element(e) => Some(&e.name),
            _ => None,
        }
    }

    /// Children of container nodes; leaves have none.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document(d) => &d.children,
            Node::Element(e) => &e.children,
            _ => &[],
        }
    }

    /// Content of Text and CDATA nodes.
    pub fn character_data(&self) -> Option<&str> {
        match self {
            Node::Text(s) | Node::CData(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a short preview of the node, truncated to `max_len` characters.
    pub fn preview(&self, max_len: usize) -> String {
        let preview = match self {
            Node::Document(_) => "#document".to_string(),
            Node::Element(e) => {
                let mut s = format!("<{}", e.name.prefixed());
                for a in &e.attributes {
                    s.push_str(&format!(" {}=\"{}\"", a.name.prefixed(), a.value));
                }
                if e.children.is_empty() {
                    s.push_str("/>");
                } else {
                    s.push_str(">...</");
                    s.push_str(&e.name.prefixed());
                    s.push('>');
                }
                s
            }
            Node::Text(t) => t.clone(),
            Node::CData(t) => format!("<![CDATA[{}]]>", t),
            Node::Comment(t) => format!("<!--{}-->", t),
            Node::ProcessingInstruction(pi) => format!("<?{} {}?>", pi.target, pi.data),
            Node::DocumentType(dt) => format!("<!DOCTYPE {}>", dt.name),
        };
        truncate(preview, max_len)
    }

    /// Removes comment nodes from the whole subtree.
    ///
    /// Text on both sides of a removed comment becomes one text node.
    pub fn without_comments(&self) -> Node {
        self.map_children(&|children| {
            let mut kept: Vec<Node> = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    Node::Comment(_) => {}
                    Node::Text(text) => match kept.last_mut() {
                        Some(Node::Text(previous)) => previous.push_str(text),
                        _ => kept.push(Node::Text(text.clone())),
                    },
                    other => kept.push(other.without_comments()),
                }
            }
            kept
        })
    }

    /// Trims text content and drops text nodes that become empty.
    pub fn trim_whitespace(&self) -> Node {
        self.map_children(&|children| {
            children
                .iter()
                .filter_map(|c| match c {
                    Node::Text(t) => {
                        let trimmed = t.trim();
                        (!trimmed.is_empty()).then(|| Node::Text(trimmed.to_string()))
                    }
                    Node::CData(t) => Some(Node::CData(t.trim().to_string())),
                    other => Some(other.trim_whitespace()),
                })
                .collect()
        })
    }

    /// Like [`Node::trim_whitespace`], additionally collapsing whitespace runs
    /// inside text into single spaces.
    pub fn normalize_whitespace(&self) -> Node {
        self.map_children(&|children| {
            children
                .iter()
                .filter_map(|c| match c {
                    Node::Text(t) => {
                        let normalized = collapse_whitespace(t);
                        (!normalized.is_empty()).then_some(Node::Text(normalized))
                    }
                    Node::CData(t) => Some(Node::CData(collapse_whitespace(t))),
                    other => Some(other.normalize_whitespace()),
                })
                .collect()
        })
    }

    fn map_children(&self, f: &dyn Fn(&[Node]) -> Vec<Node>) -> Node {
        match self {
            Node::Document(d) => Node::Document(Document {
                children: f(&d.children),
                ..d.clone()
            }),
            Node::Element(e) => Node::Element(Element {
                name: e.name.clone(),
                attributes: e.attributes.clone(),
                children: f(&e.children),
            }),
            other => other.clone(),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<Document> for Node {
    fn from(d: Document) -> Self {
        Node::Document(d)
    }
}

impl From<DocumentType> for Node {
    fn from(dt: DocumentType) -> Self {
        Node::DocumentType(dt)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn truncate(s: String, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s
    }
}
