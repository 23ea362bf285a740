//! Location tracking for the comparison walk.
//!
//! [`XPathContext`] follows the walk down the tree and renders the current
//! position as an XPath-like string such as `/a[1]/b[2]/@x`. Sibling indices
//! are assigned when a level's children are registered, so navigating back
//! and forth between siblings always reports the same index for the same
//! node.
//!
//! # Examples
//!
//! ```
//! use xmldiff_rs::xpath::{NodeInfo, XPathContext};
//! use xmldiff_rs::tree::QName;
//!
//! let mut ctx = XPathContext::new();
//! ctx.register_children(vec![NodeInfo::element(QName::local("a"))]);
//! ctx.navigate_to_child(0);
//! ctx.register_children(vec![
//!     NodeInfo::element(QName::local("b")),
//!     NodeInfo::element(QName::local("b")),
//! ]);
//! ctx.navigate_to_child(1);
//! assert_eq!(ctx.xpath(), "/a[1]/b[2]");
//! ```

use crate::tree::{Node, NodeType, QName};
use std::collections::{BTreeMap, HashMap};

const SEPARATOR: char = '/';
const ATTRIBUTE_MARKER: char = '@';

/// Prefix to namespace URI bindings used to render qualified names.
pub type NamespaceContext = BTreeMap<String, String>;

/// What the path tracker needs to know about a node to name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub node_type: NodeType,
    pub name: Option<QName>,
}

impl NodeInfo {
    pub fn element(name: QName) -> Self {
        Self {
            node_type: NodeType::Element,
            name: Some(name),
        }
    }

    pub fn of(node_type: NodeType) -> Self {
        Self {
            node_type,
            name: None,
        }
    }
}

impl From<&Node> for NodeInfo {
    fn from(node: &Node) -> Self {
        Self {
            node_type: node.node_type(),
            name: node.qname().cloned(),
        }
    }
}

/// One frame of the path: the expression of the node it stands for and the
/// pre-computed expressions of that node's registered children.
#[derive(Debug, Clone, Default)]
struct Level {
    expression: String,
    children: Vec<String>,
    attribute: bool,
}

/// Stateful tracker of the current position in a tree.
///
/// The tracker owns one frame per visited ancestor. It is created per
/// comparison run and never shared between runs.
#[derive(Debug, Clone)]
pub struct XPathContext {
    path: Vec<Level>,
    uri_to_prefix: HashMap<String, String>,
}

impl XPathContext {
    /// Creates a tracker positioned at the document root.
    pub fn new() -> Self {
        Self::with_namespaces(&NamespaceContext::new())
    }

    /// Creates a tracker that renders namespaced names with the given prefixes.
    pub fn with_namespaces(prefixes: &NamespaceContext) -> Self {
        let uri_to_prefix = prefixes
            .iter()
            .map(|(prefix, uri)| (uri.clone(), prefix.clone()))
            .collect();
        Self {
            path: vec![Level::default()],
            uri_to_prefix,
        }
    }

    /// Records the children of the current node and assigns each its
    /// 1-based occurrence index among siblings rendered with the same name.
    pub fn register_children<I>(&mut self, children: I)
    where
        I: IntoIterator<Item = NodeInfo>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let expressions = children
            .into_iter()
            .map(|info| {
                let name = self.render_name(&info);
                let count = counts.entry(name.clone()).or_insert(0);
                *count += 1;
                format!("{}[{}]", name, count)
            })
            .collect();
        self.current_mut().children = expressions;
    }

    /// Descends into the `index`th registered child.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range of the registered children; the walk
    /// only navigates to children it registered itself.
    pub fn navigate_to_child(&mut self, index: usize) {
        self.leave_attribute();
        let expression = self.current().children[index].clone();
        self.path.push(Level {
            expression,
            ..Level::default()
        });
    }

    /// Selects an attribute of the current element, replacing any attribute
    /// selected before.
    pub fn navigate_to_attribute(&mut self, name: &QName) {
        self.leave_attribute();
        let expression = format!("{}{}", ATTRIBUTE_MARKER, self.render_qname(name));
        self.path.push(Level {
            expression,
            children: Vec::new(),
            attribute: true,
        });
    }

    /// Returns to the previous frame. The root frame is never popped.
    pub fn navigate_to_parent(&mut self) {
        if self.path.len() > 1 {
            self.path.pop();
        }
    }

    /// Renders the full path to the current position.
    pub fn xpath(&self) -> String {
        render(&self.path)
    }

    /// Renders the path to the parent of the current position.
    pub fn parent_xpath(&self) -> String {
        render(&self.path[..self.path.len().saturating_sub(1).max(1)])
    }

    /// Drops the attribute selection so the element is current again.
    fn leave_attribute(&mut self) {
        if self.current().attribute {
            self.path.pop();
        }
    }

    fn current(&self) -> &Level {
        // the root frame is pushed in the constructor and never popped
        &self.path[self.path.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Level {
        let last = self.path.len() - 1;
        &mut self.path[last]
    }

    fn render_name(&self, info: &NodeInfo) -> String {
        match info.node_type {
            NodeType::Element => info
                .name
                .as_ref()
                .map(|n| self.render_qname(n))
                .unwrap_or_else(|| "*".to_string()),
            NodeType::Text | NodeType::CData => "text()".to_string(),
            NodeType::Comment => "comment()".to_string(),
            NodeType::ProcessingInstruction => "processing-instruction()".to_string(),
            _ => "node()".to_string(),
        }
    }

    fn render_qname(&self, name: &QName) -> String {
        match name
            .namespace_uri()
            .and_then(|uri| self.uri_to_prefix.get(uri))
        {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, name.local_name),
            _ => name.local_name.clone(),
        }
    }
}

impl Default for XPathContext {
    fn default() -> Self {
        Self::new()
    }
}

fn render(levels: &[Level]) -> String {
    let mut out = String::new();
    for level in levels.iter().skip(1) {
        out.push(SEPARATOR);
        out.push_str(&level.expression);
    }
    if out.is_empty() {
        out.push(SEPARATOR);
    }
    out
}
