//! Element selectors: may two sibling elements be paired for comparison?
//!
//! A selector is a pure predicate over a control and a test element. Every
//! stock selector requires equal qualified names and then applies its own
//! compatibility rule. Selectors compose with [`or`], [`and`], [`not`] and
//! [`conditional`].
//!
//! # Examples
//!
//! ```
//! use xmldiff_rs::selector::{self, ElementSelector};
//! use xmldiff_rs::tree::Node;
//!
//! let a = Node::element("item").attr("id", "1");
//! let b = Node::element("item").attr("id", "2");
//!
//! assert!(selector::by_name().can_be_compared(&a, &b));
//! assert!(!selector::by_name_and_attributes(["id"]).can_be_compared(&a, &b));
//! ```

use crate::tree::{Attribute, Element, Node, QName};
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a control element and a test element may correspond.
pub trait ElementSelector: Send + Sync {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool;
}

impl<F> ElementSelector for F
where
    F: Fn(&Element, &Element) -> bool + Send + Sync,
{
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        self(control, test)
    }
}

/// Shared, type-erased selector.
pub type SharedSelector = Arc<dyn ElementSelector>;

/// Pairs elements with equal qualified names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByName;

impl ElementSelector for ByName {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        control.name == test.name
    }
}

/// Pairs elements with equal names and equal direct text content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByNameAndText;

impl ElementSelector for ByNameAndText {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        control.name == test.name && control.direct_text() == test.direct_text()
    }
}

/// Like [`ByNameAndText`], and every pair of corresponding descendants also
/// satisfies the rule.
///
/// Children are aligned positionally after dropping comments, processing
/// instructions and whitespace-only text. That text still takes part in each
/// element's own direct-text check, as it does for [`ByNameAndText`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ByNameAndTextRec;

impl ElementSelector for ByNameAndTextRec {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        if !ByNameAndText.can_be_compared(control, test) {
            return false;
        }
        let control_children = significant_children(control);
        let test_children = significant_children(test);
        control_children.len() == test_children.len()
            && control_children
                .iter()
                .zip(&test_children)
                .all(|(c, t)| match (c, t) {
                    (Node::Element(c), Node::Element(t)) => self.can_be_compared(c, t),
                    _ => match (c.character_data(), t.character_data()) {
                        (Some(c), Some(t)) => c == t,
                        _ => false,
                    },
                })
    }
}

fn significant_children(element: &Element) -> Vec<&Node> {
    element
        .children
        .iter()
        .filter(|n| match n {
            Node::Element(_) => true,
            Node::Text(t) => !t.trim().is_empty(),
            Node::CData(_) => true,
            _ => false,
        })
        .collect()
}

/// Pairs elements with equal names and equal values for a set of attributes.
///
/// An attribute missing on both sides counts as equal; an empty set of
/// attribute names degenerates to [`ByName`].
#[derive(Debug, Clone, Default)]
pub struct ByNameAndAttributes {
    attributes: Vec<QName>,
}

impl ByNameAndAttributes {
    pub fn new<I: IntoIterator<Item = QName>>(attributes: I) -> Self {
        Self {
            attributes: attributes.into_iter().collect(),
        }
    }
}

impl ElementSelector for ByNameAndAttributes {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        control.name == test.name && attributes_equal_for(control, test, self.attributes.iter())
    }
}

/// Like [`ByNameAndAttributes`], but attributes are given by local name and
/// their namespace is taken from the control element's attribute of that
/// local name (no namespace if the control element has none).
#[derive(Debug, Clone, Default)]
pub struct ByNameAndAttributesControlNs {
    local_names: Vec<String>,
}

impl ByNameAndAttributesControlNs {
    pub fn new<I, S>(local_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            local_names: local_names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ElementSelector for ByNameAndAttributesControlNs {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        if control.name != test.name {
            return false;
        }
        let by_local: HashMap<&str, &QName> = control
            .attributes
            .iter()
            .map(|a| (a.name.local_name.as_str(), &a.name))
            .collect();
        let names: Vec<QName> = self
            .local_names
            .iter()
            .map(|local| {
                by_local
                    .get(local.as_str())
                    .map(|q| (*q).clone())
                    .unwrap_or_else(|| QName::local(local.clone()))
            })
            .collect();
        attributes_equal_for(control, test, names.iter())
    }
}

/// Pairs elements with equal names and identical attribute sets,
/// regardless of attribute order. Namespace declarations are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByNameAndAllAttributes;

impl ElementSelector for ByNameAndAllAttributes {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        if control.name != test.name {
            return false;
        }
        let control_attrs = comparable_attributes(control);
        let test_attrs = comparable_attributes(test);
        control_attrs.len() == test_attrs.len()
            && control_attrs.iter().all(|a| {
                test_attrs
                    .iter()
                    .any(|b| a.name == b.name && a.value == b.value)
            })
    }
}

fn comparable_attributes(element: &Element) -> Vec<&Attribute> {
    element
        .attributes
        .iter()
        .filter(|a| !a.name.is_namespace_declaration())
        .collect()
}

fn attributes_equal_for<'q>(
    control: &Element,
    test: &Element,
    mut names: impl Iterator<Item = &'q QName>,
) -> bool {
    names.all(|name| {
        control.attribute(name).map(|a| &a.value) == test.attribute(name).map(|a| &a.value)
    })
}

struct Or(Vec<SharedSelector>);

impl ElementSelector for Or {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        self.0.iter().any(|s| s.can_be_compared(control, test))
    }
}

struct And(Vec<SharedSelector>);

impl ElementSelector for And {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        self.0.iter().all(|s| s.can_be_compared(control, test))
    }
}

struct Not(SharedSelector);

impl ElementSelector for Not {
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        control.name == test.name && !self.0.can_be_compared(control, test)
    }
}

struct Conditional<P> {
    predicate: P,
    selector: SharedSelector,
}

impl<P> ElementSelector for Conditional<P>
where
    P: Fn(&Element) -> bool + Send + Sync,
{
    fn can_be_compared(&self, control: &Element, test: &Element) -> bool {
        (self.predicate)(control) && self.selector.can_be_compared(control, test)
    }
}

pub fn by_name() -> SharedSelector {
    Arc::new(ByName)
}

pub fn by_name_and_text() -> SharedSelector {
    Arc::new(ByNameAndText)
}

pub fn by_name_and_text_rec() -> SharedSelector {
    Arc::new(ByNameAndTextRec)
}

/// Selector over attributes without namespace, given by local name.
pub fn by_name_and_attributes<I, S>(local_names: I) -> SharedSelector
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arc::new(ByNameAndAttributes::new(
        local_names.into_iter().map(|n| QName::local(n)),
    ))
}

pub fn by_name_and_attributes_control_ns<I, S>(local_names: I) -> SharedSelector
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arc::new(ByNameAndAttributesControlNs::new(local_names))
}

pub fn by_name_and_all_attributes() -> SharedSelector {
    Arc::new(ByNameAndAllAttributes)
}

/// Accepts a pair if any of the selectors does.
pub fn or<I: IntoIterator<Item = SharedSelector>>(selectors: I) -> SharedSelector {
    Arc::new(Or(selectors.into_iter().collect()))
}

/// Accepts a pair if all of the selectors do.
pub fn and<I: IntoIterator<Item = SharedSelector>>(selectors: I) -> SharedSelector {
    Arc::new(And(selectors.into_iter().collect()))
}

/// Accepts same-named pairs the given selector rejects.
pub fn not(selector: SharedSelector) -> SharedSelector {
    Arc::new(Not(selector))
}

/// Applies `selector` only to control elements satisfying `predicate`.
pub fn conditional<P>(predicate: P, selector: SharedSelector) -> SharedSelector
where
    P: Fn(&Element) -> bool + Send + Sync + 'static,
{
    Arc::new(Conditional {
        predicate,
        selector,
    })
}

/// Applies `selector` only to control elements with the given local name.
pub fn for_element_named(local_name: impl Into<String>, selector: SharedSelector) -> SharedSelector {
    let local_name = local_name.into();
    conditional(move |e: &Element| e.name.local_name == local_name, selector)
}
