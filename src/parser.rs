//! XML parsing into the [`Node`] tree.
//!
//! Documents are read with `quick-xml`'s namespace-aware reader. Element and
//! attribute names carry their resolved namespace URI and the prefix used in
//! the source. Adjacent text (including resolved entity references) is merged
//! into a single text node; whitespace outside the root element is dropped.
//!
//! # Examples
//!
//! ```
//! use xmldiff_rs::parser::{parse_str, ParseOptions};
//!
//! let doc = parse_str(r#"<a xmlns="urn:x"><b>text</b></a>"#, &ParseOptions::default()).unwrap();
//! let root = match &doc {
//!     xmldiff_rs::Node::Document(d) => d.root_element().unwrap(),
//!     _ => unreachable!(),
//! };
//! assert_eq!(root.name.namespace_uri(), Some("urn:x"));
//! ```

use crate::error::ParseError;
use crate::tree::{
    Attribute, Document, DocumentType, Element, Node, ProcessingInstruction, QName,
    XMLNS_NAMESPACE,
};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::fs;
use std::path::Path;
use tracing::debug;

const INLINE_SOURCE: &str = "<input>";

/// Normalisations applied to a parsed tree before comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Trim text and drop whitespace-only text nodes
    pub ignore_whitespace: bool,
    /// Like `ignore_whitespace`, also collapsing inner whitespace runs
    pub normalize_whitespace: bool,
    /// Drop comment nodes
    pub ignore_comments: bool,
}

impl ParseOptions {
    /// Applies the enabled normalisations to `node`.
    pub fn apply(&self, node: Node) -> Node {
        let node = if self.ignore_comments {
            node.without_comments()
        } else {
            node
        };
        if self.normalize_whitespace {
            node.normalize_whitespace()
        } else if self.ignore_whitespace {
            node.trim_whitespace()
        } else {
            node
        }
    }
}

/// Parses an XML file into a document node.
///
/// # Errors
///
/// This function will return an error if:
/// - The file does not exist (`ParseError::FileNotFound`)
/// - The file cannot be read (`ParseError::ReadError`)
/// - The content is not well-formed XML (`ParseError::Malformed`)
/// - The document has no root element (`ParseError::EmptyDocument`)
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Node, ParseError> {
    let name = path.to_string_lossy().to_string();
    if !path.exists() {
        return Err(ParseError::file_not_found(name));
    }

    let content = fs::read_to_string(path).map_err(|e| ParseError::read_error(&name, e))?;
    debug!(path = %name, bytes = content.len(), "parsing file");
    parse_named(&content, &name, options)
}

/// Parses an XML string into a document node.
pub fn parse_str(content: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    parse_named(content, INLINE_SOURCE, options)
}

fn parse_named(content: &str, source: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    let document = read_document(content, source)?;
    Ok(options.apply(Node::Document(document)))
}

fn read_document(content: &str, source: &str) -> Result<Document, ParseError> {
    let mut reader = NsReader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut document = Document::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        let malformed = |reader: &NsReader<&[u8]>, message: String| -> ParseError {
            ParseError::malformed(source, reader.buffer_position() as u64, message)
        };

        let result = reader
            .read_resolved_event()
            .map(|(resolved, event)| (owned_namespace(resolved), event));
        let (resolved, event) = match result {
            Ok(read) => read,
            Err(e) => return Err(malformed(&reader, e.to_string())),
        };

        match event {
            Event::Start(e) => {
                let element = read_element(&reader, resolved, &e)
                    .map_err(|message| malformed(&reader, message))?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = read_element(&reader, resolved, &e)
                    .map_err(|message| malformed(&reader, message))?;
                append(&mut stack, &mut document, Node::Element(element));
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    append(&mut stack, &mut document, Node::Element(element));
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| malformed(&reader, err.to_string()))?;
                append_text(&mut stack, text.into_owned());
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append(&mut stack, &mut document, Node::CData(text));
            }
            Event::Comment(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append(&mut stack, &mut document, Node::Comment(text));
            }
            Event::PI(e) => {
                let pi = ProcessingInstruction {
                    target: String::from_utf8_lossy(e.target()).into_owned(),
                    data: String::from_utf8_lossy(e.content()).trim().to_string(),
                };
                append(&mut stack, &mut document, Node::ProcessingInstruction(pi));
            }
            Event::Decl(e) => {
                read_declaration(&e, &mut document)
                    .map_err(|message| malformed(&reader, message))?;
            }
            Event::DocType(e) => {
                let doctype = parse_doctype(&String::from_utf8_lossy(&e));
                document.children.push(Node::DocumentType(doctype));
            }
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::malformed(
            source,
            content.len() as u64,
            format!("unclosed element <{}>", open.name.prefixed()),
        ));
    }
    if document.root_element().is_none() {
        return Err(ParseError::empty_document(source));
    }
    Ok(document)
}

/// Namespace resolution result detached from the reader's borrow.
enum Resolved {
    Bound(String),
    Unbound,
    Unknown(String),
}

fn owned_namespace(result: ResolveResult<'_>) -> Resolved {
    match result {
        ResolveResult::Bound(ns) => Resolved::Bound(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => Resolved::Unbound,
        ResolveResult::Unknown(prefix) => {
            Resolved::Unknown(String::from_utf8_lossy(&prefix).into_owned())
        }
    }
}

fn resolved_uri(resolved: Resolved) -> Result<Option<String>, String> {
    match resolved {
        Resolved::Bound(uri) => Ok(Some(uri).filter(|u| !u.is_empty())),
        Resolved::Unbound => Ok(None),
        Resolved::Unknown(prefix) => Err(format!("unknown namespace prefix '{}'", prefix)),
    }
}

fn read_element(
    reader: &NsReader<&[u8]>,
    resolved: Resolved,
    start: &BytesStart<'_>,
) -> Result<Element, String> {
    let name = start.name();
    let mut qname = QName {
        local_name: String::from_utf8_lossy(name.local_name().as_ref()).into_owned(),
        namespace_uri: resolved_uri(resolved)?,
        prefix: None,
    };
    if let Some(prefix) = name.prefix() {
        qname = qname.with_prefix(String::from_utf8_lossy(prefix.as_ref()).into_owned());
    }

    let mut element = Element::new(qname);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        let key = attr.key;

        let name = if key.as_namespace_binding().is_some() {
            // xmlns="..." is named "xmlns", xmlns:p="..." is named "p"
            let local = match key.prefix() {
                Some(_) => key.local_name().as_ref().to_vec(),
                None => b"xmlns".to_vec(),
            };
            QName::ns(XMLNS_NAMESPACE, String::from_utf8_lossy(&local).into_owned())
                .with_prefix("xmlns")
        } else {
            let (resolved, local) = reader.resolve_attribute(key);
            let mut name = QName {
                local_name: String::from_utf8_lossy(local.as_ref()).into_owned(),
                namespace_uri: resolved_uri(owned_namespace(resolved))?,
                prefix: None,
            };
            if let Some(prefix) = key.prefix() {
                name = name.with_prefix(String::from_utf8_lossy(prefix.as_ref()).into_owned());
            }
            name
        };
        element.attributes.push(Attribute::new(name, value));
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>, document: &mut Document) -> Result<(), String> {
    let version = decl.version().map_err(|e| e.to_string())?;
    document.version = String::from_utf8_lossy(&version).into_owned();

    if let Some(encoding) = decl.encoding() {
        let encoding = encoding.map_err(|e| e.to_string())?;
        document.encoding = Some(String::from_utf8_lossy(&encoding).into_owned());
    }
    if let Some(standalone) = decl.standalone() {
        let standalone = standalone.map_err(|e| e.to_string())?;
        document.standalone = standalone.as_ref() == b"yes";
    }
    Ok(())
}

fn append(stack: &mut [Element], document: &mut Document, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.children.push(node),
    }
}

/// Text outside the root element is only whitespace and is dropped.
fn append_text(stack: &mut [Element], text: String) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if text.is_empty() {
        return;
    }
    match parent.children.last_mut() {
        Some(Node::Text(previous)) => previous.push_str(&text),
        _ => parent.children.push(Node::Text(text)),
    }
}

/// Parses the content of `<!DOCTYPE ...>`: the name and optional external id.
fn parse_doctype(content: &str) -> DocumentType {
    let content = content.trim();
    let (name, rest) = content
        .split_once(char::is_whitespace)
        .unwrap_or((content, ""));
    let rest = rest.trim_start();

    let mut doctype = DocumentType {
        name: name.to_string(),
        public_id: None,
        system_id: None,
    };
    if let Some(rest) = rest.strip_prefix("PUBLIC") {
        if let Some((public_id, rest)) = quoted(rest) {
            doctype.public_id = Some(public_id);
            doctype.system_id = quoted(rest).map(|(id, _)| id);
        }
    } else if let Some(rest) = rest.strip_prefix("SYSTEM") {
        doctype.system_id = quoted(rest).map(|(id, _)| id);
    }
    doctype
}

/// Reads a single- or double-quoted literal, returning it and the remainder.
fn quoted(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &s[1..];
    let end = body.find(quote)?;
    Some((body[..end].to_string(), &body[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(node: &Node) -> &Element {
        match node {
            Node::Document(d) => d.root_element().unwrap(),
            _ => panic!("expected document"),
        }
    }

    #[test]
    fn test_parse_simple_document() {
        let doc = parse_str("<a x=\"1\"><b>hi &amp; bye</b></a>", &ParseOptions::default()).unwrap();
        let a = root(&doc);
        assert_eq!(a.name, QName::local("a"));
        assert_eq!(a.attribute(&QName::local("x")).unwrap().value, "1");
        let b = a.child_elements().next().unwrap();
        assert_eq!(b.direct_text(), "hi & bye");
    }

    #[test]
    fn test_namespaces_and_prefixes() {
        let doc = parse_str(
            r#"<p:a xmlns:p="urn:p" p:id="7"><b/></p:a>"#,
            &ParseOptions::default(),
        )
        .unwrap();
        let a = root(&doc);
        assert_eq!(a.name, QName::ns("urn:p", "a"));
        assert_eq!(a.name.prefix.as_deref(), Some("p"));
        assert!(a.attributes[0].name.is_namespace_declaration());
        assert_eq!(a.attribute(&QName::ns("urn:p", "id")).unwrap().value, "7");
        assert_eq!(a.child_elements().next().unwrap().name, QName::local("b"));
    }

    #[test]
    fn test_declaration_and_doctype() {
        let doc = parse_str(
            "<?xml version=\"1.1\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <!DOCTYPE a PUBLIC \"-//X//DTD\" \"a.dtd\">\n<a/>",
            &ParseOptions::default(),
        )
        .unwrap();
        let Node::Document(d) = &doc else {
            panic!("expected document");
        };
        assert_eq!(d.version, "1.1");
        assert_eq!(d.encoding.as_deref(), Some("UTF-8"));
        assert!(d.standalone);
        let doctype = d.doctype().unwrap();
        assert_eq!(doctype.name, "a");
        assert_eq!(doctype.public_id.as_deref(), Some("-//X//DTD"));
        assert_eq!(doctype.system_id.as_deref(), Some("a.dtd"));
    }

    #[test]
    fn test_cdata_comment_and_pi() {
        let doc = parse_str(
            "<a><![CDATA[<x>]]><!-- note --><?app run?></a>",
            &ParseOptions::default(),
        )
        .unwrap();
        let a = root(&doc);
        assert_eq!(
            a.children,
            vec![
                Node::cdata("<x>"),
                Node::comment(" note "),
                Node::processing_instruction("app", "run"),
            ]
        );
    }

    #[test]
    fn test_options_normalize() {
        let options = ParseOptions {
            ignore_whitespace: true,
            ignore_comments: true,
            ..ParseOptions::default()
        };
        let doc = parse_str("<a>\n  <b> x </b>\n  <!-- c -->\n</a>", &options).unwrap();
        let a = root(&doc);
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.child_elements().next().unwrap().direct_text(), "x");
    }

    #[test]
    fn test_malformed_input() {
        let err = parse_str("<a><b></a>", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));

        let err = parse_str("<a>", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = parse_str("<x:a/>", &ParseOptions::default()).unwrap_err();
        assert!(err.to_string().contains("unknown namespace prefix"));
    }

    #[test]
    fn test_empty_document() {
        let err = parse_str("<!-- nothing -->", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyDocument { .. }));
    }

    #[test]
    fn test_parse_doctype_system() {
        let dt = parse_doctype(" html SYSTEM 'about:legacy-compat'");
        assert_eq!(dt.name, "html");
        assert!(dt.public_id.is_none());
        assert_eq!(dt.system_id.as_deref(), Some("about:legacy-compat"));
    }
}
