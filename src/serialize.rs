//! SVG serialization to XML.

use crate::Options;
use crate::ast::*;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Namespace prefixes the serializer may declare on the root element.
///
/// When the root lacks a declaration for the default namespace, or for a
/// prefix that is used somewhere in the tree and present in this table, the
/// declaration is added to the output.
#[derive(Debug, Clone)]
pub struct Namespaces {
    default: Option<String>,
    prefixes: Vec<(String, String)>,
}

impl Namespaces {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            default: None,
            prefixes: Vec::new(),
        }
    }

    pub fn with_default(mut self, uri: impl Into<String>) -> Self {
        self.default = Some(uri.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), uri.into()));
        self
    }

    fn uri(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Declarations missing from `root` for the namespaces the tree uses.
    fn missing_declarations(&self, root: &Element) -> Vec<Attribute> {
        let declared = |prefix: Option<&str>| {
            root.attributes.iter().any(|a| match prefix {
                None => a.name.prefix.is_none() && a.name.local == "xmlns",
                Some(p) => a.name.prefix.as_deref() == Some("xmlns") && a.name.local == p,
            })
        };

        let mut missing = Vec::new();
        if let Some(uri) = &self.default
            && !declared(None)
        {
            missing.push(Attribute::new("xmlns", uri.as_str()));
        }

        let mut used = Vec::new();
        collect_prefixes(root, &mut used);
        for prefix in used {
            if declared(Some(prefix.as_str())) {
                continue;
            }
            match self.uri(&prefix) {
                Some(uri) => missing.push(Attribute {
                    name: QName {
                        prefix: Some("xmlns".into()),
                        local: prefix,
                    },
                    value: uri.to_string(),
                }),
                None => tracing::warn!(%prefix, "namespace prefix used but never declared"),
            }
        }
        missing
    }
}

impl Default for Namespaces {
    /// SVG as the default namespace plus the xlink and editor prefixes
    /// commonly found in exported drawings.
    fn default() -> Self {
        Self::empty()
            .with_default(SVG_NS)
            .with_prefix("xlink", XLINK_NS)
            .with_prefix("sodipodi", "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd")
            .with_prefix("inkscape", "http://www.inkscape.org/namespaces/inkscape")
    }
}

fn collect_prefixes(root: &Element, used: &mut Vec<String>) {
    let mut stack = vec![root];
    while let Some(elem) = stack.pop() {
        let prefixes = std::iter::once(&elem.name)
            .chain(elem.attributes.iter().map(|a| &a.name))
            .filter(|name| !name.is_xmlns())
            .filter_map(|name| name.prefix.as_deref())
            .filter(|p| *p != "xml");
        for prefix in prefixes {
            if !used.iter().any(|u| u == prefix) {
                used.push(prefix.to_string());
            }
        }
        let children: Vec<&Element> = elem.child_elements().collect();
        stack.extend(children.into_iter().rev());
    }
}

/// Serialize a Document to an SVG string.
pub fn serialize(doc: &Document, namespaces: &Namespaces, options: &Options) -> String {
    let mut out = String::new();

    if options.xml_declaration {
        out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    }

    let extra = namespaces.missing_declarations(&doc.root);
    serialize_element(&mut out, &doc.root, &extra);

    out
}

/// Work left for the serializer: a node to write, or a tag to close.
enum Pending<'a> {
    Node(&'a Node),
    Close(&'a Element),
}

fn serialize_element(out: &mut String, root: &Element, extra_attrs: &[Attribute]) {
    let mut stack = Vec::new();
    open_tag(out, root, extra_attrs, &mut stack);

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Node(Node::Element(elem)) => open_tag(out, elem, &[], &mut stack),
            Pending::Node(Node::Text(text)) => push_escaped_text(out, text),
            Pending::Node(Node::CData(data)) => {
                out.push_str("<![CDATA[");
                out.push_str(data);
                out.push_str("]]>");
            }
            Pending::Close(elem) => {
                out.push_str("</");
                out.push_str(&elem.name.full_name());
                out.push('>');
            }
        }
    }
}

/// Write the start tag of `elem` and queue its content and end tag.
fn open_tag<'a>(
    out: &mut String,
    elem: &'a Element,
    extra_attrs: &[Attribute],
    stack: &mut Vec<Pending<'a>>,
) {
    out.push('<');
    out.push_str(&elem.name.full_name());

    for attr in extra_attrs.iter().chain(&elem.attributes) {
        out.push(' ');
        out.push_str(&attr.name.full_name());
        out.push_str("=\"");
        push_escaped_attr(out, &attr.value);
        out.push('"');
    }

    if elem.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    stack.push(Pending::Close(elem));
    stack.extend(elem.children.iter().rev().map(Pending::Node));
}

fn push_escaped_attr(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_text(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
