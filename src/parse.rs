//! SVG parsing from XML.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::ast::*;
use crate::error::FlattenError;

/// Parse an SVG string into a Document.
///
/// The XML declaration, DOCTYPE and anything else outside the root element
/// is discarded; the serializer writes its own declaration. Open elements are
/// kept on an explicit stack, so nesting depth is limited by memory only.
pub fn parse_svg(svg: &str) -> Result<Document, FlattenError> {
    let mut reader = Reader::from_str(svg);
    let mut open: Vec<Element> = Vec::new();

    let root = loop {
        match reader.read_event()? {
            Event::Start(start) => open.push(parse_element_start(&start)?),
            Event::Empty(start) => {
                let element = parse_element_start(&start)?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => break element,
                }
            }
            Event::End(_) => {
                // quick-xml has already checked the end name
                let Some(element) = open.pop() else {
                    return Err(FlattenError::InvalidSvg("Unmatched end tag".into()));
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => break element,
                }
            }
            Event::Text(text) => {
                if let Some(parent) = open.last_mut() {
                    let text = text.unescape()?;
                    if !text.trim().is_empty() || !parent.children.is_empty() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
            }
            Event::CData(cdata) => {
                if let Some(parent) = open.last_mut() {
                    parent
                        .children
                        .push(Node::CData(String::from_utf8_lossy(&cdata).into_owned()));
                }
            }
            Event::Eof => {
                return Err(FlattenError::InvalidSvg(match open.last() {
                    Some(element) => format!(
                        "Unexpected end of file inside <{}>",
                        element.name.full_name()
                    ),
                    None => "No root element found".into(),
                }));
            }
            // declaration, doctype, comments and PIs are not drawn
            _ => {}
        }
    };

    if !root.is("svg") {
        return Err(FlattenError::InvalidSvg(format!(
            "Root element is <{}>, expected <svg>",
            root.name.full_name()
        )));
    }

    Ok(Document { root })
}

fn parse_element_start(start: &BytesStart) -> Result<Element, FlattenError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();

    let mut element = Element {
        name: QName::parse(&name),
        attributes: Vec::new(),
        children: Vec::new(),
    };

    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?;
        element.attributes.push(Attribute {
            name: QName::parse(key),
            value: value.into_owned(),
        });
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_svg() {
        let svg = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
    <rect x="10" y="10" width="80" height="80" fill="red"/>
</svg>"#;

        let doc = parse_svg(svg).unwrap();
        assert!(doc.root.is("svg"));
        assert_eq!(doc.root.get_attr("width"), Some("100"));
        assert_eq!(doc.root.child_elements().count(), 1);
    }

    #[test]
    fn test_parse_style_cdata() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><style><![CDATA[.a{fill:red}]]></style></svg>"#;
        let doc = parse_svg(svg).unwrap();
        let style = doc.root.child_elements().next().unwrap();
        assert_eq!(style.text_content(), ".a{fill:red}");
    }

    #[test]
    fn test_parse_namespaced() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
    <use xlink:href="#foo"/>
</svg>"##;

        let doc = parse_svg(svg).unwrap();
        let used = doc.root.child_elements().next().unwrap();
        assert_eq!(used.attributes[0].name.prefix.as_deref(), Some("xlink"));
    }

    #[test]
    fn test_mismatched_tags_are_fatal() {
        assert!(parse_svg("<svg><g></svg>").is_err());
    }

    #[test]
    fn test_unclosed_root_is_fatal() {
        assert!(matches!(
            parse_svg("<svg><rect/>"),
            Err(FlattenError::InvalidSvg(_))
        ));
    }

    #[test]
    fn test_non_svg_root_rejected() {
        assert!(parse_svg("<html/>").is_err());
        assert!(parse_svg("").is_err());
    }

    #[test]
    fn test_deeply_nested_input() {
        let depth = 100_000;
        let svg = format!("<svg>{}<rect/>{}</svg>", "<g>".repeat(depth), "</g>".repeat(depth));
        let doc = parse_svg(&svg).unwrap();

        let mut levels = 0;
        let mut elem = &doc.root;
        while let Some(child) = elem.child_elements().next() {
            levels += 1;
            elem = child;
        }
        assert_eq!(levels, depth + 1);
        assert!(elem.is("rect"));
    }
}
