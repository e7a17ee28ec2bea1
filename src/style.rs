//! Paint inheritance and simple CSS class rules.
//!
//! Only `.name { prop: value; ... }` rules are understood. There are no
//! combinators, pseudo-classes or specificity beyond a single class, and only
//! `fill`, `stroke`, `stroke-width` and `opacity` are recorded.

use std::collections::HashMap;

use crate::ast::{Document, Element, declarations};

/// Properties carried in a [`StyleContext`].
pub const INHERITED_PROPERTIES: [&str; 3] = ["fill", "stroke", "stroke-width"];

const RULE_PROPERTIES: [&str; 4] = ["fill", "stroke", "stroke-width", "opacity"];

/// One resolved property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StyleValue {
    #[default]
    Unset,
    /// Explicit `none`.
    None,
    Value(String),
}

impl StyleValue {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => StyleValue::Unset,
            v if v.eq_ignore_ascii_case("none") => StyleValue::None,
            v => StyleValue::Value(v.to_string()),
        }
    }

    /// The value, if it is something to paint with.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            StyleValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Paint state handed down the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleContext {
    pub fill: StyleValue,
    pub stroke: StyleValue,
    pub stroke_width: StyleValue,
}

impl StyleContext {
    fn get(&self, property: &str) -> &StyleValue {
        match property {
            "fill" => &self.fill,
            "stroke" => &self.stroke,
            _ => &self.stroke_width,
        }
    }

    fn get_mut(&mut self, property: &str) -> &mut StyleValue {
        match property {
            "fill" => &mut self.fill,
            "stroke" => &mut self.stroke,
            _ => &mut self.stroke_width,
        }
    }

    /// Compute an element's effective style.
    ///
    /// Per property: a class rule that is not `none` wins, then the element's
    /// own inline style or attribute (an explicit `none` here is kept), then
    /// an inherited value that is not `none`, else unset.
    pub fn resolve(&self, elem: &Element, rules: &CssRuleTable) -> StyleContext {
        let from_classes = rules.for_element(elem);
        let mut resolved = StyleContext::default();

        for property in INHERITED_PROPERTIES {
            let class_value = from_classes
                .get(property)
                .map(|v| StyleValue::parse(v))
                .filter(|v| matches!(v, StyleValue::Value(_)));

            let own = elem
                .style_property(property)
                .or_else(|| elem.get_attr(property))
                .map(StyleValue::parse)
                .unwrap_or_default();

            *resolved.get_mut(property) = match (class_value, own) {
                (Some(value), _) => value,
                (None, own @ (StyleValue::Value(_) | StyleValue::None)) => own,
                (None, StyleValue::Unset) => match self.get(property) {
                    StyleValue::Value(v) => StyleValue::Value(v.clone()),
                    _ => StyleValue::Unset,
                },
            };
        }

        resolved
    }

    /// Write the resolved properties onto a leaf as presentation attributes.
    ///
    /// The same properties are removed from its inline `style`, so the
    /// attributes are what renders.
    pub fn apply_to(&self, elem: &mut Element) {
        for property in INHERITED_PROPERTIES {
            match self.get(property) {
                StyleValue::Value(v) => elem.set_attr(property, v.as_str()),
                StyleValue::None => elem.set_attr(property, "none"),
                StyleValue::Unset => {
                    elem.remove_attr(property);
                }
            }
        }
        elem.remove_style_properties(&INHERITED_PROPERTIES);
    }
}

/// Class name to declared properties, built from every `<style>` block.
#[derive(Debug, Clone, Default)]
pub struct CssRuleTable {
    rules: HashMap<String, HashMap<String, String>>,
}

impl CssRuleTable {
    pub fn from_document(doc: &Document) -> Self {
        let mut table = Self::default();
        doc.for_each_element(|elem| {
            if elem.is("style") {
                table.add_stylesheet(&elem.text_content());
            }
        });
        if !table.is_empty() {
            tracing::debug!(rules = table.len(), "collected CSS class rules");
        }
        table
    }

    /// Add every simple class rule in `css`. Repeated rules for the same
    /// class merge, later declarations winning.
    pub fn add_stylesheet(&mut self, css: &str) {
        let css = strip_comments(css);
        for block in css.split('}') {
            let Some((selectors, body)) = block.split_once('{') else {
                continue;
            };

            let props: Vec<(String, String)> = declarations(body)
                .map(|(prop, value)| (prop.to_ascii_lowercase(), value.to_string()))
                .filter(|(prop, _)| RULE_PROPERTIES.contains(&prop.as_str()))
                .collect();
            if props.is_empty() {
                continue;
            }

            for selector in selectors.split(',').map(str::trim) {
                match class_selector(selector) {
                    Some(class) => self
                        .rules
                        .entry(class.to_string())
                        .or_default()
                        .extend(props.iter().cloned()),
                    None => tracing::debug!(selector, "ignoring non-class CSS selector"),
                }
            }
        }
    }

    pub fn get(&self, class: &str) -> Option<&HashMap<String, String>> {
        self.rules.get(class)
    }

    /// Properties from all of an element's classes, later classes winning.
    pub fn for_element<'a>(&'a self, elem: &Element) -> HashMap<&'a str, &'a str> {
        let mut merged = HashMap::new();
        for class in elem.classes() {
            if let Some(props) = self.rules.get(class) {
                merged.extend(props.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        }
        merged
    }

    /// Opacity from an element's own classes.
    pub fn opacity_for(&self, elem: &Element) -> Option<&str> {
        self.for_element(elem).get("opacity").copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// `.name` with an identifier-ish name, nothing else.
fn class_selector(selector: &str) -> Option<&str> {
    let name = selector.strip_prefix('.')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(name)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        rest = match rest[start + 2..].find("*/") {
            Some(end) => &rest[start + 2 + end + 2..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}
