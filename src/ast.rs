//! In-memory SVG document tree.

/// A complete SVG document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The root `<svg>` element
    pub root: Element,
}

/// An SVG/XML element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element name with optional prefix (e.g., "svg", "svg:rect")
    pub name: QName,
    /// Attributes in document order
    pub attributes: Vec<Attribute>,
    /// Child nodes
    pub children: Vec<Node>,
}

/// A qualified name (possibly with namespace prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    /// Parse a qualified name from a string like "prefix:local" or just "local".
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Self::new(s),
        }
    }

    /// Check if this is a namespace declaration (xmlns or xmlns:prefix).
    pub fn is_xmlns(&self) -> bool {
        self.prefix.as_deref() == Some("xmlns") || (self.prefix.is_none() && self.local == "xmlns")
    }

    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: QName::new(name),
            value: value.into(),
        }
    }
}

/// A node in the SVG tree. Comments and processing instructions are not
/// kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: QName::new(name),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get an unprefixed attribute value by local name.
    ///
    /// Prefixed attributes (`xlink:href`, `inkscape:label`) are only reachable
    /// through [`Element::attributes`], so `get_attr("href")` never returns
    /// an `xlink:href`.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.prefix.is_none() && a.name.local == name)
            .map(|a| a.value.as_str())
    }

    /// Set an unprefixed attribute, replacing it in place if present.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.prefix.is_none() && a.name.local == name)
        {
            Some(attr) => attr.value = value.into(),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Remove an unprefixed attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|a| a.name.prefix.is_none() && a.name.local == name)?;
        Some(self.attributes.remove(index).value)
    }

    /// Check if this element has a specific local name.
    pub fn is(&self, name: &str) -> bool {
        self.name.local == name
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Look up a property in the inline `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<&str> {
        declarations(self.get_attr("style")?)
            .filter(|(prop, _)| prop.eq_ignore_ascii_case(property))
            .last()
            .map(|(_, value)| value)
    }

    /// Remove properties from the inline `style` attribute, dropping the
    /// attribute once it is empty.
    pub fn remove_style_properties(&mut self, properties: &[&str]) {
        let Some(style) = self.get_attr("style") else {
            return;
        };
        let kept: Vec<String> = declarations(style)
            .filter(|(prop, _)| !properties.iter().any(|p| prop.eq_ignore_ascii_case(p)))
            .map(|(prop, value)| format!("{}:{}", prop, value))
            .collect();
        if kept.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", kept.join(";"));
        }
    }

    /// Concatenated text and CDATA content of direct children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Iterate over child elements only.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate over child elements mutably.
    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }
}

/// Split CSS declaration text (`a: b; c: d`) into trimmed property/value pairs.
pub fn declarations(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let (prop, value) = (prop.trim(), value.trim());
        (!prop.is_empty()).then_some((prop, value))
    })
}

impl Document {
    /// Visit all elements in document order, root first.
    pub fn for_each_element(&self, mut f: impl FnMut(&Element)) {
        let mut stack = vec![&self.root];
        while let Some(elem) = stack.pop() {
            f(elem);
            let children: Vec<&Element> = elem.child_elements().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Visit all elements mutably in document order, root first.
    pub fn for_each_element_mut(&mut self, mut f: impl FnMut(&mut Element)) {
        let mut stack = vec![&mut self.root];
        while let Some(elem) = stack.pop() {
            f(elem);
            let children: Vec<&mut Element> = elem.child_elements_mut().collect();
            stack.extend(children.into_iter().rev());
        }
    }
}

impl Drop for Element {
    // The derived drop recurses once per nesting level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut elem) = node {
                pending.append(&mut elem.children);
            }
        }
    }
}
