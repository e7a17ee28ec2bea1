//! Moving the viewBox origin to (0, 0).

use crate::ast::{Document, Element};
use crate::matrix::Matrix;
use crate::path::format_shortest;
use crate::shapes::{LeafKind, bake_element};

/// SVG viewBox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse a viewBox attribute. Exactly four numbers separated by
    /// whitespace and/or commas.
    pub fn parse(s: &str) -> Option<Self> {
        let parts = s
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;

        match parts[..] {
            [min_x, min_y, width, height] => Some(ViewBox {
                min_x,
                min_y,
                width,
                height,
            }),
            _ => None,
        }
    }

    /// The viewBox of `root`, falling back to `0 0 width height` when the
    /// attribute is missing or unparsable.
    pub fn of(root: &Element) -> Option<Self> {
        if let Some(raw) = root.get_attr("viewBox") {
            match ViewBox::parse(raw) {
                Some(vb) => return Some(vb),
                None => tracing::warn!(view_box = raw, "unparsable viewBox"),
            }
        }

        let dimension = |name| {
            let raw = root.get_attr(name)?.trim();
            raw.strip_suffix("px").unwrap_or(raw).parse::<f64>().ok()
        };
        Some(ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: dimension("width")?,
            height: dimension("height")?,
        })
    }

    pub fn has_origin(&self) -> bool {
        self.min_x == 0.0 && self.min_y == 0.0
    }

    pub fn to_attr(&self) -> String {
        format!(
            "{} {} {} {}",
            format_shortest(self.min_x),
            format_shortest(self.min_y),
            format_shortest(self.width),
            format_shortest(self.height)
        )
    }
}

/// Translate every leaf so the viewBox starts at (0, 0), then rewrite
/// `viewBox` and set `width`/`height` to its extent.
///
/// Coordinates are moved with the same baking code as transforms, so this
/// expects a document whose transforms have already been flattened. Returns
/// false when there is no usable viewBox or size to work from.
pub fn normalize_viewbox(doc: &mut Document, precision: u8) -> bool {
    let Some(view_box) = ViewBox::of(&doc.root) else {
        tracing::warn!("no viewBox or numeric width/height, leaving document size alone");
        return false;
    };

    if !view_box.has_origin() {
        tracing::debug!(
            min_x = view_box.min_x,
            min_y = view_box.min_y,
            "moving viewBox origin"
        );
        let offset = Matrix::translate(-view_box.min_x, -view_box.min_y);
        translate_leaves(&mut doc.root, &offset, precision);
    }

    let normalized = ViewBox {
        min_x: 0.0,
        min_y: 0.0,
        ..view_box
    };
    let root = &mut doc.root;
    root.set_attr("viewBox", normalized.to_attr());
    root.set_attr("width", format_shortest(view_box.width));
    root.set_attr("height", format_shortest(view_box.height));
    true
}

/// Bake `offset` into every leaf below `root`, without descending into
/// leaves.
fn translate_leaves(root: &mut Element, offset: &Matrix, precision: u8) {
    let mut stack: Vec<&mut Element> = root.child_elements_mut().collect();
    while let Some(elem) = stack.pop() {
        match LeafKind::of(elem) {
            Some(kind) => bake_element(kind, elem, offset, precision),
            None => stack.extend(elem.child_elements_mut()),
        }
    }
}
