//! Group flattening with transform baking.
//!
//! Every drawable leaf is lifted out of its groups into the root, with the
//! composed transform of all its ancestors baked into its coordinates and
//! its paint resolved into presentation attributes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::Options;
use crate::ast::{Document, Element, Node};
use crate::matrix::Matrix;
use crate::shapes::{LeafKind, bake_element};
use crate::style::{CssRuleTable, StyleContext};
use crate::transform::parse_transform;

/// What a flattening pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    /// Leaf elements in the output.
    pub leaves: usize,
    /// Leaves whose composed matrix was not the identity.
    pub baked: usize,
    /// Leaves left with their original coordinates.
    pub untouched: usize,
    /// Non-drawable, non-group elements removed (`style`, `defs`, ...).
    pub dropped: usize,
    /// Classes with CSS rules.
    pub css_rules: usize,
    /// Output leaves per fill (or stroke) color.
    pub colors: BTreeMap<String, usize>,
    /// Elements turned into outlines by the fill-to-stroke step.
    pub fills_converted: usize,
}

impl fmt::Display for FlattenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} leaves ({} baked, {} untouched), {} dropped, {} CSS rules",
            self.leaves, self.baked, self.untouched, self.dropped, self.css_rules
        )?;
        if self.fills_converted > 0 {
            write!(f, ", {} fills converted to strokes", self.fills_converted)?;
        }
        Ok(())
    }
}

/// One pending node with the state inherited from its ancestors.
struct Frame {
    elem: Element,
    style: StyleContext,
    matrix: Matrix,
}

/// Replace the root's children with its flattened, baked leaves.
///
/// The walk is depth-first, left to right, and uses an explicit stack so
/// deeply nested groups cannot overflow the call stack. Groups are
/// discarded after their children are queued; anything that is neither a
/// group nor a drawable leaf is dropped. The root loses its `transform` and
/// `class`, which are applied to the leaves instead.
pub fn flatten(doc: &mut Document, options: &Options) -> FlattenReport {
    log_structure(doc);

    let rules = CssRuleTable::from_document(doc);
    let mut report = FlattenReport {
        css_rules: rules.len(),
        ..FlattenReport::default()
    };

    // The root wraps everything like an outer group: its transform and paint
    // are handed to the leaves and then removed from it.
    let root = &mut doc.root;
    let root_matrix = root
        .remove_attr("transform")
        .map(|t| parse_transform(&t))
        .unwrap_or(Matrix::IDENTITY);
    let root_style = StyleContext::default().resolve(root, &rules);
    if root.remove_attr("class").is_some() {
        tracing::debug!("moved root class styles onto leaves");
    }

    let mut stack: Vec<Frame> = Vec::new();
    push_children(
        &mut stack,
        std::mem::take(&mut root.children),
        &root_style,
        &root_matrix,
    );

    let mut leaves = Vec::new();
    while let Some(Frame {
        mut elem,
        style,
        matrix,
    }) = stack.pop()
    {
        let local = elem
            .get_attr("transform")
            .map(parse_transform)
            .unwrap_or(Matrix::IDENTITY);
        let composed = matrix.then(&local);
        let effective = style.resolve(&elem, &rules);

        if elem.is("g") {
            push_children(&mut stack, std::mem::take(&mut elem.children), &effective, &composed);
            continue;
        }

        let Some(kind) = LeafKind::of(&elem) else {
            tracing::debug!(element = %elem.name.full_name(), "dropping non-drawable element");
            report.dropped += 1;
            continue;
        };

        if bake_leaf(kind, &mut elem, &effective, &composed, &rules, options.precision) {
            report.baked += 1;
        } else {
            report.untouched += 1;
        }
        leaves.push(elem);
    }

    report.leaves = leaves.len();
    for leaf in &leaves {
        let color = leaf
            .get_attr("fill")
            .filter(|f| *f != "none")
            .or_else(|| leaf.get_attr("stroke"))
            .unwrap_or("no-color");
        *report.colors.entry(color.to_string()).or_default() += 1;
    }

    doc.root.children = leaves.into_iter().map(Node::Element).collect();

    tracing::info!(
        leaves = report.leaves,
        baked = report.baked,
        untouched = report.untouched,
        dropped = report.dropped,
        colors = ?report.colors,
        "flattened groups"
    );
    report
}

/// Queue element children so they pop in document order.
fn push_children(stack: &mut Vec<Frame>, children: Vec<Node>, style: &StyleContext, matrix: &Matrix) {
    let elements = children.into_iter().filter_map(|node| match node {
        Node::Element(elem) => Some(elem),
        _ => None,
    });
    let frames: Vec<Frame> = elements
        .map(|elem| Frame {
            elem,
            style: style.clone(),
            matrix: *matrix,
        })
        .collect();
    stack.extend(frames.into_iter().rev());
}

/// Strip `transform` and `class`, write the resolved style and bake the
/// matrix. Returns whether any coordinates changed.
fn bake_leaf(
    kind: LeafKind,
    elem: &mut Element,
    style: &StyleContext,
    matrix: &Matrix,
    rules: &CssRuleTable,
    precision: u8,
) -> bool {
    let class_opacity = rules.opacity_for(elem).map(str::to_string);
    elem.remove_attr("transform");
    elem.remove_attr("class");

    style.apply_to(elem);
    if let Some(opacity) = class_opacity
        && elem.get_attr("opacity").is_none()
        && elem.style_property("opacity").is_none()
    {
        elem.set_attr("opacity", opacity);
    }

    if matrix.is_identity() {
        return false;
    }
    bake_element(kind, elem, matrix, precision);
    true
}

fn log_structure(doc: &Document) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut with_transform = 0;
    let mut total = 0;
    doc.for_each_element(|elem| {
        *counts.entry(elem.name.local.clone()).or_default() += 1;
        total += 1;
        if elem.get_attr("transform").is_some() {
            with_transform += 1;
        }
    });

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort();
    tracing::debug!(?counts, total, with_transform, "document structure");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_svg;

    fn flattened(svg: &str) -> (Document, FlattenReport) {
        let mut doc = parse_svg(svg).unwrap();
        let report = flatten(&mut doc, &Options::default());
        (doc, report)
    }

    fn leaves(doc: &Document) -> Vec<&Element> {
        doc.root.child_elements().collect()
    }

    #[test]
    fn test_groups_removed_in_document_order() {
        let (doc, report) = flattened(
            r#"<svg><g><rect id="a"/><g><circle id="b"/></g></g><path id="c" d="M0 0"/><g/></svg>"#,
        );
        let ids: Vec<_> = leaves(&doc).iter().map(|e| e.get_attr("id").unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(report.leaves, 3);
        assert_eq!(report.untouched, 3);
    }

    #[test]
    fn test_nested_transforms_compose() {
        let (doc, report) = flattened(
            r#"<svg><g transform="scale(2)"><g transform="translate(1,0)"><rect x="0" y="0" width="1" height="1"/></g></g></svg>"#,
        );
        let rect = leaves(&doc)[0];
        assert_eq!(rect.get_attr("x"), Some("2.000000"));
        assert_eq!(rect.get_attr("width"), Some("2.000000"));
        assert_eq!(rect.get_attr("transform"), None);
        assert_eq!(report.baked, 1);
    }

    #[test]
    fn test_leaf_transform_applied_inside_group() {
        let (doc, _) = flattened(
            r#"<svg><g transform="translate(10 0)"><circle r="1" transform="scale(3)" cx="1"/></g></svg>"#,
        );
        let circle = leaves(&doc)[0];
        assert_eq!(circle.get_attr("cx"), Some("13.000000"));
        assert_eq!(circle.get_attr("r"), Some("3.000000"));
    }

    #[test]
    fn test_identity_leaves_untouched() {
        let (doc, _) = flattened(r#"<svg><path d="m1 1 h2" transform="translate(0 0)"/></svg>"#);
        let path = leaves(&doc)[0];
        assert_eq!(path.get_attr("d"), Some("m1 1 h2"));
        assert_eq!(path.get_attr("transform"), None);
    }

    #[test]
    fn test_class_styles_resolved() {
        let (doc, report) = flattened(
            r#"<svg><style>.water{fill:#d9e9ff} .dim{opacity:.5}</style><path class="water dim" d="M0 0"/></svg>"#,
        );
        let path = leaves(&doc)[0];
        assert_eq!(path.get_attr("fill"), Some("#d9e9ff"));
        assert_eq!(path.get_attr("opacity"), Some(".5"));
        assert_eq!(path.get_attr("class"), None);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.css_rules, 2);
        assert_eq!(report.colors.get("#d9e9ff"), Some(&1));
    }

    #[test]
    fn test_group_styles_inherited() {
        let (doc, _) = flattened(
            r#"<svg><g fill="red" stroke-width="2" class="outline"><rect/><rect fill="none"/><g fill="none"><rect/></g></g><style>.outline{stroke:#333}</style></svg>"#,
        );
        let rects = leaves(&doc);
        assert_eq!(rects[0].get_attr("fill"), Some("red"));
        assert_eq!(rects[0].get_attr("stroke"), Some("#333"));
        assert_eq!(rects[0].get_attr("stroke-width"), Some("2"));
        assert_eq!(rects[1].get_attr("fill"), Some("none"));
        // none on a group is not handed down
        assert_eq!(rects[2].get_attr("fill"), None);
        assert_eq!(rects[2].get_attr("stroke"), Some("#333"));
    }

    #[test]
    fn test_stroke_width_scaled_after_resolution() {
        let (doc, _) = flattened(
            r#"<svg><g stroke-width="1.5" transform="scale(2)"><line x2="1"/></g></svg>"#,
        );
        assert_eq!(leaves(&doc)[0].get_attr("stroke-width"), Some("3.000000"));
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 5_000;
        let mut inner = Element::new("rect");
        for _ in 0..depth {
            let mut g = Element::new("g");
            g.set_attr("transform", "translate(1)");
            g.children.push(Node::Element(inner));
            inner = g;
        }
        let mut doc = Document {
            root: Element::new("svg"),
        };
        doc.root.children.push(Node::Element(inner));

        let report = flatten(&mut doc, &Options::default());
        assert_eq!(report.leaves, 1);
        assert_eq!(leaves(&doc)[0].get_attr("x"), Some("5000.000000"));
    }

    #[test]
    fn test_root_transform_and_class_moved_to_leaves() {
        let (doc, report) = flattened(
            r#"<svg class="map" transform="scale(2)" viewBox="0 0 10 10"><style>.map{stroke:#123}</style><rect x="1" width="2" height="2"/></svg>"#,
        );
        assert_eq!(doc.root.get_attr("class"), None);
        assert_eq!(doc.root.get_attr("transform"), None);
        assert_eq!(doc.root.get_attr("viewBox"), Some("0 0 10 10"));

        let rect = leaves(&doc)[0];
        assert_eq!(rect.get_attr("x"), Some("2.000000"));
        assert_eq!(rect.get_attr("width"), Some("4.000000"));
        assert_eq!(rect.get_attr("stroke"), Some("#123"));
        assert_eq!(report.baked, 1);
    }
}
