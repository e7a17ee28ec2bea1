//! Fill-to-stroke conversion for stroke-only consumers such as plotter
//! croppers.

use crate::ast::Document;
use crate::path::format_shortest;

const OUTLINED: [&str; 7] = [
    "path", "polygon", "rect", "circle", "ellipse", "line", "polyline",
];

/// Turn filled, unstroked shapes into stroked outlines of their fill color.
///
/// A shape qualifies when its `fill` attribute is set to something other
/// than `none` and its `stroke` is missing or `none`. Returns how many
/// elements were converted.
pub fn fill_to_stroke(doc: &mut Document, stroke_width: f64) -> usize {
    let width = format_shortest(stroke_width);
    let mut converted = 0;

    doc.for_each_element_mut(|elem| {
        if !OUTLINED.contains(&elem.name.local.as_str()) {
            return;
        }
        let Some(fill) = elem.get_attr("fill").map(str::trim) else {
            return;
        };
        if fill.is_empty() || fill == "none" {
            return;
        }
        if elem.get_attr("stroke").is_some_and(|s| s.trim() != "none") {
            return;
        }

        let fill = fill.to_string();
        elem.set_attr("stroke", fill);
        elem.set_attr("stroke-width", width.as_str());
        elem.set_attr("fill", "none");
        converted += 1;
    });

    tracing::debug!(converted, "converted fills to strokes");
    converted
}
