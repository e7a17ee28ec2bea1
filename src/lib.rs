//! svgflat - bake SVG transforms and flatten groups
//!
//! svgflat rewrites an SVG so that every drawable element sits directly under
//! the root with absolute coordinates: no groups, no `transform` attributes,
//! no CSS classes, and a viewBox that starts at the origin. Consumers that
//! cannot evaluate transforms or stylesheets (plotters, croppers, simple
//! importers) can then read geometry straight off each element.

mod ast;
mod error;
mod flatten;
mod matrix;
mod parse;
mod path;
mod serialize;
mod shapes;
mod strokes;
mod style;
mod transform;
mod viewbox;

pub use ast::*;
pub use error::*;
pub use flatten::*;
pub use matrix::*;
pub use parse::*;
pub use path::*;
pub use serialize::*;
pub use shapes::*;
pub use strokes::*;
pub use style::*;
pub use transform::*;
pub use viewbox::*;

/// Flatten an SVG string with default settings.
pub fn flatten_svg(svg: &str) -> Result<String, FlattenError> {
    flatten_svg_with_options(svg, &Options::default()).map(|(out, _)| out)
}

/// Flatten an SVG string with custom options, returning what was done.
pub fn flatten_svg_with_options(
    svg: &str,
    options: &Options,
) -> Result<(String, FlattenReport), FlattenError> {
    let mut doc = parse_svg(svg)?;
    let mut report = flatten(&mut doc, options);

    if options.normalize_viewbox {
        normalize_viewbox(&mut doc, options.precision);
    }
    if let Some(width) = options.fill_to_stroke {
        report.fills_converted = fill_to_stroke(&mut doc, width);
    }

    Ok((serialize(&doc, &Namespaces::default(), options), report))
}

/// Flattening options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Number of decimal places for baked coordinates (default: 6)
    pub precision: u8,
    /// Move the viewBox origin to (0, 0) and set width/height to its extent
    pub normalize_viewbox: bool,
    /// Emit an `<?xml ...?>` declaration
    pub xml_declaration: bool,
    /// Turn filled shapes into outlines of this stroke width
    pub fill_to_stroke: Option<f64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            precision: 6,
            normalize_viewbox: true,
            xml_declaration: true,
            fill_to_stroke: None,
        }
    }
}
