//! Baking matrices into drawable elements.
//!
//! Several shapes cannot represent an arbitrary affine image of themselves,
//! and are approximated instead of being converted to paths:
//!
//! - `rect` and `image` become the axis-aligned bounding box of their
//!   transformed corners, which is not the same shape under rotation or skew.
//! - `circle` radius is scaled by the mean of the two extracted scale
//!   factors, so a non-uniform scale does not turn it into an ellipse.
//! - `ellipse` radii are scaled per axis, ignoring any rotation of the axes.
//! - `stroke-width` is scaled by the mean extracted scale.
//!
//! See [`Matrix::extract_scale`] for how the scale factors are derived.

use crate::ast::Element;
use crate::matrix::Matrix;
use crate::path::{Path, format_fixed, parse_path, scan_numbers};

/// Drawable element names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polygon,
    Polyline,
    Text,
    Image,
    Use,
}

impl LeafKind {
    pub fn from_name(local: &str) -> Option<Self> {
        Some(match local {
            "path" => LeafKind::Path,
            "rect" => LeafKind::Rect,
            "circle" => LeafKind::Circle,
            "ellipse" => LeafKind::Ellipse,
            "line" => LeafKind::Line,
            "polygon" => LeafKind::Polygon,
            "polyline" => LeafKind::Polyline,
            "text" => LeafKind::Text,
            "image" => LeafKind::Image,
            "use" => LeafKind::Use,
            _ => return None,
        })
    }

    pub fn of(elem: &Element) -> Option<Self> {
        Self::from_name(&elem.name.local)
    }
}

/// Things that can have a matrix baked into them.
pub trait ApplyMatrix {
    fn apply_matrix(&self, matrix: &Matrix) -> Self;
}

impl ApplyMatrix for Path {
    fn apply_matrix(&self, matrix: &Matrix) -> Self {
        Path::apply_matrix(self, matrix)
    }
}

/// The geometry attributes of one leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Path(Path),
    /// Also used for `image`.
    Box {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: Option<f64>,
        ry: Option<f64>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Points(Vec<(f64, f64)>),
    /// `text` and `use` only carry a position.
    Position {
        x: f64,
        y: f64,
    },
}

impl Geometry {
    /// Read the geometry of `elem`. Returns `None` for a path without `d` or
    /// a polygon/polyline without `points`, which have nothing to bake.
    pub fn read(kind: LeafKind, elem: &Element) -> Option<Geometry> {
        let len = |name: &str| length(elem, name);

        let geometry = match kind {
            LeafKind::Path => Geometry::Path(parse_path(elem.get_attr("d")?)),
            LeafKind::Rect | LeafKind::Image => Geometry::Box {
                x: len("x"),
                y: len("y"),
                width: len("width"),
                height: len("height"),
                rx: elem.get_attr("rx").map(|_| len("rx")),
                ry: elem.get_attr("ry").map(|_| len("ry")),
            },
            LeafKind::Circle => Geometry::Circle {
                cx: len("cx"),
                cy: len("cy"),
                r: len("r"),
            },
            LeafKind::Ellipse => Geometry::Ellipse {
                cx: len("cx"),
                cy: len("cy"),
                rx: len("rx"),
                ry: len("ry"),
            },
            LeafKind::Line => Geometry::Line {
                x1: len("x1"),
                y1: len("y1"),
                x2: len("x2"),
                y2: len("y2"),
            },
            LeafKind::Polygon | LeafKind::Polyline => {
                let numbers = scan_numbers(elem.get_attr("points")?);
                if numbers.len() % 2 != 0 {
                    tracing::warn!(count = numbers.len(), "odd number of point coordinates, dropping the last");
                }
                Geometry::Points(numbers.chunks_exact(2).map(|p| (p[0], p[1])).collect())
            }
            LeafKind::Text | LeafKind::Use => Geometry::Position {
                x: len("x"),
                y: len("y"),
            },
        };
        Some(geometry)
    }

    /// Write the geometry back as attributes of `elem`.
    pub fn write(&self, elem: &mut Element, precision: u8) {
        let num = |value: f64| format_fixed(value, precision);

        match self {
            Geometry::Path(path) => elem.set_attr("d", path.to_svg(precision)),
            Geometry::Box {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                elem.set_attr("x", num(*x));
                elem.set_attr("y", num(*y));
                elem.set_attr("width", num(*width));
                elem.set_attr("height", num(*height));
                if let Some(rx) = rx {
                    elem.set_attr("rx", num(*rx));
                }
                if let Some(ry) = ry {
                    elem.set_attr("ry", num(*ry));
                }
            }
            Geometry::Circle { cx, cy, r } => {
                elem.set_attr("cx", num(*cx));
                elem.set_attr("cy", num(*cy));
                elem.set_attr("r", num(*r));
            }
            Geometry::Ellipse { cx, cy, rx, ry } => {
                elem.set_attr("cx", num(*cx));
                elem.set_attr("cy", num(*cy));
                elem.set_attr("rx", num(*rx));
                elem.set_attr("ry", num(*ry));
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                elem.set_attr("x1", num(*x1));
                elem.set_attr("y1", num(*y1));
                elem.set_attr("x2", num(*x2));
                elem.set_attr("y2", num(*y2));
            }
            Geometry::Points(points) => {
                let points = points
                    .iter()
                    .map(|&(x, y)| format!("{},{}", num(x), num(y)))
                    .collect::<Vec<_>>()
                    .join(" ");
                elem.set_attr("points", points);
            }
            Geometry::Position { x, y } => {
                elem.set_attr("x", num(*x));
                elem.set_attr("y", num(*y));
            }
        }
    }
}

impl ApplyMatrix for Geometry {
    fn apply_matrix(&self, m: &Matrix) -> Self {
        match self {
            Geometry::Path(path) => Geometry::Path(path.apply_matrix(m)),
            Geometry::Box {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                let corners = [
                    m.apply(*x, *y),
                    m.apply(x + width, *y),
                    m.apply(x + width, y + height),
                    m.apply(*x, y + height),
                ];
                let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
                let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
                let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
                let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
                let (sx, sy) = m.extract_scale();
                Geometry::Box {
                    x: min_x,
                    y: min_y,
                    width: max_x - min_x,
                    height: max_y - min_y,
                    rx: rx.map(|rx| rx * sx),
                    ry: ry.map(|ry| ry * sy),
                }
            }
            Geometry::Circle { cx, cy, r } => {
                let (cx, cy) = m.apply(*cx, *cy);
                Geometry::Circle {
                    cx,
                    cy,
                    r: r * m.mean_scale(),
                }
            }
            Geometry::Ellipse { cx, cy, rx, ry } => {
                let (cx, cy) = m.apply(*cx, *cy);
                let (sx, sy) = m.extract_scale();
                Geometry::Ellipse {
                    cx,
                    cy,
                    rx: rx * sx,
                    ry: ry * sy,
                }
            }
            Geometry::Line { x1, y1, x2, y2 } => {
                let (x1, y1) = m.apply(*x1, *y1);
                let (x2, y2) = m.apply(*x2, *y2);
                Geometry::Line { x1, y1, x2, y2 }
            }
            Geometry::Points(points) => {
                Geometry::Points(points.iter().map(|&(x, y)| m.apply(x, y)).collect())
            }
            Geometry::Position { x, y } => {
                let (x, y) = m.apply(*x, *y);
                Geometry::Position { x, y }
            }
        }
    }
}

/// Bake `matrix` into a leaf's geometry and stroke width, in place.
///
/// The `transform` attribute is not touched here; callers remove it.
pub fn bake_element(kind: LeafKind, elem: &mut Element, matrix: &Matrix, precision: u8) {
    if let Some(geometry) = Geometry::read(kind, elem) {
        geometry.apply_matrix(matrix).write(elem, precision);
    }

    if let Some(width) = elem.get_attr("stroke-width") {
        match parse_length(width) {
            Some(width) => {
                let scaled = format_fixed(width * matrix.mean_scale(), precision);
                elem.set_attr("stroke-width", scaled);
            }
            None => tracing::debug!(width, "non-numeric stroke-width left unscaled"),
        }
    }
}

/// A user-unit number, optionally suffixed with `px`.
fn parse_length(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix("px")
        .unwrap_or(trimmed)
        .trim_end()
        .parse()
        .ok()
}

/// Numeric value of a geometry attribute. Absent means 0; a trailing `px` is
/// accepted; anything else unparsable is logged and read as 0.
fn length(elem: &Element, name: &str) -> f64 {
    let Some(raw) = elem.get_attr(name) else {
        return 0.0;
    };
    parse_length(raw).unwrap_or_else(|| {
        tracing::warn!(
            element = %elem.name.local,
            attribute = name,
            value = raw,
            "non-numeric dimension, using 0"
        );
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::parse_transform;

    fn element(name: &str, attrs: &[(&str, &str)]) -> Element {
        let mut e = Element::new(name);
        for (k, v) in attrs {
            e.set_attr(*k, *v);
        }
        e
    }

    fn bake(name: &str, attrs: &[(&str, &str)], transform: &str) -> Element {
        let mut e = element(name, attrs);
        let kind = LeafKind::of(&e).unwrap();
        bake_element(kind, &mut e, &parse_transform(transform), 6);
        e
    }

    #[test]
    fn test_leaf_kinds() {
        assert_eq!(LeafKind::from_name("polyline"), Some(LeafKind::Polyline));
        assert_eq!(LeafKind::from_name("g"), None);
        assert_eq!(LeafKind::from_name("style"), None);
    }

    #[test]
    fn test_rect_rotation_bounding_box() {
        let e = bake(
            "rect",
            &[("x", "0"), ("y", "0"), ("width", "10"), ("height", "10")],
            "rotate(90)",
        );
        assert_eq!(e.get_attr("x"), Some("-10.000000"));
        assert_eq!(e.get_attr("y"), Some("0.000000"));
        assert_eq!(e.get_attr("width"), Some("10.000000"));
        assert_eq!(e.get_attr("height"), Some("10.000000"));
    }

    #[test]
    fn test_rect_corner_radii_scale() {
        let e = bake(
            "rect",
            &[("width", "4"), ("height", "4"), ("rx", "1")],
            "scale(2 3)",
        );
        assert_eq!(e.get_attr("rx"), Some("2.000000"));
        assert_eq!(e.get_attr("ry"), None);
        assert_eq!(e.get_attr("height"), Some("12.000000"));
    }

    #[test]
    fn test_circle_uses_mean_scale() {
        let e = bake("circle", &[("cx", "1"), ("cy", "1"), ("r", "2")], "scale(2 4)");
        assert_eq!(e.get_attr("cx"), Some("2.000000"));
        assert_eq!(e.get_attr("cy"), Some("4.000000"));
        assert_eq!(e.get_attr("r"), Some("6.000000"));
    }

    #[test]
    fn test_ellipse_scales_per_axis() {
        let e = bake("ellipse", &[("rx", "2"), ("ry", "3")], "translate(1 1) scale(2 4)");
        assert_eq!(e.get_attr("cx"), Some("1.000000"));
        assert_eq!(e.get_attr("rx"), Some("4.000000"));
        assert_eq!(e.get_attr("ry"), Some("12.000000"));
    }

    #[test]
    fn test_line_and_points() {
        let e = bake("line", &[("x2", "5")], "translate(1,2)");
        assert_eq!(e.get_attr("x1"), Some("1.000000"));
        assert_eq!(e.get_attr("x2"), Some("6.000000"));
        assert_eq!(e.get_attr("y2"), Some("2.000000"));

        let e = bake("polygon", &[("points", "0,0 10,0 10,10")], "translate(1 1)");
        assert_eq!(
            e.get_attr("points"),
            Some("1.000000,1.000000 11.000000,1.000000 11.000000,11.000000")
        );
    }

    #[test]
    fn test_text_position_only() {
        let e = bake("text", &[("x", "3"), ("y", "4"), ("font-size", "12")], "scale(2)");
        assert_eq!(e.get_attr("x"), Some("6.000000"));
        assert_eq!(e.get_attr("y"), Some("8.000000"));
        assert_eq!(e.get_attr("font-size"), Some("12"));
    }

    #[test]
    fn test_stroke_width_scaled() {
        let e = bake("line", &[("stroke-width", "2")], "scale(1 3)");
        assert_eq!(e.get_attr("stroke-width"), Some("4.000000"));

        let e = bake("line", &[("stroke-width", "2px"), ("x2", "1")], "scale(4)");
        assert_eq!(e.get_attr("stroke-width"), Some("8.000000"));
        assert_eq!(e.get_attr("x2"), Some("4.000000"));

        let e = bake("line", &[("stroke-width", "thin")], "scale(2)");
        assert_eq!(e.get_attr("stroke-width"), Some("thin"));
    }

    #[test]
    fn test_path_without_d_untouched() {
        let e = bake("path", &[("id", "p")], "scale(2)");
        assert_eq!(e.get_attr("d"), None);
    }

    #[test]
    fn test_bad_dimension_reads_zero() {
        let e = bake("circle", &[("cx", "abc"), ("cy", "2px"), ("r", "1")], "translate(1 0)");
        assert_eq!(e.get_attr("cx"), Some("1.000000"));
        assert_eq!(e.get_attr("cy"), Some("2.000000"));
    }
}
