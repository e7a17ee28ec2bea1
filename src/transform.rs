//! SVG `transform` attribute parsing.
//!
//! Transform list syntax: https://www.w3.org/TR/SVG11/coords.html#TransformAttribute

use crate::matrix::Matrix;
use crate::path::scan_numbers;

/// One primitive from a transform list.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformFn {
    Translate { tx: f64, ty: f64 },
    Scale { sx: f64, sy: f64 },
    /// Angle in degrees, optionally about a center point.
    Rotate { angle: f64, center: Option<(f64, f64)> },
    SkewX(f64),
    SkewY(f64),
    Matrix(Matrix),
}

impl TransformFn {
    pub fn to_matrix(&self) -> Matrix {
        match *self {
            TransformFn::Translate { tx, ty } => Matrix::translate(tx, ty),
            TransformFn::Scale { sx, sy } => Matrix::scale(sx, sy),
            TransformFn::Rotate {
                angle,
                center: None,
            } => Matrix::rotate(angle),
            TransformFn::Rotate {
                angle,
                center: Some((cx, cy)),
            } => Matrix::rotate_about(angle, cx, cy),
            TransformFn::SkewX(angle) => Matrix::skew_x(angle),
            TransformFn::SkewY(angle) => Matrix::skew_y(angle),
            TransformFn::Matrix(m) => m,
        }
    }

    fn from_call(name: &str, args: &[f64]) -> Option<Self> {
        let arg = |i: usize, default: f64| args.get(i).copied().unwrap_or(default);

        let func = match name.to_ascii_lowercase().as_str() {
            "translate" => TransformFn::Translate {
                tx: arg(0, 0.0),
                ty: arg(1, 0.0),
            },
            "scale" => {
                let sx = arg(0, 1.0);
                TransformFn::Scale { sx, sy: arg(1, sx) }
            }
            "rotate" => TransformFn::Rotate {
                angle: arg(0, 0.0),
                center: (args.len() >= 3).then(|| (args[1], args[2])),
            },
            "skewx" => TransformFn::SkewX(arg(0, 0.0)),
            "skewy" => TransformFn::SkewY(arg(0, 0.0)),
            "matrix" if args.len() >= 6 => TransformFn::Matrix(Matrix::new(
                args[0], args[1], args[2], args[3], args[4], args[5],
            )),
            "matrix" => {
                tracing::warn!(args = args.len(), "matrix() needs six arguments, ignoring");
                return None;
            }
            _ => {
                tracing::warn!(function = name, "unknown transform function, ignoring");
                return None;
            }
        };
        Some(func)
    }
}

/// Split a transform attribute into its primitives, in written order.
///
/// Unknown functions are skipped. Parsing stops at the first call that is
/// missing its parentheses; everything before it is kept.
pub fn parse_transform_list(input: &str) -> Vec<TransformFn> {
    let mut funcs = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        let after_name = rest[name_len..].trim_start();

        let Some(body) = after_name.strip_prefix('(') else {
            tracing::warn!(transform = input, "malformed transform list, stopping");
            break;
        };
        let Some(close) = body.find(')') else {
            tracing::warn!(transform = input, "unterminated transform function, stopping");
            break;
        };

        let args = scan_numbers(&body[..close]);
        if let Some(func) = TransformFn::from_call(name, &args) {
            funcs.push(func);
        }
        rest = &body[close + 1..];
    }

    funcs
}

/// Parse a transform attribute into a single matrix.
///
/// Each primitive is composed as the new local transform onto the running
/// result, which gives SVG's left-to-right transform-list semantics. An empty
/// string yields the identity.
pub fn parse_transform(input: &str) -> Matrix {
    parse_transform_list(input)
        .iter()
        .fold(Matrix::IDENTITY, |acc, func| acc.then(&func.to_matrix()))
}
