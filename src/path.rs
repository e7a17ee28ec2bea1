//! SVG path data parsing and transform baking.
//!
//! SVG path syntax: https://www.w3.org/TR/SVG/paths.html
//!
//! Path data is lexed into command letters with their raw parameter text,
//! each group is turned into typed [`Command`]s, and [`Path::apply_matrix`]
//! rewrites the commands into absolute coordinates under a matrix.

use std::fmt::Write as _;

use crate::matrix::Matrix;

/// A parsed SVG path.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<Segment>,
}

/// One item of path data.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Command(Command),
    /// Text we could not make sense of, kept verbatim.
    Raw(String),
}

/// A path command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// M/m - Move to
    MoveTo { rel: bool, x: f64, y: f64 },
    /// L/l - Line to
    LineTo { rel: bool, x: f64, y: f64 },
    /// H/h - Horizontal line to
    HorizontalTo { rel: bool, x: f64 },
    /// V/v - Vertical line to
    VerticalTo { rel: bool, y: f64 },
    /// C/c - Cubic bezier
    CurveTo {
        rel: bool,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    /// S/s - Smooth cubic bezier
    SmoothCurveTo {
        rel: bool,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    /// Q/q - Quadratic bezier
    QuadTo {
        rel: bool,
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    /// T/t - Smooth quadratic bezier
    SmoothQuadTo { rel: bool, x: f64, y: f64 },
    /// A/a - Arc
    Arc {
        rel: bool,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    /// Z/z - Close path
    ClosePath { rel: bool },
}

/// Parse SVG path data.
///
/// Never fails: unknown command letters and anything before the first
/// command are kept as [`Segment::Raw`], malformed numbers are skipped and
/// incomplete trailing parameter groups are dropped.
pub fn parse_path(d: &str) -> Path {
    let mut segments = Vec::new();

    for group in PathLexer::new(d) {
        match group.letter {
            Some(letter) if is_command_letter(letter) => {
                parse_group(letter, group.params, &mut segments);
            }
            Some(letter) => {
                tracing::warn!(%letter, "unknown path command, keeping verbatim");
                segments.push(Segment::Raw(format!("{}{}", letter, group.params.trim_end())));
            }
            None => {
                tracing::warn!(data = group.params, "path data before first command, keeping verbatim");
                segments.push(Segment::Raw(group.params.trim().to_string()));
            }
        }
    }

    Path { segments }
}

/// Bake `matrix` into path data, returning absolute path data.
pub fn bake_path(d: &str, matrix: &Matrix, precision: u8) -> String {
    parse_path(d).apply_matrix(matrix).to_svg(precision)
}

fn is_command_letter(c: char) -> bool {
    matches!(
        c.to_ascii_lowercase(),
        'm' | 'l' | 'h' | 'v' | 'c' | 's' | 'q' | 't' | 'a' | 'z'
    )
}

fn parse_group(letter: char, params: &str, out: &mut Vec<Segment>) {
    let rel = letter.is_ascii_lowercase();
    let mut scanner = NumberScanner::new(params);

    if letter.eq_ignore_ascii_case(&'z') {
        if !params.trim().is_empty() {
            tracing::warn!(params, "ignoring parameters after close path");
        }
        out.push(Segment::Command(Command::ClosePath { rel }));
        return;
    }

    if params.trim().is_empty() {
        tracing::warn!(%letter, "path command without parameters, keeping verbatim");
        out.push(Segment::Raw(letter.to_string()));
        return;
    }

    let mut first = true;
    while !scanner.is_exhausted() {
        let command = match letter.to_ascii_lowercase() {
            'm' => scanner.pair().map(|(x, y)| {
                // extra pairs after a moveto are implicit linetos
                if first {
                    Command::MoveTo { rel, x, y }
                } else {
                    Command::LineTo { rel, x, y }
                }
            }),
            'l' => scanner.pair().map(|(x, y)| Command::LineTo { rel, x, y }),
            't' => scanner
                .pair()
                .map(|(x, y)| Command::SmoothQuadTo { rel, x, y }),
            'h' => scanner.number().map(|x| Command::HorizontalTo { rel, x }),
            'v' => scanner.number().map(|y| Command::VerticalTo { rel, y }),
            'c' => scanner.numbers::<6>().map(|[x1, y1, x2, y2, x, y]| Command::CurveTo {
                rel,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            }),
            's' => scanner
                .numbers::<4>()
                .map(|[x2, y2, x, y]| Command::SmoothCurveTo { rel, x2, y2, x, y }),
            'q' => scanner
                .numbers::<4>()
                .map(|[x1, y1, x, y]| Command::QuadTo { rel, x1, y1, x, y }),
            'a' => scanner.arc(rel),
            _ => None,
        };

        match command {
            Some(command) => out.push(Segment::Command(command)),
            None => {
                tracing::warn!(%letter, params, "incomplete path parameters dropped");
                break;
            }
        }
        first = false;
    }
}

impl Path {
    /// Rewrite every command into absolute coordinates transformed by
    /// `matrix`.
    ///
    /// The current point is tracked in the untransformed space, so relative
    /// deltas and H/V are resolved before the matrix is applied. H and V
    /// become L because a rotated or skewed axis-aligned segment is no
    /// longer axis-aligned. Close path returns the current point to the
    /// start of its subpath.
    pub fn apply_matrix(&self, matrix: &Matrix) -> Path {
        let mut current = (0.0, 0.0);
        let mut subpath_start = (0.0, 0.0);
        let mut segments = Vec::with_capacity(self.segments.len());

        let rotation = matrix.rotation_degrees();
        let (scale_x, scale_y) = matrix.extract_scale();
        let flips = matrix.determinant() < 0.0;

        for segment in &self.segments {
            let command = match segment {
                Segment::Raw(raw) => {
                    segments.push(Segment::Raw(raw.clone()));
                    continue;
                }
                Segment::Command(command) => command,
            };

            let resolve = |rel: bool, x: f64, y: f64| {
                if rel {
                    (current.0 + x, current.1 + y)
                } else {
                    (x, y)
                }
            };

            let (baked, end) = match *command {
                Command::MoveTo { rel, x, y } => {
                    let end = resolve(rel, x, y);
                    subpath_start = end;
                    let (x, y) = matrix.apply(end.0, end.1);
                    (Command::MoveTo { rel: false, x, y }, end)
                }
                Command::LineTo { rel, x, y } => {
                    let end = resolve(rel, x, y);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (Command::LineTo { rel: false, x, y }, end)
                }
                Command::HorizontalTo { rel, x } => {
                    let end = (if rel { current.0 + x } else { x }, current.1);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (Command::LineTo { rel: false, x, y }, end)
                }
                Command::VerticalTo { rel, y } => {
                    let end = (current.0, if rel { current.1 + y } else { y });
                    let (x, y) = matrix.apply(end.0, end.1);
                    (Command::LineTo { rel: false, x, y }, end)
                }
                Command::CurveTo {
                    rel,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let c1 = resolve(rel, x1, y1);
                    let c2 = resolve(rel, x2, y2);
                    let end = resolve(rel, x, y);
                    let (x1, y1) = matrix.apply(c1.0, c1.1);
                    let (x2, y2) = matrix.apply(c2.0, c2.1);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (
                        Command::CurveTo {
                            rel: false,
                            x1,
                            y1,
                            x2,
                            y2,
                            x,
                            y,
                        },
                        end,
                    )
                }
                Command::SmoothCurveTo { rel, x2, y2, x, y } => {
                    let c2 = resolve(rel, x2, y2);
                    let end = resolve(rel, x, y);
                    let (x2, y2) = matrix.apply(c2.0, c2.1);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (
                        Command::SmoothCurveTo {
                            rel: false,
                            x2,
                            y2,
                            x,
                            y,
                        },
                        end,
                    )
                }
                Command::QuadTo { rel, x1, y1, x, y } => {
                    let c1 = resolve(rel, x1, y1);
                    let end = resolve(rel, x, y);
                    let (x1, y1) = matrix.apply(c1.0, c1.1);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (
                        Command::QuadTo {
                            rel: false,
                            x1,
                            y1,
                            x,
                            y,
                        },
                        end,
                    )
                }
                Command::SmoothQuadTo { rel, x, y } => {
                    let end = resolve(rel, x, y);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (Command::SmoothQuadTo { rel: false, x, y }, end)
                }
                Command::Arc {
                    rel,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    x,
                    y,
                } => {
                    let end = resolve(rel, x, y);
                    let (x, y) = matrix.apply(end.0, end.1);
                    (
                        Command::Arc {
                            rel: false,
                            rx: rx * scale_x,
                            ry: ry * scale_y,
                            x_axis_rotation: x_axis_rotation + rotation,
                            large_arc,
                            // a reflection reverses the winding
                            sweep: sweep != flips,
                            x,
                            y,
                        },
                        end,
                    )
                }
                Command::ClosePath { rel } => (Command::ClosePath { rel }, subpath_start),
            };

            current = end;
            segments.push(Segment::Command(baked));
        }

        Path { segments }
    }

    /// Serialize with `precision` fixed fractional digits.
    pub fn to_svg(&self, precision: u8) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if !out.is_empty() {
                out.push(' ');
            }
            match segment {
                Segment::Raw(raw) => out.push_str(raw),
                Segment::Command(command) => write_command(&mut out, command, precision),
            }
        }
        out
    }
}

fn write_command(out: &mut String, command: &Command, precision: u8) {
    let letter = |rel: bool, c: char| if rel { c.to_ascii_lowercase() } else { c };
    let num = |n: f64| format_fixed(n, precision);

    // fmt::Write into a String cannot fail
    let _ = match *command {
        Command::MoveTo { rel, x, y } => write!(out, "{} {},{}", letter(rel, 'M'), num(x), num(y)),
        Command::LineTo { rel, x, y } => write!(out, "{} {},{}", letter(rel, 'L'), num(x), num(y)),
        Command::HorizontalTo { rel, x } => write!(out, "{} {}", letter(rel, 'H'), num(x)),
        Command::VerticalTo { rel, y } => write!(out, "{} {}", letter(rel, 'V'), num(y)),
        Command::CurveTo {
            rel,
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => write!(
            out,
            "{} {},{} {},{} {},{}",
            letter(rel, 'C'),
            num(x1),
            num(y1),
            num(x2),
            num(y2),
            num(x),
            num(y)
        ),
        Command::SmoothCurveTo { rel, x2, y2, x, y } => write!(
            out,
            "{} {},{} {},{}",
            letter(rel, 'S'),
            num(x2),
            num(y2),
            num(x),
            num(y)
        ),
        Command::QuadTo { rel, x1, y1, x, y } => write!(
            out,
            "{} {},{} {},{}",
            letter(rel, 'Q'),
            num(x1),
            num(y1),
            num(x),
            num(y)
        ),
        Command::SmoothQuadTo { rel, x, y } => {
            write!(out, "{} {},{}", letter(rel, 'T'), num(x), num(y))
        }
        Command::Arc {
            rel,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        } => write!(
            out,
            "{} {},{} {} {} {} {},{}",
            letter(rel, 'A'),
            num(rx),
            num(ry),
            num(x_axis_rotation),
            u8::from(large_arc),
            u8::from(sweep),
            num(x),
            num(y)
        ),
        Command::ClosePath { rel } => write!(out, "{}", letter(rel, 'Z')),
    };
}

/// Format a number with exactly `precision` fractional digits.
///
/// Values that round to zero are written without a sign so output does not
/// flip between `0.000000` and `-0.000000` on float noise.
pub fn format_fixed(n: f64, precision: u8) -> String {
    let s = format!("{:.*}", precision as usize, n);
    match s.strip_prefix('-') {
        Some(unsigned) if unsigned.bytes().all(|b| b == b'0' || b == b'.') => unsigned.to_string(),
        _ => s,
    }
}

/// Shortest round-tripping representation, without a trailing `.0`.
pub fn format_shortest(n: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    let s = buffer.format(n);
    s.strip_suffix(".0").unwrap_or(s).to_string()
}

/// Scan every number in `text`, skipping anything that is not one.
pub(crate) fn scan_numbers(text: &str) -> Vec<f64> {
    let mut scanner = NumberScanner::new(text);
    std::iter::from_fn(|| scanner.number()).collect()
}

/// A command letter (or `None` for leading junk) and its raw parameters.
struct Group<'a> {
    letter: Option<char>,
    params: &'a str,
}

/// Splits path data at command letters.
struct PathLexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathLexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Any ASCII letter except the exponent marker starts a new group.
    fn is_letter(c: char) -> bool {
        c.is_ascii_alphabetic() && c != 'e' && c != 'E'
    }
}

impl<'a> Iterator for PathLexer<'a> {
    type Item = Group<'a>;

    fn next(&mut self) -> Option<Group<'a>> {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            self.pos = self.input.len();
            return None;
        }
        self.pos += rest.len() - trimmed.len();

        let first = trimmed.chars().next()?;
        let letter = Self::is_letter(first).then_some(first);
        let params_start = self.pos + letter.map_or(0, char::len_utf8);

        let params_len = self.input[params_start..]
            .find(Self::is_letter)
            .unwrap_or(self.input.len() - params_start);
        self.pos = params_start + params_len;

        Some(Group {
            letter,
            params: &self.input[params_start..self.pos],
        })
    }
}

/// Reads numbers and arc flags out of a parameter group.
struct NumberScanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> NumberScanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn number(&mut self) -> Option<f64> {
        loop {
            self.skip_separators();
            let c = self.peek()?;
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') {
                if let Some(n) = self.try_number() {
                    return Some(n);
                }
            }
            // not a number: skip the character and keep going
            tracing::warn!(character = %c, input = self.input, "skipping malformed number");
            self.bump();
        }
    }

    fn pair(&mut self) -> Option<(f64, f64)> {
        let [x, y] = self.numbers::<2>()?;
        Some((x, y))
    }

    fn numbers<const N: usize>(&mut self) -> Option<[f64; N]> {
        let mut out = [0.0; N];
        for slot in &mut out {
            *slot = self.number()?;
        }
        Some(out)
    }

    /// Arc flags are a single `0` or `1` and need no separator.
    fn flag(&mut self) -> Option<bool> {
        self.skip_separators();
        match self.peek()? {
            '0' => {
                self.bump();
                Some(false)
            }
            '1' => {
                self.bump();
                Some(true)
            }
            c => {
                tracing::warn!(character = %c, "invalid arc flag");
                None
            }
        }
    }

    fn arc(&mut self, rel: bool) -> Option<Command> {
        let [rx, ry, x_axis_rotation] = self.numbers::<3>()?;
        let large_arc = self.flag()?;
        let sweep = self.flag()?;
        let (x, y) = self.pair()?;
        Some(Command::Arc {
            rel,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        })
    }

    /// Parses one number at the cursor, leaving the cursor untouched on
    /// failure.
    fn try_number(&mut self) -> Option<f64> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let mut end = start;

        if matches!(bytes.get(end), Some(b'-' | b'+')) {
            end += 1;
        }

        let int_start = end;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        let mut digits = end - int_start;

        if bytes.get(end) == Some(&b'.') {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
                frac_end += 1;
            }
            if frac_end > frac_start || digits > 0 {
                digits += frac_end - frac_start;
                end = frac_end;
            }
        }

        if digits == 0 {
            return None;
        }

        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
                exp_end += 1;
            }
            let exp_digits_start = exp_end;
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            if exp_end > exp_digits_start {
                end = exp_end;
            }
        }

        let value = self.input[start..end].parse::<f64>().ok()?;
        self.pos = end;
        Some(value)
    }

    fn is_exhausted(&mut self) -> bool {
        self.skip_separators();
        self.peek().is_none()
    }

    fn skip_separators(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_whitespace() || c == ',')
        {
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(d: &str) -> Vec<Command> {
        parse_path(d)
            .segments
            .into_iter()
            .filter_map(|s| match s {
                Segment::Command(c) => Some(c),
                Segment::Raw(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_path() {
        assert_eq!(commands("M10 20 L30 40").len(), 2);
    }

    #[test]
    fn test_parse_relative_path() {
        let cmds = commands("m10,20 l30,40");
        assert_eq!(cmds.len(), 2);
        assert!(matches!(cmds[0], Command::MoveTo { rel: true, .. }));
    }

    #[test]
    fn test_parse_implicit_lineto() {
        let cmds = commands("M10 20 30 40");
        assert_eq!(cmds.len(), 2);
        assert!(matches!(cmds[1], Command::LineTo { rel: false, .. }));
    }

    #[test]
    fn test_parse_compact_numbers() {
        let cmds = commands("M1.5.5-2e1-3");
        assert_eq!(
            cmds,
            vec![
                Command::MoveTo {
                    rel: false,
                    x: 1.5,
                    y: 0.5
                },
                Command::LineTo {
                    rel: false,
                    x: -20.0,
                    y: -3.0
                },
            ]
        );
    }

    #[test]
    fn test_parse_arc_compact_flags() {
        let cmds = commands("a10 20 30 1140 50");
        assert_eq!(
            cmds,
            vec![Command::Arc {
                rel: true,
                rx: 10.0,
                ry: 20.0,
                x_axis_rotation: 30.0,
                large_arc: true,
                sweep: true,
                x: 40.0,
                y: 50.0,
            }]
        );
    }

    #[test]
    fn test_unknown_letter_kept_verbatim() {
        let path = parse_path("M0 0 X 1 2 L3 4");
        assert_eq!(path.segments[1], Segment::Raw("X 1 2".into()));
        assert_eq!(path.segments.len(), 3);
    }

    #[test]
    fn test_translate_scenario() {
        let out = bake_path("M 0 0 L 10 0 L 10 10 Z", &Matrix::translate(5.0, 5.0), 6);
        assert_eq!(
            out,
            "M 5.000000,5.000000 L 15.000000,5.000000 L 15.000000,15.000000 Z"
        );
    }

    #[test]
    fn test_relative_becomes_absolute() {
        let out = bake_path("m 1 1 l 2 0 l 0 2 z", &Matrix::IDENTITY, 1);
        assert_eq!(out, "M 1.0,1.0 L 3.0,1.0 L 3.0,3.0 z");
    }

    #[test]
    fn test_hv_become_lines() {
        let out = bake_path("M 0 0 H 10 v 5", &Matrix::rotate(90.0), 3);
        assert_eq!(out, "M 0.000,0.000 L 0.000,10.000 L -5.000,10.000");
    }

    #[test]
    fn test_relative_curves_use_current_point() {
        let out = bake_path("M 10 10 c 1 1 2 2 3 3 s 1 1 2 2 q 1 0 2 0 t 1 1", &Matrix::IDENTITY, 0);
        assert_eq!(out, "M 10,10 C 11,11 12,12 13,13 S 14,14 15,15 Q 16,15 17,15 T 18,16");
    }

    #[test]
    fn test_arc_under_reflection() {
        let out = bake_path("M 0 0 A 5 10 0 0 1 10 0", &Matrix::scale(-2.0, 1.0), 1);
        assert_eq!(out, "M 0.0,0.0 A 10.0,10.0 180.0 0 0 -20.0,0.0");
    }

    #[test]
    fn test_arc_rotation_added() {
        let path = parse_path("A 1 2 10 1 0 0 0").apply_matrix(&Matrix::rotate(30.0));
        match &path.segments[0] {
            Segment::Command(Command::Arc {
                x_axis_rotation,
                large_arc,
                sweep,
                ..
            }) => {
                assert!((x_axis_rotation - 40.0).abs() < 1e-9);
                assert!(*large_arc);
                assert!(!*sweep);
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn test_close_path_restores_subpath_start() {
        let out = bake_path("M 5 5 l 10 0 z l 0 10", &Matrix::IDENTITY, 0);
        assert_eq!(out, "M 5,5 L 15,5 z L 5,15");
    }

    #[test]
    fn test_incomplete_trailing_pair_dropped() {
        assert_eq!(commands("M 1 2 3").len(), 1);
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(1.0, 6), "1.000000");
        assert_eq!(format_fixed(-0.0000001, 6), "0.000000");
        assert_eq!(format_fixed(-1.5, 2), "-1.50");
        assert_eq!(format_fixed(2.0, 0), "2");
    }

    #[test]
    fn test_format_shortest() {
        assert_eq!(format_shortest(100.0), "100");
        assert_eq!(format_shortest(0.25), "0.25");
        assert_eq!(format_shortest(-3.5), "-3.5");
    }

    #[test]
    fn test_scan_numbers_skips_junk() {
        assert_eq!(scan_numbers("10px, -3 .5e1"), vec![10.0, -3.0, 5.0]);
    }
}
