//! 2D affine matrices.
//!
//! A [`Matrix`] holds the six coefficients of
//!
//! ```text
//! | a  c  e |
//! | b  d  f |
//! | 0  0  1 |
//! ```
//!
//! and maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.

/// An immutable 2x3 affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation about the origin, angle in degrees.
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Rotation about `(cx, cy)`: translate(cx, cy) rotate(angle) translate(-cx, -cy).
    pub fn rotate_about(degrees: f64, cx: f64, cy: f64) -> Self {
        Self::translate(cx, cy)
            .then(&Self::rotate(degrees))
            .then(&Self::translate(-cx, -cy))
    }

    pub fn skew_x(degrees: f64) -> Self {
        Self::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(degrees: f64) -> Self {
        Self::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// `self` is the ambient transform, `local` is applied first.
    pub fn then(&self, local: &Matrix) -> Matrix {
        compose(self, local)
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Returns `None` for singular matrices.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Matrix::new(
            a,
            b,
            c,
            d,
            -(a * self.e + c * self.f),
            -(b * self.e + d * self.f),
        ))
    }

    /// Column norms `(sqrt(a² + b²), sqrt(c² + d²))`.
    ///
    /// This is only an approximation of "how much does this matrix scale
    /// things": it is exact for any combination of rotation, reflection and
    /// axis-aligned scale, but not for skews, where the image of a circle is
    /// an ellipse whose axes are not these column lengths. It is used for
    /// scalar quantities (radii, stroke widths) that cannot carry a full
    /// matrix.
    pub fn extract_scale(&self) -> (f64, f64) {
        (self.a.hypot(self.b), self.c.hypot(self.d))
    }

    /// Mean of the two extracted scale factors. Same caveats as
    /// [`Matrix::extract_scale`].
    pub fn mean_scale(&self) -> f64 {
        let (sx, sy) = self.extract_scale();
        (sx + sy) / 2.0
    }

    /// Angle of the transformed x axis, in degrees.
    pub fn rotation_degrees(&self) -> f64 {
        self.b.atan2(self.a).to_degrees()
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &Matrix, eps: f64) -> bool {
        [
            self.a - other.a,
            self.b - other.b,
            self.c - other.c,
            self.d - other.d,
            self.e - other.e,
            self.f - other.f,
        ]
        .iter()
        .all(|delta| delta.abs() <= eps)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Matrix product `ambient × local`: `local` is applied to a point first, then
/// `ambient`. Local translation is carried into ambient's basis before
/// ambient's own translation is added.
pub fn compose(ambient: &Matrix, local: &Matrix) -> Matrix {
    Matrix {
        a: ambient.a * local.a + ambient.c * local.b,
        b: ambient.b * local.a + ambient.d * local.b,
        c: ambient.a * local.c + ambient.c * local.d,
        d: ambient.b * local.c + ambient.d * local.d,
        e: ambient.a * local.e + ambient.c * local.f + ambient.e,
        f: ambient.b * local.e + ambient.d * local.f + ambient.f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_point(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < EPS && (actual.1 - expected.1).abs() < EPS,
            "{actual:?} != {expected:?}"
        );
    }

    fn samples() -> Vec<Matrix> {
        vec![
            Matrix::IDENTITY,
            Matrix::translate(10.0, -4.5),
            Matrix::scale(2.0, -3.0),
            Matrix::rotate(37.0),
            Matrix::rotate_about(90.0, 5.0, 5.0),
            Matrix::skew_x(20.0),
            Matrix::skew_y(-15.0),
            Matrix::new(1.5, 0.25, -0.75, 2.0, 3.0, -8.0),
        ]
    }

    #[test]
    fn test_compose_applies_local_first() {
        let m = compose(&Matrix::scale(2.0, 2.0), &Matrix::translate(1.0, 0.0));
        assert_eq!(m, Matrix::new(2.0, 0.0, 0.0, 2.0, 2.0, 0.0));
        assert_point(m.apply(0.0, 0.0), (2.0, 0.0));
    }

    #[test]
    fn test_compose_is_associative() {
        let all = samples();
        for a in &all {
            for b in &all {
                for c in &all {
                    let left = compose(a, &compose(b, c));
                    let right = compose(&compose(a, b), c);
                    assert!(left.approx_eq(&right, EPS), "{left:?} != {right:?}");
                }
            }
        }
    }

    #[test]
    fn test_inverse_round_trip() {
        for m in samples() {
            let inv = m.inverse().unwrap();
            for &(x, y) in &[(0.0, 0.0), (3.0, -7.0), (123.5, 0.25)] {
                let (ix, iy) = inv.apply(x, y);
                assert_point(m.apply(ix, iy), (x, y));
            }
        }
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Matrix::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_rotate_about_keeps_center() {
        let m = Matrix::rotate_about(45.0, 10.0, 20.0);
        assert_point(m.apply(10.0, 20.0), (10.0, 20.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let m = Matrix::rotate(90.0);
        assert_point(m.apply(10.0, 0.0), (0.0, 10.0));
        assert_point(m.apply(0.0, 10.0), (-10.0, 0.0));
    }

    #[test]
    fn test_extract_scale() {
        let (sx, sy) = Matrix::scale(2.0, -3.0).extract_scale();
        assert!((sx - 2.0).abs() < EPS);
        assert!((sy - 3.0).abs() < EPS);

        // rotation does not change the column norms
        let m = compose(&Matrix::rotate(30.0), &Matrix::scale(4.0, 1.0));
        let (sx, sy) = m.extract_scale();
        assert!((sx - 4.0).abs() < EPS);
        assert!((sy - 1.0).abs() < EPS);
        assert!((m.mean_scale() - 2.5).abs() < EPS);
    }

    #[test]
    fn test_rotation_and_determinant() {
        assert!((Matrix::rotate(30.0).rotation_degrees() - 30.0).abs() < EPS);
        assert!(Matrix::scale(1.0, -1.0).determinant() < 0.0);
        assert!(Matrix::rotate(200.0).determinant() > 0.0);
    }
}
