use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

/// A scattered sample: position in the (x, y) plane plus its value `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The origin point (0, 0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// The (x, y) projection used by the triangulation.
    #[must_use]
    pub const fn xy(self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Linear interpolation between two points.
    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        let [x, y, z] = arr;
        Self::new(x, y, z)
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        p.to_array()
    }
}

impl From<(f64, f64, f64)> for Point3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounds2
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in the (x, y) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds2 {
    #[must_use]
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    #[must_use]
    pub fn from_xy(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let mut iter = xs.iter().copied().zip(ys.iter().copied());
        let (x0, y0) = iter.next()?;
        let mut bounds = Self::new(x0, x0, y0, y0);
        for (x, y) in iter {
            bounds = bounds.expand_point(x, y);
        }
        Some(bounds)
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.y_max - self.y_min
    }

    #[must_use]
    pub fn expand_point(self, x: f64, y: f64) -> Self {
        Self::new(
            self.x_min.min(x),
            self.x_max.max(x),
            self.y_min.min(y),
            self.y_max.max(y),
        )
    }

    /// Grows each side by `fraction` of the corresponding extent.
    #[must_use]
    pub fn expand_by_fraction(self, fraction: f64) -> Self {
        let dx = fraction * self.width();
        let dy = fraction * self.height();
        Self::new(
            self.x_min - dx,
            self.x_max + dx,
            self.y_min - dy,
            self.y_max + dy,
        )
    }

    /// Widens zero-width ranges so that a grid can be laid over them.
    ///
    /// A range whose ends agree to `rel_eps` relative precision is opened to
    /// `±0.001` when it sits at zero, otherwise by `|v| * rel_eps / 2` on each side.
    #[must_use]
    pub fn widen_degenerate(self, rel_eps: f64) -> Self {
        let (x_min, x_max) = widen_range(self.x_min, self.x_max, rel_eps);
        let (y_min, y_max) = widen_range(self.y_min, self.y_max, rel_eps);
        Self::new(x_min, x_max, y_min, y_max)
    }
}

fn widen_range(lo: f64, hi: f64, rel_eps: f64) -> (f64, f64) {
    if !approx_eq_relative(lo, hi, rel_eps) {
        return (lo, hi);
    }
    if lo.abs() < rel_eps {
        (-0.001, 0.001)
    } else {
        (
            lo - lo.abs() * (rel_eps / 2.0),
            hi + hi.abs() * (rel_eps / 2.0),
        )
    }
}

/// Relative comparison: `|a - b| <= eps * (|a| + |b|) / 2`.
#[must_use]
pub fn approx_eq_relative(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps * 0.5 * (a.abs() + b.abs())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Relative tolerance for the geometric predicates.
///
/// A determinant whose magnitude is at most `eps` times its permanent (the
/// same sum with every term taken in absolute value) is treated as zero: the
/// points are then collinear, or cocircular, for the purposes of the
/// triangulation. The check is independent of the coordinate scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Default predicate tolerance (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    /// `true` when `det` is indistinguishable from zero given its permanent.
    #[must_use]
    pub fn is_negligible(self, det: f64, permanent: f64) -> bool {
        det.abs() <= self.eps * permanent
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point3_lerp() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 4.0, 6.0);
        assert_eq!(a.lerp(b, 0.5), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(Point3::from([1.0, 2.0, 3.0]).to_array(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bounds_from_xy() {
        let xs = [1.0, -2.0, 3.0];
        let ys = [0.5, 4.0, -1.0];
        let bounds = Bounds2::from_xy(&xs, &ys).unwrap();
        assert_eq!(bounds, Bounds2::new(-2.0, 3.0, -1.0, 4.0));
        assert_eq!((bounds.width(), bounds.height()), (5.0, 5.0));
        assert!(Bounds2::from_xy(&[], &[]).is_none());
    }

    #[test]
    fn test_bounds_expand_by_fraction() {
        let bounds = Bounds2::new(0.0, 10.0, 0.0, 2.0).expand_by_fraction(0.1);
        assert_eq!(bounds, Bounds2::new(-1.0, 11.0, -0.2, 2.2));
    }

    #[test]
    fn test_widen_degenerate_ranges() {
        let at_zero = Bounds2::new(0.0, 0.0, 1.0, 2.0).widen_degenerate(1e-9);
        assert_eq!(at_zero.x_min, -0.001);
        assert_eq!(at_zero.x_max, 0.001);
        assert_eq!(at_zero.y_min, 1.0);

        let away = Bounds2::new(5.0, 5.0, 1.0, 2.0).widen_degenerate(1e-9);
        assert!(away.x_min < 5.0 && away.x_max > 5.0);
        assert!(away.width() < 1e-7);
    }

    #[test]
    fn test_tolerance_is_negligible() {
        let tol = Tolerance::default();
        assert!(tol.is_negligible(1e-12, 1.0));
        assert!(!tol.is_negligible(1e-6, 1.0));
        assert!(tol.is_negligible(0.0, 0.0));
    }
}
