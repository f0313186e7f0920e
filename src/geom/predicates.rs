//! Orientation and in-circle predicates on doubles.
//!
//! Both predicates return the raw determinant together with its permanent so
//! callers can decide degeneracy with a scale-free [`Tolerance`].

use super::core::Tolerance;

pub type Xy = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

/// Twice the signed area of `abc`; positive when counter-clockwise.
#[must_use]
pub fn orient2d(a: Xy, b: Xy, c: Xy) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// [`orient2d`] plus the permanent of the determinant.
#[must_use]
pub fn orient2d_with_permanent(a: Xy, b: Xy, c: Xy) -> (f64, f64) {
    let left = (b.0 - a.0) * (c.1 - a.1);
    let right = (b.1 - a.1) * (c.0 - a.0);
    (left - right, left.abs() + right.abs())
}

#[must_use]
pub fn orientation(a: Xy, b: Xy, c: Xy, tol: Tolerance) -> Orientation {
    let (det, permanent) = orient2d_with_permanent(a, b, c);
    if tol.is_negligible(det, permanent) {
        Orientation::Collinear
    } else if det > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    }
}

/// In-circle determinant: positive when `d` lies inside the circle through the
/// counter-clockwise triangle `abc`, negative outside, zero when cocircular.
#[must_use]
pub fn incircle_with_permanent(a: Xy, b: Xy, c: Xy, d: Xy) -> (f64, f64) {
    let adx = a.0 - d.0;
    let ady = a.1 - d.1;
    let bdx = b.0 - d.0;
    let bdy = b.1 - d.1;
    let cdx = c.0 - d.0;
    let cdy = c.1 - d.1;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let bc = bdx * cdy - cdx * bdy;
    let ca = cdx * ady - adx * cdy;
    let ab = adx * bdy - bdx * ady;

    let det = alift * bc + blift * ca + clift * ab;
    let permanent = ((bdx * cdy).abs() + (cdx * bdy).abs()) * alift
        + ((cdx * ady).abs() + (adx * cdy).abs()) * blift
        + ((adx * bdy).abs() + (bdx * ady).abs()) * clift;
    (det, permanent)
}

/// `true` when `d` is strictly inside the circumcircle of the counter-clockwise
/// triangle `abc`, beyond the tolerance. Near-cocircular points are outside.
#[must_use]
pub fn in_circumcircle(a: Xy, b: Xy, c: Xy, d: Xy, tol: Tolerance) -> bool {
    let (det, permanent) = incircle_with_permanent(a, b, c, d);
    det > 0.0 && !tol.is_negligible(det, permanent)
}

/// Circumcenter of `abc`, or `None` for a degenerate triangle.
#[must_use]
pub fn circumcenter(a: Xy, b: Xy, c: Xy) -> Option<Xy> {
    let bx = b.0 - a.0;
    let by = b.1 - a.1;
    let cx = c.0 - a.0;
    let cy = c.1 - a.1;
    let d = 2.0 * (bx * cy - by * cx);
    if d == 0.0 || !d.is_finite() {
        return None;
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    Some((a.0 + ux, a.1 + uy))
}

/// Squared distance from `p` to the closed segment `ab`.
#[must_use]
pub fn segment_distance_squared(p: Xy, a: Xy, b: Xy) -> f64 {
    let abx = b.0 - a.0;
    let aby = b.1 - a.1;
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = a.0 + t * abx - p.0;
    let dy = a.1 + t * aby - p.1;
    dx * dx + dy * dy
}

/// `true` when `p`, assumed on the line through `ab`, projects strictly
/// between `a` and `b`.
#[must_use]
pub fn projects_inside_segment(p: Xy, a: Xy, b: Xy) -> bool {
    let abx = b.0 - a.0;
    let aby = b.1 - a.1;
    let t = (p.0 - a.0) * abx + (p.1 - a.1) * aby;
    t > 0.0 && t < abx * abx + aby * aby
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient2d_sign() {
        assert!(orient2d((0.0, 0.0), (1.0, 0.0), (0.0, 1.0)) > 0.0);
        assert!(orient2d((0.0, 0.0), (0.0, 1.0), (1.0, 0.0)) < 0.0);
        assert_eq!(orient2d((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_orientation_is_scale_free() {
        let tol = Tolerance::default();
        let tiny = 1e-20;
        assert_eq!(
            orientation((0.0, 0.0), (tiny, 0.0), (0.0, tiny), tol),
            Orientation::CounterClockwise
        );
        assert_eq!(
            orientation((0.0, 0.0), (1.0, 1.0), (3.0, 3.0 + 1e-12), tol),
            Orientation::Collinear
        );
        assert_eq!(
            orientation((0.0, 0.0), (1.0, 1.0), (3.0, 3.0 + 1e-12), Tolerance::new(0.0)),
            Orientation::CounterClockwise
        );
    }

    #[test]
    fn test_incircle_inside_outside_cocircular() {
        let tol = Tolerance::default();
        let a = (0.0, 0.0);
        let b = (1.0, 0.0);
        let c = (0.0, 1.0);
        assert!(in_circumcircle(a, b, c, (0.5, 0.5), tol));
        assert!(!in_circumcircle(a, b, c, (2.0, 2.0), tol));
        // (1, 1) is on the circle through the unit right triangle.
        assert!(!in_circumcircle(a, b, c, (1.0, 1.0), tol));
        let (det, _) = incircle_with_permanent(a, b, c, (1.0, 1.0));
        assert_eq!(det, 0.0);
    }

    #[test]
    fn test_circumcenter() {
        let center = circumcenter((0.0, 0.0), (2.0, 0.0), (0.0, 2.0)).unwrap();
        assert!((center.0 - 1.0).abs() < 1e-12);
        assert!((center.1 - 1.0).abs() < 1e-12);
        assert!(circumcenter((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)).is_none());
    }

    #[test]
    fn test_segment_distance() {
        let d = segment_distance_squared((0.5, 1.0), (0.0, 0.0), (1.0, 0.0));
        assert!((d - 1.0).abs() < 1e-12);
        let d = segment_distance_squared((2.0, 0.0), (0.0, 0.0), (1.0, 0.0));
        assert!((d - 1.0).abs() < 1e-12);
        assert!(projects_inside_segment((0.5, 0.0), (0.0, 0.0), (1.0, 0.0)));
        assert!(!projects_inside_segment((1.5, 0.0), (0.0, 0.0), (1.0, 0.0)));
    }
}
