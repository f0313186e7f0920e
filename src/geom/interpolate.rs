//! Piecewise-linear interpolation over a triangulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::locate::{Location, LocatorStrategy, PointLocator};
use super::point_set::PointSet;
use super::predicates::orient2d;
use super::triangulation::{Triangle, Triangulation};

/// Which point-location engine answers the queries. Both give the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationEngine {
    /// Walking locator seeded by the previous answer.
    #[default]
    Delaunay,
    /// Exhaustive scan over the triangles.
    Legacy,
}

impl InterpolationEngine {
    #[must_use]
    pub const fn strategy(self) -> LocatorStrategy {
        match self {
            Self::Delaunay => LocatorStrategy::Walk,
            Self::Legacy => LocatorStrategy::Scan,
        }
    }
}

impl fmt::Display for InterpolationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delaunay => f.write_str("delaunay"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for InterpolationEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delaunay" | "new" => Ok(Self::Delaunay),
            "legacy" | "old" => Ok(Self::Legacy),
            other => Err(format!("unknown interpolation engine '{other}'")),
        }
    }
}

/// Value of the plane through `triangle`'s vertices at `(x, y)`.
///
/// Barycentric weights are formed so that a query bit-equal to a vertex gets
/// weight exactly one there and zero elsewhere.
#[must_use]
pub fn planar_value(triangle: &Triangle, points: &PointSet, x: f64, y: f64) -> f64 {
    let [ia, ib, ic] = triangle.vertices;
    let (a, b, c) = (points.xy(ia), points.xy(ib), points.xy(ic));
    let p = (x, y);
    let area = orient2d(a, b, c);
    if area == 0.0 {
        return f64::NAN;
    }
    let wa = orient2d(p, b, c) / area;
    let wb = orient2d(a, p, c) / area;
    let wc = orient2d(a, b, p) / area;
    wa * points.z(ia) + wb * points.z(ib) + wc * points.z(ic)
}

/// Answers `value_at` queries against one triangulation.
#[derive(Debug, Clone)]
pub struct Interpolator<'a> {
    points: &'a PointSet,
    triangulation: &'a Triangulation,
    locator: PointLocator<'a>,
    margin_value: f64,
}

impl<'a> Interpolator<'a> {
    #[must_use]
    pub fn new(
        triangulation: &'a Triangulation,
        points: &'a PointSet,
        engine: InterpolationEngine,
        margin_value: f64,
    ) -> Self {
        Self {
            points,
            triangulation,
            locator: PointLocator::new(triangulation, points, engine.strategy()),
            margin_value,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<usize>) -> Self {
        self.locator = self.locator.with_hint(hint);
        self
    }

    #[must_use]
    pub const fn margin_value(&self) -> f64 {
        self.margin_value
    }

    #[must_use]
    pub fn locator(&self) -> &PointLocator<'a> {
        &self.locator
    }

    pub fn reset_hint(&mut self) {
        self.locator.reset_hint();
    }

    pub fn locate(&mut self, x: f64, y: f64) -> Location {
        self.locator.locate(x, y)
    }

    /// Interpolated value at `(x, y)`, or the margin value outside the hull.
    pub fn value_at(&mut self, x: f64, y: f64) -> f64 {
        self.value_with_location(x, y).0
    }

    /// Like [`Self::value_at`], also reporting whether the margin value was used.
    pub fn value_with_location(&mut self, x: f64, y: f64) -> (f64, Location) {
        let location = self.locator.locate(x, y);
        let value = match location {
            Location::Inside { triangle } => {
                let triangle = &self.triangulation.triangles()[triangle];
                triangle
                    .vertices
                    .iter()
                    .find(|&&v| self.points.xy(v) == (x, y))
                    .map_or_else(
                        || planar_value(triangle, self.points, x, y),
                        |&v| self.points.z(v),
                    )
            }
            Location::Outside { .. } => self.margin_value,
        };
        (value, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::triangulation::DelaunayOptions;

    fn unit_square() -> PointSet {
        PointSet::from_slices(&[0.0, 1.0, 0.0, 1.0], &[0.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 1.0, 2.0])
            .unwrap()
    }

    #[test]
    fn test_square_center_is_one() {
        let points = unit_square();
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        for engine in [InterpolationEngine::Delaunay, InterpolationEngine::Legacy] {
            let mut interp = Interpolator::new(&tri, &points, engine, 0.0);
            assert!((interp.value_at(0.5, 0.5) - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn test_vertices_are_exact() {
        let points = PointSet::from_slices(
            &[0.1, 3.7, 1.3, 2.9, 0.4],
            &[0.2, 0.3, 2.8, 2.1, 1.9],
            &[0.123_456_789, -4.5, 1e-7, 3.25, 17.0],
        )
        .unwrap();
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        let mut interp = Interpolator::new(&tri, &points, InterpolationEngine::Delaunay, 0.0);
        for p in points.iter() {
            assert_eq!(interp.value_at(p.x, p.y), p.z);
        }
    }

    #[test]
    fn test_plane_is_reproduced() {
        let mut points = PointSet::new();
        for (x, y) in [(0.0, 0.0), (4.0, 0.5), (3.5, 4.0), (-0.5, 3.0), (2.0, 2.2)] {
            points.push(x, y, 2.0 * x - 3.0 * y + 0.5);
        }
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        let mut interp = Interpolator::new(&tri, &points, InterpolationEngine::Legacy, 0.0);
        let value = interp.value_at(1.5, 1.5);
        assert!((value - (3.0 - 4.5 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_outside_returns_margin_value() {
        let points = unit_square();
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        let mut interp = Interpolator::new(&tri, &points, InterpolationEngine::Delaunay, -7.5);
        assert_eq!(interp.value_at(2.0, 2.0), -7.5);
        let (value, location) = interp.value_with_location(-1.0, 0.5);
        assert_eq!(value, -7.5);
        assert!(location.is_outside());
    }

    #[test]
    fn test_engine_names() {
        assert_eq!("Legacy".parse::<InterpolationEngine>(), Ok(InterpolationEngine::Legacy));
        assert_eq!("delaunay".parse::<InterpolationEngine>(), Ok(InterpolationEngine::Delaunay));
        assert!("other".parse::<InterpolationEngine>().is_err());
        assert_eq!(InterpolationEngine::Legacy.to_string(), "legacy");
    }
}
