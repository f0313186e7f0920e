//! Point location in a [`Triangulation`].

use serde::{Deserialize, Serialize};

use super::point_set::PointSet;
use super::predicates::{Xy, orient2d, segment_distance_squared};
use super::triangulation::{Edge, Triangulation};

/// Where a query point falls relative to the triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// Inside or on the boundary of `triangle`.
    Inside { triangle: usize },
    /// Outside the convex hull; carries the closest hull edge.
    Outside { nearest_hull_edge: Edge },
}

impl Location {
    #[must_use]
    pub const fn triangle(self) -> Option<usize> {
        match self {
            Self::Inside { triangle } => Some(triangle),
            Self::Outside { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_outside(self) -> bool {
        matches!(self, Self::Outside { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocatorStrategy {
    /// Visibility walk from the previous answer.
    #[default]
    Walk,
    /// First triangle in index order whose closed area holds the query.
    Scan,
}

/// Locates query points, remembering the last triangle as a starting hint.
#[derive(Debug, Clone)]
pub struct PointLocator<'a> {
    triangulation: &'a Triangulation,
    points: &'a PointSet,
    strategy: LocatorStrategy,
    hint: Option<usize>,
    fallbacks: usize,
}

impl<'a> PointLocator<'a> {
    #[must_use]
    pub fn new(
        triangulation: &'a Triangulation,
        points: &'a PointSet,
        strategy: LocatorStrategy,
    ) -> Self {
        Self {
            triangulation,
            points,
            strategy,
            hint: None,
            fallbacks: 0,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Option<usize>) -> Self {
        self.hint = hint;
        self
    }

    #[must_use]
    pub const fn hint(&self) -> Option<usize> {
        self.hint
    }

    pub fn reset_hint(&mut self) {
        self.hint = None;
    }

    #[must_use]
    pub const fn strategy(&self) -> LocatorStrategy {
        self.strategy
    }

    /// Number of walks that hit the step limit and fell back to a scan.
    #[must_use]
    pub const fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    pub fn locate(&mut self, x: f64, y: f64) -> Location {
        let p = (x, y);
        let location = match self.strategy {
            LocatorStrategy::Walk => self.walk(p),
            LocatorStrategy::Scan => self.scan(p),
        };
        if let Location::Inside { triangle } = location {
            self.hint = Some(triangle);
        }
        location
    }

    fn corners(&self, t: usize) -> [Xy; 3] {
        self.triangulation.triangles()[t].xy(self.points)
    }

    fn walk(&mut self, p: Xy) -> Location {
        let count = self.triangulation.len();
        let mut t = self.hint.filter(|&t| t < count).unwrap_or(0);

        'walk: for _ in 0..=count {
            let corners = self.corners(t);
            for k in 0..3 {
                let a = corners[(k + 1) % 3];
                let b = corners[(k + 2) % 3];
                if orient2d(a, b, p) < 0.0 {
                    match self.triangulation.neighbors(t)[k] {
                        Some(next) => {
                            t = next;
                            continue 'walk;
                        }
                        None => {
                            self.hint = Some(t);
                            return self.outside(p);
                        }
                    }
                }
            }
            return Location::Inside { triangle: t };
        }

        self.fallbacks += 1;
        log::trace!("walk to ({}, {}) exceeded {count} steps, scanning", p.0, p.1);
        self.scan(p)
    }

    fn scan(&self, p: Xy) -> Location {
        let mut best: Option<(usize, f64)> = None;
        for t in 0..self.triangulation.len() {
            let [a, b, c] = self.corners(t);
            let worst = orient2d(a, b, p).min(orient2d(b, c, p)).min(orient2d(c, a, p));
            if worst >= 0.0 {
                return Location::Inside { triangle: t };
            }
            if best.is_none_or(|(_, value)| worst > value) {
                best = Some((t, worst));
            }
        }

        // Rounding can leave a point on a shared edge outside both triangles;
        // if no hull edge has it strictly outside, take the closest fit.
        if self.beyond_hull(p) {
            self.outside(p)
        } else {
            best.map_or_else(|| self.outside(p), |(triangle, _)| Location::Inside { triangle })
        }
    }

    fn beyond_hull(&self, p: Xy) -> bool {
        let hull = self.triangulation.hull();
        (0..hull.len()).any(|i| {
            let a = self.points.xy(hull[i]);
            let b = self.points.xy(hull[(i + 1) % hull.len()]);
            orient2d(a, b, p) < 0.0
        })
    }

    fn outside(&self, p: Xy) -> Location {
        let edges = self.triangulation.hull_edges();
        let distance = |edge: &Edge| {
            segment_distance_squared(p, self.points.xy(edge.a), self.points.xy(edge.b))
        };
        let mut nearest = edges[0];
        let mut nearest_distance = distance(&nearest);
        for edge in &edges[1..] {
            let d = distance(edge);
            if d < nearest_distance {
                nearest = *edge;
                nearest_distance = d;
            }
        }
        Location::Outside {
            nearest_hull_edge: nearest,
        }
    }
}
