//! Iso-lines of the interpolated surface, traced triangle by triangle.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::point_set::PointSet;
use super::predicates::Xy;
use super::triangulation::{Edge, Triangulation};

/// A polyline at one level. Closed loops do not repeat their first point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourLine {
    pub points: Vec<Xy>,
    pub closed: bool,
}

impl ContourLine {
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| (w[1].0 - w[0].0).hypot(w[1].1 - w[0].1))
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + (first.0 - last.0).hypot(first.1 - last.1),
            _ => open,
        }
    }
}

/// Marching triangles at `level`. A vertex with `z >= level` is above.
///
/// Open lines start and end on hull edges; everything else is a closed loop.
/// Output order is deterministic for a given triangulation.
#[must_use]
pub fn contour_lines(
    triangulation: &Triangulation,
    points: &PointSet,
    level: f64,
) -> Vec<ContourLine> {
    let mut crossings: HashMap<Edge, Xy> = HashMap::new();
    let mut links: HashMap<Edge, Vec<Edge>> = HashMap::new();

    for triangle in triangulation.triangles() {
        let cut: Vec<Edge> = triangle
            .edges()
            .into_iter()
            .filter(|edge| (points.z(edge.a) >= level) != (points.z(edge.b) >= level))
            .collect();
        if let &[first, second] = cut.as_slice() {
            for edge in [first, second] {
                crossings
                    .entry(edge)
                    .or_insert_with(|| crossing_point(points, edge, level));
            }
            links.entry(first).or_default().push(second);
            links.entry(second).or_default().push(first);
        }
    }

    let mut nodes: Vec<Edge> = links.keys().copied().collect();
    nodes.sort_unstable();

    let mut visited: HashSet<Edge> = HashSet::with_capacity(nodes.len());
    let mut lines = Vec::new();

    for &start in &nodes {
        if links[&start].len() == 1 && !visited.contains(&start) {
            lines.push(trace(start, false, &links, &crossings, &mut visited));
        }
    }
    for &start in &nodes {
        if !visited.contains(&start) {
            lines.push(trace(start, true, &links, &crossings, &mut visited));
        }
    }

    log::debug!("contour at {level}: {} line(s)", lines.len());
    lines
}

fn crossing_point(points: &PointSet, edge: Edge, level: f64) -> Xy {
    let (ax, ay) = points.xy(edge.a);
    let (bx, by) = points.xy(edge.b);
    let (za, zb) = (points.z(edge.a), points.z(edge.b));
    let t = (level - za) / (zb - za);
    (ax + t * (bx - ax), ay + t * (by - ay))
}

fn trace(
    start: Edge,
    closed: bool,
    links: &HashMap<Edge, Vec<Edge>>,
    crossings: &HashMap<Edge, Xy>,
    visited: &mut HashSet<Edge>,
) -> ContourLine {
    let mut points = Vec::new();
    let mut current = start;
    loop {
        visited.insert(current);
        points.push(crossings[&current]);
        let next = links[&current].iter().copied().find(|edge| !visited.contains(edge));
        match next {
            Some(edge) => current = edge,
            None => break,
        }
    }
    ContourLine { points, closed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::triangulation::DelaunayOptions;

    fn lattice(f: impl Fn(f64, f64) -> f64) -> PointSet {
        let mut points = PointSet::new();
        for j in 0..7 {
            for i in 0..7 {
                let x = f64::from(i) + 0.01 * f64::from(j % 3);
                let y = f64::from(j) + 0.01 * f64::from(i % 2);
                points.push(x, y, f(x, y));
            }
        }
        points
    }

    #[test]
    fn test_plane_gives_single_open_line() {
        let points = lattice(|x, _| x);
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        let lines = contour_lines(&tri, &points, 2.5);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(!line.closed);
        assert!(line.len() >= 7);
        for &(x, _) in &line.points {
            assert!((x - 2.5).abs() < 1e-12);
        }
        assert!(line.length() > 5.9);
    }

    #[test]
    fn test_peak_gives_closed_loop() {
        let points = lattice(|x, y| -((x - 3.0).powi(2) + (y - 3.0).powi(2)));
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        let lines = contour_lines(&tri, &points, -2.5);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].closed);
        assert!(lines[0].len() >= 4);
    }

    #[test]
    fn test_level_outside_range_is_empty() {
        let points = lattice(|x, y| x + y);
        let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
        assert!(contour_lines(&tri, &points, 100.0).is_empty());
        assert!(contour_lines(&tri, &points, -100.0).is_empty());
    }
}
