//! Delaunay triangulation of the (x, y) projection of a [`PointSet`].
//!
//! Bowyer-Watson incremental insertion. Instead of a finite super-triangle the
//! working mesh carries one *ghost* triangle per hull edge, joining that edge to
//! a virtual vertex at infinity. The mesh is then topologically closed, hull
//! growth goes through the same cavity code as interior insertion, and the
//! final real triangles tile the exact convex hull.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::core::Tolerance;
use super::point_set::PointSet;
use super::predicates::{
    Orientation, Xy, circumcenter, in_circumcircle, orient2d, orient2d_with_permanent,
    orientation, projects_inside_segment,
};
use crate::error::{DelaunayError, DelaunayResult};

/// Virtual vertex at infinity used by ghost triangles.
const GHOST: usize = usize::MAX;

// ============================================================================
// Public types
// ============================================================================

/// Three point indices in counter-clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [usize; 3],
}

impl Triangle {
    #[must_use]
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Edge opposite vertex slot `k`.
    #[must_use]
    pub const fn edge(&self, k: usize) -> Edge {
        Edge::new(self.vertices[(k + 1) % 3], self.vertices[(k + 2) % 3])
    }

    #[must_use]
    pub fn edges(&self) -> [Edge; 3] {
        [self.edge(0), self.edge(1), self.edge(2)]
    }

    #[must_use]
    pub fn contains_vertex(&self, index: usize) -> bool {
        self.vertices.contains(&index)
    }

    /// Vertex indices sorted ascending; useful to compare triangulations.
    #[must_use]
    pub fn sorted(&self) -> [usize; 3] {
        let mut v = self.vertices;
        v.sort_unstable();
        v
    }

    #[must_use]
    pub fn xy(&self, points: &PointSet) -> [Xy; 3] {
        self.vertices.map(|i| points.xy(i))
    }

    /// Positive for counter-clockwise triangles.
    #[must_use]
    pub fn signed_area(&self, points: &PointSet) -> f64 {
        let [a, b, c] = self.xy(points);
        0.5 * orient2d(a, b, c)
    }

    #[must_use]
    pub fn circumcenter(&self, points: &PointSet) -> Option<Xy> {
        let [a, b, c] = self.xy(points);
        circumcenter(a, b, c)
    }

    #[must_use]
    pub fn circumradius(&self, points: &PointSet) -> Option<f64> {
        let (cx, cy) = self.circumcenter(points)?;
        let (ax, ay) = points.xy(self.vertices[0]);
        Some((ax - cx).hypot(ay - cy))
    }
}

/// Unordered pair of point indices, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    #[must_use]
    pub const fn new(p: usize, q: usize) -> Self {
        if p < q { Self { a: p, b: q } } else { Self { a: q, b: p } }
    }
}

/// Parameters of a triangulation build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelaunayOptions {
    /// Cavity operations allowed over the whole build. One operation is one
    /// triangle absorbed into a cavity, either as a conflict or as a repair;
    /// an insertion absorbs about four on average.
    pub max_iterations: usize,
    /// Relative tolerance of the orientation / in-circle predicates.
    pub tolerance: Tolerance,
}

impl Default for DelaunayOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tolerance: Tolerance::default(),
        }
    }
}

impl DelaunayOptions {
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangulationDiagnostics {
    pub input_point_count: usize,
    pub triangle_count: usize,
    pub hull_vertex_count: usize,
    /// Triangles absorbed into cavities over the whole build.
    pub cavity_operations: usize,
    /// Largest number of cavity operations spent on one insertion.
    pub max_cavity_operations: usize,
    /// Triangles absorbed to make a cavity star-shaped.
    pub cavity_repairs: usize,
    /// Insertions whose walk hit its step limit and fell back to a scan.
    pub location_fallbacks: usize,
}

/// A Delaunay triangulation tiling the convex hull of its input exactly once.
///
/// Triangles refer to points by index and own no coordinates; pass the same,
/// unmodified [`PointSet`] to every geometric query.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    triangles: Vec<Triangle>,
    neighbors: Vec<[Option<usize>; 3]>,
    hull: Vec<usize>,
    hull_edges: Vec<Edge>,
    on_hull: Vec<bool>,
    vertex_triangle: Vec<usize>,
    diagnostics: TriangulationDiagnostics,
}

impl Triangulation {
    /// Builds the triangulation of `points`.
    pub fn build(points: &PointSet, options: DelaunayOptions) -> DelaunayResult<Self> {
        validate_input(points)?;
        log::debug!(
            "building Delaunay triangulation of {} points (budget {} cavity operations)",
            points.len(),
            options.max_iterations
        );

        let order = insertion_order(points);
        let (seed, rest) = choose_seed(points, &order, options.tolerance)?;

        let mut builder = Builder::new(points, seed, options);
        for index in rest {
            builder.insert(index)?;
        }
        let triangulation = builder.finish();

        log::debug!(
            "triangulation done: {} triangles, {} hull vertices, {} cavity operations",
            triangulation.diagnostics.triangle_count,
            triangulation.diagnostics.hull_vertex_count,
            triangulation.diagnostics.cavity_operations
        );
        Ok(triangulation)
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Neighbours of triangle `t`; slot `k` is across the edge opposite vertex `k`,
    /// `None` across a hull edge.
    #[must_use]
    pub fn neighbors(&self, t: usize) -> [Option<usize>; 3] {
        self.neighbors[t]
    }

    /// Hull vertices in counter-clockwise order, starting at the lowest index.
    #[must_use]
    pub fn hull(&self) -> &[usize] {
        &self.hull
    }

    /// Hull edges in the same order as [`Self::hull`].
    #[must_use]
    pub fn hull_edges(&self) -> &[Edge] {
        &self.hull_edges
    }

    #[must_use]
    pub fn is_on_hull(&self, point: usize) -> bool {
        self.on_hull.get(point).copied().unwrap_or(false)
    }

    /// One triangle incident to `point`.
    #[must_use]
    pub fn incident_triangle(&self, point: usize) -> Option<usize> {
        self.vertex_triangle.get(point).copied().filter(|&t| t != usize::MAX)
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.vertex_triangle.len()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &TriangulationDiagnostics {
        &self.diagnostics
    }

    /// All distinct edges, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.triangles.iter().flat_map(Triangle::edges).collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Number of triangles incident to every edge.
    #[must_use]
    pub fn edge_incidence(&self) -> HashMap<Edge, usize> {
        let mut counts = HashMap::new();
        for edge in self.triangles.iter().flat_map(Triangle::edges) {
            *counts.entry(edge).or_insert(0) += 1;
        }
        counts
    }

    /// Sum of the triangle areas.
    #[must_use]
    pub fn area(&self, points: &PointSet) -> f64 {
        self.triangles.iter().map(|t| t.signed_area(points)).sum()
    }

    /// Area enclosed by the hull polygon.
    #[must_use]
    pub fn hull_area(&self, points: &PointSet) -> f64 {
        let n = self.hull.len();
        let Some(&first) = self.hull.first() else {
            return 0.0;
        };
        // Shoelace on coordinates relative to the first hull vertex.
        let (ox, oy) = points.xy(first);
        let twice: f64 = (1..n.saturating_sub(1))
            .map(|i| {
                let (x0, y0) = points.xy(self.hull[i]);
                let (x1, y1) = points.xy(self.hull[i + 1]);
                (x0 - ox) * (y1 - oy) - (x1 - ox) * (y0 - oy)
            })
            .sum();
        0.5 * twice
    }
}

// ============================================================================
// Input checks and insertion order
// ============================================================================

fn validate_input(points: &PointSet) -> DelaunayResult<()> {
    for (index, (x, y)) in points.xs().iter().zip(points.ys()).enumerate() {
        if !x.is_finite() || !y.is_finite() {
            return Err(DelaunayError::NonFiniteCoordinate { index });
        }
    }
    if points.len() < 3 {
        return Err(DelaunayError::InsufficientPoints {
            provided: points.len(),
        });
    }

    let mut sorted: Vec<usize> = (0..points.len()).collect();
    sorted.sort_by(|&i, &j| {
        let (xi, yi) = points.xy(i);
        let (xj, yj) = points.xy(j);
        xi.total_cmp(&xj).then(yi.total_cmp(&yj)).then(i.cmp(&j))
    });
    for pair in sorted.windows(2) {
        if points.xy(pair[0]) == points.xy(pair[1]) {
            return Err(DelaunayError::DuplicatePoint {
                first: pair[0].min(pair[1]),
                second: pair[0].max(pair[1]),
            });
        }
    }
    Ok(())
}

/// Snake-ordered bucketing: consecutive insertions are spatially close, which
/// keeps the walk from the previous insertion short.
fn insertion_order(points: &PointSet) -> Vec<usize> {
    let n = points.len();
    let mut order: Vec<usize> = (0..n).collect();
    let Ok(bounds) = points.bounds() else {
        return order;
    };

    let cells = ((n as f64 / 4.0).sqrt().ceil() as usize).max(1);
    let bucket = |value: f64, lo: f64, extent: f64| -> usize {
        if extent > 0.0 {
            (((value - lo) / extent * cells as f64) as usize).min(cells - 1)
        } else {
            0
        }
    };

    order.sort_by_cached_key(|&i| {
        let (x, y) = points.xy(i);
        let row = bucket(y, bounds.y_min, bounds.height());
        let col = bucket(x, bounds.x_min, bounds.width());
        let col = if row % 2 == 1 { cells - 1 - col } else { col };
        (row, col, i)
    });
    order
}

/// First two points of the order plus the first point not collinear with them,
/// returned counter-clockwise, and the remaining points in order.
fn choose_seed(
    points: &PointSet,
    order: &[usize],
    tol: Tolerance,
) -> DelaunayResult<([usize; 3], Vec<usize>)> {
    let a = order[0];
    let b = order[1];
    let (pa, pb) = (points.xy(a), points.xy(b));

    let mut seed = None;
    for (pos, &c) in order.iter().enumerate().skip(2) {
        match orientation(pa, pb, points.xy(c), tol) {
            Orientation::CounterClockwise => {
                seed = Some((pos, [a, b, c]));
                break;
            }
            Orientation::Clockwise => {
                seed = Some((pos, [a, c, b]));
                break;
            }
            Orientation::Collinear => {}
        }
    }
    let (pos, seed) = seed.ok_or(DelaunayError::DegenerateInput)?;

    let rest = order
        .iter()
        .enumerate()
        .filter(|&(i, _)| i >= 2 && i != pos)
        .map(|(_, &p)| p)
        .collect();
    Ok((seed, rest))
}

// ============================================================================
// Incremental builder
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Slot {
    v: [usize; 3],
    /// `n[k]` is the slot across the edge opposite `v[k]`.
    n: [usize; 3],
    alive: bool,
}

impl Slot {
    fn ghost_position(&self) -> Option<usize> {
        self.v.iter().position(|&v| v == GHOST)
    }
}

#[derive(Debug, Clone, Copy)]
struct BoundaryEdge {
    a: usize,
    b: usize,
    outside: usize,
}

struct Builder<'a> {
    points: &'a PointSet,
    options: DelaunayOptions,
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Cavity membership, stamped with the insertion counter.
    mark: Vec<u64>,
    stamp: u64,
    hint: usize,
    diagnostics: TriangulationDiagnostics,
}

impl<'a> Builder<'a> {
    fn new(points: &'a PointSet, seed: [usize; 3], options: DelaunayOptions) -> Self {
        let [a, b, c] = seed;
        let mut slots = vec![
            Slot { v: [a, b, c], n: [0; 3], alive: true },
            Slot { v: [c, b, GHOST], n: [0; 3], alive: true },
            Slot { v: [a, c, GHOST], n: [0; 3], alive: true },
            Slot { v: [b, a, GHOST], n: [0; 3], alive: true },
        ];

        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for (id, slot) in slots.iter().enumerate() {
            for k in 0..3 {
                directed.insert((slot.v[(k + 1) % 3], slot.v[(k + 2) % 3]), id);
            }
        }
        for slot in &mut slots {
            for k in 0..3 {
                let reverse = (slot.v[(k + 2) % 3], slot.v[(k + 1) % 3]);
                slot.n[k] = directed[&reverse];
            }
        }

        Self {
            points,
            options,
            mark: vec![0; slots.len()],
            slots,
            free: Vec::new(),
            stamp: 0,
            hint: 0,
            diagnostics: TriangulationDiagnostics {
                input_point_count: points.len(),
                ..TriangulationDiagnostics::default()
            },
        }
    }

    fn xy(&self, v: usize) -> Xy {
        self.points.xy(v)
    }

    fn is_ghost(&self, t: usize) -> bool {
        self.slots[t].ghost_position().is_some()
    }

    /// Whether the circumcircle of `t` strictly contains `p`. For a ghost the
    /// "circle" is the open half-plane beyond its hull edge, plus the open hull
    /// segment itself.
    fn conflicts(&self, t: usize, p: Xy) -> bool {
        let slot = &self.slots[t];
        match slot.ghost_position() {
            Some(k) => {
                let a = self.xy(slot.v[(k + 1) % 3]);
                let b = self.xy(slot.v[(k + 2) % 3]);
                let (det, permanent) = orient2d_with_permanent(a, b, p);
                if self.options.tolerance.is_negligible(det, permanent) {
                    projects_inside_segment(p, a, b)
                } else {
                    det > 0.0
                }
            }
            None => {
                let [a, b, c] = slot.v.map(|v| self.xy(v));
                in_circumcircle(a, b, c, p, self.options.tolerance)
            }
        }
    }

    /// Walks from the hint to the real triangle containing `p`, or to the ghost
    /// behind the hull edge `p` lies beyond.
    fn locate(&mut self, p: Xy) -> Option<usize> {
        let mut t = self.hint;
        let limit = self.slots.len() + 3;
        'walk: for _ in 0..limit {
            if self.is_ghost(t) {
                return Some(t);
            }
            let slot = self.slots[t];
            for k in 0..3 {
                let a = self.xy(slot.v[(k + 1) % 3]);
                let b = self.xy(slot.v[(k + 2) % 3]);
                if orient2d(a, b, p) < 0.0 {
                    t = slot.n[k];
                    continue 'walk;
                }
            }
            return Some(t);
        }

        self.diagnostics.location_fallbacks += 1;
        log::trace!("insertion walk exceeded {limit} steps, scanning");
        let contains = |slot: &Slot| {
            let [a, b, c] = slot.v.map(|v| self.xy(v));
            orient2d(a, b, p) >= 0.0 && orient2d(b, c, p) >= 0.0 && orient2d(c, a, p) >= 0.0
        };
        self.slots
            .iter()
            .position(|s| s.alive && s.ghost_position().is_none() && contains(s))
            .or_else(|| self.conflicting_ghost(p))
    }

    fn conflicting_ghost(&self, p: Xy) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .find(|&(id, s)| s.alive && s.ghost_position().is_some() && self.conflicts(id, p))
            .map(|(id, _)| id)
    }

    /// Charges one cavity operation to the insertion and to the build total.
    fn spend(&mut self, ops: &mut usize) -> DelaunayResult<()> {
        *ops += 1;
        self.diagnostics.cavity_operations += 1;
        if self.diagnostics.cavity_operations > self.options.max_iterations {
            return Err(DelaunayError::IterationBudgetExceeded {
                budget: self.options.max_iterations,
            });
        }
        Ok(())
    }

    fn insert(&mut self, index: usize) -> DelaunayResult<()> {
        let p = self.xy(index);
        // A walk can stop at a ghost whose hull edge `p` is only collinear with.
        let start = self
            .locate(p)
            .filter(|&t| !self.is_ghost(t) || self.conflicts(t, p))
            .or_else(|| self.conflicting_ghost(p))
            .ok_or(DelaunayError::Robustness { point: index })?;

        self.stamp += 1;
        let stamp = self.stamp;
        let mut ops = 0usize;

        // Conflict region: breadth-first from the located triangle.
        self.spend(&mut ops)?;
        let mut cavity = vec![start];
        self.mark[start] = stamp;
        let mut cursor = 0;
        while cursor < cavity.len() {
            let t = cavity[cursor];
            cursor += 1;
            for k in 0..3 {
                let nb = self.slots[t].n[k];
                if self.mark[nb] == stamp {
                    continue;
                }
                if self.conflicts(nb, p) {
                    self.spend(&mut ops)?;
                    self.mark[nb] = stamp;
                    cavity.push(nb);
                }
            }
        }

        // Every boundary edge must see `p` strictly on its left.
        let mut boundary: Vec<BoundaryEdge> = Vec::new();
        loop {
            boundary.clear();
            let mut invisible = None;
            'scan: for &t in &cavity {
                let slot = self.slots[t];
                for k in 0..3 {
                    let nb = slot.n[k];
                    if self.mark[nb] == stamp {
                        continue;
                    }
                    let a = slot.v[(k + 1) % 3];
                    let b = slot.v[(k + 2) % 3];
                    if a != GHOST && b != GHOST && orient2d(self.xy(a), self.xy(b), p) <= 0.0 {
                        invisible = Some(nb);
                        break 'scan;
                    }
                    boundary.push(BoundaryEdge { a, b, outside: nb });
                }
            }
            match invisible {
                Some(nb) => {
                    self.spend(&mut ops)?;
                    self.diagnostics.cavity_repairs += 1;
                    self.mark[nb] = stamp;
                    cavity.push(nb);
                }
                None => break,
            }
        }

        self.retriangulate(index, &cavity, &boundary)?;

        self.diagnostics.max_cavity_operations = self.diagnostics.max_cavity_operations.max(ops);
        Ok(())
    }

    /// Replaces the cavity by a fan from `index` to its boundary edges.
    fn retriangulate(
        &mut self,
        index: usize,
        cavity: &[usize],
        boundary: &[BoundaryEdge],
    ) -> DelaunayResult<()> {
        let mut by_start: HashMap<usize, usize> = HashMap::with_capacity(boundary.len());
        let mut by_end: HashMap<usize, usize> = HashMap::with_capacity(boundary.len());

        for &t in cavity {
            self.slots[t].alive = false;
            self.free.push(t);
        }

        let mut created = Vec::with_capacity(boundary.len());
        for edge in boundary {
            let id = self.alloc([edge.a, edge.b, index]);
            self.slots[id].n[2] = edge.outside;

            let outside = &mut self.slots[edge.outside];
            if let Some(k) = (0..3)
                .find(|&k| outside.v[(k + 1) % 3] == edge.b && outside.v[(k + 2) % 3] == edge.a)
            {
                outside.n[k] = id;
            }

            // A vertex seen twice means the cavity boundary is not a simple loop.
            if by_start.insert(edge.a, id).is_some() || by_end.insert(edge.b, id).is_some() {
                return Err(DelaunayError::Robustness { point: index });
            }
            created.push(id);
        }

        for &id in &created {
            let [a, b, _] = self.slots[id].v;
            let next = by_start.get(&b).copied();
            let prev = by_end.get(&a).copied();
            match (next, prev) {
                (Some(next), Some(prev)) => {
                    self.slots[id].n[0] = next;
                    self.slots[id].n[1] = prev;
                }
                _ => return Err(DelaunayError::Robustness { point: index }),
            }
        }

        self.hint = created
            .iter()
            .copied()
            .find(|&id| !self.is_ghost(id))
            .ok_or(DelaunayError::Robustness { point: index })?;
        Ok(())
    }

    fn alloc(&mut self, v: [usize; 3]) -> usize {
        let slot = Slot { v, n: [0; 3], alive: true };
        if let Some(id) = self.free.pop() {
            self.slots[id] = slot;
            id
        } else {
            self.slots.push(slot);
            self.mark.push(0);
            self.slots.len() - 1
        }
    }

    fn finish(self) -> Triangulation {
        let point_count = self.points.len();

        let mut remap = vec![usize::MAX; self.slots.len()];
        let mut triangles = Vec::new();
        for (id, slot) in self.slots.iter().enumerate() {
            if slot.alive && slot.ghost_position().is_none() {
                remap[id] = triangles.len();
                triangles.push(Triangle { vertices: slot.v });
            }
        }

        let neighbors: Vec<[Option<usize>; 3]> = self
            .slots
            .iter()
            .filter(|slot| slot.alive && slot.ghost_position().is_none())
            .map(|slot| slot.n.map(|nb| (remap[nb] != usize::MAX).then_some(remap[nb])))
            .collect();

        // Ghost [.., a, b] (rotated so GHOST leads) lies beyond hull edge b -> a.
        let mut next_on_hull: HashMap<usize, usize> = HashMap::new();
        for slot in self.slots.iter().filter(|s| s.alive) {
            if let Some(k) = slot.ghost_position() {
                let a = slot.v[(k + 1) % 3];
                let b = slot.v[(k + 2) % 3];
                next_on_hull.insert(b, a);
            }
        }

        let mut hull = Vec::with_capacity(next_on_hull.len());
        if let Some(&start) = next_on_hull.keys().min() {
            let mut current = start;
            loop {
                hull.push(current);
                match next_on_hull.get(&current) {
                    Some(&next) if next != start && hull.len() <= next_on_hull.len() => {
                        current = next;
                    }
                    _ => break,
                }
            }
        }
        let hull_edges: Vec<Edge> = (0..hull.len())
            .map(|i| Edge::new(hull[i], hull[(i + 1) % hull.len()]))
            .collect();

        let mut on_hull = vec![false; point_count];
        for &v in &hull {
            on_hull[v] = true;
        }

        let mut vertex_triangle = vec![usize::MAX; point_count];
        for (t, triangle) in triangles.iter().enumerate() {
            for &v in &triangle.vertices {
                if vertex_triangle[v] == usize::MAX {
                    vertex_triangle[v] = t;
                }
            }
        }

        let diagnostics = TriangulationDiagnostics {
            triangle_count: triangles.len(),
            hull_vertex_count: hull.len(),
            ..self.diagnostics
        };

        Triangulation {
            triangles,
            neighbors,
            hull,
            hull_edges,
            on_hull,
            vertex_triangle,
            diagnostics,
        }
    }
}
