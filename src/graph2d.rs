//! A scattered 2D data set that owns its triangulation.
//!
//! [`Graph2D`] holds the points, the options and a [`TriangulationCache`]. The
//! triangulation is built on the first query after a mutation and shared by
//! every query until the next one. There is no global state; each graph owns
//! its cache.

use serde::{Deserialize, Serialize};

use crate::error::{DelaunayError, DelaunayResult};
use crate::geom::{
    Axes, CacheStats, ContourLine, DelaunayOptions, GridResult, GridSpec, InterpolationEngine,
    Interpolator, Metrics, Point3, PointSet, TimingBucket, TimingReport, Tolerance, Triangulation,
    TriangulationCache, contour_lines, sample,
};

/// Relative precision at which a histogram axis counts as zero-width.
const DEGENERATE_RANGE_EPS: f64 = 1e-9;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Layout of the default histogram view of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramOptions {
    /// Bins along x, in `MIN_BINS..=MAX_BINS`.
    pub npx: usize,
    /// Bins along y, in `MIN_BINS..=MAX_BINS`.
    pub npy: usize,
    /// Fraction of the data range added on each side, in `0..=1`.
    pub margin: f64,
    /// Fixed lower end of the reported z range.
    pub minimum: Option<f64>,
    /// Fixed upper end of the reported z range.
    pub maximum: Option<f64>,
}

impl HistogramOptions {
    pub const DEFAULT_BINS: usize = 40;
    pub const MIN_BINS: usize = 4;
    pub const MAX_BINS: usize = 500;
    /// Margin used when an out-of-range one is requested.
    pub const FALLBACK_MARGIN: f64 = 0.1;

    #[must_use]
    pub fn with_npx(mut self, npx: usize) -> Self {
        self.npx = clamp_bins(npx, "x");
        self
    }

    #[must_use]
    pub fn with_npy(mut self, npy: usize) -> Self {
        self.npy = clamp_bins(npy, "y");
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = checked_margin(margin);
        self
    }

    #[must_use]
    pub fn with_minimum(mut self, minimum: Option<f64>) -> Self {
        self.minimum = minimum;
        self
    }

    #[must_use]
    pub fn with_maximum(mut self, maximum: Option<f64>) -> Self {
        self.maximum = maximum;
        self
    }
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            npx: Self::DEFAULT_BINS,
            npy: Self::DEFAULT_BINS,
            margin: 0.0,
            minimum: None,
            maximum: None,
        }
    }
}

fn clamp_bins(bins: usize, axis: &str) -> usize {
    let clamped = bins.clamp(HistogramOptions::MIN_BINS, HistogramOptions::MAX_BINS);
    if clamped != bins {
        log::warn!("{bins} bins along {axis} out of range, using {clamped}");
    }
    clamped
}

fn checked_margin(margin: f64) -> f64 {
    if (0.0..=1.0).contains(&margin) {
        margin
    } else {
        log::warn!(
            "histogram margin {margin} not in [0, 1], using {}",
            HistogramOptions::FALLBACK_MARGIN
        );
        HistogramOptions::FALLBACK_MARGIN
    }
}

/// Everything that shapes the triangulation and the values read from it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph2DOptions {
    pub delaunay: DelaunayOptions,
    pub engine: InterpolationEngine,
    /// Value reported for queries outside the convex hull.
    pub margin_value: f64,
    pub histogram: HistogramOptions,
}

impl Graph2DOptions {
    #[must_use]
    pub fn with_delaunay(mut self, delaunay: DelaunayOptions) -> Self {
        self.delaunay = delaunay;
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: InterpolationEngine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn with_margin_value(mut self, margin_value: f64) -> Self {
        self.margin_value = margin_value;
        self
    }

    #[must_use]
    pub fn with_histogram(mut self, histogram: HistogramOptions) -> Self {
        self.histogram = histogram;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph2D
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Graph2D {
    points: PointSet,
    options: Graph2DOptions,
    cache: TriangulationCache,
    hint: Option<usize>,
    metrics: Metrics,
}

impl Graph2D {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_points(points: PointSet) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_options(points: PointSet, options: Graph2DOptions) -> Self {
        Self {
            points,
            options,
            ..Self::default()
        }
    }

    pub fn from_slices(x: &[f64], y: &[f64], z: &[f64]) -> DelaunayResult<Self> {
        Ok(Self::with_points(PointSet::from_slices(x, y, z)?))
    }

    #[must_use]
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub const fn options(&self) -> &Graph2DOptions {
        &self.options
    }

    fn invalidate(&mut self) {
        self.cache.invalidate();
        self.hint = None;
    }

    // ── Point mutation ──────────────────────────────────────────────────────

    pub fn push(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.invalidate();
        self.points.push(x, y, z)
    }

    /// Writes point `index`, growing the set with zero points if needed.
    pub fn set_point(&mut self, index: usize, x: f64, y: f64, z: f64) -> usize {
        self.invalidate();
        self.points.set_point(index, x, y, z)
    }

    pub fn set_len(&mut self, len: usize) {
        self.invalidate();
        self.points.set_len(len);
    }

    pub fn remove_point(&mut self, index: usize) -> DelaunayResult<Point3> {
        let removed = self.points.remove(index)?;
        self.invalidate();
        Ok(removed)
    }

    /// Drops later points whose (x, y) repeats an earlier one; returns the new length.
    pub fn remove_duplicates(&mut self) -> usize {
        self.invalidate();
        self.points.remove_duplicates()
    }

    pub fn scale(&mut self, factor: f64, axes: Axes) {
        self.invalidate();
        self.points.scale(factor, axes);
    }

    /// `z = f(x, y, z)` for every point.
    pub fn apply(&mut self, f: impl FnMut(f64, f64, f64) -> f64) {
        self.invalidate();
        self.points.apply(f);
    }

    /// `z += c * f(x, y, z)` for every point.
    pub fn add(&mut self, f: impl FnMut(f64, f64, f64) -> f64, c: f64) {
        self.invalidate();
        self.points.add(f, c);
    }

    pub fn apply_expr(&mut self, formula: &str) -> DelaunayResult<()> {
        self.invalidate();
        self.points.apply_expr(formula)
    }

    pub fn add_expr(&mut self, formula: &str, c: f64) -> DelaunayResult<()> {
        self.invalidate();
        self.points.add_expr(formula, c)
    }

    /// Direct access to the points. The cached triangulation is dropped up front.
    pub fn points_mut(&mut self) -> &mut PointSet {
        self.invalidate();
        &mut self.points
    }

    // ── Options ─────────────────────────────────────────────────────────────

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        if self.options.delaunay.max_iterations != max_iterations {
            self.options.delaunay.max_iterations = max_iterations;
            self.invalidate();
        }
    }

    pub fn set_tolerance(&mut self, tolerance: Tolerance) {
        if self.options.delaunay.tolerance != tolerance {
            self.options.delaunay.tolerance = tolerance;
            self.invalidate();
        }
    }

    pub fn set_engine(&mut self, engine: InterpolationEngine) {
        self.options.engine = engine;
        self.hint = None;
    }

    /// Value reported outside the hull. A change starts a new generation.
    pub fn set_margin_value(&mut self, margin_value: f64) {
        if self.options.margin_value.to_bits() != margin_value.to_bits() {
            self.options.margin_value = margin_value;
            self.invalidate();
        }
    }

    pub fn set_npx(&mut self, npx: usize) {
        self.options.histogram = self.options.histogram.with_npx(npx);
    }

    pub fn set_npy(&mut self, npy: usize) {
        self.options.histogram = self.options.histogram.with_npy(npy);
    }

    /// Histogram margin fraction. A change starts a new generation.
    pub fn set_margin(&mut self, margin: f64) {
        let histogram = self.options.histogram.with_margin(margin);
        if histogram.margin.to_bits() != self.options.histogram.margin.to_bits() {
            self.options.histogram = histogram;
            self.invalidate();
        }
    }

    pub fn set_minimum(&mut self, minimum: Option<f64>) {
        self.options.histogram.minimum = minimum;
    }

    pub fn set_maximum(&mut self, maximum: Option<f64>) {
        self.options.histogram.maximum = maximum;
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// The triangulation of the current points, building it if needed.
    pub fn triangulation(&mut self) -> DelaunayResult<&Triangulation> {
        let Self {
            points,
            options,
            cache,
            metrics,
            ..
        } = self;
        cached_build(cache, points, options.delaunay, metrics)
            .as_ref()
            .map_err(DelaunayError::clone)
    }

    /// Interpolated value at `(x, y)`; build failures are returned.
    pub fn try_value_at(&mut self, x: f64, y: f64) -> DelaunayResult<f64> {
        let Self {
            points,
            options,
            cache,
            hint,
            metrics,
        } = self;
        let triangulation = cached_build(cache, points, options.delaunay, metrics)
            .as_ref()
            .map_err(DelaunayError::clone)?;

        let value = metrics.time(TimingBucket::Interpolation, || {
            let mut interpolator =
                Interpolator::new(triangulation, points, options.engine, options.margin_value)
                    .with_hint(*hint);
            let value = interpolator.value_at(x, y);
            *hint = interpolator.locator().hint();
            value
        });
        Ok(value)
    }

    /// Interpolated value at `(x, y)`, or NaN when the points cannot be triangulated.
    pub fn value_at(&mut self, x: f64, y: f64) -> f64 {
        self.try_value_at(x, y).unwrap_or(f64::NAN)
    }

    /// Samples `spec`; a failed build gives an all-NaN grid.
    pub fn sample(&mut self, spec: GridSpec) -> GridResult {
        let Self {
            points,
            options,
            cache,
            metrics,
            ..
        } = self;
        let Ok(triangulation) = cached_build(cache, points, options.delaunay, metrics) else {
            return GridResult::nan(spec);
        };
        metrics.time(TimingBucket::Sampling, || {
            sample(triangulation, points, options.engine, options.margin_value, spec)
        })
    }

    /// The grid the histogram view uses: data bounds widened by the margin
    /// fraction, zero-width axes opened up.
    pub fn histogram_spec(&self) -> DelaunayResult<GridSpec> {
        let histogram = self.options.histogram;
        let bounds = self
            .points
            .bounds()?
            .expand_by_fraction(histogram.margin)
            .widen_degenerate(DEGENERATE_RANGE_EPS);
        Ok(GridSpec::over(bounds, histogram.npx, histogram.npy))
    }

    /// `npx × npy` view over the data, with any user-fixed z range applied.
    pub fn histogram(&mut self) -> DelaunayResult<GridResult> {
        let spec = self.histogram_spec()?;
        let HistogramOptions { minimum, maximum, .. } = self.options.histogram;
        Ok(self.sample(spec).with_range(minimum, maximum))
    }

    /// Iso-lines of the interpolated surface at `level`.
    pub fn contour_lines(&mut self, level: f64) -> DelaunayResult<Vec<ContourLine>> {
        if self.points.is_empty() {
            return Err(DelaunayError::EmptyInput);
        }
        let Self {
            points,
            options,
            cache,
            metrics,
            ..
        } = self;
        let triangulation = cached_build(cache, points, options.delaunay, metrics)
            .as_ref()
            .map_err(DelaunayError::clone)?;
        Ok(metrics.time(TimingBucket::Contouring, || {
            contour_lines(triangulation, points, level)
        }))
    }

    /// The z range to draw with: data range, opened by 1 % when flat, with any
    /// user-fixed ends applied.
    pub fn z_display_range(&self) -> DelaunayResult<(f64, f64)> {
        let (mut lo, mut hi) = (self.points.z_min()?, self.points.z_max()?);
        if lo == hi {
            let z = lo;
            if z == 0.0 {
                (lo, hi) = (-0.01, 0.01);
            } else {
                (lo, hi) = (z - 0.01 * z.abs(), z + 0.01 * z.abs());
            }
        }
        let histogram = &self.options.histogram;
        Ok((histogram.minimum.unwrap_or(lo), histogram.maximum.unwrap_or(hi)))
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Accumulated timings; `None` unless built with the `metrics` feature.
    #[must_use]
    pub fn timing_report(&self) -> Option<TimingReport> {
        self.metrics.end()
    }

    pub fn reset_timings(&mut self) {
        self.metrics.begin();
    }
}

fn cached_build<'a>(
    cache: &'a mut TriangulationCache,
    points: &PointSet,
    options: DelaunayOptions,
    metrics: &mut Metrics,
) -> &'a DelaunayResult<Triangulation> {
    cache.get_or_build(|| {
        metrics.time(TimingBucket::Triangulation, || Triangulation::build(points, options))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Graph2D {
        Graph2D::from_slices(&[0.0, 1.0, 0.0, 1.0], &[0.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 1.0, 2.0])
            .unwrap()
    }

    #[test]
    fn test_golden_square_center() {
        let mut graph = unit_square();
        assert_eq!(graph.value_at(0.5, 0.5), 1.0);
        assert_eq!(graph.try_value_at(0.25, 0.25), Ok(0.5));
    }

    #[test]
    fn test_value_at_is_nan_on_failed_build() {
        let mut graph =
            Graph2D::from_slices(&[0.0, 1.0, 2.0], &[0.0, 0.0, 0.0], &[0.0, 1.0, 2.0]).unwrap();
        assert!(graph.value_at(0.5, 0.0).is_nan());
        assert_eq!(graph.try_value_at(0.5, 0.0), Err(DelaunayError::DegenerateInput));
        assert_eq!(graph.triangulation().err(), Some(DelaunayError::DegenerateInput));
        let stats = graph.cache_stats();
        assert_eq!(stats.failed_builds, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[test]
    fn test_mutation_invalidates() {
        let mut graph = unit_square();
        assert_eq!(graph.triangulation().unwrap().len(), 2);
        graph.push(0.5, 2.0, 3.0);
        assert!(!graph.cache_stats().cached);
        assert_eq!(graph.triangulation().unwrap().len(), 3);
        assert_eq!(graph.remove_point(4), Ok(Point3::new(0.5, 2.0, 3.0)));
        assert_eq!(graph.triangulation().unwrap().len(), 2);
        assert_eq!(graph.remove_point(9), Err(DelaunayError::Index { index: 9, len: 4 }));
        assert_eq!(graph.cache_stats().invalidations, 2);
    }

    #[test]
    fn test_z_transforms_rebuild_values() {
        let mut graph = unit_square();
        assert_eq!(graph.value_at(0.5, 0.5), 1.0);
        graph.apply_expr("z * 10").unwrap();
        assert_eq!(graph.value_at(0.5, 0.5), 10.0);
        graph.add(|x, _, _| x, 1.0);
        assert!((graph.value_at(0.5, 0.5) - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_option_setters() {
        let mut graph = unit_square();
        let _ = graph.triangulation();
        graph.set_npx(1);
        graph.set_npy(10_000);
        graph.set_engine(InterpolationEngine::Legacy);
        assert!(graph.cache_stats().cached);
        let histogram = graph.options().histogram;
        assert_eq!((histogram.npx, histogram.npy), (4, 500));

        // Margin changes start a new generation; repeating a value does not.
        graph.set_margin(2.0);
        assert!(!graph.cache_stats().cached);
        assert_eq!(graph.options().histogram.margin, 0.1);
        let _ = graph.triangulation();
        graph.set_margin(0.1);
        assert!(graph.cache_stats().cached);
        graph.set_margin_value(-1.0);
        assert!(!graph.cache_stats().cached);
        assert_eq!(graph.value_at(5.0, 5.0), -1.0);
        assert!(graph.cache_stats().cached);
        graph.set_margin_value(-1.0);
        assert!(graph.cache_stats().cached);
        assert_eq!(graph.cache_stats().invalidations, 2);

        graph.set_max_iterations(10);
        assert!(!graph.cache_stats().cached);
    }

    #[test]
    fn test_histogram_covers_widened_bounds() {
        let mut graph = unit_square();
        graph.set_margin(0.5);
        graph.set_npx(4);
        graph.set_npy(4);
        let grid = graph.histogram().unwrap();
        assert_eq!(grid.spec, GridSpec::new(-0.5, 1.5, 4, -0.5, 1.5, 4));
        // Corner cells fall outside the square.
        assert_eq!(grid.margin_cells, 12);
        assert_eq!(grid.value(1, 1), 0.5);

        graph.set_minimum(Some(-2.0));
        let grid = graph.histogram().unwrap();
        assert_eq!(grid.min, Some(-2.0));
        assert_eq!(grid.max, Some(1.5));
    }

    #[test]
    fn test_histogram_of_empty_graph() {
        let mut graph = Graph2D::new();
        assert_eq!(graph.histogram(), Err(DelaunayError::EmptyInput));
        assert_eq!(graph.contour_lines(0.0), Err(DelaunayError::EmptyInput));
    }

    #[test]
    fn test_z_display_range() {
        let mut graph = unit_square();
        assert_eq!(graph.z_display_range(), Ok((0.0, 2.0)));
        graph.apply(|_, _, _| 0.0);
        assert_eq!(graph.z_display_range(), Ok((-0.01, 0.01)));
        graph.apply(|_, _, _| 5.0);
        let (lo, hi) = graph.z_display_range().unwrap();
        assert!((lo - 4.95).abs() < 1e-12 && (hi - 5.05).abs() < 1e-12);
        graph.set_maximum(Some(9.0));
        assert_eq!(graph.z_display_range().unwrap().1, 9.0);
    }

    #[test]
    fn test_failed_build_gives_nan_grid() {
        let mut graph = Graph2D::from_slices(&[0.0, 1.0], &[0.0, 1.0], &[0.0, 1.0]).unwrap();
        let grid = graph.sample(GridSpec::new(0.0, 1.0, 3, 0.0, 1.0, 3));
        assert_eq!(grid.nan_cells, 9);
        assert_eq!(grid.min, None);
    }
}
