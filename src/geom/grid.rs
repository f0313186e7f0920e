//! Dense sampling of the interpolated surface on a regular grid.

use serde::{Deserialize, Serialize};

use super::core::Bounds2;
use super::interpolate::{InterpolationEngine, Interpolator};
use super::point_set::PointSet;
use super::triangulation::Triangulation;

/// A regular `nx × ny` grid of cells over `[x_min, x_max] × [y_min, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub x_min: f64,
    pub x_max: f64,
    pub nx: usize,
    pub y_min: f64,
    pub y_max: f64,
    pub ny: usize,
}

impl GridSpec {
    #[must_use]
    pub const fn new(x_min: f64, x_max: f64, nx: usize, y_min: f64, y_max: f64, ny: usize) -> Self {
        Self {
            x_min,
            x_max,
            nx,
            y_min,
            y_max,
            ny,
        }
    }

    #[must_use]
    pub const fn over(bounds: Bounds2, nx: usize, ny: usize) -> Self {
        Self::new(bounds.x_min, bounds.x_max, nx, bounds.y_min, bounds.y_max, ny)
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    #[must_use]
    pub fn dx(&self) -> f64 {
        (self.x_max - self.x_min) / self.nx as f64
    }

    #[must_use]
    pub fn dy(&self) -> f64 {
        (self.y_max - self.y_min) / self.ny as f64
    }

    /// Centre of column `ix`.
    #[must_use]
    pub fn x_center(&self, ix: usize) -> f64 {
        self.x_min + (ix as f64 + 0.5) * self.dx()
    }

    /// Centre of row `iy`.
    #[must_use]
    pub fn y_center(&self, iy: usize) -> f64 {
        self.y_min + (iy as f64 + 0.5) * self.dy()
    }

    #[must_use]
    pub fn cell_center(&self, ix: usize, iy: usize) -> (f64, f64) {
        (self.x_center(ix), self.y_center(iy))
    }
}

/// Sampled values, row-major: `values[iy * nx + ix]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResult {
    pub spec: GridSpec,
    pub values: Vec<f64>,
    /// Smallest finite interpolated value; margin cells do not count.
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Smallest strictly positive interpolated value, for log scales.
    pub min_positive: Option<f64>,
    pub margin_cells: usize,
    pub nan_cells: usize,
}

impl GridResult {
    /// Every cell NaN; what a pass over a failed build produces.
    #[must_use]
    pub fn nan(spec: GridSpec) -> Self {
        Self {
            spec,
            values: vec![f64::NAN; spec.cell_count()],
            min: None,
            max: None,
            min_positive: None,
            margin_cells: 0,
            nan_cells: spec.cell_count(),
        }
    }

    #[must_use]
    pub fn value(&self, ix: usize, iy: usize) -> f64 {
        self.values[iy * self.spec.nx + ix]
    }

    /// Rows from bottom (`iy = 0`) to top.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.spec.nx.max(1))
    }

    /// Replaces the reported range, as a user-fixed axis would.
    #[must_use]
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        if minimum.is_some() {
            self.min = minimum;
        }
        if maximum.is_some() {
            self.max = maximum;
        }
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    value: f64,
    margin: bool,
}

/// Samples every cell centre of `spec`.
///
/// The locator hint is reset at the start of each row, so the result does not
/// depend on whether rows run serially or in parallel.
#[must_use]
pub fn sample(
    triangulation: &Triangulation,
    points: &PointSet,
    engine: InterpolationEngine,
    margin_value: f64,
    spec: GridSpec,
) -> GridResult {
    log::debug!(
        "sampling {}x{} grid over [{}, {}] x [{}, {}]",
        spec.nx,
        spec.ny,
        spec.x_min,
        spec.x_max,
        spec.y_min,
        spec.y_max
    );

    let sample_row = |iy: usize| -> Vec<Cell> {
        let mut interpolator = Interpolator::new(triangulation, points, engine, margin_value);
        let y = spec.y_center(iy);
        (0..spec.nx)
            .map(|ix| {
                let (value, location) = interpolator.value_with_location(spec.x_center(ix), y);
                Cell {
                    value,
                    margin: location.is_outside(),
                }
            })
            .collect()
    };

    let rows = sample_rows(spec.ny, sample_row);
    accumulate(spec, rows)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        fn sample_rows(
            ny: usize,
            sample_row: impl Fn(usize) -> Vec<Cell> + Send + Sync,
        ) -> Vec<Vec<Cell>> {
            use rayon::prelude::*;
            (0..ny).into_par_iter().map(sample_row).collect()
        }
    } else {
        fn sample_rows(ny: usize, sample_row: impl Fn(usize) -> Vec<Cell>) -> Vec<Vec<Cell>> {
            (0..ny).map(sample_row).collect()
        }
    }
}

fn accumulate(spec: GridSpec, rows: Vec<Vec<Cell>>) -> GridResult {
    let mut result = GridResult {
        spec,
        values: Vec::with_capacity(spec.cell_count()),
        min: None,
        max: None,
        min_positive: None,
        margin_cells: 0,
        nan_cells: 0,
    };

    for cell in rows.into_iter().flatten() {
        result.values.push(cell.value);
        if cell.value.is_nan() {
            result.nan_cells += 1;
        } else if cell.margin {
            result.margin_cells += 1;
        } else {
            let v = cell.value;
            result.min = Some(result.min.map_or(v, |m| m.min(v)));
            result.max = Some(result.max.map_or(v, |m| m.max(v)));
            if v > 0.0 {
                result.min_positive = Some(result.min_positive.map_or(v, |m| m.min(v)));
            }
        }
    }
    result
}
