use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "parallel")]
use crate::geom::Interpolator;
use crate::geom::{
    DelaunayOptions, GridResult, GridSpec, InterpolationEngine, PointSet, Triangulation, sample,
};

fn sinc_cloud(seed: u64, n: usize) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = PointSet::with_capacity(n);
    for _ in 0..n {
        let x: f64 = rng.random_range(-5.0..5.0);
        let y: f64 = rng.random_range(-5.0..5.0);
        let r = x.hypot(y);
        points.push(x, y, r.sin() / r);
    }
    points
}

#[test]
fn sinc_grid_is_finite_inside_hull() {
    let points = sinc_cloud(1, 1000);
    let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
    let spec = GridSpec::new(-5.0, 5.0, 40, -5.0, 5.0, 40);
    let grid = sample(&tri, &points, InterpolationEngine::Delaunay, 0.0, spec);

    assert_eq!(grid.values.len(), 1600);
    assert_eq!(grid.nan_cells, 0);
    assert!(grid.values.iter().all(|v| v.is_finite()));
    // A dense cloud covers all but a thin band along the border.
    assert!(grid.margin_cells < 160);
    let (min, max) = (grid.min.unwrap(), grid.max.unwrap());
    assert!(min >= -0.3 && max <= 1.0 && max > 0.8);
}

#[test]
fn sampling_is_deterministic() {
    let points = sinc_cloud(2, 500);
    let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
    let spec = GridSpec::new(-6.0, 6.0, 33, -6.0, 6.0, 27);
    let first = sample(&tri, &points, InterpolationEngine::Delaunay, -1.0, spec);
    let rebuilt = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
    let second = sample(&rebuilt, &points, InterpolationEngine::Delaunay, -1.0, spec);
    assert_eq!(first, second);
}

#[test]
fn margin_band_counts() {
    let points = sinc_cloud(3, 300);
    let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
    // The outer ring of cells lies beyond the data.
    let spec = GridSpec::new(-7.0, 7.0, 14, -7.0, 7.0, 14);
    let grid = sample(&tri, &points, InterpolationEngine::Legacy, 5.0, spec);
    assert!(grid.margin_cells >= 52);
    for i in 0..14 {
        assert_eq!(grid.value(i, 0), 5.0);
        assert_eq!(grid.value(0, i), 5.0);
        assert_eq!(grid.value(i, 13), 5.0);
        assert_eq!(grid.value(13, i), 5.0);
    }
    // The margin value is far above every sample yet does not leak into max.
    assert!(grid.max.unwrap() < 1.0);
}

/// Row-by-row reference with a fresh interpolator per row, the same hint
/// discipline `sample` promises whichever way its rows are scheduled.
#[cfg(feature = "parallel")]
fn serial_reference(
    tri: &Triangulation,
    points: &PointSet,
    engine: InterpolationEngine,
    margin_value: f64,
    spec: GridSpec,
) -> Vec<f64> {
    let mut values = Vec::with_capacity(spec.cell_count());
    for iy in 0..spec.ny {
        let mut interpolator = Interpolator::new(tri, points, engine, margin_value);
        for ix in 0..spec.nx {
            let (x, y) = spec.cell_center(ix, iy);
            values.push(interpolator.value_at(x, y));
        }
    }
    values
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_rows_match_serial_reference() {
    let points = sinc_cloud(5, 2000);
    let tri = Triangulation::build(&points, DelaunayOptions::default()).unwrap();
    let spec = GridSpec::new(-5.5, 5.5, 97, -5.5, 5.5, 61);
    for engine in [InterpolationEngine::Delaunay, InterpolationEngine::Legacy] {
        let grid = sample(&tri, &points, engine, -2.0, spec);
        let reference = serial_reference(&tri, &points, engine, -2.0, spec);
        assert_eq!(grid.values.len(), reference.len());
        for (cell, (got, want)) in grid.values.iter().zip(&reference).enumerate() {
            assert_eq!(got.to_bits(), want.to_bits(), "{engine} cell {cell}");
        }
        assert_eq!(grid, sample(&tri, &points, engine, -2.0, spec));
    }
}

#[test]
fn nan_grid_shape() {
    let spec = GridSpec::new(0.0, 1.0, 5, 0.0, 2.0, 3);
    let grid = GridResult::nan(spec);
    assert_eq!(grid.rows().count(), 3);
    assert!(grid.rows().all(|row| row.len() == 5));
}
