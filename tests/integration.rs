use graph2d_engine::parse::{ReadOptions, read_points_str};
use graph2d_engine::{
    DelaunayError, Graph2D, GridSpec, InterpolationEngine, Point3, PointSet, Triangulation,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sinc_points(count: usize, seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x: f64 = rng.random_range(-5.0..5.0);
            let y: f64 = rng.random_range(-5.0..5.0);
            let r = x.hypot(y);
            let z = if r == 0.0 { 1.0 } else { r.sin() / r };
            Point3::new(x, y, z)
        })
        .collect()
}

#[test]
fn unit_square_center() {
    let mut graph =
        Graph2D::from_slices(&[0.0, 1.0, 0.0, 1.0], &[0.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 1.0, 2.0])
            .expect("equal lengths");
    assert_eq!(graph.value_at(0.5, 0.5), 1.0);
    assert_eq!(graph.triangulation().expect("square").len(), 2);
}

#[test]
fn collinear_input_is_degenerate() {
    let mut graph =
        Graph2D::from_slices(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 2.0, 3.0], &[1.0; 4]).unwrap();
    assert_eq!(graph.triangulation().err(), Some(DelaunayError::DegenerateInput));
    assert!(graph.value_at(1.5, 1.5).is_nan());
}

#[test]
fn sinc_grid_is_finite() {
    let mut graph = Graph2D::with_points(sinc_points(1000, 7));
    let grid = graph.sample(GridSpec::new(-5.0, 5.0, 40, -5.0, 5.0, 40));
    assert_eq!(grid.values.len(), 1600);
    assert_eq!(grid.nan_cells, 0);
    assert!(grid.values.iter().all(|v| v.is_finite()));
    let max = grid.max.expect("non-empty grid");
    assert!(max <= 1.0 + 1e-12);
}

#[test]
fn triangle_area_matches_hull_area() {
    let points = sinc_points(500, 11);
    let triangulation = Triangulation::build(&points, Default::default()).unwrap();
    let area = triangulation.area(&points);
    let hull_area = triangulation.hull_area(&points);
    assert!((area - hull_area).abs() <= 1e-9 * hull_area);
}

#[test]
fn vertices_interpolate_exactly() {
    let points = sinc_points(300, 3);
    for engine in [InterpolationEngine::Delaunay, InterpolationEngine::Legacy] {
        let mut graph = Graph2D::with_points(points.clone());
        graph.set_engine(engine);
        for point in points.iter() {
            assert_eq!(graph.value_at(point.x, point.y), point.z, "{engine}");
        }
    }
}

#[test]
fn outside_hull_gives_margin_value() {
    let mut graph = Graph2D::with_points(sinc_points(200, 5));
    graph.set_margin_value(-7.5);
    assert_eq!(graph.value_at(100.0, 0.0), -7.5);
    assert_eq!(graph.value_at(-5.5, -5.5), -7.5);
}

#[test]
fn rebuilding_is_idempotent() {
    let points = sinc_points(400, 13);
    let first = Triangulation::build(&points, Default::default()).unwrap();
    let second = Triangulation::build(&points, Default::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn dedup_keeps_first_z() {
    let mut graph = Graph2D::with_points(sinc_points(50, 17));
    let (x0, y0) = graph.points().xy(0);
    let (x9, y9) = graph.points().xy(9);
    let first_z = graph.points().z(0);
    graph.push(x0, y0, first_z + 100.0);
    graph.push(x9, y9, -100.0);
    graph.push(x0, y0, 42.0);
    assert_eq!(graph.len(), 53);

    assert_eq!(graph.remove_duplicates(), 50);
    assert_eq!(graph.len(), 50);
    assert_eq!(graph.value_at(x0, y0), first_z);
}

#[test]
fn text_points_feed_the_graph() {
    let input = "x,y,z\n0,0,0\n1,0,1\n0,1,1\n1,1,2\n";
    let options = ReadOptions::default().with_delimiters(",");
    let (points, report) = read_points_str(input, &options).unwrap();
    assert_eq!(report.accepted, 4);
    assert_eq!(report.skipped_lines, vec![1]);

    let mut graph = Graph2D::with_points(points);
    assert_eq!(graph.value_at(0.5, 0.5), 1.0);
    let lines = graph.contour_lines(0.5).unwrap();
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].closed);
}
