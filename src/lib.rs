#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Scattered-data Delaunay triangulation and piecewise-linear interpolation.
//!
//! Points `(x, y, z)` are triangulated on their `(x, y)` projection; the
//! surface through the triangles can then be queried at single points,
//! sampled on a regular grid or cut into contour lines.
//!
//! ```ignore
//! use graph2d_engine::{Graph2D, GridSpec};
//!
//! let xs = [0.0, 1.0, 0.0, 1.0];
//! let ys = [0.0, 0.0, 1.0, 1.0];
//! let mut graph = Graph2D::from_slices(&xs, &ys, &[0.0, 1.0, 1.0, 2.0])?;
//! assert_eq!(graph.value_at(0.5, 0.5), 1.0);
//! let grid = graph.sample(GridSpec::new(0.0, 1.0, 10, 0.0, 1.0, 10));
//! ```

pub mod error;
pub mod geom;
pub mod graph2d;
pub mod parse;

pub use error::{DelaunayError, DelaunayResult};
pub use geom::{
    Axes, ContourLine, DelaunayOptions, GridResult, GridSpec, InterpolationEngine, Location,
    Point3, PointSet, Tolerance, Triangulation,
};
pub use graph2d::{Graph2D, Graph2DOptions, HistogramOptions};
