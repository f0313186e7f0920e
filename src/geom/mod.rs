mod cache;
mod contour;
mod core;
mod grid;
mod interpolate;
mod locate;
mod metrics;
mod point_set;
mod predicates;
mod triangulation;

pub use cache::{CacheStats, TriangulationCache};
pub use contour::{ContourLine, contour_lines};
pub use core::{Bounds2, Point3, Tolerance, approx_eq_relative};
pub use grid::{GridResult, GridSpec, sample};
pub use interpolate::{InterpolationEngine, Interpolator, planar_value};
pub use locate::{Location, LocatorStrategy, PointLocator};
pub use metrics::{Metrics, TimingBucket, TimingReport};
pub use point_set::{Axes, PointSet};
pub use predicates::{
    Orientation, Xy, circumcenter, in_circumcircle, incircle_with_permanent, orient2d,
    orient2d_with_permanent, orientation, segment_distance_squared,
};
pub use triangulation::{
    DelaunayOptions, Edge, Triangle, Triangulation, TriangulationDiagnostics,
};

#[cfg(test)]
mod tests;
