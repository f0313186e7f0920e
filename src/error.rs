//! Error taxonomy shared by the point set, the triangulator and the queries.

use thiserror::Error;

/// Result type for point-set and triangulation operations.
pub type DelaunayResult<T> = Result<T, DelaunayError>;

/// Failures of point-set access, triangulation builds and formula transforms.
///
/// Per-query edge cases (a query exactly on an edge or on the hull) are never
/// reported here; they are resolved by the locator's tie-break rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelaunayError {
    /// Fewer than three points are available for a 2D triangulation.
    #[error("insufficient points: {provided} provided, at least 3 required")]
    InsufficientPoints { provided: usize },
    /// All points lie on one line; no 2D triangulation exists.
    #[error("degenerate input: all points are collinear")]
    DegenerateInput,
    /// Two points share a bit-identical (x, y) position.
    #[error(
        "duplicate point: {second} has the same (x, y) as {first}; call remove_duplicates first"
    )]
    DuplicatePoint { first: usize, second: usize },
    /// The build needed more cavity operations in total than allowed.
    #[error("iteration budget of {budget} cavity operations exceeded by the build")]
    IterationBudgetExceeded { budget: usize },
    /// Floating-point predicates disagreed while inserting `point`, leaving a
    /// cavity that is not star-shaped. Perturb the input or loosen the tolerance.
    #[error("inconsistent predicates while inserting point {point}")]
    Robustness { point: usize },
    /// Point index outside `[0, len)`.
    #[error("point index {index} out of range (len {len})")]
    Index { index: usize, len: usize },
    /// An operation that needs at least one point ran on an empty set.
    #[error("point set is empty")]
    EmptyInput,
    /// A point has a NaN or infinite x or y coordinate.
    #[error("point {index} has a non-finite (x, y) coordinate")]
    NonFiniteCoordinate { index: usize },
    /// Coordinate arrays of different lengths were supplied.
    #[error("coordinate arrays differ in length: x={x}, y={y}, z={z}")]
    LengthMismatch { x: usize, y: usize, z: usize },
    /// A z-transform formula failed to parse or evaluate.
    #[error("expression error: {0}")]
    Expression(String),
}
