//! Owned storage for scattered (x, y, z) samples.
//!
//! The three coordinate columns are kept as parallel vectors of equal length.
//! A point's identity is its index; removing a point shifts every later index
//! down by one, so anything that refers to points by index (a triangulation)
//! must be rebuilt after a removal.

use meval::{Context, ContextProvider, Expr};
use serde::{Deserialize, Serialize};

use super::core::{Bounds2, Point3};
use crate::error::{DelaunayError, DelaunayResult};

/// Selects the coordinate columns touched by [`PointSet::scale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Axes {
    pub const X: Self = Self { x: true, y: false, z: false };
    pub const Y: Self = Self { x: false, y: true, z: false };
    pub const Z: Self = Self { x: false, y: false, z: true };
    pub const XY: Self = Self { x: true, y: true, z: false };
    pub const ALL: Self = Self { x: true, y: true, z: true };

    /// Parses an option string such as `"xz"`; unknown letters are ignored.
    #[must_use]
    pub fn from_option(option: &str) -> Self {
        let lower = option.to_ascii_lowercase();
        Self {
            x: lower.contains('x'),
            y: lower.contains('y'),
            z: lower.contains('z'),
        }
    }

    /// `true` when x or y is selected, i.e. the triangulation changes.
    #[must_use]
    pub const fn touches_plane(self) -> bool {
        self.x || self.y
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl PointSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
        }
    }

    /// Copies three parallel coordinate arrays.
    pub fn from_slices(x: &[f64], y: &[f64], z: &[f64]) -> DelaunayResult<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(DelaunayError::LengthMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            z: z.to_vec(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    #[must_use]
    pub fn zs(&self) -> &[f64] {
        &self.z
    }

    /// The (x, y) projection of point `index`. Panics when out of range.
    #[must_use]
    pub fn xy(&self, index: usize) -> (f64, f64) {
        (self.x[index], self.y[index])
    }

    #[must_use]
    pub fn z(&self, index: usize) -> f64 {
        self.z[index]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point3> {
        (index < self.len()).then(|| Point3::new(self.x[index], self.y[index], self.z[index]))
    }

    pub fn point(&self, index: usize) -> DelaunayResult<Point3> {
        self.get(index).ok_or(DelaunayError::Index {
            index,
            len: self.len(),
        })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point3> + '_ {
        (0..self.len()).map(|i| Point3::new(self.x[i], self.y[i], self.z[i]))
    }

    /// Appends a point and returns its index.
    pub fn push(&mut self, x: f64, y: f64, z: f64) -> usize {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
        self.len() - 1
    }

    /// Writes point `index`, growing the set to `index + 1` points when needed.
    /// Points created to fill a gap are zero.
    pub fn set_point(&mut self, index: usize, x: f64, y: f64, z: f64) -> usize {
        if index >= self.len() {
            self.set_len(index + 1);
        }
        self.x[index] = x;
        self.y[index] = y;
        self.z[index] = z;
        index
    }

    /// Truncates, or zero-extends, to exactly `len` points.
    pub fn set_len(&mut self, len: usize) {
        self.x.resize(len, 0.0);
        self.y.resize(len, 0.0);
        self.z.resize(len, 0.0);
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }

    /// Removes point `index`, shifting later points down by one.
    pub fn remove(&mut self, index: usize) -> DelaunayResult<Point3> {
        let point = self.point(index)?;
        self.x.remove(index);
        self.y.remove(index);
        self.z.remove(index);
        Ok(point)
    }

    /// Removes every point whose (x, y) is bit-identical to an earlier one.
    ///
    /// The first occurrence, and its z, is kept. Returns the new length.
    pub fn remove_duplicates(&mut self) -> usize {
        let mut i = 0;
        while i < self.len() {
            let (xi, yi) = self.xy(i);
            let mut j = i + 1;
            while j < self.len() {
                if self.x[j] == xi && self.y[j] == yi {
                    self.x.remove(j);
                    self.y.remove(j);
                    self.z.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        self.len()
    }

    pub fn x_min(&self) -> DelaunayResult<f64> {
        fold_column(&self.x, f64::min)
    }

    pub fn x_max(&self) -> DelaunayResult<f64> {
        fold_column(&self.x, f64::max)
    }

    pub fn y_min(&self) -> DelaunayResult<f64> {
        fold_column(&self.y, f64::min)
    }

    pub fn y_max(&self) -> DelaunayResult<f64> {
        fold_column(&self.y, f64::max)
    }

    pub fn z_min(&self) -> DelaunayResult<f64> {
        fold_column(&self.z, f64::min)
    }

    pub fn z_max(&self) -> DelaunayResult<f64> {
        fold_column(&self.z, f64::max)
    }

    /// Bounding rectangle of the (x, y) projection.
    pub fn bounds(&self) -> DelaunayResult<Bounds2> {
        Bounds2::from_xy(&self.x, &self.y).ok_or(DelaunayError::EmptyInput)
    }

    /// Multiplies the selected coordinate columns by `factor`.
    pub fn scale(&mut self, factor: f64, axes: Axes) {
        let columns = [(axes.x, &mut self.x), (axes.y, &mut self.y), (axes.z, &mut self.z)];
        for (selected, column) in columns {
            if selected {
                column.iter_mut().for_each(|v| *v *= factor);
            }
        }
    }

    /// Replaces every z by `f(x, y, z)`.
    pub fn apply(&mut self, mut f: impl FnMut(f64, f64, f64) -> f64) {
        for i in 0..self.len() {
            self.z[i] = f(self.x[i], self.y[i], self.z[i]);
        }
    }

    /// Adds `c * f(x, y, z)` to every z.
    pub fn add(&mut self, mut f: impl FnMut(f64, f64, f64) -> f64, c: f64) {
        for i in 0..self.len() {
            self.z[i] += c * f(self.x[i], self.y[i], self.z[i]);
        }
    }

    /// Replaces every z by a formula in `x`, `y` and `z`, e.g. `"sin(x) * y"`.
    ///
    /// The formula is evaluated for all points before any z is written, so a
    /// failure leaves the set untouched.
    pub fn apply_expr(&mut self, formula: &str) -> DelaunayResult<()> {
        let values = self.evaluate_formula(formula)?;
        self.z = values;
        Ok(())
    }

    /// Adds `c` times a formula in `x`, `y` and `z` to every z.
    pub fn add_expr(&mut self, formula: &str, c: f64) -> DelaunayResult<()> {
        let values = self.evaluate_formula(formula)?;
        for (z, v) in self.z.iter_mut().zip(values) {
            *z += c * v;
        }
        Ok(())
    }

    fn evaluate_formula(&self, formula: &str) -> DelaunayResult<Vec<f64>> {
        let expr: Expr = formula
            .trim()
            .parse()
            .map_err(|error: meval::Error| DelaunayError::Expression(error.to_string()))?;
        let context = Context::new();

        self.iter()
            .map(|p| {
                let variables = PointVariables(p);
                expr.eval_with_context((&variables, &context))
                    .map_err(|error| DelaunayError::Expression(error.to_string()))
            })
            .collect()
    }
}

impl FromIterator<Point3> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.push(p.x, p.y, p.z);
        }
        set
    }
}

struct PointVariables(Point3);

impl ContextProvider for PointVariables {
    fn get_var(&self, name: &str) -> Option<f64> {
        match name {
            "x" | "X" => Some(self.0.x),
            "y" | "Y" => Some(self.0.y),
            "z" | "Z" => Some(self.0.z),
            _ => None,
        }
    }
}

fn fold_column(column: &[f64], pick: fn(f64, f64) -> f64) -> DelaunayResult<f64> {
    let (first, rest) = column.split_first().ok_or(DelaunayError::EmptyInput)?;
    Ok(rest.iter().copied().fold(*first, pick))
}
