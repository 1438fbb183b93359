//! Numeric types and iteration utilities.
//!
//! This module defines the [`Value`] trait, which abstracts the numeric
//! types the statistics helpers work with, ensuring compatibility with
//! nalgebra, floating-point operations, and formatting.
//!
//! # Iterators
//!
//! - [`SampleGrid`]: An evenly spaced grid over a range, used to sample a
//!   fitted model for plotting.
//!
//! # Example
//!
//! ```rust
//! use earthfit::value::SampleGrid;
//!
//! // 11 points from 0.0 to 1.0
//! let grid = SampleGrid::spanning(0.0, 1.0, 10);
//! assert_eq!(grid.count(), 11);
//! ```
use std::ops::Range;

/// Numeric type for statistics
pub trait Value:
    nalgebra::Scalar
    + nalgebra::ComplexField<RealField = Self>
    + nalgebra::RealField
    + num_traits::float::FloatCore
    + std::fmt::LowerExp
{
    /// Returns the value 2.0
    #[must_use]
    fn two() -> Self {
        Self::one() + Self::one()
    }

    /// Tries to cast a value to the target type
    ///
    /// Returns `None` if the value cannot be represented.
    fn try_cast<U: num_traits::NumCast>(n: U) -> Option<Self> {
        num_traits::cast(n)
    }

    /// Raises the value to the power of an integer
    #[must_use]
    fn powi(self, n: i32) -> Self {
        nalgebra::ComplexField::powi(self, n)
    }

    /// Get the absolute value for a numeric type
    #[must_use]
    fn abs(self) -> Self {
        nalgebra::ComplexField::abs(self)
    }

    /// Converts a `usize` to the target numeric type.
    ///
    /// Results in `infinity` if the value is out of range.
    #[must_use]
    fn from_positive_int(n: usize) -> Self {
        Self::try_cast(n).unwrap_or(Self::infinity())
    }
}

impl<T> Value for T where
    T: nalgebra::Scalar
        + nalgebra::ComplexField<RealField = Self>
        + nalgebra::RealField
        + num_traits::float::FloatCore
        + std::fmt::LowerExp
{
}

/// Iterator over evenly spaced values.
///
/// Yields `start + i * step` for `i` in `0..len`. Values are computed from the
/// index rather than accumulated, so the last point does not drift.
pub struct SampleGrid<T: Value> {
    start: T,
    step: T,
    index: usize,
    len: usize,
}
impl<T: Value> SampleGrid<T> {
    /// Creates a grid of `len` points starting at `start`
    pub fn new(start: T, step: T, len: usize) -> Self {
        Self {
            start,
            step,
            index: 0,
            len,
        }
    }

    /// Creates a grid splitting `min..max` into `steps` equal steps.
    ///
    /// The upper bound is widened by one step and treated as exclusive, so the
    /// grid holds `steps + 1` points and its last point is `max`.
    pub fn spanning(min: T, max: T, steps: usize) -> Self {
        let step = (max - min) / T::from_positive_int(steps.max(1));
        Self::new(min, step, steps + 1)
    }

    /// Distance between two neighbouring points
    pub fn step(&self) -> T {
        self.step
    }
}
impl<T: Value> Iterator for SampleGrid<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }

        let value = self.start + T::from_positive_int(self.index) * self.step;
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}
impl<T: Value> ExactSizeIterator for SampleGrid<T> {}

/// Extension trait for accessing the `x` and `y` coordinates of a set of points.
///
/// # Examples
///
/// ```
/// # use earthfit::value::CoordExt;
/// let data = vec![(1.5, -2.0), (2.0, 3.0), (0.0, 1.0)];
/// assert_eq!(data.y_range(), Some(-2.0..3.0));
/// ```
pub trait CoordExt<T: Value> {
    /// Returns an iterator over the x-coordinates of this value.
    fn x_iter(&self) -> impl Iterator<Item = T>;

    /// Returns an iterator over the y-coordinates of this value.
    fn y_iter(&self) -> impl Iterator<Item = T>;

    /// Returns the range of x-coordinates of this value.
    fn x_range(&self) -> Option<Range<T>> {
        min_max(self.x_iter())
    }

    /// Returns the range of y-coordinates of this value.
    fn y_range(&self) -> Option<Range<T>> {
        min_max(self.y_iter())
    }
}
impl<T: Value> CoordExt<T> for Vec<(T, T)> {
    fn x_iter(&self) -> impl Iterator<Item = T> {
        self.iter().map(|(x, _)| *x)
    }

    fn y_iter(&self) -> impl Iterator<Item = T> {
        self.iter().map(|(_, y)| *y)
    }
}
impl<T: Value> CoordExt<T> for &[(T, T)] {
    fn x_iter(&self) -> impl Iterator<Item = T> {
        self.iter().map(|(x, _)| *x)
    }

    fn y_iter(&self) -> impl Iterator<Item = T> {
        self.iter().map(|(_, y)| *y)
    }
}

/// Smallest and largest value of an iterator, as a range
pub fn min_max<T: Value>(values: impl Iterator<Item = T>) -> Option<Range<T>> {
    let bounds = values.fold(None, |acc: Option<(T, T)>, v| {
        Some(match acc {
            Some((min, max)) => (
                nalgebra::RealField::min(min, v),
                nalgebra::RealField::max(max, v),
            ),
            None => (v, v),
        })
    });
    bounds.map(|(start, end)| start..end)
}
