//! Regression engines
//!
//! The rest of the crate only needs something that turns a sample matrix and a
//! target matrix into a [`Model`]. That capability is the [`RegressionEngine`]
//! trait; [`Earth`] is the MARS implementation shipped with the crate.
//!
//! # Example
//! ```
//! # use earthfit::{engine::{Earth, EarthOptions, RegressionEngine}, nalgebra::DMatrix};
//! let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
//! let y = DMatrix::from_row_slice(4, 1, &[1.0, 3.0, 5.0, 7.0]);
//!
//! let engine = Earth::new(EarthOptions::default());
//! let model = engine.fit(&x, &y).unwrap();
//! assert!(model.rmse() < 1e-9);
//! ```
use nalgebra::DMatrix;

use crate::{error::FitError, Model};

mod earth;
pub use earth::{Earth, EarthOptions};

/// Something that can fit a [`Model`] to training data.
///
/// Implementations must be deterministic for a fixed input and configuration.
pub trait RegressionEngine {
    /// Fits a model mapping the rows of `x` to the rows of `y`.
    ///
    /// `x` is `observations x features`, `y` is `observations x outputs`.
    ///
    /// # Errors
    /// Returns a [`FitError`] if the data is unusable or the fit fails.
    fn fit(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<Model, FitError>;
}
