//! # earthfit
//! ## Fit a spline, get a formula
//!
//! Fits a multivariate adaptive regression spline (MARS, or "Earth") model to a
//! small tabular dataset and turns the fitted model back into a closed-form
//! expression you can paste somewhere else: a spreadsheet, a shader, a C file.
//!
//! The pipeline has four steps:
//! 1. [`parse::parse_matrix`] reads delimited text (`"1,2;2,4;3,6"`) into a matrix
//! 2. A [`engine::RegressionEngine`] fits a [`Model`]; [`engine::Earth`] is the MARS implementation
//! 3. [`formula::assemble`] pairs every active basis function with its coefficients
//! 4. [`display::render_flat`] or [`export::export_code`] turns that into text
//!
//! ```rust
//! # use earthfit::{engine::{Earth, RegressionEngine}, export::{export_code, CodeOptions}, formula::assemble, display::render_flat, parse::{parse_matrix, Delimiters}};
//! let x = parse_matrix("1,2;2,4;3,6", &Delimiters::default()).unwrap();
//! let y = parse_matrix("2;4;6", &Delimiters::default()).unwrap();
//!
//! let model = Earth::default().fit(&x, &y).unwrap();
//! assert!(model.rmse() < 1e-9);
//!
//! // `1.0*[...]+x0*[...]`
//! let flat = render_flat(&assemble(&model));
//! assert!(flat.starts_with("1.0*["));
//!
//! let code = export_code(&model, &CodeOptions::default()).unwrap();
//! println!("{} (RMSE {})", code.code, code.rmse);
//! ```
//!
//! # Core Concepts
//! - A [`basis::BasisFunction`] is one additive term of the model:
//!     - the intercept, a plain variable, a hinge `max(0, x - k)` or `max(0, k - x)`,
//!     - or a product of linear and hinge factors (an interaction).
//! - A [`basis::Basis`] is the ordered list of every function the forward pass created.
//!     - Pruning does not remove functions; it flags them inactive.
//! - A [`Model`] is a basis plus one row of coefficients per output.
//!     - Inactive functions always have zero coefficients.
//!
//! # Testing utilities
//! The [`assert_close!`], [`assert_all_close!`] and [`assert_rmse!`] macros are
//! exported for checking fitted models. See [`test`].
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_range_loop)] // The worst clippy lint
#![allow(clippy::cast_precision_loss)] // Observation counts are never near 2^52
#![allow(clippy::similar_names)] //       x0, x1, y0, y1
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod test;

#[cfg(feature = "plotting")]
#[cfg_attr(docsrs, doc(cfg(feature = "plotting")))]
pub mod plotting;

pub mod basis;
pub mod display;
pub mod engine;
pub mod error;
pub mod export;
pub mod formula;
pub mod parse;
pub mod statistics;
pub mod value;

mod model;

pub use error::{Error, Result};
pub use model::Model;

pub use nalgebra;
