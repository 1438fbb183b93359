//! Assembling a fitted model into a formula
//!
//! The formula of an Earth model is the ordered list of its active basis
//! functions, each paired with the coefficients it carries for every output:
//!
//! ```text
//! y = 1.0*[c0] + h(x0-3.5)*[c1] + ...
//! ```
//!
//! [`assemble`] builds it; [`crate::display::render_flat`] and
//! [`crate::export::export_code`] turn it into text.
use std::fmt;

use serde::Serialize;

use crate::Model;

/// Text used for the intercept in a formula
pub const INTERCEPT_TEXT: &str = "1.0";

/// The coefficients of one basis function, one per output.
///
/// Displays as `[c0 c1 ...]`, with every entry in Rust's shortest round-trip
/// float format, so no precision is lost.
///
/// ```
/// # use earthfit::formula::CoefficientVector;
/// let c = CoefficientVector::new(vec![2.0, -0.1, 1e-20]);
/// assert_eq!(c.to_string(), "[2.0 -0.1 1e-20]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CoefficientVector(Vec<f64>);
impl CoefficientVector {
    /// Wraps a list of coefficients
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The coefficients, in output order
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of outputs
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no coefficients
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl fmt::Display for CoefficientVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{c:?}")?;
        }
        write!(f, "]")
    }
}

/// One active basis function of a formula
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionTerm {
    /// Canonical text of the basis function, or [`INTERCEPT_TEXT`]
    pub text: String,

    /// Its coefficients, one per output
    pub coefficients: CoefficientVector,
}

/// The active terms of a model, in the order the model stores them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Expression {
    terms: Vec<ExpressionTerm>,
}
impl Expression {
    /// The terms, in model order
    #[must_use]
    pub fn terms(&self) -> &[ExpressionTerm] {
        &self.terms
    }

    /// Number of terms
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if the model had no active basis function
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates over the terms
    pub fn iter(&self) -> impl Iterator<Item = &ExpressionTerm> {
        self.terms.iter()
    }
}

/// Builds the formula of a fitted model.
///
/// Walks the basis in stored order, skipping pruned functions, and pairs
/// each active function's text with its full coefficient column. The
/// intercept is written as [`INTERCEPT_TEXT`]; every other function keeps its
/// canonical text, named with the model's variable labels.
///
/// A model with no active function gives an empty expression.
///
/// # Example
/// ```
/// # use earthfit::{Model, formula::assemble, basis::{Basis, BasisFunction}, nalgebra::DMatrix};
/// let mut basis = Basis::intercept();
/// basis.push(BasisFunction::Linear(0));
/// let model = Model::new(basis, DMatrix::from_row_slice(1, 2, &[0.5, 2.0]), 1, 0.0).unwrap();
///
/// let formula = assemble(&model);
/// assert_eq!(formula.terms()[0].text, "1.0");
/// assert_eq!(formula.terms()[1].text, "x0");
/// assert_eq!(formula.terms()[1].coefficients.as_slice(), &[2.0]);
/// ```
#[must_use]
pub fn assemble(model: &Model) -> Expression {
    let terms = model
        .active_functions()
        .map(|(index, function)| {
            let text = if function.is_intercept() {
                INTERCEPT_TEXT.to_string()
            } else {
                function.label(model.labels())
            };

            let coefficients = model.coefficients_for(index).iter().copied().collect();
            ExpressionTerm {
                text,
                coefficients: CoefficientVector::new(coefficients),
            }
        })
        .collect();

    Expression { terms }
}
