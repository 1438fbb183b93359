//! Utilities for displaying formulas as text
//!
//! # Key Concepts
//! - **[`Term`]**: A single additive term with a sign and body.
//! - **[`Sign`]**: Tracks whether a term is positive or negative.
//!
//! # Renderings
//! - [`render_flat`]: The flat `text*coef` form of an [`Expression`].
//! - [`write_terms`]: Joins signed terms with ` + ` and ` - `, used by [`crate::export`].
use std::fmt::Write;

use crate::formula::Expression;

/// Separator between the terms of a flat formula
pub const FLAT_SEPARATOR: char = '+';

/// Renders an expression as `text*[coefs]` pairs joined by `+`.
///
/// Every coefficient vector is written in full, one entry per output, so for
/// multi-output models the result lists every output's weights side by side
/// and is not itself an evaluable expression.
///
/// An empty expression renders as an empty string.
///
/// # Example
/// ```
/// # use earthfit::{Model, formula::assemble, display::render_flat, basis::{Basis, BasisFunction}, nalgebra::DMatrix};
/// let mut basis = Basis::intercept();
/// basis.push(BasisFunction::Linear(0));
/// let model = Model::new(basis, DMatrix::from_row_slice(1, 2, &[0.5, 2.0]), 1, 0.0).unwrap();
///
/// assert_eq!(render_flat(&assemble(&model)), "1.0*[0.5]+x0*[2.0]");
/// ```
#[must_use]
pub fn render_flat(expression: &Expression) -> String {
    let mut out = String::new();
    for (i, term) in expression.iter().enumerate() {
        if i > 0 {
            out.push(FLAT_SEPARATOR);
        }

        // Writing to a String cannot fail
        let _ = write!(out, "{}*{}", term.text, term.coefficients);
    }
    out
}

/// Represents the sign of a term.
///
/// Used when rendering sums to decide how a term connects to the one before
/// it (with `+` or `-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Positive sign (`+` when displayed).
    Positive,

    /// Negative sign (`-` when displayed).
    Negative,
}

impl Sign {
    /// Determines the sign from a numeric coefficient.
    ///
    /// # Example
    /// ```
    /// # use earthfit::display::Sign;
    /// assert_eq!(Sign::from_coef(3.0), Sign::Positive);
    /// assert_eq!(Sign::from_coef(-2.0), Sign::Negative);
    /// ```
    #[must_use]
    pub fn from_coef(coef: f64) -> Self {
        if coef.is_sign_negative() {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    /// The opposite sign
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }

    /// `+` for `Positive`, `-` for `Negative`.
    #[must_use]
    pub fn char(&self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

/// A single additive term for display purposes.
///
/// The body never carries the sign: `-2.0*x0` is `Term { sign: Negative, body: "2.0*x0" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// The sign of the term
    pub sign: Sign,

    /// The body of the term, without its sign
    pub body: String,
}

impl Term {
    /// Creates a new term with the given sign and body.
    #[must_use]
    pub fn new(sign: Sign, body: String) -> Self {
        Self { sign, body }
    }
}

/// Writes terms as a sum into the buffer.
///
/// - The first term is written without a leading `+`.
/// - Subsequent terms are joined with ` + ` or ` - ` depending on their sign.
/// - No terms at all writes `0`.
///
/// # Errors
/// Returns an error if writing to `buffer` fails.
///
/// ```
/// # use earthfit::display::{write_terms, Sign, Term};
/// let mut out = String::new();
/// let terms = vec![
///     Term::new(Sign::Negative, "1.5".to_string()),
///     Term::new(Sign::Negative, "2.0*x0".to_string()),
///     Term::new(Sign::Positive, "x1".to_string()),
/// ];
/// write_terms(&mut out, &terms).unwrap();
/// assert_eq!(out, "-1.5 - 2.0*x0 + x1");
/// ```
pub fn write_terms<B: Write>(buffer: &mut B, terms: &[Term]) -> std::fmt::Result {
    let Some((first, rest)) = terms.split_first() else {
        return write!(buffer, "0");
    };

    if first.sign == Sign::Negative {
        write!(buffer, "{}", first.sign.char())?;
    }
    write!(buffer, "{}", first.body)?;

    for term in rest {
        write!(buffer, " {} {}", term.sign.char(), term.body)?;
    }
    Ok(())
}
