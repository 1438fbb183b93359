//! Earth basis functions
//!
//! An Earth model is a weighted sum of basis functions. Each one is either the
//! constant intercept, or a product of one or more univariate factors:
//! - **Linear** factors, `x`
//! - **Hinge** factors, `max(0, x - knot)` or `max(0, knot - x)`
//!
//! Every basis function has a canonical text form, in the notation the formula
//! output uses:
//!
//! | Function                    | Text          |
//! |-----------------------------|---------------|
//! | intercept                   | `(Intercept)` |
//! | `x0`                        | `x0`          |
//! | `max(0, x0 - 3.5)`          | `h(x0-3.5)`   |
//! | `max(0, 3.5 - x0)`          | `h(3.5-x0)`   |
//! | `max(0, x0 - 1) * x1`       | `h(x0-1)*x1`  |
//!
//! A [`Basis`] is the ordered list of functions a model was built from, along
//! with which of them were pruned.
use std::{borrow::Cow, fmt};

use nalgebra::{DMatrix, DVector};

/// Canonical text of the intercept basis function
pub const INTERCEPT_LABEL: &str = "(Intercept)";

/// Which side of its knot a hinge is non-zero on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `max(0, x - knot)`
    Right,

    /// `max(0, knot - x)`
    Left,
}

/// A knot-truncated linear function of a single variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hinge {
    /// Column index of the variable
    pub variable: usize,

    /// Position of the knot
    pub knot: f64,

    /// Side of the knot the hinge is active on
    pub direction: Direction,
}
impl Hinge {
    /// Creates a new hinge
    #[must_use]
    pub fn new(variable: usize, knot: f64, direction: Direction) -> Self {
        Self {
            variable,
            knot,
            direction,
        }
    }

    /// The hinge and its mirror image around the same knot
    #[must_use]
    pub fn pair(variable: usize, knot: f64) -> (Self, Self) {
        (
            Self::new(variable, knot, Direction::Right),
            Self::new(variable, knot, Direction::Left),
        )
    }

    /// Evaluates the hinge for a value of its variable
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let d = match self.direction {
            Direction::Right => x - self.knot,
            Direction::Left => self.knot - x,
        };
        d.max(0.0)
    }
}

/// One univariate factor of a product basis function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Factor {
    /// The variable itself
    Linear(usize),

    /// A hinge on the variable
    Hinge(Hinge),
}
impl Factor {
    /// Column index of the variable this factor reads
    #[must_use]
    pub fn variable(&self) -> usize {
        match self {
            Factor::Linear(v) => *v,
            Factor::Hinge(h) => h.variable,
        }
    }

    /// Evaluates the factor for a value of its variable
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Factor::Linear(_) => x,
            Factor::Hinge(h) => h.evaluate(x),
        }
    }

    fn write_label(&self, f: &mut impl fmt::Write, labels: &VariableLabels) -> fmt::Result {
        match self {
            Factor::Linear(v) => write!(f, "{}", labels.name(*v)),
            Factor::Hinge(h) => {
                let name = labels.name(h.variable);
                match h.direction {
                    Direction::Right => write!(f, "h({name}-{})", h.knot),
                    Direction::Left => write!(f, "h({}-{name})", h.knot),
                }
            }
        }
    }
}

/// A single term of an Earth model.
///
/// The typed variants make intercept detection a pattern match; no other
/// function can be mistaken for the constant term, whatever its text.
#[derive(Debug, Clone, PartialEq)]
pub enum BasisFunction {
    /// The constant term
    Intercept,

    /// A linear term in one variable
    Linear(usize),

    /// A hinge in one variable
    Hinge(Hinge),

    /// A product of two or more factors
    Interaction(Vec<Factor>),
}
impl BasisFunction {
    /// Returns true for the constant term
    #[must_use]
    pub fn is_intercept(&self) -> bool {
        matches!(self, BasisFunction::Intercept)
    }

    /// The factors multiplied together by this function. Empty for the intercept.
    #[must_use]
    pub fn factors(&self) -> Cow<'_, [Factor]> {
        match self {
            BasisFunction::Intercept => Cow::Borrowed(&[]),
            BasisFunction::Linear(v) => Cow::Owned(vec![Factor::Linear(*v)]),
            BasisFunction::Hinge(h) => Cow::Owned(vec![Factor::Hinge(*h)]),
            BasisFunction::Interaction(factors) => Cow::Borrowed(factors),
        }
    }

    /// Interaction degree: the number of factors
    #[must_use]
    pub fn degree(&self) -> usize {
        match self {
            BasisFunction::Intercept => 0,
            BasisFunction::Linear(_) | BasisFunction::Hinge(_) => 1,
            BasisFunction::Interaction(factors) => factors.len(),
        }
    }

    /// Returns true if any factor reads the given variable
    #[must_use]
    pub fn uses_variable(&self, variable: usize) -> bool {
        self.factors().iter().any(|f| f.variable() == variable)
    }

    /// Returns true if every knot is a finite number
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.factors().iter().all(|f| match f {
            Factor::Linear(_) => true,
            Factor::Hinge(h) => h.knot.is_finite(),
        })
    }

    /// Builds the child function `self * factor`
    #[must_use]
    pub fn multiply(&self, factor: Factor) -> Self {
        match self {
            BasisFunction::Intercept => match factor {
                Factor::Linear(v) => BasisFunction::Linear(v),
                Factor::Hinge(h) => BasisFunction::Hinge(h),
            },
            _ => {
                let mut factors = self.factors().into_owned();
                factors.push(factor);
                BasisFunction::Interaction(factors)
            }
        }
    }

    /// Evaluates the function, reading variable values through `value`
    pub fn evaluate_with(&self, value: impl Fn(usize) -> f64) -> f64 {
        self.factors()
            .iter()
            .map(|f| f.evaluate(value(f.variable())))
            .product()
    }

    /// Evaluates the function for one observation
    #[must_use]
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        self.evaluate_with(|v| row[v])
    }

    /// Evaluates the function for every row of a sample matrix
    #[must_use]
    pub fn column(&self, x: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(x.nrows(), |i, _| self.evaluate_with(|v| x[(i, v)]))
    }

    /// Canonical text of the function, naming variables with `labels`
    #[must_use]
    pub fn label(&self, labels: &VariableLabels) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_label(&mut out, labels);
        out
    }

    fn write_label(&self, f: &mut impl fmt::Write, labels: &VariableLabels) -> fmt::Result {
        if self.is_intercept() {
            return write!(f, "{INTERCEPT_LABEL}");
        }

        for (i, factor) in self.factors().iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            factor.write_label(f, labels)?;
        }
        Ok(())
    }
}
impl fmt::Display for BasisFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_label(f, &VariableLabels::default())
    }
}

/// Names for the input variables.
///
/// Variables without a name fall back to `x{index}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableLabels(Vec<String>);
impl VariableLabels {
    /// Creates a set of labels, one per variable in column order
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// Name of the variable at `index`
    #[must_use]
    pub fn name(&self, index: usize) -> Cow<'_, str> {
        match self.0.get(index) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("x{index}")),
        }
    }

    /// Returns every custom label
    #[must_use]
    pub fn custom(&self) -> &[String] {
        &self.0
    }
}

/// One entry of a [`Basis`]
#[derive(Debug, Clone, PartialEq)]
pub struct BasisEntry {
    /// The function
    pub function: BasisFunction,

    /// Whether the pruning pass removed the function from the model
    pub pruned: bool,
}

/// The ordered basis functions of a model.
///
/// Order is fitting order, and the index of an entry is the index of its
/// column in the coefficient matrix. Pruned functions keep their slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Basis {
    entries: Vec<BasisEntry>,
}
impl Basis {
    /// Creates an empty basis
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a basis holding only the intercept, where every forward pass starts
    #[must_use]
    pub fn intercept() -> Self {
        let mut basis = Self::new();
        basis.push(BasisFunction::Intercept);
        basis
    }

    /// Appends an active function, returning its index
    pub fn push(&mut self, function: BasisFunction) -> usize {
        self.entries.push(BasisEntry {
            function,
            pruned: false,
        });
        self.entries.len() - 1
    }

    /// Appends a function with the given pruned flag
    pub fn push_entry(&mut self, function: BasisFunction, pruned: bool) -> usize {
        self.entries.push(BasisEntry { function, pruned });
        self.entries.len() - 1
    }

    /// Number of functions, pruned or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the basis has no functions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BasisEntry> {
        self.entries.get(index)
    }

    /// Iterates over every entry in stored order
    pub fn iter(&self) -> impl Iterator<Item = &BasisEntry> {
        self.entries.iter()
    }

    /// Indices of the functions that were not pruned
    #[must_use]
    pub fn active_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.pruned)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of functions that were not pruned
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.entries.iter().filter(|e| !e.pruned).count()
    }

    /// Sets the pruned flag of the function at `index`
    ///
    /// Out of range indices are ignored.
    pub fn set_pruned(&mut self, index: usize, pruned: bool) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.pruned = pruned;
        }
    }

    /// Evaluates the functions at `columns` for every row of `x`.
    ///
    /// Returns a `rows x columns.len()` design matrix.
    #[must_use]
    pub fn design_matrix(&self, x: &DMatrix<f64>, columns: &[usize]) -> DMatrix<f64> {
        let mut design = DMatrix::zeros(x.nrows(), columns.len());
        for (j, &index) in columns.iter().enumerate() {
            design.set_column(j, &self.entries[index].function.column(x));
        }
        design
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hinge_evaluate() {
        let (right, left) = Hinge::pair(0, 2.0);
        assert_eq!(right.evaluate(5.0), 3.0);
        assert_eq!(right.evaluate(1.0), 0.0);
        assert_eq!(left.evaluate(5.0), 0.0);
        assert_eq!(left.evaluate(0.5), 1.5);
    }

    #[test]
    fn test_canonical_text() {
        let (right, left) = Hinge::pair(0, 3.5);
        assert_eq!(BasisFunction::Intercept.to_string(), "(Intercept)");
        assert_eq!(BasisFunction::Linear(2).to_string(), "x2");
        assert_eq!(BasisFunction::Hinge(right).to_string(), "h(x0-3.5)");
        assert_eq!(BasisFunction::Hinge(left).to_string(), "h(3.5-x0)");

        let product = BasisFunction::Hinge(Hinge::new(0, 1.0, Direction::Right))
            .multiply(Factor::Linear(1));
        assert_eq!(product.to_string(), "h(x0-1)*x1");
    }

    #[test]
    fn test_custom_labels() {
        let labels = VariableLabels::new(vec!["size".into()]);
        let f = BasisFunction::Hinge(Hinge::new(0, -2.0, Direction::Right)).multiply(Factor::Linear(1));
        assert_eq!(f.label(&labels), "h(size--2)*x1");
        assert_eq!(labels.custom(), &["size".to_string()]);
        assert!(VariableLabels::default().custom().is_empty());
    }

    #[test]
    fn test_multiply_and_degree() {
        let linear = BasisFunction::Intercept.multiply(Factor::Linear(0));
        assert_eq!(linear, BasisFunction::Linear(0));
        assert_eq!(linear.degree(), 1);

        let product = linear.multiply(Factor::Hinge(Hinge::new(1, 0.0, Direction::Left)));
        assert_eq!(product.degree(), 2);
        assert!(product.uses_variable(0));
        assert!(product.uses_variable(1));
        assert!(!product.uses_variable(2));
        assert_eq!(BasisFunction::Intercept.degree(), 0);
    }

    #[test]
    fn test_evaluate_product() {
        let f = BasisFunction::Hinge(Hinge::new(0, 1.0, Direction::Right)).multiply(Factor::Linear(1));
        assert_eq!(f.evaluate(&[3.0, 4.0]), 8.0);
        assert_eq!(f.evaluate(&[0.0, 4.0]), 0.0);
        assert_eq!(BasisFunction::Intercept.evaluate(&[9.0]), 1.0);
    }

    #[test]
    fn test_is_finite() {
        assert!(BasisFunction::Linear(0).is_finite());
        let bad = BasisFunction::Hinge(Hinge::new(0, f64::NAN, Direction::Left));
        assert!(!bad.is_finite());
    }

    #[test]
    fn test_basis_pruning_keeps_slots() {
        let mut basis = Basis::intercept();
        basis.push(BasisFunction::Linear(0));
        basis.push(BasisFunction::Linear(1));
        basis.set_pruned(1, true);

        assert_eq!(basis.len(), 3);
        assert_eq!(basis.active_len(), 2);
        assert_eq!(basis.active_indices(), vec![0, 2]);
        assert!(basis.get(1).unwrap().pruned);
    }

    #[test]
    fn test_design_matrix() {
        let mut basis = Basis::intercept();
        basis.push(BasisFunction::Hinge(Hinge::new(0, 2.0, Direction::Right)));
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 4.0]);

        let design = basis.design_matrix(&x, &[0, 1]);
        assert_eq!(design.shape(), (3, 2));
        assert_eq!(design.column(0).iter().copied().collect::<Vec<_>>(), vec![1.0; 3]);
        assert_eq!(design.column(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 2.0]);
    }
}
