//! Exporting a model as portable code
//!
//! [`export_code`] renders a fitted model in a restricted infix grammar that a
//! C-family compiler (C89, Java, JavaScript, ...) accepts as an expression:
//! - numeric literals, variables, `+`, `-`, `*` and parentheses
//! - hinges as the conditional `((e) > 0 ? (e) : 0)`
//!
//! ```
//! # use earthfit::{Model, export::{export_code, CodeOptions}, basis::{Basis, BasisFunction, Hinge}, nalgebra::DMatrix};
//! let (right, _) = Hinge::pair(0, 3.5);
//! let mut basis = Basis::intercept();
//! basis.push(BasisFunction::Hinge(right));
//! let model = Model::new(basis, DMatrix::from_row_slice(1, 2, &[1.0, -2.0]), 1, 0.04).unwrap();
//!
//! let export = export_code(&model, &CodeOptions::default()).unwrap();
//! assert_eq!(export.code, "1.0 - 2.0*((x0 - 3.5) > 0 ? (x0 - 3.5) : 0)");
//! assert!((export.rmse - 0.2).abs() < 1e-12);
//! ```
use std::fmt;

use serde::Serialize;

use crate::{
    basis::{BasisFunction, Direction, Factor, VariableLabels},
    display::{self, Sign, Term},
    error::ExportError,
    formula::{self, ExpressionTerm},
    Model,
};

/// Reserved words of C89; none of them can name a variable
const C_KEYWORDS: [&str; 32] = [
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while",
];

/// How variables are named in exported code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariableStyle {
    /// One identifier per variable: `x0`, or its label
    #[default]
    Named,

    /// Elements of one array: `x[0]`
    Indexed,
}

/// Options for [`export_code`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeOptions {
    /// How variables are named
    pub variable_style: VariableStyle,
}

/// A model rendered as portable code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeExport {
    /// The expression text; `[e0, e1, ...]` for multi-output models
    pub code: String,

    /// Root mean squared training error of the model
    pub rmse: f64,
}

/// Everything the tool reports about a model, for machine consumption
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Flat formula, as [`display::render_flat`] writes it
    pub formula: String,

    /// The formula's terms
    pub terms: Vec<ExpressionTerm>,

    /// Portable code for every output
    pub code: String,

    /// Root mean squared training error
    pub rmse: f64,
}
impl Report {
    /// Builds the report for a model
    ///
    /// # Errors
    /// Fails as [`export_code`] does.
    pub fn new(model: &Model, options: &CodeOptions) -> Result<Self, ExportError> {
        let expression = formula::assemble(model);
        let CodeExport { code, rmse } = export_code(model, options)?;
        Ok(Self {
            formula: display::render_flat(&expression),
            terms: expression.terms().to_vec(),
            code,
            rmse,
        })
    }

    /// The report as a pretty-printed JSON document
    ///
    /// # Errors
    /// Returns [`ExportError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Serialize(e.to_string()))
    }
}

/// Arithmetic over the input variables.
///
/// Simplification follows the usual identities: constant folding, `x + 0`,
/// `x - 0`, `0 * x`, `1 * x`, and `max(0, c)` for constant `c`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Input variable by column index
    Var(usize),

    /// Numeric literal
    Const(f64),

    /// Sum
    Add(Box<Expr>, Box<Expr>),

    /// Difference
    Sub(Box<Expr>, Box<Expr>),

    /// Product
    Mul(Box<Expr>, Box<Expr>),

    /// `max(0, e)`
    Positive(Box<Expr>),
}

impl Expr {
    fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Add(Box::new(lhs), Box::new(rhs))
    }

    fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(lhs), Box::new(rhs))
    }

    fn mul(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(lhs), Box::new(rhs))
    }

    /// Builds the expression for one output of a model.
    ///
    /// Constant terms come first so the intercept folds into a single literal.
    #[must_use]
    pub fn from_model(model: &Model, output: usize) -> Expr {
        let mut constants = Vec::new();
        let mut products = Vec::new();
        for (index, function) in model.active_functions() {
            let coef = Expr::Const(model.coefficients()[(output, index)]);
            let term = function
                .factors()
                .iter()
                .fold(coef, |acc, factor| Expr::mul(acc, Self::from_factor(*factor)));

            if function.is_intercept() {
                constants.push(term);
            } else {
                products.push(term);
            }
        }

        constants
            .into_iter()
            .chain(products)
            .reduce(Expr::add)
            .unwrap_or(Expr::Const(0.0))
    }

    fn from_factor(factor: Factor) -> Expr {
        match factor {
            Factor::Linear(v) => Expr::Var(v),
            Factor::Hinge(h) => {
                let difference = match h.direction {
                    Direction::Right => Expr::sub(Expr::Var(h.variable), Expr::Const(h.knot)),
                    Direction::Left => Expr::sub(Expr::Const(h.knot), Expr::Var(h.variable)),
                };
                Expr::Positive(Box::new(difference))
            }
        }
    }

    /// Returns a simplified copy of the expression
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
                    (Expr::Const(a), _) if *a == 0.0 => rhs,
                    (_, Expr::Const(b)) if *b == 0.0 => lhs,
                    _ => Expr::add(lhs, rhs),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
                    (_, Expr::Const(b)) if *b == 0.0 => lhs,
                    (_, Expr::Const(b)) if *b < 0.0 => Expr::add(lhs, Expr::Const(-b)),
                    _ => Expr::sub(lhs, rhs),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                match (&lhs, &rhs) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
                    (Expr::Const(a), _) | (_, Expr::Const(a)) if *a == 0.0 => Expr::Const(0.0),
                    (Expr::Const(a), _) if *a == 1.0 => rhs,
                    (_, Expr::Const(b)) if *b == 1.0 => lhs,
                    _ => Expr::mul(lhs, rhs),
                }
            }
            Expr::Positive(inner) => match inner.simplify() {
                Expr::Const(c) => Expr::Const(c.max(0.0)),
                inner => Expr::Positive(Box::new(inner)),
            },
        }
    }

    /// Evaluates the expression for one observation
    ///
    /// # Panics
    /// Panics if `row` is too short to hold a variable the expression reads.
    #[must_use]
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        match self {
            Expr::Var(v) => row[*v],
            Expr::Const(c) => *c,
            Expr::Add(lhs, rhs) => lhs.evaluate(row) + rhs.evaluate(row),
            Expr::Sub(lhs, rhs) => lhs.evaluate(row) - rhs.evaluate(row),
            Expr::Mul(lhs, rhs) => lhs.evaluate(row) * rhs.evaluate(row),
            Expr::Positive(inner) => inner.evaluate(row).max(0.0),
        }
    }

    /// Renders the expression, naming variables with `name`
    pub fn to_code(&self, name: &impl Fn(usize) -> String) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_code(&mut out, name, Precedence::Top);
        out
    }

    fn write_code(
        &self,
        out: &mut impl fmt::Write,
        name: &impl Fn(usize) -> String,
        required: Precedence,
    ) -> fmt::Result {
        match self {
            Expr::Var(v) => write!(out, "{}", name(*v)),
            Expr::Const(c) if *c < 0.0 && required > Precedence::Product => write!(out, "({c:?})"),
            Expr::Const(c) => write!(out, "{c:?}"),
            Expr::Add(..) | Expr::Sub(..) => {
                let mut terms = Vec::new();
                self.collect_terms(Sign::Positive, name, &mut terms);

                let mut text = String::new();
                display::write_terms(&mut text, &terms)?;
                if required > Precedence::Sum {
                    write!(out, "({text})")
                } else {
                    write!(out, "{text}")
                }
            }
            Expr::Mul(lhs, rhs) => {
                lhs.write_code(out, name, Precedence::Product)?;
                write!(out, "*")?;
                rhs.write_code(out, name, Precedence::Operand)
            }
            Expr::Positive(inner) => {
                let inner = inner.to_code(name);
                write!(out, "(({inner}) > 0 ? ({inner}) : 0)")
            }
        }
    }

    /// Flattens a chain of sums and differences into signed terms
    fn collect_terms(&self, sign: Sign, name: &impl Fn(usize) -> String, terms: &mut Vec<Term>) {
        match self {
            Expr::Add(lhs, rhs) => {
                lhs.collect_terms(sign, name, terms);
                rhs.collect_terms(sign, name, terms);
            }
            Expr::Sub(lhs, rhs) => {
                lhs.collect_terms(sign, name, terms);
                rhs.collect_terms(sign.flip(), name, terms);
            }
            _ => {
                let (sign, term) = match self.negate_leading() {
                    Some(negated) => (sign.flip(), negated),
                    None => (sign, self.clone()),
                };

                let mut body = String::new();
                // Writing to a String cannot fail
                let _ = term.write_code(&mut body, name, Precedence::Product);
                terms.push(Term::new(sign, body));
            }
        }
    }

    /// `-self`, if the leading factor is a negative literal
    fn negate_leading(&self) -> Option<Expr> {
        match self {
            Expr::Const(c) if *c < 0.0 => Some(Expr::Const(-c)),
            Expr::Mul(lhs, rhs) => lhs
                .negate_leading()
                .map(|lhs| Expr::mul(lhs, (**rhs).clone())),
            _ => None,
        }
    }
}
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = VariableLabels::default();
        write!(f, "{}", self.to_code(&|v| labels.name(v).into_owned()))
    }
}

/// Binding strength an operand needs to be written without parentheses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Top,
    Sum,
    Product,

    /// Right-hand operand of a product
    Operand,
}

/// Returns true if `name` can be used as a C identifier
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !C_KEYWORDS.contains(&name)
}

/// Renders a model as portable code, along with its RMSE.
///
/// One expression is built per output and simplified; single-output models
/// render the bare expression and multi-output models `[e0, e1, ...]`.
///
/// # Errors
/// - [`ExportError::NonFinite`] if an active function has a NaN or infinite
///   coefficient or knot
/// - [`ExportError::InvalidIdentifier`] if, with [`VariableStyle::Named`], a
///   variable used by the model has a label that is not a C identifier
pub fn export_code(model: &Model, options: &CodeOptions) -> Result<CodeExport, ExportError> {
    validate(model, options)?;

    let labels = model.labels();
    let name = |v: usize| match options.variable_style {
        VariableStyle::Named => labels.name(v).into_owned(),
        VariableStyle::Indexed => format!("x[{v}]"),
    };

    let outputs: Vec<String> = (0..model.outputs())
        .map(|output| Expr::from_model(model, output).simplify().to_code(&name))
        .collect();

    let code = match outputs.as_slice() {
        [single] => single.clone(),
        _ => format!("[{}]", outputs.join(", ")),
    };

    log::debug!("Exported {} outputs as code", outputs.len());
    Ok(CodeExport {
        code,
        rmse: model.rmse(),
    })
}

fn validate(model: &Model, options: &CodeOptions) -> Result<(), ExportError> {
    for (index, function) in model.active_functions() {
        let coefficients_finite = model.coefficients().column(index).iter().all(|c| c.is_finite());
        if !coefficients_finite || !function.is_finite() {
            return Err(ExportError::NonFinite {
                basis: function.label(model.labels()),
            });
        }

        if options.variable_style == VariableStyle::Named {
            check_names(function, model.labels())?;
        }
    }
    Ok(())
}

fn check_names(function: &BasisFunction, labels: &VariableLabels) -> Result<(), ExportError> {
    for factor in function.factors().iter() {
        let name = labels.name(factor.variable());
        if !is_identifier(&name) {
            return Err(ExportError::InvalidIdentifier(name.into_owned()));
        }
    }
    Ok(())
}
