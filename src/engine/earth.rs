use nalgebra::{DMatrix, DVector, SVD};

use crate::{
    basis::{Basis, BasisFunction, Factor, Hinge, VariableLabels},
    engine::RegressionEngine,
    error::FitError,
    parse::check_training_shapes,
    statistics,
    value::Value,
    Model,
};

/// Improvements smaller than this fraction of the total sum of squares count as ties
const RSS_TIE_TOLERANCE: f64 = 1e-10;

/// Hard cap on the number of basis functions the forward pass may grow
const MAX_TERMS_CEILING: usize = 400;

/// Settings for [`Earth`].
#[derive(Debug, Clone, PartialEq)]
pub struct EarthOptions {
    /// Maximum number of factors in one basis function
    pub max_degree: usize,

    /// Maximum number of basis functions, intercept included.
    ///
    /// `None` uses `min(2p + n/10, 400) + 1`, where `p` is the number of
    /// features and `n` the number of observations.
    pub max_terms: Option<usize>,

    /// GCV cost of every knot
    pub penalty: f64,

    /// The forward pass stops once the R² gain of a step falls below this,
    /// or once R² exceeds `1 - threshold`
    pub threshold: f64,

    /// Allow plain linear terms as well as hinges
    pub allow_linear: bool,

    /// Run the pruning pass after the forward pass
    pub enable_pruning: bool,

    /// Names of the input variables, attached to the fitted model
    pub variable_labels: VariableLabels,
}
impl Default for EarthOptions {
    fn default() -> Self {
        Self {
            max_degree: 1,
            max_terms: None,
            penalty: 3.0,
            threshold: 0.001,
            allow_linear: true,
            enable_pruning: true,
            variable_labels: VariableLabels::default(),
        }
    }
}

/// Multivariate adaptive regression splines.
///
/// Fitting runs in two passes:
/// - **Forward**: starting from the intercept, greedily adds the child of an
///   existing function that lowers the residual sum of squares the most. A child
///   is the parent times a linear factor, or a mirrored pair of hinges at a knot
///   taken from the training data.
/// - **Pruning**: greedily removes the function whose loss hurts the fit the
///   least, and keeps the subset with the lowest [`statistics::gcv`] score.
///   Removed functions stay in the basis, flagged as pruned.
///
/// Both passes are deterministic: candidates are visited in a fixed order and
/// ties go to the first one seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Earth {
    options: EarthOptions,
}

/// A possible forward step: one or two children of an existing function
#[derive(Debug, Clone)]
struct Candidate {
    parent: usize,
    factors: Vec<Factor>,
}

struct LeastSquares {
    /// `basis functions x outputs`
    coefficients: DMatrix<f64>,
    rss: f64,
}

impl Earth {
    /// Creates an engine with the given options
    #[must_use]
    pub fn new(options: EarthOptions) -> Self {
        Self { options }
    }

    /// Sets the maximum interaction degree
    #[must_use]
    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.options.max_degree = max_degree;
        self
    }

    /// Sets the variable labels attached to fitted models
    #[must_use]
    pub fn with_labels(mut self, labels: VariableLabels) -> Self {
        self.options.variable_labels = labels;
        self
    }

    /// The options this engine fits with
    #[must_use]
    pub fn options(&self) -> &EarthOptions {
        &self.options
    }

    /// Largest basis the forward pass may grow for `n` observations of `p` features
    #[must_use]
    pub fn max_terms(&self, n: usize, p: usize) -> usize {
        let default = (2 * p + n / 10).min(MAX_TERMS_CEILING) + 1;
        self.options.max_terms.unwrap_or(default).min(n).max(1)
    }

    fn forward_pass(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<Basis, FitError> {
        let (n, p) = x.shape();
        let max_terms = self.max_terms(n, p);

        let mut basis = Basis::intercept();
        let mut columns = vec![DVector::from_element(n, 1.0)];

        let sst = total_sum_of_squares(y);
        if sst <= f64::EPSILON * y.norm_squared() {
            log::warn!("Targets have no variance; the model is the intercept only");
            return Ok(basis);
        }

        let mut rss = least_squares(&basis.design_matrix(x, &[0]), y)?.rss;
        while basis.len() < max_terms {
            let candidates = self.candidates(&basis, &columns, x, max_terms - basis.len());
            if candidates.is_empty() {
                log::debug!("Forward pass: no candidates left");
                break;
            }

            let scores = score_candidates(&candidates, &columns, x, y)?;
            let mut best: Option<(usize, f64)> = None;
            for (i, score) in scores.into_iter().enumerate() {
                let improves = match best {
                    Some((_, best_rss)) => score < best_rss - RSS_TIE_TOLERANCE * sst,
                    None => true,
                };
                if improves {
                    best = Some((i, score));
                }
            }

            let Some((best, best_rss)) = best else {
                break;
            };
            if best_rss >= rss - RSS_TIE_TOLERANCE * sst {
                log::debug!("Forward pass: no candidate improves the fit");
                break;
            }

            let candidate = &candidates[best];
            let parent = basis_function(&basis, candidate.parent)?.clone();
            for factor in &candidate.factors {
                columns.push(child_column(&columns[candidate.parent], *factor, x));
                let function = parent.multiply(*factor);
                log::debug!("Forward pass: added {function}");
                basis.push(function);
            }

            let gain = (rss - best_rss) / sst;
            rss = best_rss;
            if rss / sst <= self.options.threshold {
                log::debug!("Forward pass: R² reached 1 - {}", self.options.threshold);
                break;
            }
            if gain < self.options.threshold {
                log::debug!("Forward pass: R² gain {gain} below threshold");
                break;
            }
        }

        log::info!("Forward pass selected {} basis functions", basis.len());
        Ok(basis)
    }

    /// Every child that could be added to `basis` without exceeding `room` more functions.
    ///
    /// Order: by parent, then by variable, with the linear child ahead of the
    /// hinge pairs, which follow in increasing knot order.
    fn candidates(
        &self,
        basis: &Basis,
        columns: &[DVector<f64>],
        x: &DMatrix<f64>,
        room: usize,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for (parent, entry) in basis.iter().enumerate() {
            if entry.function.degree() >= self.options.max_degree {
                continue;
            }

            for variable in 0..x.ncols() {
                if entry.function.uses_variable(variable) {
                    continue;
                }

                let is_new = |factor: Factor| {
                    let child = entry.function.multiply(factor);
                    basis.iter().all(|e| e.function != child)
                };

                if self.options.allow_linear && is_new(Factor::Linear(variable)) {
                    candidates.push(Candidate {
                        parent,
                        factors: vec![Factor::Linear(variable)],
                    });
                }

                if room < 2 {
                    continue;
                }
                for knot in interior_knots(&columns[parent], x, variable) {
                    let (right, left) = Hinge::pair(variable, knot);
                    if is_new(Factor::Hinge(right)) {
                        candidates.push(Candidate {
                            parent,
                            factors: vec![Factor::Hinge(right), Factor::Hinge(left)],
                        });
                    }
                }
            }
        }
        candidates
    }

    /// Flags the functions the pruning pass removes, keeping the lowest-GCV subset
    fn prune(&self, basis: &mut Basis, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<(), FitError> {
        let n = x.nrows();
        let outputs = y.ncols();
        let score = |rss: f64, terms: usize| {
            let mse = rss / f64::from_positive_int(n * outputs);
            let c = statistics::effective_parameters(terms, self.options.penalty);
            statistics::gcv(mse, c, n)
        };

        let mut active = basis.active_indices();
        let rss = least_squares(&basis.design_matrix(x, &active), y)?.rss;
        let mut best_gcv = score(rss, active.len());
        let mut best_subset = active.clone();

        while active.len() > 1 {
            let mut removal: Option<(usize, f64)> = None;
            for (position, &index) in active.iter().enumerate() {
                if basis_function(basis, index)?.is_intercept() {
                    continue;
                }

                let mut trial = active.clone();
                trial.remove(position);
                let rss = least_squares(&basis.design_matrix(x, &trial), y)?.rss;
                if removal.map_or(true, |(_, best)| rss < best) {
                    removal = Some((position, rss));
                }
            }

            let Some((position, rss)) = removal else {
                break;
            };
            active.remove(position);

            let gcv = score(rss, active.len());
            log::debug!("Pruning pass: {} terms, GCV {gcv}", active.len());
            if gcv < best_gcv {
                best_gcv = gcv;
                best_subset = active.clone();
            }
        }

        for index in basis.active_indices() {
            if !best_subset.contains(&index) {
                basis.set_pruned(index, true);
            }
        }

        log::info!(
            "Pruning pass kept {} of {} basis functions, GCV {best_gcv}",
            best_subset.len(),
            basis.len()
        );
        Ok(())
    }
}

impl RegressionEngine for Earth {
    fn fit(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<Model, FitError> {
        check_training_shapes(x, y)?;
        if self.options.max_degree == 0 {
            return Err(FitError::InvalidDegree);
        }

        let (n, p) = x.shape();
        log::debug!(
            "Fitting {n} observations of {p} features to {} outputs",
            y.ncols()
        );

        let labels = self.options.variable_labels.custom();
        if !labels.is_empty() && labels.len() != p {
            log::warn!("{} variable labels given for {p} features", labels.len());
        }

        let mut basis = self.forward_pass(x, y)?;
        if self.options.enable_pruning {
            self.prune(&mut basis, x, y)?;
        }

        // Refit on the surviving functions; pruned columns keep zero weights
        let active = basis.active_indices();
        let solution = least_squares(&basis.design_matrix(x, &active), y)?;

        let mut coefficients = DMatrix::zeros(y.ncols(), basis.len());
        for (row, &index) in active.iter().enumerate() {
            coefficients.set_column(index, &solution.coefficients.row(row).transpose());
        }

        let mse = solution.rss / f64::from_positive_int(n * y.ncols());
        let model = Model::new(basis, coefficients, p, mse)?
            .with_labels(self.options.variable_labels.clone());
        Ok(model)
    }
}

fn basis_function(basis: &Basis, index: usize) -> Result<&BasisFunction, FitError> {
    basis
        .get(index)
        .map(|e| &e.function)
        .ok_or(FitError::Algebra("basis index out of range"))
}

fn total_sum_of_squares(y: &DMatrix<f64>) -> f64 {
    y.column_iter()
        .map(|column| {
            let mean = column.mean();
            column.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        })
        .sum()
}

/// Sorted unique values of `variable` where the parent is non-zero, minus the two extremes
fn interior_knots(parent: &DVector<f64>, x: &DMatrix<f64>, variable: usize) -> Vec<f64> {
    let mut values: Vec<f64> = parent
        .iter()
        .enumerate()
        .filter(|(_, p)| **p != 0.0)
        .map(|(i, _)| x[(i, variable)])
        .collect();
    values.sort_by(f64::total_cmp);
    values.dedup();

    if values.len() < 3 {
        return Vec::new();
    }
    values[1..values.len() - 1].to_vec()
}

fn child_column(parent: &DVector<f64>, factor: Factor, x: &DMatrix<f64>) -> DVector<f64> {
    let variable = factor.variable();
    DVector::from_fn(parent.len(), |i, _| {
        parent[i] * factor.evaluate(x[(i, variable)])
    })
}

fn stack_columns(columns: &[&DVector<f64>]) -> DMatrix<f64> {
    let rows = columns.first().map_or(0, |c| c.len());
    let mut design = DMatrix::zeros(rows, columns.len());
    for (j, column) in columns.iter().enumerate() {
        design.set_column(j, *column);
    }
    design
}

fn score_candidate(
    candidate: &Candidate,
    columns: &[DVector<f64>],
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
) -> Result<f64, FitError> {
    let children: Vec<DVector<f64>> = candidate
        .factors
        .iter()
        .map(|factor| child_column(&columns[candidate.parent], *factor, x))
        .collect();

    let design = stack_columns(&columns.iter().chain(children.iter()).collect::<Vec<_>>());
    Ok(least_squares(&design, y)?.rss)
}

/// Residual sum of squares of every candidate, in candidate order
fn score_candidates(
    candidates: &[Candidate],
    columns: &[DVector<f64>],
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
) -> Result<Vec<f64>, FitError> {
    #[cfg(not(feature = "parallel"))]
    {
        return candidates
            .iter()
            .map(|candidate| score_candidate(candidate, columns, x, y))
            .collect();
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        candidates
            .par_iter()
            .map(|candidate| score_candidate(candidate, columns, x, y))
            .collect()
    }
}

/// Least squares solution of `design * coefficients = y` for every output at once
fn least_squares(design: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<LeastSquares, FitError> {
    let size = design.shape();
    let decomp = SVD::new(design.clone(), true, true);

    // ~= machine_epsilon * max(size) * max_singular
    let sigma_max = decomp.singular_values.max();
    let epsilon = f64::EPSILON * f64::from_positive_int(size.0.max(size.1)) * sigma_max;

    let coefficients = decomp.solve(y, epsilon).map_err(FitError::Algebra)?;
    if coefficients.iter().any(|c| c.is_nan()) {
        return Err(FitError::Algebra("NaN in coefficients"));
    }

    let residuals = y - design * &coefficients;
    Ok(LeastSquares {
        coefficients,
        rss: residuals.norm_squared(),
    })
}
