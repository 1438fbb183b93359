use nalgebra::{DMatrix, DVector};

use crate::{
    basis::{Basis, BasisFunction, VariableLabels},
    error::FitError,
    statistics,
};

/// A fitted Earth model.
///
/// Owns the ordered [`Basis`] produced by the forward pass, with pruned
/// functions flagged rather than removed, and a coefficient matrix of shape
/// `[outputs, basis functions]`. Column `j` of the coefficient matrix holds
/// the weights of basis function `j` for every output; the columns of pruned
/// functions hold zeros and are never read.
///
/// Prediction is `y(x) = Σ coefficients[:, j] * basis_j(x)` over the active `j`.
///
/// # Example
/// ```
/// # use earthfit::{Model, basis::{Basis, BasisFunction}, nalgebra::DMatrix};
/// let mut basis = Basis::intercept();
/// basis.push(BasisFunction::Linear(0));
///
/// // y = 1 + 2 x0
/// let coefficients = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
/// let model = Model::new(basis, coefficients, 1, 0.0).unwrap();
/// assert_eq!(model.predict(&[3.0])[0], 7.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    basis: Basis,
    coefficients: DMatrix<f64>,
    features: usize,
    mse: f64,
    labels: VariableLabels,
}
impl Model {
    /// Creates a model from its parts.
    ///
    /// # Errors
    /// Returns [`FitError::ShapeMismatch`] if `coefficients` does not have one
    /// column per basis function.
    pub fn new(
        basis: Basis,
        coefficients: DMatrix<f64>,
        features: usize,
        mse: f64,
    ) -> Result<Self, FitError> {
        if coefficients.ncols() != basis.len() || coefficients.nrows() == 0 {
            return Err(FitError::ShapeMismatch {
                rows: coefficients.nrows(),
                cols: coefficients.ncols(),
                outputs: coefficients.nrows().max(1),
                basis: basis.len(),
            });
        }

        Ok(Self {
            basis,
            coefficients,
            features,
            mse,
            labels: VariableLabels::default(),
        })
    }

    /// Attaches names for the input variables, used by every text rendering
    #[must_use]
    pub fn with_labels(mut self, labels: VariableLabels) -> Self {
        self.labels = labels;
        self
    }

    /// The ordered basis, pruned functions included
    #[must_use]
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// The full `[outputs, basis functions]` coefficient matrix
    #[must_use]
    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    /// Weights of basis function `index` for every output
    #[must_use]
    pub fn coefficients_for(&self, index: usize) -> DVector<f64> {
        self.coefficients.column(index).into_owned()
    }

    /// Number of outputs
    #[must_use]
    pub fn outputs(&self) -> usize {
        self.coefficients.nrows()
    }

    /// Number of input features the model was trained on
    #[must_use]
    pub fn features(&self) -> usize {
        self.features
    }

    /// Names of the input variables
    #[must_use]
    pub fn labels(&self) -> &VariableLabels {
        &self.labels
    }

    /// Mean squared training error, averaged over every output
    #[must_use]
    pub fn mse(&self) -> f64 {
        self.mse
    }

    /// Root mean squared training error, `sqrt(mse)`
    #[must_use]
    pub fn rmse(&self) -> f64 {
        self.mse.sqrt()
    }

    /// Active basis functions along with their index, in stored order
    pub fn active_functions(&self) -> impl Iterator<Item = (usize, &BasisFunction)> {
        self.basis
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.pruned)
            .map(|(i, e)| (i, &e.function))
    }

    /// Predicts every output for one observation
    ///
    /// # Panics
    /// Panics if `row` has fewer values than the model has features.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> DVector<f64> {
        assert!(
            row.len() >= self.features,
            "Observation has {} values, the model was trained on {} features",
            row.len(),
            self.features
        );

        let mut y = DVector::zeros(self.outputs());
        for (j, function) in self.active_functions() {
            let value = function.evaluate(row);
            y += self.coefficients.column(j) * value;
        }
        y
    }

    /// Predicts every output for every row of `x`; the result is `rows x outputs`
    ///
    /// # Panics
    /// Panics if `x` has fewer columns than the model has features.
    #[must_use]
    pub fn predict_matrix(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        assert!(
            x.ncols() >= self.features,
            "Sample matrix has {} columns, the model was trained on {} features",
            x.ncols(),
            self.features
        );

        let columns = self.basis.active_indices();
        let design = self.basis.design_matrix(x, &columns);
        let weights = self.coefficients.select_columns(&columns);
        design * weights.transpose()
    }

    /// Coefficient of determination of output `output` against `y`
    #[must_use]
    pub fn r_squared(&self, x: &DMatrix<f64>, y: &DMatrix<f64>, output: usize) -> f64 {
        let y_fit = self.predict_matrix(x);
        statistics::r_squared(
            y.column(output).iter().copied(),
            y_fit.column(output).iter().copied(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assert_close,
        basis::{Direction, Hinge},
    };

    fn hinge_model() -> Model {
        // y0 = 1 + 2 h(x0-1) - 3 h(1-x0), y1 = -1 + 0.5 h(x0-1)
        let (right, left) = Hinge::pair(0, 1.0);
        let mut basis = Basis::intercept();
        basis.push(BasisFunction::Hinge(right));
        basis.push(BasisFunction::Hinge(left));
        basis.set_pruned(2, true);

        let coefficients = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 0.0, -1.0, 0.5, 0.0]);
        Model::new(basis, coefficients, 1, 0.25).unwrap()
    }

    #[test]
    fn test_shape_checked() {
        let basis = Basis::intercept();
        let coefficients = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(matches!(
            Model::new(basis, coefficients, 1, 0.0),
            Err(FitError::ShapeMismatch { cols: 2, basis: 1, .. })
        ));
    }

    #[test]
    fn test_predict_skips_pruned() {
        let model = hinge_model();
        let y = model.predict(&[3.0]);
        assert_eq!(y.len(), 2);
        assert_close!(y[0], 5.0);
        assert_close!(y[1], 0.0);

        // The pruned left hinge would be active here
        let y = model.predict(&[0.0]);
        assert_close!(y[0], 1.0);
    }

    #[test]
    fn test_predict_matrix_matches_rows() {
        let model = hinge_model();
        let x = DMatrix::from_row_slice(3, 1, &[0.0, 1.5, 4.0]);
        let y = model.predict_matrix(&x);
        assert_eq!(y.shape(), (3, 2));
        for i in 0..3 {
            let row = model.predict(&[x[(i, 0)]]);
            assert_close!(y[(i, 0)], row[0]);
            assert_close!(y[(i, 1)], row[1]);
        }
    }

    #[test]
    #[should_panic(expected = "Observation has 1 values, the model was trained on 2 features")]
    fn test_predict_rejects_short_rows() {
        let mut basis = Basis::intercept();
        basis.push(BasisFunction::Linear(1));
        let model = Model::new(basis, DMatrix::from_row_slice(1, 2, &[1.0, 2.0]), 2, 0.0).unwrap();
        let _ = model.predict(&[1.0]);
    }

    #[test]
    #[should_panic(expected = "Sample matrix has 1 columns")]
    fn test_predict_matrix_rejects_narrow_samples() {
        let mut basis = Basis::intercept();
        basis.push(BasisFunction::Linear(1));
        let model = Model::new(basis, DMatrix::from_row_slice(1, 2, &[1.0, 2.0]), 2, 0.0).unwrap();
        let _ = model.predict_matrix(&DMatrix::from_element(3, 1, 1.0));
    }

    #[test]
    fn test_r_squared_of_exact_model() {
        let model = hinge_model();
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = model.predict_matrix(&x);
        assert_close!(model.r_squared(&x, &y, 0), 1.0);
    }

    #[test]
    fn test_rmse_is_root_of_mse() {
        let model = hinge_model();
        assert_close!(model.rmse(), 0.5);
    }

    #[test]
    fn test_coefficients_for_returns_every_output() {
        let model = hinge_model();
        let c = model.coefficients_for(1);
        assert_eq!(c.as_slice(), &[2.0, 0.5]);
        assert_eq!(model.active_functions().count(), 2);
        assert_eq!(
            model.active_functions().nth(1).map(|(i, _)| i),
            Some(1)
        );
        assert_eq!(
            model.basis().get(2).map(|e| e.function.clone()),
            Some(BasisFunction::Hinge(Hinge::new(0, 1.0, Direction::Left)))
        );
    }
}
