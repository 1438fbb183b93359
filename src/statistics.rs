//! Functions for evaluating how well a fitted model explains its data
//!
//! # Error Metrics
//! - [`mean_squared_error`]: Average squared difference between observed and predicted values. Lower is better.
//! - [`root_mean_squared_error`]: Square root of MSE, giving error in same units as observed values. Lower is better.
//! - [`r_squared`]: Proportion of variance explained by the model. Higher is better (0 to 1).
//!
//! # Model Selection
//! - [`effective_parameters`]: The parameter count GCV charges an Earth model with.
//! - [`gcv`]: Generalized cross validation score, used to choose how far to prune. Lower is better.
//!
//! # Examples
//!
//! ```rust
//! use earthfit::statistics::{r_squared, root_mean_squared_error};
//!
//! let y = vec![1.0, 2.0, 3.0];
//! let y_fit = vec![1.1, 1.9, 3.05];
//!
//! let r2 = r_squared(y.iter().copied(), y_fit.iter().copied());
//! let rmse = root_mean_squared_error(y.into_iter(), y_fit.into_iter());
//! println!("R² = {r2}, RMSE = {rmse}");
//! ```
use crate::value::Value;

/// Calculate the R-squared value for a set of data.
///
/// R-squared is a number between 0 and 1 that tells you how well the model explains the data:
/// - `0` means the model explains none of the variation.
/// - `1` means the model explains all the variation.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// R² = 1 - (SS_res / SS_tot)
/// where
///   SS_res = Σ (y_i - y_fit_i)²
///   SS_tot = Σ (y_i - y_mean)²
/// ```
/// </div>
///
/// Returns NaN when `y` is constant, since there is no variance to explain.
pub fn r_squared<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> T {
    let y: Vec<T> = y.collect();
    let y_fit: Vec<T> = y_fit.collect();

    let mut y_mean = T::zero();
    let mut y_n = T::zero();
    for y in &y {
        y_mean += *y;
        y_n += T::one();
    }
    y_mean /= y_n;

    let mut ss_total = T::zero();
    let mut ss_residual = T::zero();
    for (y, y_fit) in y.into_iter().zip(y_fit) {
        ss_total += Value::powi(y - y_mean, 2);
        ss_residual += Value::powi(y - y_fit, 2);
    }

    if ss_total == T::zero() {
        return T::nan();
    }
    T::one() - ss_residual / ss_total
}

/// Computes the root mean squared error (RMSE) between two sets of values.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// RMSE = √( (Σ (y_i - y_fit_i)²) / N )
/// ```
/// </div>
///
/// # Example
/// ```
/// # use earthfit::statistics::root_mean_squared_error;
/// let y = vec![1.0, 2.0, 3.0];
/// let y_fit = vec![1.1, 1.9, 3.05];
/// let rmse = root_mean_squared_error(y.into_iter(), y_fit.into_iter());
/// ```
pub fn root_mean_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    let (mse, _) = mse_with_n(y, y_fit);
    mse.sqrt()
}

/// Computes the mean squared error (MSE) between two sets of values.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// MSE = (Σ (y_i - y_fit_i)²) / N
/// ```
/// </div>
///
/// Returns NaN for empty input.
pub fn mean_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    let (mse, _) = mse_with_n(y, y_fit);
    mse
}

/// Number of effective parameters of a model with `terms` basis functions.
///
/// Every knot placed by the forward pass costs `penalty / 2` on top of the
/// coefficient it adds, since knot positions were chosen by looking at the data.
///
/// ```math
/// C = k + penalty * (k - 1) / 2
/// ```
pub fn effective_parameters<T: Value>(terms: usize, penalty: T) -> T {
    let k = T::from_positive_int(terms);
    k + penalty * (k - T::one()) / T::two()
}

/// Generalized cross validation score.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// GCV = MSE / (1 - C / N)²
/// where
///   C = effective parameters, N = number of observations
/// ```
/// </div>
///
/// A perfect fit scores zero. If `C == N` the score is infinite, since the
/// model could have memorised its data.
pub fn gcv<T: Value>(mse: T, effective_parameters: T, n: usize) -> T {
    if mse == T::zero() {
        return T::zero();
    }

    let n = T::from_positive_int(n);
    let denominator = Value::powi(T::one() - effective_parameters / n, 2);
    if denominator <= T::epsilon() {
        return T::infinity();
    }
    mse / denominator
}

fn mse_with_n<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> (T, T) {
    let mut total = T::zero();
    let mut n = T::zero();
    for (y, y_fit) in y.zip(y_fit) {
        total += Value::powi(y - y_fit, 2);
        n += T::one();
    }
    (total / n, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r_squared_perfect_fit() {
        let y = vec![1.0, 2.0, 3.0];
        let y_fit = vec![1.0, 2.0, 3.0];
        let r2 = r_squared::<f64>(y.into_iter(), y_fit.into_iter());
        assert_eq!(r2, 1.0);
    }

    #[test]
    fn r_squared_bad_fit() {
        // mean(y) = 2, SST = 2, SSE = 2
        let y = vec![1.0, 2.0, 3.0];
        let y_fit = vec![2.0, 2.0, 2.0];
        let r2 = r_squared::<f64>(y.into_iter(), y_fit.into_iter());
        assert_eq!(r2, 0.0);
    }

    #[test]
    fn r_squared_constant_y() {
        let y = vec![2.0, 2.0, 2.0];
        let y_fit = vec![2.0, 2.0, 2.0];
        let r2 = r_squared::<f64>(y.into_iter(), y_fit.into_iter());
        assert!(r2.is_nan());
    }

    #[test]
    fn mse_with_negatives() {
        // diffs = [-2, -4], squared = [4, 16], mean = 10
        let y = vec![-1.0, -2.0];
        let y_fit = vec![1.0, 2.0];
        let mse = mean_squared_error::<f64>(y.into_iter(), y_fit.into_iter());
        assert_eq!(mse, 10.0);
    }

    #[test]
    fn mse_empty_input_returns_nan() {
        let y: Vec<f64> = vec![];
        let y_fit: Vec<f64> = vec![];
        let mse = mean_squared_error::<f64>(y.into_iter(), y_fit.into_iter());
        assert!(mse.is_nan());
    }

    #[test]
    fn rmse_is_root_of_mse() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let y_fit = vec![1.5, 2.0, 2.0, 4.5];
        let mse = mean_squared_error::<f64>(y.iter().copied(), y_fit.iter().copied());
        let rmse = root_mean_squared_error::<f64>(y.into_iter(), y_fit.into_iter());
        assert!((rmse - mse.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn effective_parameters_charges_knots() {
        assert_eq!(effective_parameters::<f64>(1, 3.0), 1.0);
        assert_eq!(effective_parameters::<f64>(3, 3.0), 6.0);
        assert_eq!(effective_parameters::<f64>(3, 0.0), 3.0);
    }

    #[test]
    fn gcv_edge_cases() {
        assert_eq!(gcv::<f64>(0.0, 2.0, 2), 0.0);
        assert!(gcv::<f64>(1.0, 4.0, 4).is_infinite());

        // (1 - 2/4)² = 0.25
        assert!((gcv::<f64>(1.0, 2.0, 4) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn gcv_prefers_smaller_models_at_equal_error() {
        let small = gcv::<f64>(1.0, effective_parameters(2, 3.0), 50);
        let large = gcv::<f64>(1.0, effective_parameters(6, 3.0), 50);
        assert!(small < large);
    }
}
