//! Assertions for testing fitted models.
//!
//! ### [`crate::assert_close`]
//! Asserts that two floating-point values are approximately equal within a tolerance.
//! - `assert_eq!` equivalent for floats.
//! - Defaults to [`DEFAULT_TOLERANCE`], scaled up for large values.
//!
//! ### [`crate::assert_all_close`]
//! Element-wise [`crate::assert_close`] for anything with `len()` and `iter()`.
//!
//! ### [`crate::assert_rmse`]
//! Asserts that a model's training RMSE is below a threshold.
//! Useful as a coarse check that the engine actually fit the data.

/// Tolerance used by [`crate::assert_close`] when none is given
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Returns true if `a` and `b` differ by at most `tolerance`, relative to their magnitude once it exceeds 1
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_close(a: f64, b: f64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }

    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tolerance * scale
}

/// Asserts that two floating-point values are approximately equal.
///
/// ```
/// # use earthfit::assert_close;
/// assert_close!(0.1 + 0.2, 0.3);
/// assert_close!(1.0, 1.05, 0.1);
/// assert_close!(2.0, 2.0, 1e-12, "custom message for {}", "x0");
/// ```
#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr $(,)?) => {
        $crate::assert_close!($a, $b, $crate::test::DEFAULT_TOLERANCE)
    };

    ($a:expr, $b:expr, $tol:expr $(, $msg:literal $(, $args:expr)* )?) => {{
        #[allow(unused_mut, unused_assignments)] let mut msg = "Values not close".to_string();
        $( msg = format!($msg $(, $args)*); )?

        let (a, b): (f64, f64) = ($a, $b);
        assert!(
            $crate::test::is_close(a, b, $tol),
            "{msg}: {a} != {b}"
        );
    }};
}

/// Asserts that two sequences of floating-point values are approximately equal element-wise.
///
/// ```
/// # use earthfit::assert_all_close;
/// let a = vec![1.0, 2.0, 3.0];
/// let b = vec![1.0 + 1e-16, 2.0, 3.0];
///
/// assert_all_close!(a, b);
/// ```
#[macro_export]
macro_rules! assert_all_close {
    ($src:expr, $dst:expr $(,)?) => {
        $crate::assert_all_close!($src, $dst, $crate::test::DEFAULT_TOLERANCE)
    };

    ($src:expr, $dst:expr, $tol:expr) => {{
        let (src, dst) = (&$src, &$dst);
        assert_eq!(src.len(), dst.len(), "length mismatch");

        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            $crate::assert_close!(*s, *d, $tol, "src[{}]", i);
        }
    }};
}

/// Asserts that a model's RMSE is at most the given threshold.
///
/// ```
/// # use earthfit::{assert_rmse, Model, basis::Basis, nalgebra::DMatrix};
/// let model = Model::new(Basis::intercept(), DMatrix::from_element(1, 1, 2.0), 1, 0.01).unwrap();
/// assert_rmse!(model, 0.2);
/// ```
#[macro_export]
macro_rules! assert_rmse {
    ($model:expr, $threshold:expr) => {{
        let rmse = $model.rmse();
        let threshold: f64 = $threshold;
        assert!(
            rmse <= threshold && rmse.is_finite(),
            "Model RMSE {rmse} exceeds {threshold}"
        );
    }};
}

/// Synthetic training data
#[cfg(test)]
pub(crate) mod data {
    use nalgebra::DMatrix;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    /// Samples `f` on `0..n` evenly spaced points of `[start, end]`, with optional gaussian noise.
    ///
    /// Returns single-column `(x, y)` matrices. The seed is fixed so tests are repeatable.
    pub fn sample_1d(
        f: impl Fn(f64) -> f64,
        start: f64,
        end: f64,
        n: usize,
        noise: Option<f64>,
    ) -> (DMatrix<f64>, DMatrix<f64>) {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let step = (end - start) / (n - 1) as f64;

        let xs: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| {
                let y = f(x);
                match noise {
                    Some(sd) => {
                        let normal = Normal::new(0.0, sd).expect("valid standard deviation");
                        y + normal.sample(&mut rng)
                    }
                    None => y,
                }
            })
            .collect();

        (
            DMatrix::from_column_slice(n, 1, &xs),
            DMatrix::from_column_slice(n, 1, &ys),
        )
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_close_macro() {
        assert_close!(1.0 + 1e-16, 1.0);
        assert_close!(1e6 + 1e-4, 1e6, 1e-9, "large values scale the tolerance");
    }

    #[test]
    #[should_panic(expected = "Values not close")]
    fn test_assert_close_fails() {
        assert_close!(1.0, 1.1);
    }

    #[test]
    fn test_assert_all_close_macro() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0 + 1e-16, 2.0, 3.0];
        assert_all_close!(a, b);
    }

    #[test]
    fn test_sample_1d_is_repeatable() {
        let (x1, y1) = super::data::sample_1d(|x| 2.0 * x, 0.0, 1.0, 5, Some(0.1));
        let (x2, y2) = super::data::sample_1d(|x| 2.0 * x, 0.0, 1.0, 5, Some(0.1));
        assert_eq!(x1, x2);
        assert_eq!(y1, y2);
        assert_eq!(x1[(4, 0)], 1.0);
    }
}
