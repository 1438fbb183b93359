//! Delimited numeric text to and from matrices
//!
//! Matrices are passed on the command line as a single string: rows are
//! separated by `;` and values within a row by `,`, e.g. `"1,2;2,4;3,6"`.
use nalgebra::DMatrix;

use crate::error::{FitError, ParseError};

/// Characters separating rows and values in delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Separates rows (observations)
    pub row: char,

    /// Separates values within a row
    pub value: char,
}
impl Default for Delimiters {
    fn default() -> Self {
        Self {
            row: ';',
            value: ',',
        }
    }
}

/// Parses delimited text into a matrix with one row per observation.
///
/// Whitespace around tokens is ignored. Rows must all have the same number of
/// values; ragged input is rejected rather than padded.
///
/// # Errors
/// - [`ParseError::Empty`] if the text holds no rows
/// - [`ParseError::InvalidNumber`] if a token is not a finite floating point number
/// - [`ParseError::RaggedRow`] if rows differ in length
///
/// # Example
/// ```
/// # use earthfit::parse::{parse_matrix, Delimiters};
/// let x = parse_matrix("1,2;2,4;3,6", &Delimiters::default()).unwrap();
/// assert_eq!(x.shape(), (3, 2));
/// assert_eq!(x[(2, 1)], 6.0);
/// ```
pub fn parse_matrix(text: &str, delimiters: &Delimiters) -> Result<DMatrix<f64>, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (row, line) in text.split(delimiters.row).enumerate() {
        let values = line
            .split(delimiters.value)
            .enumerate()
            .map(|(column, token)| {
                let token = token.trim();
                match token.parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    _ => Err(ParseError::InvalidNumber {
                        row,
                        column,
                        token: token.to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(first) = rows.first() {
            if first.len() != values.len() {
                return Err(ParseError::RaggedRow {
                    row,
                    expected: first.len(),
                    found: values.len(),
                });
            }
        }
        rows.push(values);
    }

    let ncols = rows[0].len();
    Ok(DMatrix::from_row_iterator(
        rows.len(),
        ncols,
        rows.into_iter().flatten(),
    ))
}

/// Formats a matrix as delimited text; the inverse of [`parse_matrix`].
///
/// Values use Rust's shortest round-trip float formatting, so parsing the
/// result gives back the same matrix.
///
/// ```
/// # use earthfit::parse::{format_matrix, Delimiters};
/// # use earthfit::nalgebra::DMatrix;
/// let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.5, -3.0, 4.0]);
/// assert_eq!(format_matrix(&m, &Delimiters::default()), "1,2.5;-3,4");
/// ```
#[must_use]
pub fn format_matrix(matrix: &DMatrix<f64>, delimiters: &Delimiters) -> String {
    matrix
        .row_iter()
        .map(|row| {
            row.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(&delimiters.value.to_string())
        })
        .collect::<Vec<_>>()
        .join(&delimiters.row.to_string())
}

/// Checks that a sample matrix and a target matrix can be trained together.
///
/// # Errors
/// - [`FitError::NoData`] if either matrix has no rows or no columns
/// - [`FitError::RowMismatch`] if the row counts differ
/// - [`FitError::NonFinite`] if any value is NaN or infinite
pub fn check_training_shapes(x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<(), FitError> {
    if x.nrows() == 0 || x.ncols() == 0 || y.ncols() == 0 {
        return Err(FitError::NoData);
    }

    if x.nrows() != y.nrows() {
        return Err(FitError::RowMismatch {
            samples: x.nrows(),
            targets: y.nrows(),
        });
    }

    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_features() {
        let x = parse_matrix("1,2;2,4;3,6", &Delimiters::default()).unwrap();
        assert_eq!(x.shape(), (3, 2));
        assert_eq!(x.row(1).iter().copied().collect::<Vec<_>>(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_parse_single_column() {
        let y = parse_matrix("2;4;6", &Delimiters::default()).unwrap();
        assert_eq!(y.shape(), (3, 1));
        assert_eq!(y[(2, 0)], 6.0);
    }

    #[test]
    fn test_parse_whitespace_and_exponents() {
        let x = parse_matrix(" 1e-3 , -2.5 ; 4 ,5E2 ", &Delimiters::default()).unwrap();
        assert_eq!(x[(0, 0)], 0.001);
        assert_eq!(x[(1, 1)], 500.0);
    }

    #[test]
    fn test_parse_custom_delimiters() {
        let delimiters = Delimiters {
            row: '\n',
            value: '\t',
        };
        let x = parse_matrix("1\t2\n3\t4", &delimiters).unwrap();
        assert_eq!(x.shape(), (2, 2));
    }

    #[test]
    fn test_parse_errors() {
        let d = Delimiters::default();
        assert_eq!(parse_matrix("   ", &d), Err(ParseError::Empty));
        assert_eq!(
            parse_matrix("1,2;3,abc", &d),
            Err(ParseError::InvalidNumber {
                row: 1,
                column: 1,
                token: "abc".to_string()
            })
        );
        assert_eq!(
            parse_matrix("1,2;3", &d),
            Err(ParseError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            parse_matrix("1;;2", &d),
            Err(ParseError::InvalidNumber { row: 1, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_finite_tokens() {
        let d = Delimiters::default();
        for token in ["nan", "inf", "-infinity", "NaN"] {
            assert_eq!(
                parse_matrix(&format!("1,{token}"), &d),
                Err(ParseError::InvalidNumber {
                    row: 0,
                    column: 1,
                    token: token.to_string()
                })
            );
        }
        assert_eq!(parse_matrix("1e308", &d).unwrap()[(0, 0)], 1e308);
    }

    #[test]
    fn test_format_then_parse() {
        let m = DMatrix::from_row_slice(2, 3, &[0.1, 1.0 / 3.0, -7.25, 1e-12, 2.0, 3.5]);
        let text = format_matrix(&m, &Delimiters::default());
        assert_eq!(parse_matrix(&text, &Delimiters::default()).unwrap(), m);
    }

    #[test]
    fn test_check_training_shapes() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        assert_eq!(
            check_training_shapes(&x, &y),
            Err(FitError::RowMismatch {
                samples: 3,
                targets: 2
            })
        );

        let y = DMatrix::from_row_slice(3, 1, &[1.0, f64::NAN, 3.0]);
        assert_eq!(check_training_shapes(&x, &y), Err(FitError::NonFinite));

        let y = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        assert_eq!(check_training_shapes(&x, &y), Ok(()));
    }
}
