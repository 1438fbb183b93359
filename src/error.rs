//! Error types for fitting and exporting Earth models
//!
//! Every stage of the pipeline has its own error enum; they are collected in
//! [`Error`], along with a convenient `Result` alias.

/// Errors that can occur anywhere in the parse → fit → export → plot pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The delimited input could not be turned into a matrix.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The regression engine could not produce a model.
    #[error(transparent)]
    Fit(#[from] FitError),

    /// The model could not be rendered as portable code.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The diagnostic plot could not be produced.
    #[error(transparent)]
    Plot(#[from] PlotError),

    /// The results could not be written out.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while parsing delimited numeric text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Nothing to parse.
    #[error("Input contains no rows")]
    Empty,

    /// A token could not be read as a finite floating point number.
    #[error("Invalid number `{token}` at row {row}, column {column}")]
    InvalidNumber {
        /// Zero-based row index
        row: usize,
        /// Zero-based column index
        column: usize,
        /// The offending text
        token: String,
    },

    /// A row does not have the same number of values as the first row.
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        /// Zero-based row index
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        found: usize,
    },
}

/// Errors produced by a regression engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Cannot fit a model because there is no data.
    #[error("No data available for fitting")]
    NoData,

    /// Sample and target matrices disagree on the number of observations.
    #[error("Sample matrix has {samples} rows but target matrix has {targets}")]
    RowMismatch {
        /// Rows in the sample matrix
        samples: usize,
        /// Rows in the target matrix
        targets: usize,
    },

    /// The training data contains NaN or infinite values.
    #[error("Training data contains non-finite values")]
    NonFinite,

    /// The requested interaction degree is unusable.
    #[error("Maximum interaction degree must be at least 1")]
    InvalidDegree,

    /// Failed to solve the least squares system during fitting.
    ///
    /// Contains a static string describing the solver error.
    #[error("Failed to solve: {0}")]
    Algebra(&'static str),

    /// The model parts handed to [`crate::Model::new`] do not agree on their shapes.
    #[error("Coefficient matrix is {rows}x{cols}, expected {outputs}x{basis} (outputs x basis functions)")]
    ShapeMismatch {
        /// Rows of the given coefficient matrix
        rows: usize,
        /// Columns of the given coefficient matrix
        cols: usize,
        /// Expected number of outputs
        outputs: usize,
        /// Number of basis functions
        basis: usize,
    },
}

/// Errors produced while rendering a model as portable numeric code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    /// A coefficient or knot has no finite literal representation.
    #[error("Basis function `{basis}` has a non-finite value and cannot be exported")]
    NonFinite {
        /// Canonical text of the offending basis function
        basis: String,
    },

    /// A variable label cannot be used as an identifier in the target grammar.
    #[error("Variable label `{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    /// The report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(String),
}

/// Errors produced by the diagnostic plotter.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// The sample matrix does not have exactly one feature column.
    #[error("Diagnostic plots need exactly one feature column, found {0}")]
    NotUnivariate(usize),

    /// The feature column does not span a usable range.
    #[error("Cannot sample the range {min}..{max}")]
    InvalidRange {
        /// Smallest feature value
        min: f64,
        /// Largest feature value
        max: f64,
    },

    /// The output location could not be prepared.
    #[error("Failed to create plot directory: {0}")]
    Io(#[from] std::io::Error),

    /// The drawing backend failed.
    #[error("Error drawing plot: {0}")]
    Backend(String),
}

/// Result type for earthfit
pub type Result<T> = std::result::Result<T, Error>;
