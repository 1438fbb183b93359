/// Elements that can be plotted
#[derive(Debug, Clone, PartialEq)]
pub enum PlottingElement {
    /// Observed points, drawn as a scatter series
    Data {
        /// `(x, y)` pairs
        points: Vec<(f64, f64)>,

        /// Legend entry
        label: String,
    },

    /// A sampled function, drawn as a line
    Curve {
        /// `(x, y)` pairs in increasing `x`
        points: Vec<(f64, f64)>,

        /// Legend entry
        label: String,
    },
}
impl PlottingElement {
    /// Creates a scatter element by pairing up two columns of values
    pub fn from_columns(
        x: impl Iterator<Item = f64>,
        y: impl Iterator<Item = f64>,
        label: String,
    ) -> Self {
        Self::Data {
            points: x.zip(y).collect(),
            label,
        }
    }

    /// The points of the element
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        match self {
            Self::Data { points, .. } | Self::Curve { points, .. } => points,
        }
    }

    /// The legend entry of the element
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Data { label, .. } | Self::Curve { label, .. } => label,
        }
    }
}
