use std::{ops::Range, path::PathBuf};

use crate::plotting::PlottingElement;

pub mod plotters;

/// Everything a backend needs to draw one plot
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    /// Where the image goes
    pub path: PathBuf,

    /// Caption
    pub title: String,

    /// Image size in pixels
    pub size: (u32, u32),

    /// Visible x values
    pub x_range: Range<f64>,

    /// Visible y values
    pub y_range: Range<f64>,

    /// Series, in drawing order
    pub elements: Vec<PlottingElement>,
}

/// Trait for plot backends
pub trait PlotBackend {
    /// Error type for the plot backend
    type Error: std::error::Error;

    /// Draws the plot
    ///
    /// # Errors
    /// Returns an error if the plot cannot be drawn or written.
    fn render(&mut self, plot: &Plot) -> Result<(), Self::Error>;
}
