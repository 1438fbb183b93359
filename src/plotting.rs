//! Diagnostic plots for single-feature models
//!
//! [`plot_model`] draws the training data of every output as a scatter series,
//! with the model's prediction over the data's range as a curve on top.
//!
//! Drawing goes through a [`PlotBackend`]; [`plotters::Backend`] writes a PNG
//! file. Any other backend (a recording one in tests, for example) can be
//! passed instead.
use std::path::PathBuf;

use nalgebra::DMatrix;

use crate::{
    error::PlotError,
    value::{min_max, CoordExt, SampleGrid},
    Model,
};

mod backend;
pub use backend::*;

mod element;
pub use element::*;

/// Number of steps the curve takes across the range of the data
pub const GRID_STEPS: usize = 100;

/// Options for plotting
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    /// Directory the image is written to; created when absent
    pub directory: PathBuf,

    /// File name of the image, without extension
    pub name: String,

    /// Size of the output image in pixels
    pub size: (u32, u32),

    /// Caption for the plot
    pub title: String,
}
impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("plots"),
            name: "earth".to_string(),
            size: (640, 480),
            title: "Earth model".to_string(),
        }
    }
}
impl PlotOptions {
    /// Location of the image: `<directory>/<name>.png`
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(format!("{}.png", self.name))
    }
}

/// Describes the diagnostic plot of a model without drawing it.
///
/// # Errors
/// - [`PlotError::NotUnivariate`] if `x` does not have exactly one column
/// - [`PlotError::InvalidRange`] if the feature column does not span a range
pub fn build_plot(
    model: &Model,
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
    options: &PlotOptions,
) -> Result<Plot, PlotError> {
    if x.ncols() != 1 {
        return Err(PlotError::NotUnivariate(x.ncols()));
    }

    let x_range = min_max(x.column(0).iter().copied()).unwrap_or(0.0..0.0);
    let span = x_range.end - x_range.start;
    if !span.is_finite() || span <= 0.0 {
        return Err(PlotError::InvalidRange {
            min: x_range.start,
            max: x_range.end,
        });
    }

    let grid: Vec<f64> = SampleGrid::spanning(x_range.start, x_range.end, GRID_STEPS).collect();
    let predictions = model.predict_matrix(&DMatrix::from_column_slice(grid.len(), 1, &grid));

    let mut elements = Vec::with_capacity(2 * y.ncols());
    for output in 0..y.ncols() {
        let (data_label, curve_label) = if y.ncols() == 1 {
            ("data".to_string(), "model".to_string())
        } else {
            (format!("y{output}"), format!("model y{output}"))
        };

        elements.push(PlottingElement::from_columns(
            x.column(0).iter().copied(),
            y.column(output).iter().copied(),
            data_label,
        ));

        if output < predictions.ncols() {
            elements.push(PlottingElement::Curve {
                points: grid
                    .iter()
                    .copied()
                    .zip(predictions.column(output).iter().copied())
                    .collect(),
                label: curve_label,
            });
        }
    }

    let all_points: Vec<(f64, f64)> = elements.iter().flat_map(|e| e.points().iter().copied()).collect();
    let y_range = padded(all_points.y_range().unwrap_or(0.0..0.0));

    Ok(Plot {
        path: options.path(),
        title: options.title.clone(),
        size: options.size,
        x_range,
        y_range,
        elements,
    })
}

/// Draws the diagnostic plot of a model, returning where the image was written.
///
/// # Errors
/// Fails as [`build_plot`] does, if the output directory cannot be created, or
/// with [`PlotError::Backend`] if the backend fails to draw.
pub fn plot_model<B: PlotBackend>(
    backend: &mut B,
    model: &Model,
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
    options: &PlotOptions,
) -> Result<PathBuf, PlotError> {
    let plot = build_plot(model, x, y, options)?;

    if !options.directory.exists() {
        log::debug!("Creating plot directory {}", options.directory.display());
        std::fs::create_dir_all(&options.directory)?;
    }

    backend
        .render(&plot)
        .map_err(|e| PlotError::Backend(e.to_string()))?;

    log::info!("Wrote plot to {}", plot.path.display());
    Ok(plot.path)
}

/// Widens a range by 5% on each side, or by 1 if it is empty
fn padded(range: std::ops::Range<f64>) -> std::ops::Range<f64> {
    let span = range.end - range.start;
    let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
    (range.start - pad)..(range.end + pad)
}
