//! Plotting backend using the `plotters` crate
//!
//! Uses the bitmap backend to create PNG files. Text is drawn with the
//! system's sans-serif font.
use plotters::prelude::*;

use crate::plotting::{Plot, PlotBackend, PlottingElement};

const MAX_LBL_WIDTH: usize = 120;

const PALETTE: [RGBColor; 6] = [RED, BLUE, GREEN, MAGENTA, CYAN, BLACK];

/// Plotters backend writing PNG files
#[derive(Debug, Clone, Copy, Default)]
pub struct Backend;

impl PlotBackend for Backend {
    type Error = Error;

    fn render(&mut self, plot: &Plot) -> Result<(), Self::Error> {
        let root = BitMapBackend::new(&plot.path, plot.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let mut context = ChartBuilder::on(&root)
            .caption(&plot.title, (FontFamily::SansSerif, 16).into_font())
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(plot.x_range.clone(), plot.y_range.clone())
            .map_err(draw_error)?;

        context
            .configure_mesh()
            .label_style((FontFamily::SansSerif, 12))
            .draw()
            .map_err(draw_error)?;

        for (i, element) in plot.elements.iter().enumerate() {
            // Data and curve of one output share a color
            let color = PALETTE[(i / 2) % PALETTE.len()];
            let label = shorten(element.label());

            match element {
                PlottingElement::Data { points, .. } => {
                    let style = color.filled();
                    context
                        .draw_series(points.iter().map(|&p| Circle::new(p, 3, style)))
                        .map_err(draw_error)?
                        .label(label)
                        .legend(move |(x, y)| Circle::new((x + 10, y), 3, style));
                }

                PlottingElement::Curve { points, .. } => {
                    let style = ShapeStyle::from(color).stroke_width(2);
                    context
                        .draw_series(LineSeries::new(points.iter().copied(), style))
                        .map_err(draw_error)?
                        .label(label)
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
            }
        }

        context
            .configure_series_labels()
            .label_font((FontFamily::SansSerif, 10))
            .background_style(WHITE.mix(0.5))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()
            .map_err(draw_error)?;

        root.present().map_err(draw_error)?;
        Ok(())
    }
}

/// Shorten label and add [...] if too long
fn shorten(label: &str) -> String {
    if label.len() > MAX_LBL_WIDTH {
        let mut s: String = label.chars().take(MAX_LBL_WIDTH - 3).collect();
        s.push_str("...");
        s
    } else {
        label.to_string()
    }
}

fn draw_error(e: impl std::error::Error) -> Error {
    Error::Draw(e.to_string())
}

/// Error occurring during plotting
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error drawing the plot
    #[error("{0}")]
    Draw(String),
}
