use std::io::Write;

use clap::{Parser, ValueEnum};
use earthfit::{
    basis::VariableLabels,
    display::render_flat,
    engine::{Earth, RegressionEngine},
    export::{export_code, CodeOptions, Report, VariableStyle},
    formula::assemble,
    nalgebra::DMatrix,
    parse::{parse_matrix, Delimiters},
    Model,
};

#[derive(Parser, Debug)]
#[command(name = "earthfit")]
#[command(about = "Fit an Earth (MARS) model and print it as a formula", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Samples, rows separated by `;` and values by `,` (e.g. "1,2;2,4;3,6")
    x: String,

    /// Targets, in the same layout as the samples
    y: String,

    /// Name of a diagnostic plot to write; single-feature data only
    plot: Option<String>,

    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Flat)]
    format: Format,

    /// Maximum number of factors in one basis function
    #[arg(short = 'd', long = "max-degree", default_value_t = 3)]
    max_degree: usize,

    /// Write variables as `x[i]` instead of `x0`, `x1`, ...
    #[arg(long = "indexed")]
    indexed: bool,

    /// Directory the plot is written to
    #[arg(long = "plot-dir", default_value = "plots")]
    plot_dir: std::path::PathBuf,

    /// Names for the feature columns, in order
    #[arg(long = "labels", value_delimiter = ',')]
    labels: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `basis*[coefficients]` terms joined by `+`
    Flat,
    /// A single numeric expression, followed by the RMSE
    Code,
    /// Formula terms, code and RMSE as one JSON document
    Json,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> earthfit::Result<()> {
    let cli = Cli::parse();

    let delimiters = Delimiters::default();
    let x = parse_matrix(&cli.x, &delimiters)?;
    let y = parse_matrix(&cli.y, &delimiters)?;
    log::debug!(
        "Parsed {} observations of {} features and {} outputs",
        x.nrows(),
        x.ncols(),
        y.ncols()
    );

    let mut engine = Earth::default().with_max_degree(cli.max_degree);
    if !cli.labels.is_empty() {
        engine = engine.with_labels(VariableLabels::new(cli.labels.clone()));
    }
    let model = engine.fit(&x, &y)?;

    let options = CodeOptions {
        variable_style: if cli.indexed {
            VariableStyle::Indexed
        } else {
            VariableStyle::Named
        },
    };

    write_output(&mut std::io::stdout().lock(), &model, cli.format, &options)?;

    if let Some(name) = cli.plot {
        plot(&model, &x, &y, name, cli.plot_dir)?;
    }

    Ok(())
}

/// Writes the model in the requested format.
///
/// Code output is two lines: the expression, then the bare RMSE value.
fn write_output(
    out: &mut impl Write,
    model: &Model,
    format: Format,
    options: &CodeOptions,
) -> earthfit::Result<()> {
    match format {
        Format::Flat => writeln!(out, "{}", render_flat(&assemble(model)))?,
        Format::Code => {
            let export = export_code(model, options)?;
            writeln!(out, "{}", export.code)?;
            writeln!(out, "{}", export.rmse)?;
        }
        Format::Json => writeln!(out, "{}", Report::new(model, options)?.to_json()?)?,
    }
    Ok(())
}

#[cfg(feature = "plotting")]
fn plot(
    model: &Model,
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
    name: String,
    directory: std::path::PathBuf,
) -> earthfit::Result<()> {
    use earthfit::plotting::{plot_model, plotters::Backend, PlotOptions};

    let options = PlotOptions {
        directory,
        name,
        ..PlotOptions::default()
    };
    let path = plot_model(&mut Backend, model, x, y, &options)?;
    log::info!("Plot written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "plotting"))]
fn plot(
    _: &Model,
    _: &DMatrix<f64>,
    _: &DMatrix<f64>,
    name: String,
    _: std::path::PathBuf,
) -> earthfit::Result<()> {
    log::warn!("Built without the `plotting` feature, skipping plot `{name}`");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_model() -> Model {
        let x = parse_matrix("1,2;2,4;3,6", &Delimiters::default()).unwrap();
        let y = parse_matrix("2;4;6", &Delimiters::default()).unwrap();
        Earth::default().with_max_degree(3).fit(&x, &y).unwrap()
    }

    fn output(model: &Model, format: Format, options: &CodeOptions) -> String {
        let mut out = Vec::new();
        write_output(&mut out, model, format, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_code_output_ends_with_bare_rmse() {
        let model = scenario_model();
        let text = output(&model, Format::Code, &CodeOptions::default());

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("*x0"));

        let rmse: f64 = lines[1].parse().unwrap();
        assert_eq!(rmse, model.rmse());
        assert!(rmse < 1e-9);
    }

    #[test]
    fn test_flat_output_is_one_line() {
        let model = scenario_model();
        let text = output(&model, Format::Flat, &CodeOptions::default());
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("1.0*["));
        assert!(text.contains("+x0*["));
    }

    #[test]
    fn test_json_output_parses() {
        let model = scenario_model();
        let options = CodeOptions {
            variable_style: VariableStyle::Indexed,
        };
        let text = output(&model, Format::Json, &options);

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["code"].as_str().unwrap().contains("x[0]"));
        let rmse = json["rmse"].as_f64().unwrap();
        assert!((rmse - model.rmse()).abs() < 1e-12);
    }

    #[test]
    fn test_export_errors_are_reported() {
        let model = scenario_model().with_labels(VariableLabels::new(vec!["not valid".into()]));
        let mut out = Vec::new();
        let result = write_output(&mut out, &model, Format::Code, &CodeOptions::default());
        assert!(matches!(result, Err(earthfit::Error::Export(_))));
        assert!(out.is_empty());
    }
}
