//! Legendre Plot - renders polynomial values and derivatives side by side
//!
//! Reads the sample table produced by the upstream evaluator and writes
//! `legendre_polynomials.png` next to it.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use legendre_plot::config::{DisplayMode, PlotConfig};
use legendre_plot::gui::viewer_for;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plot sampled Legendre polynomials and their derivatives", long_about = None)]
struct Cli {
    /// Sample table (header row + `x, P0, P0', ..., P{K-1}, P{K-1}'` rows)
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Directory for the figure (defaults to the input's directory)
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Figure file name; the extension picks the format (png, jpg, bmp, svg)
    #[arg(long)]
    output_name: Option<String>,

    /// Number of polynomial orders per row
    #[arg(short = 'k', long)]
    orders: Option<usize>,

    /// Output resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// Lower bound of the horizontal axis
    #[arg(long, allow_hyphen_values = true)]
    domain_min: Option<f64>,

    /// Upper bound of the horizontal axis
    #[arg(long, allow_hyphen_values = true)]
    domain_max: Option<f64>,

    /// JSON config file; flags override its values
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// How to show the figure once written
    #[arg(long, value_enum)]
    display: Option<DisplayMode>,

    /// Do not show the figure (same as `--display none`)
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "display")]
    no_show: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<PlotConfig> {
        let mut config = match &self.config {
            Some(path) => PlotConfig::from_file(path)?,
            None => PlotConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = Some(dir);
        }
        if let Some(name) = self.output_name {
            config.output_name = name;
        }
        if let Some(orders) = self.orders {
            config.orders = orders;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(min) = self.domain_min {
            config.domain[0] = min;
        }
        if let Some(max) = self.domain_max {
            config.domain[1] = max;
        }
        if let Some(display) = self.display {
            config.display = display;
        }
        if self.no_show {
            config.display = DisplayMode::None;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = cli.into_config()?;
    let viewer = viewer_for(config.display);

    legendre_plot::run(&config, viewer.as_ref())
        .with_context(|| format!("Failed to plot {}", config.input.display()))?;

    Ok(())
}
