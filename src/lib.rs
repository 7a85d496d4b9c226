//! Legendre Plot - function vs. derivative charts from sampled data
//!
//! A one-shot pipeline over a precomputed sample table:
//!
//! ```text
//!   legendre.csv ──► DataLoader ──► SeriesSet ──► ChartPlotter ──► Figure
//!                                                                    │
//!                  FigureViewer (optional, blocking) ◄── PNG ◄── StaticChartRenderer
//! ```
//!
//! Each stage only consumes the immutable output of the previous one.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;

use charts::{ChartPlotter, RenderError, StaticChartRenderer};
use config::{ConfigError, PlotConfig};
use data::{DataLoader, LoaderError};
use gui::{FigureViewer, ViewerError};
use log::info;
use std::path::PathBuf;
use thiserror::Error;

/// Any failure of the pipeline, wrapping the stage that produced it.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Display(#[from] ViewerError),
}

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing/unreadable input or unwritable output location
    Io,
    /// Malformed input content
    Format,
    /// Drawing or encoding failure
    Render,
    /// The optional viewer failed
    Display,
    /// Invalid configuration
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Load(e) if e.is_io() => ErrorKind::Io,
            Error::Load(_) => ErrorKind::Format,
            Error::Render(e) if e.is_io() => ErrorKind::Io,
            Error::Render(_) => ErrorKind::Render,
            Error::Display(_) => ErrorKind::Display,
        }
    }
}

/// Load, compose, write, then hand the written file to `viewer`.
///
/// Returns the path of the written figure. Nothing is written if loading fails.
pub fn run(config: &PlotConfig, viewer: &dyn FigureViewer) -> Result<PathBuf, Error> {
    config.validate()?;

    let series = DataLoader::load(&config.input, config.orders)?;
    let figure = ChartPlotter::compose(&series, &config.chart_style());
    let path = StaticChartRenderer::write(&figure, &config.output_options())?;

    viewer.show(&path)?;
    info!("Done");
    Ok(path)
}
