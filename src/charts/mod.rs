//! Charts module - figure composition and static rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, ChartStyle, Curve, Figure, Panel, PALETTE};
pub use renderer::{OutputFormat, OutputOptions, RenderError, StaticChartRenderer};
