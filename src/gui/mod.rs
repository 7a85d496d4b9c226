//! GUI module - optional display of the written figure

mod chart_viewer;
mod viewer;

pub use chart_viewer::ChartViewer;
pub use viewer::{viewer_for, FigureViewer, NoopViewer, SystemViewer, ViewerError, WindowViewer};
