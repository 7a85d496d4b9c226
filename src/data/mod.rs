//! Data module - sample table loading and the columnar series model

mod loader;
mod series;

pub use loader::{DataLoader, LoaderError};
pub use series::{OrderSeries, Sample, SeriesError, SeriesSet, SeriesSetBuilder};
