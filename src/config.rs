//! Run configuration: defaults, optional JSON file, validation.
//!
//! Precedence is defaults < config file < command line flags; the binary
//! applies the flags on top of whatever [`PlotConfig::from_file`] returns.

use crate::charts::{ChartStyle, OutputOptions};
use crate::data::SeriesSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INPUT: &str = "build/legendre.csv";
pub const DEFAULT_OUTPUT_NAME: &str = "legendre_polynomials.png";
pub const DEFAULT_ORDERS: usize = 6;
pub const DEFAULT_DPI: u32 = 300;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How (and whether) the written figure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Do not show anything
    None,
    /// Blocking native window
    #[default]
    Window,
    /// Platform default image viewer
    System,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub input: PathBuf,
    /// Defaults to the input file's directory
    pub output_dir: Option<PathBuf>,
    pub output_name: String,
    pub orders: usize,
    pub dpi: u32,
    /// Horizontal axis bounds `[min, max]`
    pub domain: [f64; 2],
    /// Figure size in inches `[width, height]`
    pub figure_size: [f64; 2],
    /// Curve width in points
    pub line_width: f64,
    pub display: DisplayMode,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: None,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            orders: DEFAULT_ORDERS,
            dpi: DEFAULT_DPI,
            domain: [-1.0, 1.0],
            figure_size: [12.0, 9.0],
            line_width: 2.5,
            display: DisplayMode::Window,
        }
    }
}

impl PlotConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        };

        if SeriesSet::field_count(self.orders).is_none() {
            return Err(invalid(
                "orders",
                &format!("must be at most {}", SeriesSet::MAX_ORDERS),
            ));
        }
        if self.dpi == 0 {
            return Err(invalid("dpi", "must be positive"));
        }
        let [min, max] = self.domain;
        if !(min.is_finite() && max.is_finite() && min < max && (max - min).is_finite()) {
            return Err(invalid("domain", "needs finite bounds with min < max"));
        }
        if !self.figure_size.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(invalid("figure_size", "dimensions must be positive"));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(invalid("line_width", "must be positive"));
        }
        if self.output_name.trim().is_empty() {
            return Err(invalid("output_name", "must not be empty"));
        }
        Ok(())
    }

    /// Directory the figure is written to.
    pub fn output_directory(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => match self.input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            directory: self.output_directory(),
            file_name: self.output_name.clone(),
            dpi: self.dpi,
        }
    }

    pub fn chart_style(&self) -> ChartStyle {
        ChartStyle {
            domain: self.domain[0]..self.domain[1],
            figure_size: (self.figure_size[0], self.figure_size[1]),
            line_width: self.line_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_original_behaviour() {
        let config = PlotConfig::default();
        assert_eq!(config.input, PathBuf::from("build/legendre.csv"));
        assert_eq!(config.orders, 6);
        assert_eq!(config.dpi, 300);
        assert_eq!(config.display, DisplayMode::Window);
        assert_eq!(
            config.output_options().path(),
            PathBuf::from("build/legendre_polynomials.png")
        );
        assert_eq!(config.chart_style(), ChartStyle::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_output_directory() {
        let mut config = PlotConfig {
            input: PathBuf::from("legendre.csv"),
            ..PlotConfig::default()
        };
        assert_eq!(config.output_directory(), PathBuf::from("."));

        config.output_dir = Some(PathBuf::from("/tmp/plots"));
        assert_eq!(config.output_directory(), PathBuf::from("/tmp/plots"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"orders": 4, "dpi": 150, "display": "none"}}"#).unwrap();

        let config = PlotConfig::from_file(file.path()).unwrap();
        assert_eq!(config.orders, 4);
        assert_eq!(config.dpi, 150);
        assert_eq!(config.display, DisplayMode::None);
        assert_eq!(config.output_name, DEFAULT_OUTPUT_NAME);
        assert_eq!(config.domain, [-1.0, 1.0]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"colour": "red"}}"#).unwrap();
        assert!(matches!(
            PlotConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let bad = |config: PlotConfig| config.validate().unwrap_err();

        assert!(matches!(
            bad(PlotConfig { dpi: 0, ..PlotConfig::default() }),
            ConfigError::Invalid { field: "dpi", .. }
        ));
        assert!(matches!(
            bad(PlotConfig { domain: [1.0, -1.0], ..PlotConfig::default() }),
            ConfigError::Invalid { field: "domain", .. }
        ));
        assert!(matches!(
            bad(PlotConfig { domain: [-1e308, 1e308], ..PlotConfig::default() }),
            ConfigError::Invalid { field: "domain", .. }
        ));
        assert!(matches!(
            bad(PlotConfig { orders: usize::MAX, ..PlotConfig::default() }),
            ConfigError::Invalid { field: "orders", .. }
        ));
        assert!(matches!(
            bad(PlotConfig { orders: SeriesSet::MAX_ORDERS + 1, ..PlotConfig::default() }),
            ConfigError::Invalid { field: "orders", .. }
        ));
        PlotConfig { orders: SeriesSet::MAX_ORDERS, ..PlotConfig::default() }
            .validate()
            .unwrap();
        assert!(matches!(
            bad(PlotConfig { figure_size: [0.0, 9.0], ..PlotConfig::default() }),
            ConfigError::Invalid { field: "figure_size", .. }
        ));
        assert!(matches!(
            bad(PlotConfig { output_name: " ".into(), ..PlotConfig::default() }),
            ConfigError::Invalid { field: "output_name", .. }
        ));
    }
}
