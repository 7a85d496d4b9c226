//! CSV Data Loader Module
//! Parses the sample table into a `SeriesSet`, failing fast on the first bad row.
//!
//! Row layout: `x, value_0, derivative_0, ..., value_{K-1}, derivative_{K-1}`.
//! The first row is a header and is discarded without inspection.

use crate::data::series::{Sample, SeriesSet, SeriesSetBuilder};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input has no header row")]
    MissingHeader,
    #[error("Line {line}: expected {expected} fields, found {found} (`{content}`)")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
        content: String,
    },
    #[error("Line {line}, column {column}: `{token}` is not a number (`{content}`)")]
    InvalidNumber {
        line: u64,
        column: usize,
        token: String,
        content: String,
    },
    #[error("Failed to read CSV near line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("{orders} orders requested, at most {max} are supported")]
    TooManyOrders { orders: usize, max: usize },
}

impl LoaderError {
    /// True for failures of the underlying reader rather than of the content.
    pub fn is_io(&self) -> bool {
        match self {
            LoaderError::Io { .. } => true,
            LoaderError::Csv { source, .. } => source.is_io_error(),
            _ => false,
        }
    }

    /// 1-based line number of the offending row, when known.
    pub fn line(&self) -> Option<u64> {
        match self {
            LoaderError::FieldCount { line, .. }
            | LoaderError::InvalidNumber { line, .. }
            | LoaderError::Csv { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Handles loading of the sample table.
pub struct DataLoader;

impl DataLoader {
    /// Load the file at `path`, expecting `orders` value/derivative pairs per row.
    ///
    /// The file handle lives only for the duration of this call and is
    /// released on every return path.
    pub fn load(path: &Path, orders: usize) -> Result<SeriesSet, LoaderError> {
        let file = File::open(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let series = Self::from_reader(file, orders)?;
        info!(
            "Loaded {} samples x {} orders from {}",
            series.len(),
            series.order_count(),
            path.display()
        );
        Ok(series)
    }

    /// Parse an already opened source. Rows are taken strictly in order.
    pub fn from_reader<R: Read>(reader: R, orders: usize) -> Result<SeriesSet, LoaderError> {
        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let expected = SeriesSet::field_count(orders).ok_or(LoaderError::TooManyOrders {
            orders,
            max: SeriesSet::MAX_ORDERS,
        })?;
        let mut records = csv.records();

        // Header: consumed and discarded
        match records.next() {
            None => return Err(LoaderError::MissingHeader),
            Some(header) => {
                let header = header.map_err(|source| LoaderError::Csv { line: 1, source })?;
                debug!("Skipping header with {} fields", header.len());
            }
        }

        let mut builder = SeriesSetBuilder::new(orders);
        for result in records {
            let record = result.map_err(|source| LoaderError::Csv {
                line: source.position().map(|p| p.line()).unwrap_or(0),
                source,
            })?;
            let sample = Self::parse_record(&record, orders, expected)?;
            builder.push_row(&sample);
        }

        Ok(builder.build())
    }

    /// Convert one data record into a sample.
    fn parse_record(
        record: &StringRecord,
        orders: usize,
        expected: usize,
    ) -> Result<Sample, LoaderError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != expected {
            return Err(LoaderError::FieldCount {
                line,
                expected,
                found: record.len(),
                content: Self::describe(record),
            });
        }

        let field = |column: usize| -> Result<f64, LoaderError> {
            let token = record.get(column).unwrap_or("");
            token.parse::<f64>().map_err(|_| LoaderError::InvalidNumber {
                line,
                column,
                token: token.to_string(),
                content: Self::describe(record),
            })
        };

        let x = field(0)?;
        let pairs = (0..orders)
            .map(|k| -> Result<(f64, f64), LoaderError> {
                Ok((field(1 + 2 * k)?, field(2 + 2 * k)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sample::new(x, pairs))
    }

    fn describe(record: &StringRecord) -> String {
        record.iter().collect::<Vec<_>>().join(",")
    }
}
