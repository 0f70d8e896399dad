//! CSV Export Module
//! Writes every fetched price field to CSV with Polars.

use crate::data::processor::{PriceTable, ProcessorError};
use crate::data::{MarketArea, PriceField};
use chrono::{FixedOffset, NaiveDate};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    CsvError(#[from] PolarsError),
    #[error(transparent)]
    Processing(#[from] ProcessorError),
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Row layout of the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvLayout {
    /// One observation per line: timestamp, mba, price_type, value, unit.
    #[default]
    Long,
    /// One timestamp per line with a column per price field.
    Wide,
}

/// Serializes price tables to CSV.
///
/// The export always carries every fetched field. Price-type toggles only
/// affect what the viewer shows.
pub struct CsvExporter;

impl CsvExporter {
    /// Render the whole table as CSV bytes, header row included.
    pub fn to_csv_bytes(
        table: &PriceTable,
        layout: CsvLayout,
        offset: FixedOffset,
    ) -> Result<Vec<u8>, ExportError> {
        let mut df = match layout {
            CsvLayout::Long => table.long_frame(&PriceField::ALL, offset)?,
            CsvLayout::Wide => table.wide_frame(&PriceField::ALL, offset)?,
        };

        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)?;
        Ok(buf)
    }

    /// Write the CSV to `path`; returns the number of data lines written.
    pub fn write_csv(
        table: &PriceTable,
        layout: CsvLayout,
        offset: FixedOffset,
        path: &Path,
    ) -> Result<usize, ExportError> {
        let bytes = Self::to_csv_bytes(table, layout, offset)?;
        fs::write(path, &bytes)?;

        let lines = bytes.iter().filter(|&&b| b == b'\n').count();
        Ok(lines.saturating_sub(1))
    }

    /// Suggested file name for a download.
    pub fn default_file_name(area: MarketArea, start: NaiveDate, end: NaiveDate) -> String {
        format!("esett_prices_{}_{}_{}.csv", area.short_name(), start, end)
    }
}
