//! Data Processor Module
//! Reshapes API rows into a sorted wide table and long observations.

use crate::api::PriceRecord;
use crate::data::{MarketArea, PriceField, PriceObservation};
use chrono::{DateTime, FixedOffset, Utc};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

pub const TIMESTAMP_COL: &str = "timestamp";
pub const MBA_COL: &str = "mba";
pub const PRICE_TYPE_COL: &str = "price_type";
pub const VALUE_COL: &str = "value";
pub const UNIT_COL: &str = "unit";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No timestamp column found in response")]
    MissingTimestamp,
    #[error("Invalid timestamp value in table: {0}")]
    InvalidTimestamp(i64),
}

/// One row of the raw data grid, already formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub timestamp: String,
    pub mba: String,
    pub values: Vec<Option<f64>>,
}

/// Fetched prices for one query: one row per timestamp, one column per field.
///
/// Columns: `timestamp` (UTC epoch millis), `mba`, then one nullable `f64`
/// column per [`PriceField`] keyed by its API name. Rows are sorted by
/// timestamp; rows whose timestamp could not be parsed are dropped.
#[derive(Clone)]
pub struct PriceTable {
    df: DataFrame,
}

impl PriceTable {
    /// Build the table from raw API rows.
    pub fn from_records(records: &[PriceRecord], area: MarketArea) -> Result<Self, ProcessorError> {
        if !records.is_empty() && !records.iter().any(PriceRecord::has_timestamp_key) {
            return Err(ProcessorError::MissingTimestamp);
        }

        let mut rows: Vec<(DateTime<Utc>, &PriceRecord)> = records
            .iter()
            .filter_map(|r| r.parsed_timestamp().map(|ts| (ts, r)))
            .collect();

        let dropped = records.len() - rows.len();
        if dropped > 0 {
            debug!(dropped, "dropped rows with unreadable timestamps");
        }

        // Stable sort keeps API order for equal timestamps
        rows.sort_by_key(|(ts, _)| *ts);

        let timestamps: Vec<i64> = rows.iter().map(|(ts, _)| ts.timestamp_millis()).collect();
        let mbas: Vec<String> = rows
            .iter()
            .map(|(_, r)| {
                r.mba
                    .clone()
                    .unwrap_or_else(|| area.short_name().to_string())
            })
            .collect();

        let mut columns = vec![
            Column::new(TIMESTAMP_COL.into(), timestamps),
            Column::new(MBA_COL.into(), mbas),
        ];
        for field in PriceField::ALL {
            let values: Vec<Option<f64>> = rows.iter().map(|(_, r)| r.value(field)).collect();
            columns.push(Column::new(field.api_key().into(), values));
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Row timestamps in table order.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>, ProcessorError> {
        self.df
            .column(TIMESTAMP_COL)?
            .i64()?
            .into_iter()
            .map(|ms| {
                let ms = ms.unwrap_or_default();
                DateTime::from_timestamp_millis(ms).ok_or(ProcessorError::InvalidTimestamp(ms))
            })
            .collect()
    }

    pub fn mbas(&self) -> Result<Vec<String>, ProcessorError> {
        Ok(self
            .df
            .column(MBA_COL)?
            .str()?
            .into_iter()
            .map(|m| m.unwrap_or_default().to_string())
            .collect())
    }

    /// Column values for one field, `None` where the API had no value.
    pub fn values(&self, field: PriceField) -> Result<Vec<Option<f64>>, ProcessorError> {
        Ok(self.df.column(field.api_key())?.f64()?.into_iter().collect())
    }

    /// Non-null values for one field, in timestamp order.
    pub fn present_values(&self, field: PriceField) -> Result<Vec<f64>, ProcessorError> {
        Ok(self.values(field)?.into_iter().flatten().collect())
    }

    /// `(timestamp, value)` pairs for one field, skipping gaps.
    pub fn points(&self, field: PriceField) -> Result<Vec<(DateTime<Utc>, f64)>, ProcessorError> {
        let timestamps = self.timestamps()?;
        let values = self.values(field)?;
        Ok(timestamps
            .into_iter()
            .zip(values)
            .filter_map(|(ts, v)| v.map(|v| (ts, v)))
            .collect())
    }

    /// First and last timestamp.
    pub fn time_span(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ProcessorError> {
        let timestamps = self.timestamps()?;
        Ok(timestamps.first().copied().zip(timestamps.last().copied()))
    }

    /// Stack the selected fields into long observations (stack operation).
    ///
    /// Output is row-major: all fields of the first timestamp, then the next,
    /// so timestamps stay non-decreasing. Null values are skipped.
    pub fn observations(&self, fields: &[PriceField]) -> Result<Vec<PriceObservation>, ProcessorError> {
        let timestamps = self.timestamps()?;
        let mbas = self.mbas()?;
        let columns = fields
            .iter()
            .map(|&f| self.values(f).map(|v| (f, v)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut observations = Vec::with_capacity(timestamps.len() * fields.len());
        for (i, (ts, mba)) in timestamps.iter().zip(mbas.iter()).enumerate() {
            for (field, values) in &columns {
                if let Some(value) = values[i] {
                    observations.push(PriceObservation {
                        timestamp: *ts,
                        mba: mba.clone(),
                        price_type: *field,
                        value,
                    });
                }
            }
        }

        Ok(observations)
    }

    /// Long-format frame: [timestamp, mba, price_type, value, unit].
    ///
    /// Timestamps are RFC 3339 strings in the display offset.
    pub fn long_frame(
        &self,
        fields: &[PriceField],
        offset: FixedOffset,
    ) -> Result<DataFrame, ProcessorError> {
        let observations = self.observations(fields)?;

        let timestamps: Vec<String> = observations
            .iter()
            .map(|o| o.timestamp.with_timezone(&offset).to_rfc3339())
            .collect();
        let mbas: Vec<String> = observations.iter().map(|o| o.mba.clone()).collect();
        let price_types: Vec<&str> = observations.iter().map(|o| o.price_type.api_key()).collect();
        let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
        let units: Vec<&str> = observations.iter().map(|o| o.unit()).collect();

        let df = DataFrame::new(vec![
            Column::new(TIMESTAMP_COL.into(), timestamps),
            Column::new(MBA_COL.into(), mbas),
            Column::new(PRICE_TYPE_COL.into(), price_types),
            Column::new(VALUE_COL.into(), values),
            Column::new(UNIT_COL.into(), units),
        ])?;

        Ok(df)
    }

    /// Wide-format frame: [timestamp, mba, <field>...] with one row per timestamp.
    pub fn wide_frame(
        &self,
        fields: &[PriceField],
        offset: FixedOffset,
    ) -> Result<DataFrame, ProcessorError> {
        let timestamps: Vec<String> = self
            .timestamps()?
            .iter()
            .map(|ts| ts.with_timezone(&offset).to_rfc3339())
            .collect();

        let mut columns = vec![
            Column::new(TIMESTAMP_COL.into(), timestamps),
            self.df.column(MBA_COL)?.clone(),
        ];
        for field in fields {
            columns.push(self.df.column(field.api_key())?.clone());
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Last `n` rows formatted for the raw data grid.
    pub fn tail_rows(
        &self,
        n: usize,
        fields: &[PriceField],
        offset: FixedOffset,
    ) -> Result<Vec<DisplayRow>, ProcessorError> {
        let timestamps = self.timestamps()?;
        let mbas = self.mbas()?;
        let columns = fields
            .iter()
            .map(|&f| self.values(f))
            .collect::<Result<Vec<_>, _>>()?;

        let start = self.len().saturating_sub(n);
        Ok((start..self.len())
            .map(|i| DisplayRow {
                timestamp: timestamps[i]
                    .with_timezone(&offset)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                mba: mbas[i].clone(),
                values: columns.iter().map(|c| c[i]).collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(ts: &str, sales: Option<f64>, up: Option<f64>) -> PriceRecord {
        PriceRecord {
            timestamp: Some(ts.to_string()),
            mba: Some("SE3".to_string()),
            imbl_sales_price: sales,
            up_reg_price: up,
            ..Default::default()
        }
    }

    fn utc2() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[test]
    fn test_rows_are_sorted_by_timestamp() {
        let records = vec![
            record("2023-01-01T02:00:00", Some(3.0), None),
            record("2023-01-01T00:00:00", Some(1.0), None),
            record("2023-01-01T01:00:00", Some(2.0), None),
        ];
        let table = PriceTable::from_records(&records, MarketArea::Se3).unwrap();

        let timestamps = table.timestamps().unwrap();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            table.present_values(PriceField::ImbalanceSales).unwrap(),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_unreadable_timestamps_are_dropped() {
        let records = vec![
            record("2023-01-01T00:00:00", Some(1.0), None),
            record("garbage", Some(99.0), None),
        ];
        let table = PriceTable::from_records(&records, MarketArea::Se3).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_timestamp_keys_is_error() {
        let records = vec![PriceRecord {
            mba: Some("SE3".to_string()),
            imbl_sales_price: Some(1.0),
            ..Default::default()
        }];
        let err = PriceTable::from_records(&records, MarketArea::Se3).err();
        assert!(matches!(err, Some(ProcessorError::MissingTimestamp)));
    }

    #[test]
    fn test_empty_records_give_empty_table() {
        let table = PriceTable::from_records(&[], MarketArea::Fi).unwrap();
        assert!(table.is_empty());
        assert!(table.observations(&PriceField::ALL).unwrap().is_empty());
        assert_eq!(table.time_span().unwrap(), None);
    }

    #[test]
    fn test_missing_mba_falls_back_to_area() {
        let records = vec![PriceRecord {
            timestamp: Some("2023-01-01T00:00:00".to_string()),
            ..Default::default()
        }];
        let table = PriceTable::from_records(&records, MarketArea::Fi).unwrap();
        assert_eq!(table.mbas().unwrap(), vec!["FI".to_string()]);
    }

    #[test]
    fn test_observations_are_row_major_and_skip_nulls() {
        let records = vec![
            record("2023-01-01T00:00:00", Some(1.0), Some(10.0)),
            record("2023-01-01T01:00:00", None, Some(20.0)),
        ];
        let table = PriceTable::from_records(&records, MarketArea::Se3).unwrap();
        let obs = table
            .observations(&[PriceField::ImbalanceSales, PriceField::UpRegulation])
            .unwrap();

        assert_eq!(obs.len(), 3);
        assert_eq!(obs[0].price_type, PriceField::ImbalanceSales);
        assert_eq!(obs[1].price_type, PriceField::UpRegulation);
        assert_eq!(obs[2].value, 20.0);
        assert!(obs.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(
            obs[2].timestamp,
            Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_long_frame_shape() {
        let records = vec![record("2023-01-01T00:00:00", Some(1.0), Some(10.0))];
        let table = PriceTable::from_records(&records, MarketArea::Se3).unwrap();
        let df = table
            .long_frame(&[PriceField::ImbalanceSales, PriceField::UpRegulation], utc2())
            .unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 5);
        let ts = df.column(TIMESTAMP_COL).unwrap().str().unwrap().get(0);
        assert_eq!(ts, Some("2023-01-01T02:00:00+02:00"));
    }

    #[test]
    fn test_wide_frame_keeps_selected_fields() {
        let records = vec![
            record("2023-01-01T00:00:00", Some(1.0), None),
            record("2023-01-01T01:00:00", Some(2.0), Some(5.0)),
        ];
        let table = PriceTable::from_records(&records, MarketArea::Se3).unwrap();
        let df = table
            .wide_frame(&[PriceField::UpRegulation], utc2())
            .unwrap();

        assert_eq!(df.height(), 2);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["timestamp", "mba", "upRegPrice"]);
    }

    #[test]
    fn test_tail_rows_formats_in_display_offset() {
        let records: Vec<PriceRecord> = (0..5)
            .map(|h| record(&format!("2023-01-01T0{}:00:00", h), Some(h as f64), None))
            .collect();
        let table = PriceTable::from_records(&records, MarketArea::Se3).unwrap();
        let rows = table
            .tail_rows(2, &[PriceField::ImbalanceSales], utc2())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "2023-01-01 05:00");
        assert_eq!(rows[1].values, vec![Some(4.0)]);
    }
}
