//! Price Loader Module
//! Runs one query against the eSett API and builds the price table.

use crate::api::{ApiError, EsettClient};
use crate::data::processor::{PriceTable, ProcessorError};
use crate::data::PriceQuery;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Data parsing error: {0}")]
    Processing(#[from] ProcessorError),
    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl FetchError {
    /// Follow-up suggestion shown under the error message.
    pub fn hint(&self) -> &'static str {
        match self {
            FetchError::Api(e) => e.hint(),
            FetchError::Processing(_) => {
                "The API response format may be different for this area. Please try a different Market Balance Area."
            }
            FetchError::InvalidRange { .. } => "Pick a start date on or before the end date.",
        }
    }
}

/// Fetches prices for a query and reshapes them into a [`PriceTable`].
pub struct PriceLoader {
    client: EsettClient,
}

impl PriceLoader {
    pub fn new(client: EsettClient) -> Self {
        Self { client }
    }

    /// Fetch and reshape. An empty upstream result gives an empty table.
    pub fn load(&self, query: &PriceQuery) -> Result<PriceTable, FetchError> {
        if !query.is_valid_range() {
            return Err(FetchError::InvalidRange {
                start: query.start,
                end: query.end,
            });
        }

        let records = self.client.fetch_prices(query)?;
        let table = PriceTable::from_records(&records, query.area)?;

        info!(
            mba = query.area.code(),
            start = %query.start,
            end = %query.end,
            rows = table.len(),
            "loaded price table"
        );
        Ok(table)
    }
}
