//! Data module - price fetching, reshaping and CSV export

mod export;
mod loader;
mod processor;
mod types;

pub use export::{CsvExporter, CsvLayout};
pub use loader::{FetchError, PriceLoader};
pub use processor::{DisplayRow, PriceTable, ProcessorError};
pub use types::{MarketArea, PriceField, PriceObservation, PriceQuery};
