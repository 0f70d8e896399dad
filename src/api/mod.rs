//! API module - eSett OpenData client

mod client;
mod models;

pub use client::EsettClient;
pub use models::{ApiError, PriceRecord};
