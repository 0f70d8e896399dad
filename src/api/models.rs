use crate::data::PriceField;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by the eSett client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network failure or timeout; nothing usable came back.
    #[error("eSett API unreachable: {0}")]
    UpstreamUnavailable(String),

    /// Non-2xx status or a body that is not a price array.
    #[error("eSett API returned a bad response: {0}")]
    UpstreamBadResponse(String),

    #[error("Failed to set up HTTP client: {0}")]
    ClientSetup(String),
}

impl ApiError {
    /// Follow-up suggestion shown under the error message.
    pub fn hint(&self) -> &'static str {
        match self {
            ApiError::UpstreamUnavailable(_) => {
                "Check your network connection or try again in a moment."
            }
            ApiError::UpstreamBadResponse(_) => {
                "Some Market Balance Areas may not have data for all date ranges. Try adjusting the date range or selecting a different area."
            }
            ApiError::ClientSetup(_) => "Restart the application.",
        }
    }
}

/// One row of the EXP14 price response.
///
/// All values are optional; the API leaves them `null` for periods where a
/// price was not published.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, rename = "timestampUTC")]
    pub timestamp_utc: Option<String>,
    #[serde(default)]
    pub mba: Option<String>,
    #[serde(default)]
    pub imbl_sales_price: Option<f64>,
    #[serde(default)]
    pub imbl_purchase_price: Option<f64>,
    #[serde(default)]
    pub up_reg_price: Option<f64>,
    #[serde(default)]
    pub down_reg_price: Option<f64>,
    #[serde(default)]
    pub imbl_spot_difference_price: Option<f64>,
    #[serde(default, rename = "mainDirRegPowerPerMBA")]
    pub main_dir_reg_power_per_mba: Option<f64>,
}

impl PriceRecord {
    pub fn has_timestamp_key(&self) -> bool {
        self.timestamp.is_some() || self.timestamp_utc.is_some()
    }

    /// Parsed UTC timestamp; `timestamp` wins over `timestampUTC`.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .or(self.timestamp_utc.as_deref())
            .and_then(parse_timestamp)
    }

    pub fn value(&self, field: PriceField) -> Option<f64> {
        let value = match field {
            PriceField::ImbalanceSales => self.imbl_sales_price,
            PriceField::ImbalancePurchase => self.imbl_purchase_price,
            PriceField::UpRegulation => self.up_reg_price,
            PriceField::DownRegulation => self.down_reg_price,
            PriceField::ImbalanceSpotDifference => self.imbl_spot_difference_price,
            PriceField::MainDirection => self.main_dir_reg_power_per_mba,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Parse an API timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_deserializes_camel_case() {
        let json = r#"{
            "timestamp": "2023-01-01T00:00:00",
            "mba": "SE3",
            "imblSalesPrice": 12.5,
            "imblPurchasePrice": 13.0,
            "upRegPrice": null,
            "downRegPrice": 9.75,
            "mainDirRegPowerPerMBA": -1
        }"#;
        let record: PriceRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.mba.as_deref(), Some("SE3"));
        assert_eq!(record.value(PriceField::ImbalanceSales), Some(12.5));
        assert_eq!(record.value(PriceField::UpRegulation), None);
        assert_eq!(record.value(PriceField::ImbalanceSpotDifference), None);
        assert_eq!(record.value(PriceField::MainDirection), Some(-1.0));
    }

    #[test]
    fn test_timestamp_falls_back_to_utc_key() {
        let json = r#"{"timestampUTC": "2023-01-01T05:15:00Z", "mba": "FI"}"#;
        let record: PriceRecord = serde_json::from_str(json).unwrap();

        assert!(record.has_timestamp_key());
        assert_eq!(
            record.parsed_timestamp(),
            Some(Utc.with_ymd_and_hms(2023, 1, 1, 5, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-03-04T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-03-04T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-03-04T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-03-04 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_unreadable_timestamp_yields_none() {
        let record = PriceRecord {
            timestamp: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(record.has_timestamp_key());
        assert_eq!(record.parsed_timestamp(), None);
    }
}
