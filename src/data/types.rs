//! Domain types shared by the fetch, table and chart layers.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Nordic market balance areas published by eSett.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarketArea {
    #[default]
    Se1,
    Se2,
    Se3,
    Se4,
    Fi,
    No1,
    No2,
    No3,
    No4,
    No5,
    Dk1,
    Dk2,
}

impl MarketArea {
    pub const ALL: [MarketArea; 12] = [
        MarketArea::Se1,
        MarketArea::Se2,
        MarketArea::Se3,
        MarketArea::Se4,
        MarketArea::Fi,
        MarketArea::No1,
        MarketArea::No2,
        MarketArea::No3,
        MarketArea::No4,
        MarketArea::No5,
        MarketArea::Dk1,
        MarketArea::Dk2,
    ];

    /// Label shown in the area selector.
    pub fn label(self) -> &'static str {
        match self {
            MarketArea::Se1 => "SE1 (Luleå)",
            MarketArea::Se2 => "SE2 (Sundsvall)",
            MarketArea::Se3 => "SE3 (Stockholm)",
            MarketArea::Se4 => "SE4 (Malmö)",
            MarketArea::Fi => "FI (Finland)",
            MarketArea::No1 => "NO1 (Oslo)",
            MarketArea::No2 => "NO2 (Kristiansand)",
            MarketArea::No3 => "NO3 (Trondheim)",
            MarketArea::No4 => "NO4 (Tromsø)",
            MarketArea::No5 => "NO5 (Bergen)",
            MarketArea::Dk1 => "DK1 (West Denmark)",
            MarketArea::Dk2 => "DK2 (East Denmark)",
        }
    }

    /// Code sent as the `mba` query parameter.
    pub fn code(self) -> &'static str {
        match self {
            MarketArea::Fi => "10YFI_1________U",
            other => other.short_name(),
        }
    }

    /// Short name used in titles and file names.
    pub fn short_name(self) -> &'static str {
        match self {
            MarketArea::Se1 => "SE1",
            MarketArea::Se2 => "SE2",
            MarketArea::Se3 => "SE3",
            MarketArea::Se4 => "SE4",
            MarketArea::Fi => "FI",
            MarketArea::No1 => "NO1",
            MarketArea::No2 => "NO2",
            MarketArea::No3 => "NO3",
            MarketArea::No4 => "NO4",
            MarketArea::No5 => "NO5",
            MarketArea::Dk1 => "DK1",
            MarketArea::Dk2 => "DK2",
        }
    }
}

impl fmt::Display for MarketArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One series in the EXP14 price response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceField {
    ImbalanceSales,
    ImbalancePurchase,
    UpRegulation,
    DownRegulation,
    ImbalanceSpotDifference,
    /// Main regulation direction: -1 down, 0 neutral, 1 up.
    MainDirection,
}

impl PriceField {
    pub const ALL: [PriceField; 6] = [
        PriceField::ImbalanceSales,
        PriceField::ImbalancePurchase,
        PriceField::UpRegulation,
        PriceField::DownRegulation,
        PriceField::ImbalanceSpotDifference,
        PriceField::MainDirection,
    ];

    /// JSON key in the API response, also used as the wide CSV column name.
    pub fn api_key(self) -> &'static str {
        match self {
            PriceField::ImbalanceSales => "imblSalesPrice",
            PriceField::ImbalancePurchase => "imblPurchasePrice",
            PriceField::UpRegulation => "upRegPrice",
            PriceField::DownRegulation => "downRegPrice",
            PriceField::ImbalanceSpotDifference => "imblSpotDifferencePrice",
            PriceField::MainDirection => "mainDirRegPowerPerMBA",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceField::ImbalanceSales => "Imbalance Sales Price",
            PriceField::ImbalancePurchase => "Imbalance Purchase Price",
            PriceField::UpRegulation => "Up Regulation Price",
            PriceField::DownRegulation => "Down Regulation Price",
            PriceField::ImbalanceSpotDifference => "Imbalance Spot Difference",
            PriceField::MainDirection => "Main Direction Regulation Power",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            PriceField::MainDirection => "direction",
            _ => "EUR/MWh",
        }
    }

    pub fn is_price(self) -> bool {
        !matches!(self, PriceField::MainDirection)
    }

    /// Whether the field is shown before the user touches the toggles.
    pub fn default_visible(self) -> bool {
        matches!(
            self,
            PriceField::ImbalanceSales
                | PriceField::ImbalancePurchase
                | PriceField::UpRegulation
                | PriceField::DownRegulation
        )
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_key())
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceField::ALL
            .into_iter()
            .find(|field| field.api_key() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Parameters of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuery {
    pub area: MarketArea,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PriceQuery {
    pub fn new(area: MarketArea, start: NaiveDate, end: NaiveDate) -> Self {
        Self { area, start, end }
    }

    /// `start`/`end` query values: whole days, formatted as the API expects.
    pub fn api_bounds(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%dT00:00:00.000Z").to_string(),
            self.end.format("%Y-%m-%dT23:59:59.000Z").to_string(),
        )
    }

    pub fn is_valid_range(&self) -> bool {
        self.start <= self.end
    }
}

/// A single price value at one instant, in long format.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub timestamp: DateTime<Utc>,
    pub mba: String,
    pub price_type: PriceField,
    pub value: f64,
}

impl PriceObservation {
    pub fn unit(&self) -> &'static str {
        self.price_type.unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finland_uses_eic_code() {
        assert_eq!(MarketArea::Fi.code(), "10YFI_1________U");
        assert_eq!(MarketArea::Fi.short_name(), "FI");
        assert_eq!(MarketArea::Se3.code(), "SE3");
    }

    #[test]
    fn test_price_field_parses_api_keys() {
        for field in PriceField::ALL {
            assert_eq!(field.api_key().parse::<PriceField>(), Ok(field));
        }
        assert!("bogus".parse::<PriceField>().is_err());
    }

    #[test]
    fn test_default_visible_fields() {
        let visible: Vec<PriceField> = PriceField::ALL
            .into_iter()
            .filter(|f| f.default_visible())
            .collect();
        assert_eq!(visible.len(), 4);
        assert!(!PriceField::MainDirection.default_visible());
        assert!(!PriceField::ImbalanceSpotDifference.default_visible());
    }

    #[test]
    fn test_api_bounds_cover_whole_days() {
        let query = PriceQuery::new(
            MarketArea::Se3,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        );
        let (start, end) = query.api_bounds();
        assert_eq!(start, "2023-01-01T00:00:00.000Z");
        assert_eq!(end, "2023-01-02T23:59:59.000Z");
        assert!(query.is_valid_range());
    }

    #[test]
    fn test_reversed_range_is_invalid() {
        let query = PriceQuery::new(
            MarketArea::Dk1,
            NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        );
        assert!(!query.is_valid_range());
    }
}
