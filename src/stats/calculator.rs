//! Statistics Calculator Module
//! Descriptive statistics per price field, computed in parallel.

use crate::data::{PriceField, PriceTable, ProcessorError};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Summary of one price field over the fetched range.
#[derive(Debug, Clone)]
pub struct FieldStats {
    pub field: PriceField,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl FieldStats {
    fn empty(field: PriceField) -> Self {
        Self {
            field,
            count: 0,
            mean: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            std: f64::NAN,
        }
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for one field's values.
    pub fn compute_field_stats(field: PriceField, values: &[f64]) -> FieldStats {
        if values.is_empty() {
            return FieldStats::empty(field);
        }

        // Sample standard deviation; a single value has no spread
        let std = if values.len() > 1 {
            Statistics::std_dev(values.iter())
        } else {
            0.0
        };

        FieldStats {
            field,
            count: values.len(),
            mean: Statistics::mean(values.iter()),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
            std,
        }
    }

    /// Compute stats for every field in parallel, preserving field order.
    pub fn compute_all_stats_parallel(
        table: &PriceTable,
        fields: &[PriceField],
    ) -> Result<Vec<FieldStats>, ProcessorError> {
        fields
            .par_iter()
            .map(|&field| {
                let values = table.present_values(field)?;
                Ok(Self::compute_field_stats(field, &values))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PriceRecord;
    use crate::data::MarketArea;

    #[test]
    fn test_descriptive_stats() {
        let stats = StatsCalculator::compute_field_stats(
            PriceField::UpRegulation,
            &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0],
        );

        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        // Sample std of the classic population-std-2 example
        assert!((stats.std - 2.138089935299395).abs() < 1e-9);
    }

    #[test]
    fn test_empty_values_are_nan() {
        let stats = StatsCalculator::compute_field_stats(PriceField::DownRegulation, &[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let stats = StatsCalculator::compute_field_stats(PriceField::ImbalanceSales, &[42.0]);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_parallel_stats_keep_field_order() {
        let records: Vec<PriceRecord> = (0..4)
            .map(|h| PriceRecord {
                timestamp: Some(format!("2023-01-01T0{}:00:00", h)),
                imbl_sales_price: Some(h as f64),
                up_reg_price: if h % 2 == 0 { Some(10.0) } else { None },
                ..Default::default()
            })
            .collect();
        let table = PriceTable::from_records(&records, MarketArea::No1).unwrap();

        let fields = [PriceField::UpRegulation, PriceField::ImbalanceSales];
        let stats = StatsCalculator::compute_all_stats_parallel(&table, &fields).unwrap();

        assert_eq!(stats[0].field, PriceField::UpRegulation);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[1].field, PriceField::ImbalanceSales);
        assert!((stats[1].mean - 1.5).abs() < 1e-12);
    }
}
