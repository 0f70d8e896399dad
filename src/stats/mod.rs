//! Stats module - descriptive statistics for price fields

mod calculator;

pub use calculator::{FieldStats, StatsCalculator};
