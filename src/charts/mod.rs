//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartData, ChartPlotter, SALES_COLOR};
pub use renderer::StaticChartRenderer;
