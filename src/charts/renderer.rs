//! Static Chart Renderer
//! Renders the price chart to a PNG file with plotters.
//!
//! Layout:
//! 1. Title centered at the top
//! 2. Price lines on the left axis (EUR/MWh)
//! 3. Main direction on a secondary right axis (-1.5..1.5), when shown
//! 4. Legend in the upper left corner

use crate::charts::{ChartData, ChartPlotter};
use egui::Color32;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render")]
    NoData,
    #[error("Chart drawing failed: {0}")]
    Draw(String),
}

const DIRECTION_RANGE: (f64, f64) = (-1.5, 1.5);

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the chart into a PNG at `path`.
    pub fn render_png(
        data: &ChartData,
        sales_color: Color32,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if data.is_empty() {
            return Err(RenderError::NoData);
        }
        let (x_min, x_max) = data.x_range.ok_or(RenderError::NoData)?;
        let x_max = if x_max > x_min { x_max } else { x_min + 3600.0 };
        let (y_min, y_max) = data.price_range().unwrap_or(DIRECTION_RANGE);

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&data.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .right_y_label_area_size(if data.direction.is_some() { 60 } else { 0 })
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?
            .set_secondary_coord(x_min..x_max, DIRECTION_RANGE.0..DIRECTION_RANGE.1);

        let x_formatter = |x: &f64| ChartPlotter::format_time(*x, "%m-%d %H:%M");
        chart
            .configure_mesh()
            .light_line_style(RGBColor(235, 235, 235))
            .x_desc(format!("Time ({})", data.offset_label))
            .y_desc("Price (€/MWh)")
            .x_labels(8)
            .x_label_formatter(&x_formatter)
            .draw()
            .map_err(draw_err)?;

        for series in &data.prices {
            if series.points.is_empty() {
                continue;
            }
            let color = to_rgb(ChartPlotter::field_color(series.field, sales_color));
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().map(|p| (p[0], p[1])),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(series.field.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        if let Some(series) = &data.direction {
            chart
                .configure_secondary_axes()
                .y_desc("Direction (-1=Down, 0=Neutral, 1=Up)")
                .draw()
                .map_err(draw_err)?;

            let color = to_rgb(ChartPlotter::field_color(series.field, sales_color));
            chart
                .draw_secondary_series(LineSeries::new(
                    series.points.iter().map(|p| (p[0], p[1])),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(series.field.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart
                .draw_secondary_series(
                    series
                        .points
                        .iter()
                        .map(|p| Circle::new((p[0], p[1]), 2, color.filled())),
                )
                .map_err(draw_err)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn to_rgb(color: Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::plotter::ChartSeries;
    use crate::data::PriceField;

    #[test]
    fn test_empty_chart_is_rejected() {
        let data = ChartData {
            title: "empty".to_string(),
            offset_label: "UTC".to_string(),
            prices: vec![ChartSeries {
                field: PriceField::UpRegulation,
                points: Vec::new(),
            }],
            direction: None,
            x_range: None,
        };
        let path = std::env::temp_dir().join("esett_never_written.png");

        let err = StaticChartRenderer::render_png(&data, Color32::GREEN, &path, 800, 600);
        assert!(matches!(err, Err(RenderError::NoData)));
        assert!(!path.exists());
    }

    #[test]
    fn test_rgb_conversion() {
        let rgb = to_rgb(Color32::from_rgb(10, 20, 30));
        assert_eq!((rgb.0, rgb.1, rgb.2), (10, 20, 30));
    }
}
