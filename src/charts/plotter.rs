//! Chart Plotter Module
//! Creates interactive price charts using egui_plot.

use crate::data::{PriceField, PriceTable, ProcessorError};
use chrono::{DateTime, FixedOffset};
use egui::Color32;
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints, Points};

/// Default line colors per field
pub const SALES_COLOR: Color32 = Color32::from_rgb(0, 249, 0);
pub const PURCHASE_COLOR: Color32 = Color32::from_rgb(162, 59, 114);
pub const UP_REG_COLOR: Color32 = Color32::from_rgb(241, 143, 1);
pub const DOWN_REG_COLOR: Color32 = Color32::from_rgb(36, 191, 114);
pub const SPOT_DIFF_COLOR: Color32 = Color32::from_rgb(106, 153, 78);
pub const DIRECTION_COLOR: Color32 = Color32::from_rgb(139, 69, 19);

const PRICE_CHART_HEIGHT: f32 = 420.0;
const DIRECTION_CHART_HEIGHT: f32 = 140.0;
const TIME_AXIS_GROUP: &str = "esett_time_axis";

/// Points for one field. X is display-local time in epoch seconds.
#[derive(Clone, Debug)]
pub struct ChartSeries {
    pub field: PriceField,
    pub points: Vec<[f64; 2]>,
}

/// Everything needed to draw the price charts for one fetch.
#[derive(Clone, Debug)]
pub struct ChartData {
    pub title: String,
    pub offset_label: String,
    /// Price series plotted against EUR/MWh
    pub prices: Vec<ChartSeries>,
    /// Main direction series, drawn on its own axis
    pub direction: Option<ChartSeries>,
    pub x_range: Option<(f64, f64)>,
}

impl ChartData {
    /// Build chart series for the visible fields of a table.
    pub fn from_table(
        table: &PriceTable,
        fields: &[PriceField],
        title: String,
        offset: FixedOffset,
        offset_label: String,
    ) -> Result<Self, ProcessorError> {
        let shift = offset.local_minus_utc() as f64;

        let mut prices = Vec::new();
        let mut direction = None;
        for &field in fields {
            let points = table
                .points(field)?
                .into_iter()
                .map(|(ts, v)| [ts.timestamp() as f64 + shift, v])
                .collect();
            let series = ChartSeries { field, points };
            if field.is_price() {
                prices.push(series);
            } else {
                direction = Some(series);
            }
        }

        let x_range = table
            .time_span()?
            .map(|(first, last)| (first.timestamp() as f64 + shift, last.timestamp() as f64 + shift));

        Ok(Self {
            title,
            offset_label,
            prices,
            direction,
            x_range,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.prices.iter().all(|s| s.points.is_empty())
            && self.direction.as_ref().map_or(true, |s| s.points.is_empty())
    }

    /// Price y-range over all price series, padded.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for point in self.prices.iter().flat_map(|s| s.points.iter()) {
            min = min.min(point[1]);
            max = max.max(point[1]);
        }
        if min.is_infinite() {
            return None;
        }
        let pad = ((max - min) * 0.05).max(1.0);
        Some((min - pad, max + pad))
    }
}

/// Creates interactive price charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Line color for a field; the sales color is user-selectable.
    pub fn field_color(field: PriceField, sales_color: Color32) -> Color32 {
        match field {
            PriceField::ImbalanceSales => sales_color,
            PriceField::ImbalancePurchase => PURCHASE_COLOR,
            PriceField::UpRegulation => UP_REG_COLOR,
            PriceField::DownRegulation => DOWN_REG_COLOR,
            PriceField::ImbalanceSpotDifference => SPOT_DIFF_COLOR,
            PriceField::MainDirection => DIRECTION_COLOR,
        }
    }

    /// Axis label for a display-local epoch second.
    pub fn format_time(seconds: f64, pattern: &str) -> String {
        DateTime::from_timestamp(seconds.round() as i64, 0)
            .map(|dt| dt.naive_utc().format(pattern).to_string())
            .unwrap_or_default()
    }

    /// Draw the price lines.
    pub fn draw_price_chart(ui: &mut egui::Ui, data: &ChartData, sales_color: Color32) {
        let mut plot = Plot::new("price_chart")
            .height(PRICE_CHART_HEIGHT)
            .legend(Legend::default().position(Corner::LeftTop))
            .allow_scroll(false)
            .link_axis(TIME_AXIS_GROUP, [true, false])
            .x_axis_label(format!("Time ({})", data.offset_label))
            .y_axis_label("Price (€/MWh)")
            .x_axis_formatter(|mark, _range| Self::format_time(mark.value, "%m-%d %H:%M"))
            .label_formatter(|name, value| {
                let time = Self::format_time(value.x, "%Y-%m-%d %H:%M");
                if name.is_empty() {
                    time
                } else {
                    format!("{}\n{}\n{:.2} €/MWh", name, time, value.y)
                }
            });

        if let Some((x_min, x_max)) = data.x_range {
            plot = plot.include_x(x_min).include_x(x_max);
        }

        plot.show(ui, |plot_ui| {
            for series in &data.prices {
                if series.points.is_empty() {
                    continue;
                }
                plot_ui.line(
                    Line::new(PlotPoints::from(series.points.clone()))
                        .color(Self::field_color(series.field, sales_color))
                        .width(2.0)
                        .name(series.field.label()),
                );
            }
        });
    }

    /// Draw main regulation direction with markers on a fixed -1.5..1.5 axis.
    pub fn draw_direction_chart(ui: &mut egui::Ui, data: &ChartData) {
        let Some(series) = &data.direction else {
            return;
        };

        let mut plot = Plot::new("direction_chart")
            .height(DIRECTION_CHART_HEIGHT)
            .allow_scroll(false)
            .link_axis(TIME_AXIS_GROUP, [true, false])
            .include_y(-1.5)
            .include_y(1.5)
            .y_axis_label("Direction")
            .x_axis_formatter(|mark, _range| Self::format_time(mark.value, "%m-%d %H:%M"))
            .y_axis_formatter(|mark, _range| match mark.value.round() as i64 {
                -1 if (mark.value + 1.0).abs() < 1e-6 => "Down".to_string(),
                0 if mark.value.abs() < 1e-6 => "0".to_string(),
                1 if (mark.value - 1.0).abs() < 1e-6 => "Up".to_string(),
                _ => String::new(),
            });

        if let Some((x_min, x_max)) = data.x_range {
            plot = plot.include_x(x_min).include_x(x_max);
        }

        let color = DIRECTION_COLOR;
        plot.show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(series.points.clone()))
                    .color(color)
                    .width(2.0)
                    .name(series.field.label()),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(series.points.clone()))
                    .radius(2.0)
                    .color(color),
            );
        });
    }
}
