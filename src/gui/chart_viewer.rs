//! Chart Viewer Widget
//! Central panel: summary metrics, interactive price charts and the raw data grid.

use crate::charts::{ChartData, ChartPlotter};
use crate::data::{DisplayRow, PriceField, PriceQuery, PriceTable, ProcessorError};
use crate::gui::control_panel::UserSettings;
use crate::stats::{FieldStats, StatsCalculator};
use chrono::FixedOffset;
use egui::{Color32, RichText, ScrollArea};
use tracing::warn;

const METRIC_CARD_WIDTH: f32 = 190.0;
const TABLE_HEIGHT: f32 = 260.0;

/// Message shown in place of (or above) the chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Warning { message: String, hint: String },
    Error { message: String, hint: String },
}

/// Prices from the last successful fetch.
pub struct LoadedPrices {
    pub query: PriceQuery,
    pub table: PriceTable,
}

/// Chart, stats and grid rows derived for one set of visible fields.
struct ViewCache {
    fields: Vec<PriceField>,
    chart: ChartData,
    stats: Vec<FieldStats>,
    rows: Vec<DisplayRow>,
}

/// Central display area.
pub struct ChartViewer {
    pub loaded: Option<LoadedPrices>,
    pub notice: Option<Notice>,
    cache: Option<ViewCache>,
    offset: FixedOffset,
    offset_label: String,
    table_rows: usize,
}

impl ChartViewer {
    pub fn new(offset: FixedOffset, offset_label: String, table_rows: usize) -> Self {
        Self {
            loaded: None,
            notice: None,
            cache: None,
            offset,
            offset_label,
            table_rows,
        }
    }

    /// Drop the current data and message.
    pub fn clear(&mut self) {
        self.loaded = None;
        self.notice = None;
        self.cache = None;
    }

    pub fn has_data(&self) -> bool {
        self.loaded.as_ref().is_some_and(|l| !l.table.is_empty())
    }

    pub fn set_prices(&mut self, query: PriceQuery, table: PriceTable) {
        self.cache = None;
        self.loaded = Some(LoadedPrices { query, table });
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Chart for the given fields, rebuilding derived data when they change.
    pub fn chart_data(&mut self, fields: &[PriceField]) -> Result<Option<&ChartData>, ProcessorError> {
        self.refresh(fields)?;
        Ok(self.cache.as_ref().map(|c| &c.chart))
    }

    fn refresh(&mut self, fields: &[PriceField]) -> Result<(), ProcessorError> {
        let Some(loaded) = &self.loaded else {
            self.cache = None;
            return Ok(());
        };
        if self.cache.as_ref().is_some_and(|c| c.fields == fields) {
            return Ok(());
        }

        let title = format!("eSett Prices - {}", loaded.query.area.label());
        let chart = ChartData::from_table(
            &loaded.table,
            fields,
            title,
            self.offset,
            self.offset_label.clone(),
        )?;
        let price_fields: Vec<PriceField> =
            fields.iter().copied().filter(|f| f.is_price()).collect();
        let stats = StatsCalculator::compute_all_stats_parallel(&loaded.table, &price_fields)?;
        let rows = loaded.table.tail_rows(self.table_rows, fields, self.offset)?;

        self.cache = Some(ViewCache {
            fields: fields.to_vec(),
            chart,
            stats,
            rows,
        });
        Ok(())
    }

    /// Draw the viewer
    pub fn show(&mut self, ui: &mut egui::Ui, settings: &UserSettings, is_fetching: bool) {
        if let Some(notice) = &self.notice {
            Self::draw_notice(ui, notice);
            ui.add_space(10.0);
        }

        if is_fetching && !self.has_data() {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        }

        if !self.has_data() {
            if self.notice.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(
                            "Configure the settings in the sidebar and click 'Fetch Data' to start.",
                        )
                        .size(16.0),
                    );
                });
            }
            return;
        }

        let fields = settings.visible_fields();
        if let Err(e) = self.refresh(&fields) {
            warn!(error = %e, "failed to prepare chart");
            Self::draw_notice(
                ui,
                &Notice::Error {
                    message: format!("Data parsing error: {}", e),
                    hint: String::new(),
                },
            );
            return;
        }
        let Some(cache) = &self.cache else {
            return;
        };
        let offset_label = self.offset_label.clone();

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                // ===== Summary Statistics =====
                ui.label(RichText::new("Summary Statistics").size(18.0).strong());
                ui.add_space(5.0);
                if cache.stats.is_empty() {
                    ui.label(RichText::new("No price types selected").color(Color32::GRAY));
                } else {
                    ui.horizontal_wrapped(|ui| {
                        for stat in &cache.stats {
                            Self::draw_metric_card(ui, stat);
                            ui.add_space(8.0);
                        }
                    });
                }

                ui.add_space(15.0);

                // ===== Price Chart =====
                ui.label(RichText::new("Price Time Series").size(18.0).strong());
                ui.label(
                    RichText::new(format!("Times displayed in {}", offset_label))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(5.0);
                ui.label(RichText::new(&cache.chart.title).size(14.0));
                ChartPlotter::draw_price_chart(ui, &cache.chart, settings.sales_color);
                if cache.chart.direction.is_some() {
                    ui.add_space(5.0);
                    ChartPlotter::draw_direction_chart(ui, &cache.chart);
                }

                ui.add_space(15.0);

                // ===== Raw Data =====
                ui.label(RichText::new("Raw Data").size(18.0).strong());
                ui.add_space(5.0);
                Self::draw_raw_table(ui, &cache.fields, &cache.rows);
            });
    }

    fn draw_notice(ui: &mut egui::Ui, notice: &Notice) {
        let (color, message, hint) = match notice {
            Notice::Info(message) => (Color32::from_rgb(100, 149, 237), message, None),
            Notice::Warning { message, hint } => {
                (Color32::from_rgb(230, 160, 20), message, Some(hint))
            }
            Notice::Error { message, hint } => {
                (Color32::from_rgb(220, 53, 69), message, Some(hint))
            }
        };

        egui::Frame::none()
            .rounding(5.0)
            .stroke(egui::Stroke::new(1.5, color))
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(message).size(14.0).color(color));
                if let Some(hint) = hint.filter(|h| !h.is_empty()) {
                    ui.label(RichText::new(hint).size(12.0).color(Color32::GRAY));
                }
            });
    }

    /// Metric card: average in large type, range and count below.
    fn draw_metric_card(ui: &mut egui::Ui, stat: &FieldStats) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(METRIC_CARD_WIDTH);
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(format!("Avg {}", stat.field.label()))
                            .size(11.0)
                            .color(Color32::GRAY),
                    );
                    let mean = if stat.count == 0 {
                        "-".to_string()
                    } else {
                        format!("{:.2} €/MWh", stat.mean)
                    };
                    ui.label(RichText::new(mean).size(20.0).strong());
                    if stat.count > 0 {
                        ui.label(
                            RichText::new(format!(
                                "min {:.2} · max {:.2} · σ {:.2} · n={}",
                                stat.min, stat.max, stat.std, stat.count
                            ))
                            .size(10.0),
                        );
                    }
                });
            });
    }

    fn draw_raw_table(ui: &mut egui::Ui, fields: &[PriceField], rows: &[DisplayRow]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ScrollArea::both()
                    .id_salt("raw_data_scroll")
                    .max_height(TABLE_HEIGHT)
                    .show(ui, |ui| {
                        egui::Grid::new("raw_data_table")
                            .striped(true)
                            .min_col_width(70.0)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                ui.label(RichText::new("Timestamp").strong().size(11.0));
                                ui.label(RichText::new("MBA").strong().size(11.0));
                                for field in fields {
                                    ui.label(RichText::new(field.api_key()).strong().size(11.0));
                                }
                                ui.end_row();

                                for row in rows {
                                    ui.label(RichText::new(&row.timestamp).size(11.0));
                                    ui.label(RichText::new(&row.mba).size(11.0));
                                    for value in &row.values {
                                        let text = value
                                            .map(|v| format!("{:.2}", v))
                                            .unwrap_or_else(|| "-".to_string());
                                        ui.label(RichText::new(text).size(11.0));
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
    }
}
