//! eSett Price Viewer Main Application
//! Main window with control panel and chart viewer.

use crate::api::EsettClient;
use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{CsvExporter, FetchError, PriceLoader, PriceQuery, PriceTable};
use crate::gui::chart_viewer::Notice;
use crate::gui::control_panel::StatusKind;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use chrono::{FixedOffset, Local, NaiveDate};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const PNG_WIDTH: u32 = 1600;
const PNG_HEIGHT: u32 = 900;

/// Fetch result from background thread
enum FetchResult {
    Complete {
        query: PriceQuery,
        table: PriceTable,
        elapsed: Duration,
    },
    Error {
        query: PriceQuery,
        error: FetchError,
    },
}

/// Main application window.
pub struct EsettViewerApp {
    client: EsettClient,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    offset: FixedOffset,

    // Async fetch
    fetch_rx: Option<Receiver<FetchResult>>,
    is_fetching: bool,
}

impl EsettViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, client: EsettClient) -> Self {
        Self::with_config(config, client, Local::now().date_naive())
    }

    /// Build the app state without a window.
    fn with_config(config: AppConfig, client: EsettClient, today: NaiveDate) -> Self {
        Self {
            client,
            control_panel: ControlPanel::new(today, config.lookback_days),
            chart_viewer: ChartViewer::new(
                config.display_offset(),
                config.offset_label(),
                config.table_rows,
            ),
            offset: config.display_offset(),
            fetch_rx: None,
            is_fetching: false,
        }
    }

    /// Start a fetch in a background thread.
    ///
    /// A newer fetch replaces the receiver, so results of older ones are dropped.
    fn start_fetch(&mut self) {
        let query = self.control_panel.settings.query();
        self.chart_viewer.clear();
        self.control_panel.export_enabled = false;

        if !query.is_valid_range() {
            self.fetch_rx = None;
            self.is_fetching = false;
            let error = FetchError::InvalidRange {
                start: query.start,
                end: query.end,
            };
            self.control_panel
                .set_status(StatusKind::Error, &format!("Error: {}", error));
            self.chart_viewer.set_notice(Notice::Error {
                message: error.to_string(),
                hint: error.hint().to_string(),
            });
            return;
        }

        let message = format!("Fetching data from eSett API for {}...", query.area.label());
        self.control_panel.set_status(StatusKind::Info, &message);
        self.chart_viewer.set_notice(Notice::Info(message));
        info!(mba = query.area.code(), start = %query.start, end = %query.end, "starting fetch");

        let (tx, rx) = channel();
        self.fetch_rx = Some(rx);
        self.is_fetching = true;

        let loader = PriceLoader::new(self.client.clone());
        thread::spawn(move || {
            let started = Instant::now();
            let result = match loader.load(&query) {
                Ok(table) => FetchResult::Complete {
                    query,
                    table,
                    elapsed: started.elapsed(),
                },
                Err(error) => FetchResult::Error { query, error },
            };
            // Receiver is gone when a newer fetch superseded this one
            let _ = tx.send(result);
        });
    }

    /// Check for fetch results
    fn check_fetch_results(&mut self) {
        // Take the receiver temporarily to avoid borrow issues
        let rx = self.fetch_rx.take();
        if let Some(rx) = rx {
            match rx.try_recv() {
                Ok(result) => {
                    self.is_fetching = false;
                    self.apply_fetch_result(result);
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => {
                    self.fetch_rx = Some(rx);
                }
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    self.is_fetching = false;
                    self.control_panel
                        .set_status(StatusKind::Error, "Error: fetch thread stopped unexpectedly");
                }
            }
        }
    }

    fn apply_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Complete {
                query,
                table,
                elapsed,
            } => {
                if table.is_empty() {
                    info!(mba = query.area.code(), "no data for range");
                    let message = format!(
                        "No data available for {} in the selected date range.",
                        query.area.label()
                    );
                    self.control_panel.set_status(StatusKind::Warning, &message);
                    self.chart_viewer.set_notice(Notice::Warning {
                        message,
                        hint: "Try selecting a different date range or Market Balance Area."
                            .to_string(),
                    });
                    return;
                }

                let span = table.time_span().ok().flatten().map(|(first, last)| {
                    (
                        first.with_timezone(&self.offset).format("%Y-%m-%d %H:%M"),
                        last.with_timezone(&self.offset).format("%Y-%m-%d %H:%M"),
                    )
                });
                let message = match span {
                    Some((first, last)) => format!(
                        "Fetched {} records from {} to {}",
                        table.len(),
                        first,
                        last
                    ),
                    None => format!("Fetched {} records", table.len()),
                };
                info!(rows = table.len(), elapsed_ms = elapsed.as_millis() as u64, "fetch complete");

                self.control_panel.set_status(StatusKind::Success, &message);
                self.control_panel.export_enabled = true;
                self.chart_viewer.set_prices(query, table);
            }
            FetchResult::Error { query, error } => {
                warn!(mba = query.area.code(), error = %error, "fetch failed");
                let message = match &error {
                    FetchError::Api(_) => format!("API request failed: {}", error),
                    _ => error.to_string(),
                };
                self.control_panel
                    .set_status(StatusKind::Error, &format!("Error: {}", error));
                self.chart_viewer.set_notice(Notice::Error {
                    message,
                    hint: error.hint().to_string(),
                });
            }
        }
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::Fetch | ControlPanelAction::QueryChanged => self.start_fetch(),
            ControlPanelAction::ExportCsv => self.handle_export_csv(),
            ControlPanelAction::ExportPng => self.handle_export_png(),
            ControlPanelAction::None => {}
        }
    }

    /// Handle CSV export of the fetched data
    fn handle_export_csv(&mut self) {
        let Some(loaded) = &self.chart_viewer.loaded else {
            self.control_panel
                .set_status(StatusKind::Warning, "No data to export");
            return;
        };

        let settings = &self.control_panel.settings;
        let file_name =
            CsvExporter::default_file_name(loaded.query.area, loaded.query.start, loaded.query.end);

        // Ask user for output location
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&file_name)
            .save_file()
        else {
            return; // User cancelled
        };

        match CsvExporter::write_csv(&loaded.table, settings.csv_layout, self.offset, &path) {
            Ok(rows) => {
                info!(path = %path.display(), rows, "CSV exported");
                self.control_panel.set_status(
                    StatusKind::Success,
                    &format!("CSV exported: {} rows to {}", rows, path.display()),
                );
            }
            Err(e) => {
                warn!(error = %e, "CSV export failed");
                self.control_panel
                    .set_status(StatusKind::Error, &format!("Export error: {}", e));
            }
        }
    }

    /// Handle PNG export of the current chart
    fn handle_export_png(&mut self) {
        let fields = self.control_panel.settings.visible_fields();
        let sales_color = self.control_panel.settings.sales_color;

        let file_name = match &self.chart_viewer.loaded {
            Some(loaded) => format!(
                "esett_chart_{}_{}_{}.png",
                loaded.query.area.short_name(),
                loaded.query.start,
                loaded.query.end
            ),
            None => {
                self.control_panel
                    .set_status(StatusKind::Warning, "No chart to export");
                return;
            }
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(&file_name)
            .save_file()
        else {
            return;
        };

        let result = match self.chart_viewer.chart_data(&fields) {
            Ok(Some(chart)) => {
                StaticChartRenderer::render_png(chart, sales_color, &path, PNG_WIDTH, PNG_HEIGHT)
                    .map_err(|e| e.to_string())
            }
            Ok(None) => Err("No chart to export".to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => {
                info!(path = %path.display(), "chart exported");
                self.control_panel.set_status(
                    StatusKind::Success,
                    &format!("Chart saved to {}", path.display()),
                );
            }
            Err(e) => {
                warn!(error = %e, "chart export failed");
                self.control_panel
                    .set_status(StatusKind::Error, &format!("Render error: {}", e));
            }
        }
    }
}

impl eframe::App for EsettViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_fetch_results();
        self.control_panel.is_fetching = self.is_fetching;

        // Request repaint while fetching
        if self.is_fetching {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    self.handle_action(action);
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer
                .show(ui, &self.control_panel.settings, self.is_fetching);
        });
    }
}
