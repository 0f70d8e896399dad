//! Control Panel Widget
//! Left side panel with area, date range and price type selectors.

use crate::charts::SALES_COLOR;
use crate::data::{CsvLayout, MarketArea, PriceField, PriceQuery};
use chrono::{Duration, NaiveDate};
use egui::{Color32, ComboBox, RichText};
use egui_extras::DatePickerButton;

const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
const WARNING_COLOR: Color32 = Color32::from_rgb(230, 160, 20);

/// User selections driving fetch and display.
#[derive(Clone, Debug, PartialEq)]
pub struct UserSettings {
    pub area: MarketArea,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Visibility per field, indexed like `PriceField::ALL`
    pub visible: [bool; PriceField::ALL.len()],
    pub sales_color: Color32,
    pub csv_layout: CsvLayout,
}

impl UserSettings {
    /// Defaults: first area, the last `lookback_days` up to `today`.
    ///
    /// A lookback that does not fit the calendar starts the range at `today`.
    pub fn new(today: NaiveDate, lookback_days: i64) -> Self {
        let start = Duration::try_days(lookback_days)
            .and_then(|days| today.checked_sub_signed(days))
            .unwrap_or(today);
        Self {
            area: MarketArea::default(),
            start,
            end: today,
            visible: PriceField::ALL.map(PriceField::default_visible),
            sales_color: SALES_COLOR,
            csv_layout: CsvLayout::default(),
        }
    }

    pub fn query(&self) -> PriceQuery {
        PriceQuery::new(self.area, self.start, self.end)
    }

    pub fn visible_fields(&self) -> Vec<PriceField> {
        PriceField::ALL
            .into_iter()
            .zip(self.visible)
            .filter(|(_, shown)| *shown)
            .map(|(field, _)| field)
            .collect()
    }

    /// End date cannot be in the future.
    pub fn clamp_to_today(&mut self, today: NaiveDate) {
        if self.end > today {
            self.end = today;
        }
    }
}

/// Severity of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Left side control panel with query selectors and export buttons.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub today: NaiveDate,
    pub status: String,
    pub status_kind: StatusKind,
    pub is_fetching: bool,
    pub export_enabled: bool,
    /// Query as of the end of the previous frame
    last_query: PriceQuery,
}

impl ControlPanel {
    pub fn new(today: NaiveDate, lookback_days: i64) -> Self {
        let settings = UserSettings::new(today, lookback_days);
        Self {
            last_query: settings.query(),
            settings,
            today,
            status: "Ready".to_string(),
            status_kind: StatusKind::Info,
            is_fetching: false,
            export_enabled: false,
        }
    }

    /// Set status line
    pub fn set_status(&mut self, kind: StatusKind, status: &str) {
        self.status_kind = kind;
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("⚡ eSett Price Viewer")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Imbalance and regulation prices")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Market Area Section =====
        ui.label(RichText::new("🗺 Market Balance Area").size(14.0).strong());
        ui.add_space(5.0);

        ComboBox::from_id_salt("market_area")
            .width(220.0)
            .selected_text(self.settings.area.label())
            .show_ui(ui, |ui| {
                for area in MarketArea::ALL {
                    ui.selectable_value(&mut self.settings.area, area, area.label());
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Date Range Section =====
        ui.label(RichText::new("📅 Date Range").size(14.0).strong());
        ui.add_space(5.0);

        let label_width = 80.0;
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Start Date:"));
            ui.add(DatePickerButton::new(&mut self.settings.start).id_salt("start_date"));
        });
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("End Date:"));
            ui.add(DatePickerButton::new(&mut self.settings.end).id_salt("end_date"));
        });
        self.settings.clamp_to_today(self.today);

        let range_valid = self.settings.query().is_valid_range();
        if !range_valid {
            ui.label(
                RichText::new("Start date must not be after the end date")
                    .size(11.0)
                    .color(ERROR_COLOR),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Price Types Section =====
        ui.label(RichText::new("💶 Price Types").size(14.0).strong());
        ui.add_space(5.0);

        for (i, field) in PriceField::ALL.into_iter().enumerate() {
            if field == PriceField::MainDirection {
                ui.add_space(5.0);
                ui.label(RichText::new("Additional Data").size(12.0).strong());
            }
            ui.horizontal(|ui| {
                ui.checkbox(&mut self.settings.visible[i], field.label());
                if field == PriceField::ImbalanceSales {
                    ui.color_edit_button_srgba(&mut self.settings.sales_color);
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(range_valid && !self.is_fetching, |ui| {
                let button = egui::Button::new(RichText::new("▶ Fetch Data").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Fetch;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.export_enabled, |ui| {
                ui.horizontal(|ui| {
                    ui.radio_value(&mut self.settings.csv_layout, CsvLayout::Long, "Long");
                    ui.radio_value(&mut self.settings.csv_layout, CsvLayout::Wide, "Wide");
                });
                let csv_button = egui::Button::new(RichText::new("⬇ Download CSV").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(csv_button).clicked() {
                    action = ControlPanelAction::ExportCsv;
                }

                ui.add_space(4.0);

                let png_button = egui::Button::new(RichText::new("🖼 Save Chart PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            if self.is_fetching {
                ui.spinner();
            }
            let status_color = match self.status_kind {
                StatusKind::Error => ERROR_COLOR,
                StatusKind::Success => SUCCESS_COLOR,
                StatusKind::Warning => WARNING_COLOR,
                StatusKind::Info => Color32::GRAY,
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        });

        // A changed filter discards the current data and re-fetches
        let query = self.settings.query();
        if action == ControlPanelAction::None && query != self.last_query {
            action = ControlPanelAction::QueryChanged;
        }
        self.last_query = query;

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Fetch,
    QueryChanged,
    ExportCsv,
    ExportPng,
}
