//! eSett Price Viewer - Interactive imbalance price charts
//!
//! Fetches imbalance and regulation prices from the eSett OpenData API and
//! displays them as interactive charts with CSV export.

mod api;
mod charts;
mod config;
mod data;
mod gui;
mod stats;

use api::EsettClient;
use config::AppConfig;
use eframe::egui;
use gui::EsettViewerApp;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("esett_viewer=info,warn")),
        )
        .with_target(true)
        .init();

    let config = AppConfig::from_env();
    info!(
        base_url = %config.api_base_url,
        timeout_secs = config.timeout_secs,
        offset = %config.offset_label(),
        "starting eSett Price Viewer"
    );

    let client = EsettClient::new(config.api_base_url.clone(), config.timeout())?;

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("eSett Price Viewer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "eSett Price Viewer",
        options,
        Box::new(move |cc| Ok(Box::new(EsettViewerApp::new(cc, config, client)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start UI: {}", e))
}
