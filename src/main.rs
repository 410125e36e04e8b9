mod app;
mod color;
mod config;
mod data;
mod error;
mod fits;
mod pipeline;
mod state;
mod ui;

use app::EdiskApp;
use config::ViewerConfig;
use data::model::SourceCatalog;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::load().unwrap_or_else(|e| {
        log::error!("Invalid configuration, using defaults: {e:#}");
        ViewerConfig::default()
    });

    let mut startup_error = None;
    let catalog = data::loader::load_catalog(&config.catalog_path).unwrap_or_else(|e| {
        log::error!("Failed to load catalog: {e:#}");
        startup_error = Some(format!("Error: {e:#}"));
        SourceCatalog::default()
    });
    log::info!(
        "Loaded {} sources from {}",
        catalog.len(),
        config.catalog_path.display()
    );

    let mut state = AppState::new(config, catalog);
    state.status_message = startup_error;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "eDisk Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(EdiskApp::new(state)))),
    )
}
