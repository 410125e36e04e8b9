use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::ViewerConfig;
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open catalog…").clicked() {
                open_catalog_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        match &state.page {
            Page::Overview => {
                ui.label(format!("{} sources", state.catalog.len()));
            }
            Page::Detail(detail) => {
                ui.label(format!(
                    "{} / {}",
                    detail.context.source.name, detail.request.molecule
                ));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Footer
// ---------------------------------------------------------------------------

pub fn footer(ui: &mut Ui, config: &ViewerConfig) {
    if config.footer.is_empty() {
        return;
    }
    ui.with_layout(egui::Layout::top_down(egui::Align::Max), |ui: &mut Ui| {
        for line in &config.footer {
            ui.label(RichText::new(line).color(Color32::GRAY));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_catalog_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open source catalog")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_catalog(&path) {
            Ok(catalog) => {
                log::info!("Loaded {} sources from {}", catalog.len(), path.display());
                state.config.catalog_path = path;
                state.set_catalog(catalog);
            }
            Err(e) => {
                log::error!("Failed to load catalog: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
