use eframe::egui;

use crate::state::{AppState, Page};
use crate::ui::{detail, overview, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EdiskApp {
    pub state: AppState,
}

impl EdiskApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for EdiskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: footer ----
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            panels::footer(ui, &self.state.config);
        });

        // ---- Page ----
        match &self.state.page {
            Page::Overview => overview::show(ctx, &mut self.state),
            Page::Detail(_) => detail::show(ctx, &mut self.state),
        }
    }
}
