use std::collections::HashMap;

use eframe::egui::TextureHandle;

use crate::config::ViewerConfig;
use crate::data::model::SourceCatalog;
use crate::pipeline::moment::{render_detail, DetailContext, DetailFigures, DetailRequest};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which of the two pages is showing.
pub enum Page {
    Overview,
    Detail(DetailState),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Catalog loaded at startup (or through File → Open catalog…).
    pub catalog: SourceCatalog,

    /// Source chosen in the overview selector.
    pub selected: Option<String>,

    pub page: Page,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig, catalog: SourceCatalog) -> Self {
        let mut state = Self {
            config,
            catalog: SourceCatalog::default(),
            selected: None,
            page: Page::Overview,
            status_message: None,
        };
        state.set_catalog(catalog);
        state
    }

    /// Replace the catalog and go back to the overview.
    pub fn set_catalog(&mut self, catalog: SourceCatalog) {
        self.selected = catalog.sources.first().map(|s| s.name.clone());
        self.catalog = catalog;
        self.page = Page::Overview;
        self.status_message = None;
    }

    /// Open the detail page for the selected source.
    pub fn submit(&mut self) {
        let Some(source) = self
            .selected
            .as_deref()
            .and_then(|name| self.catalog.find(name))
        else {
            self.status_message = Some("Select a source first".to_string());
            return;
        };
        log::info!("Opening detail page for {}", source.name);
        let context = DetailContext::new(source.clone());
        self.page = Page::Detail(DetailState::new(context, &self.config));
        self.status_message = None;
    }

    pub fn return_back(&mut self) {
        self.page = Page::Overview;
    }
}

// ---------------------------------------------------------------------------
// Detail page state
// ---------------------------------------------------------------------------

/// Controls and last pipeline result of the detail page.
pub struct DetailState {
    pub context: DetailContext,
    /// Current control values.
    pub request: DetailRequest,
    /// Controls the current `outcome` was built from.
    rendered: Option<DetailRequest>,
    /// Figures, or the message of the error that aborted the render.
    pub outcome: Option<Result<DetailFigures, String>>,
    /// GPU textures of the current figures, keyed by figure name.
    pub textures: HashMap<&'static str, TextureHandle>,
}

impl DetailState {
    pub fn new(context: DetailContext, config: &ViewerConfig) -> Self {
        let request = DetailRequest::new(&context, config);
        Self {
            context,
            request,
            rendered: None,
            outcome: None,
            textures: HashMap::new(),
        }
    }

    /// Rerun the pipeline if any control changed since the last run.
    /// Returns whether it ran.
    pub fn refresh(&mut self, config: &ViewerConfig) -> bool {
        if self.rendered.as_ref() == Some(&self.request) {
            return false;
        }
        self.outcome = Some(render_detail(config, &self.context, &self.request).map_err(|e| {
            log::error!(
                "Rendering {} / {} failed: {e}",
                self.request.source,
                self.request.molecule
            );
            e.to_string()
        }));
        self.rendered = Some(self.request.clone());
        self.textures.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_catalog;

    const CSV: &str = "\
Source,RA,Dec,Distance,T_bol,L_bol,v_sys,cont_rms,Description
Ced110IRS4,11:06:46.37,-77:22:32.6,189,68,1.0,4.7,0.02,Class 0 binary
L1489IRS,04:04:43.07,26:18:56.2,146,213,3.4,7.3,0.03,Class I disk
";

    fn state() -> AppState {
        let mut config = ViewerConfig::default();
        config.data_root = "/nonexistent/edisk".into();
        AppState::new(config, read_catalog(CSV.as_bytes()).unwrap())
    }

    #[test]
    fn first_source_is_preselected() {
        let s = state();
        assert_eq!(s.selected.as_deref(), Some("Ced110IRS4"));
        assert!(matches!(s.page, Page::Overview));
    }

    #[test]
    fn submit_and_return() {
        let mut s = state();
        s.selected = Some("L1489IRS".to_string());
        s.submit();
        let Page::Detail(detail) = &s.page else {
            panic!("expected detail page");
        };
        assert_eq!(detail.context.source.name, "L1489IRS");
        assert_eq!(detail.request.zoom_arcsec, 15);

        s.return_back();
        assert!(matches!(s.page, Page::Overview));
    }

    #[test]
    fn submit_without_selection_stays_on_overview() {
        let mut s = state();
        s.selected = Some("Unknown".to_string());
        s.submit();
        assert!(matches!(s.page, Page::Overview));
        assert!(s.status_message.is_some());
    }

    #[test]
    fn refresh_runs_once_per_change() {
        let mut s = state();
        s.submit();
        let config = s.config.clone();
        let Page::Detail(detail) = &mut s.page else {
            panic!("expected detail page");
        };
        assert!(detail.refresh(&config));
        assert!(matches!(detail.outcome, Some(Err(_))));
        assert!(!detail.refresh(&config));

        detail.request.zoom_arcsec = 5;
        assert!(detail.refresh(&config));
    }
}
