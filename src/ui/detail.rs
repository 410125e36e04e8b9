use std::collections::HashMap;

use eframe::egui::{self, Color32, RichText, ScrollArea, TextureHandle, Ui};

use super::figure;
use crate::config::ViewerConfig;
use crate::pipeline::moment::DetailFigures;
use crate::pipeline::render::{format_tick, MomentFigure};
use crate::state::{AppState, DetailState, Page};

// ---------------------------------------------------------------------------
// Detail page
// ---------------------------------------------------------------------------

pub fn show(ctx: &egui::Context, state: &mut AppState) {
    let mut back = false;
    let AppState {
        config,
        page,
        status_message,
        ..
    } = state;
    let Page::Detail(detail) = page else {
        return;
    };

    egui::SidePanel::left("detail_controls")
        .default_width(240.0)
        .resizable(true)
        .show(ctx, |ui| {
            back = controls(ui, detail, config);
        });

    detail.refresh(config);

    egui::CentralPanel::default().show(ctx, |ui| {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                let source = &detail.context.source;
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.heading(&source.name);
                });
                if !source.description.is_empty() {
                    ui.label(&source.description);
                }
                ui.separator();

                match &detail.outcome {
                    None => {}
                    Some(Err(msg)) => {
                        ui.label(
                            RichText::new(format!("Plots for this source are unavailable: {msg}"))
                                .color(Color32::RED),
                        );
                    }
                    Some(Ok(figs)) => {
                        let panels = figure_panels(figs, &source.name, &detail.request.molecule);
                        let textures = &mut detail.textures;
                        ui.columns(panels.len(), |cols| {
                            for (ui, panel) in cols.iter_mut().zip(&panels) {
                                if let Some(err) = figure_panel(ui, textures, panel) {
                                    *status_message = Some(err);
                                }
                            }
                        });
                        if let Some(rms) = figs.continuum_rms {
                            ui.label(format!(
                                "Continuum RMS: measured {rms:.3e}, catalog {}",
                                source.cont_rms
                            ));
                        }
                    }
                }
            });
    });

    if back {
        state.return_back();
    }
}

/// Left panel controls. Returns whether "Return Back" was clicked.
fn controls(ui: &mut Ui, detail: &mut DetailState, config: &ViewerConfig) -> bool {
    let back = ui.button("Return Back").clicked();
    ui.separator();

    ui.strong("Select the molecule:");
    egui::ComboBox::from_id_salt("molecule")
        .selected_text(detail.request.molecule.clone())
        .width(220.0)
        .show_ui(ui, |ui: &mut Ui| {
            for mol in &config.molecules {
                ui.selectable_value(&mut detail.request.molecule, mol.clone(), mol);
            }
        });
    ui.add_space(8.0);

    ui.strong("Zoom level (RA/Dec square size in arcsec):");
    ui.add(
        egui::Slider::new(&mut detail.request.zoom_arcsec, config.zoom.min..=config.zoom.max)
            .step_by(1.0)
            .suffix("″"),
    );
    ui.add_space(8.0);

    ui.checkbox(&mut detail.request.show_continuum, "Show continuum");
    ui.checkbox(&mut detail.request.show_contours, "Continuum contours");
    ui.separator();

    let source = &detail.context.source;
    egui::Grid::new("source_info")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for (key, value) in [
                ("Class", source.class().to_string()),
                ("R.A.", source.ra.clone()),
                ("Dec.", source.dec.clone()),
                ("Distance", format!("{} pc", source.distance)),
                ("T_bol", format!("{} K", source.t_bol)),
                ("L_bol", format!("{} L_sun", source.l_bol)),
                ("v_sys", format!("{} km/s", source.v_sys)),
            ] {
                ui.label(key);
                ui.label(value);
                ui.end_row();
            }
        });
    back
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

struct FigurePanel<'a> {
    key: &'static str,
    title: String,
    export_name: String,
    figure: &'a MomentFigure,
}

fn figure_panels<'a>(figs: &'a DetailFigures, source: &str, molecule: &str) -> Vec<FigurePanel<'a>> {
    let mut panels = Vec::with_capacity(3);
    if let Some(cont) = &figs.continuum {
        panels.push(FigurePanel {
            key: "continuum",
            title: format!("Continuum of {source}"),
            export_name: format!("{source}_continuum.png"),
            figure: cont,
        });
    }
    panels.push(FigurePanel {
        key: "mom8",
        title: format!("Moment 8 map of {molecule}"),
        export_name: format!("{source}_{molecule}_mom8.png"),
        figure: &figs.mom8,
    });
    panels.push(FigurePanel {
        key: "mom9",
        title: format!("Moment 9 map of {molecule}"),
        export_name: format!("{source}_{molecule}_mom9.png"),
        figure: &figs.mom9,
    });
    panels
}

/// Returns an error message if an export failed.
fn figure_panel(
    ui: &mut Ui,
    textures: &mut HashMap<&'static str, TextureHandle>,
    panel: &FigurePanel<'_>,
) -> Option<String> {
    let fig = panel.figure;
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&panel.title);
    });
    let texture = figure::texture(ui.ctx(), textures, panel.key, fig).clone();
    let side = (ui.available_width() - 100.0).clamp(150.0, 600.0);
    figure::show(ui, fig, &texture, side);

    let span = fig.range.max() - fig.range.min();
    ui.label(format!(
        "Display range: {} to {}",
        format_tick(fig.range.min(), span),
        format_tick(fig.range.max(), span)
    ));

    if ui.button("Export PNG…").clicked() {
        return figure::export_dialog(fig, &panel.export_name);
    }
    None
}
