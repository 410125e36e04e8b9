use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{GridMark, LineStyle, Plot, PlotPoint, Points, Text, VLine};

use crate::color::generate_palette;
use crate::data::model::{ProtostarClass, SourceRecord, CLASS_0_MAX_TBOL, CLASS_I_MAX_TBOL};
use crate::state::AppState;

const INTRO: &str = "Early Planet Formation in Embedded Disks (eDisk) is an ALMA Large \
Program that surveyed 19 Class 0/I protostars in nearby star-forming regions at \
resolutions of about 5 au (0.04\"), looking for substructures that could mark \
the onset of planet formation.";

/// Visible catalog columns; v_sys, cont_rms and Description stay hidden.
pub const TABLE_COLUMNS: [&str; 7] = [
    "Source",
    "R.A. (hh:mm:ss)",
    "Dec. (dd:mm:ss)",
    "Distance (pc)",
    "T_bol (K)",
    "L_bol (L_sun)",
    "Class",
];

/// Plot ranges in log10 units: 10-1000 K and 0.1-100 L_sun.
const LOG_T_RANGE: (f64, f64) = (1.0, 3.0);
const LOG_L_RANGE: (f64, f64) = (-1.0, 2.0);

// ---------------------------------------------------------------------------
// Overview page
// ---------------------------------------------------------------------------

pub fn show(ctx: &egui::Context, state: &mut AppState) {
    let mut submit = false;

    egui::CentralPanel::default().show(ctx, |ui| {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                ui.heading("The eDisk program");
                ui.label(
                    RichText::new("When do substructures start to develop in disks?")
                        .italics()
                        .color(Color32::RED),
                );
                ui.label(INTRO);
                ui.separator();

                if state.catalog.is_empty() {
                    ui.label("No sources loaded.  (File → Open catalog…)");
                    return;
                }

                ui.columns(2, |cols| {
                    source_table(&mut cols[0], state);
                    lbol_tbol_plot(&mut cols[1], &state.catalog.sources);
                });

                ui.separator();
                ui.heading("Select a source to view:");
                ui.horizontal(|ui: &mut Ui| {
                    let current = state.selected.clone().unwrap_or_default();
                    egui::ComboBox::from_id_salt("select_source")
                        .selected_text(&current)
                        .width(200.0)
                        .show_ui(ui, |ui: &mut Ui| {
                            for src in &state.catalog.sources {
                                if ui.selectable_label(current == src.name, &src.name).clicked() {
                                    state.selected = Some(src.name.clone());
                                }
                            }
                        });
                    submit = ui.button("Submit").clicked();
                });
            });
    });

    if submit {
        state.submit();
    }
}

// ---------------------------------------------------------------------------
// Catalog table
// ---------------------------------------------------------------------------

pub fn table_row(src: &SourceRecord) -> [String; 7] {
    [
        src.name.clone(),
        src.ra.clone(),
        src.dec.clone(),
        format!("{}", src.distance),
        format!("{}", src.t_bol),
        format!("{}", src.l_bol),
        src.class().to_string(),
    ]
}

fn source_table(ui: &mut Ui, state: &mut AppState) {
    let rows: Vec<[String; 7]> = state.catalog.sources.iter().map(table_row).collect();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(380.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto(), TABLE_COLUMNS.len())
        .header(20.0, |mut header| {
            for name in TABLE_COLUMNS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for row in &rows {
                body.row(18.0, |mut row_ui| {
                    let selected = state.selected.as_deref() == Some(row[0].as_str());
                    row_ui.col(|ui| {
                        if ui.selectable_label(selected, &row[0]).clicked() {
                            state.selected = Some(row[0].clone());
                        }
                    });
                    for cell in &row[1..] {
                        row_ui.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// L_bol vs T_bol diagram (log-log)
// ---------------------------------------------------------------------------

fn class_color(class: ProtostarClass, palette: &[Color32]) -> Color32 {
    let i = match class {
        ProtostarClass::Class0 => 0,
        ProtostarClass::ClassI => 1,
        ProtostarClass::ClassII => 2,
    };
    palette.get(i).copied().unwrap_or(Color32::LIGHT_BLUE)
}

/// Tick label for a log10 axis position.
pub fn log_tick_label(log_value: f64) -> String {
    let v = 10f64.powf(log_value);
    if v >= 1.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn lbol_tbol_plot(ui: &mut Ui, sources: &[SourceRecord]) {
    let palette = generate_palette(3);
    ui.strong("L_bol vs T_bol diagram of the eDisk sources");

    Plot::new("lbol_tbol_plot")
        .height(420.0)
        .x_axis_label("T_bol (K)")
        .y_axis_label("L_bol (L_sun)")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| log_tick_label(mark.value))
        .y_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| log_tick_label(mark.value))
        .label_formatter(|name, value| {
            let t = 10f64.powf(value.x);
            let l = 10f64.powf(value.y);
            if name.is_empty() {
                format!("T_bol = {t:.0} K\nL_bol = {l:.2} L_sun")
            } else {
                format!("{name}\nT_bol = {t:.0} K\nL_bol = {l:.2} L_sun")
            }
        })
        .include_x(LOG_T_RANGE.0)
        .include_x(LOG_T_RANGE.1)
        .include_y(LOG_L_RANGE.0)
        .include_y(LOG_L_RANGE.1)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for src in sources.iter().filter(|s| s.t_bol > 0.0 && s.l_bol > 0.0) {
                let point = [src.t_bol.log10(), src.l_bol.log10()];
                plot_ui.points(
                    Points::new(vec![point])
                        .name(&src.name)
                        .radius(5.0)
                        .color(class_color(src.class(), &palette)),
                );
            }

            for boundary in [CLASS_0_MAX_TBOL, CLASS_I_MAX_TBOL] {
                plot_ui.vline(
                    VLine::new(boundary.log10())
                        .style(LineStyle::dashed_loose())
                        .color(Color32::GRAY),
                );
            }
            for (t, label) in [(30.0f64, "Class 0"), (200.0f64, "Class I")] {
                plot_ui.text(Text::new(
                    PlotPoint::new(t.log10(), 70f64.log10()),
                    RichText::new(label).size(20.0).strong(),
                ));
            }
        });
}
