/// egui rendering: one module per page plus shared panels and the figure
/// painter used by the detail page.

pub mod detail;
pub mod figure;
pub mod overview;
pub mod panels;
