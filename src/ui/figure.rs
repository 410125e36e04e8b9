use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{
    self, Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, Shape, Stroke, TextureHandle,
    TextureOptions, Ui, Vec2,
};

use crate::pipeline::render::{Corner, MomentFigure};

/// Gap between the image edge and corner annotations, screen points.
const MARGIN: f32 = 16.0;
const COLORBAR_WIDTH: f32 = 18.0;
const COLORBAR_GAP: f32 = 10.0;
/// Room for colorbar tick labels and the unit.
const COLORBAR_LABELS: f32 = 70.0;
const BEAM_SEGMENTS: usize = 48;

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

/// Texture for `figure`, uploaded on first use and cached under `key`.
pub fn texture<'a>(
    ctx: &egui::Context,
    cache: &'a mut HashMap<&'static str, TextureHandle>,
    key: &'static str,
    figure: &MomentFigure,
) -> &'a TextureHandle {
    cache.entry(key).or_insert_with(|| {
        let image = ColorImage::from_rgba_unmultiplied([figure.width, figure.height], &figure.rgba);
        ctx.load_texture(key, image, TextureOptions::NEAREST)
    })
}

// ---------------------------------------------------------------------------
// Screen mapping
// ---------------------------------------------------------------------------

/// Maps continuous image pixel coordinates into a screen rect showing the
/// figure's current view (north up).
struct ScreenMap {
    rect: Rect,
    x0: f64,
    y0: f64,
    /// Screen points per image pixel.
    scale: f32,
}

impl ScreenMap {
    fn new(rect: Rect, figure: &MomentFigure) -> Self {
        Self {
            rect,
            x0: figure.view.x0,
            y0: figure.view.y0,
            scale: rect.width() / figure.view.width() as f32,
        }
    }

    fn to_screen(&self, (x, y): (f64, f64)) -> Pos2 {
        Pos2::new(
            self.rect.left() + (x - self.x0) as f32 * self.scale,
            self.rect.bottom() - (y - self.y0) as f32 * self.scale,
        )
    }

    fn to_image(&self, pos: Pos2) -> (f64, f64) {
        (
            self.x0 + f64::from((pos.x - self.rect.left()) / self.scale),
            self.y0 + f64::from((self.rect.bottom() - pos.y) / self.scale),
        )
    }
}

// ---------------------------------------------------------------------------
// Figure widget
// ---------------------------------------------------------------------------

/// Paint a figure with its colorbar into `side`×`side` points (image part).
pub fn show(ui: &mut Ui, figure: &MomentFigure, texture: &TextureHandle, side: f32) {
    let view = figure.view;
    let aspect = (view.height() / view.width()) as f32;
    let image_size = Vec2::new(side, side * aspect);
    let total = image_size + Vec2::new(COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_LABELS, 0.0);
    let (outer, response) = ui.allocate_exact_size(total, Sense::hover());
    let rect = Rect::from_min_size(outer.min, image_size);
    let map = ScreenMap::new(rect, figure);
    let painter = ui.painter_at(rect);

    let (u0, v0, u1, v1) = view.uv(figure.width, figure.height);
    painter.image(
        texture.id(),
        rect,
        Rect::from_min_max(Pos2::new(u0, v0), Pos2::new(u1, v1)),
        Color32::WHITE,
    );

    for overlay in &figure.overlays {
        let stroke = Stroke::new(1.0, overlay.color);
        for [a, b] in &overlay.segments {
            painter.line_segment([map.to_screen(*a), map.to_screen(*b)], stroke);
        }
    }

    paint_scale_bar(&painter, &map, figure);
    paint_beam(&painter, &map, figure);
    ui.painter().add(frame(rect, Color32::BLACK));

    let bar = Rect::from_min_size(
        Pos2::new(rect.right() + COLORBAR_GAP, rect.top()),
        Vec2::new(COLORBAR_WIDTH, rect.height()),
    );
    paint_colorbar(ui.painter(), bar, figure);

    if let Some(pos) = response.hover_pos().filter(|p| rect.contains(*p)) {
        let (x, y) = map.to_image(pos);
        if let Some((ra, dec)) = figure.wcs.pixel_to_world(x, y) {
            response.on_hover_text(format!("RA {ra:.6}°  Dec {dec:.6}°"));
        }
    }
}

fn frame(rect: Rect, color: Color32) -> Shape {
    Shape::closed_line(
        vec![rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()],
        Stroke::new(1.0, color),
    )
}

fn paint_scale_bar(painter: &egui::Painter, map: &ScreenMap, figure: &MomentFigure) {
    let bar = &figure.scale_bar;
    let length = bar.length_px as f32 * map.scale;
    let y = map.rect.bottom() - MARGIN - bar.line_width / 2.0;
    let (start, end) = match bar.corner {
        Corner::BottomRight => {
            let right = map.rect.right() - MARGIN;
            (Pos2::new(right - length, y), Pos2::new(right, y))
        }
        Corner::BottomLeft => {
            let left = map.rect.left() + MARGIN;
            (Pos2::new(left, y), Pos2::new(left + length, y))
        }
    };
    painter.line_segment([start, end], Stroke::new(bar.line_width, bar.color));
    painter.text(
        Pos2::new((start.x + end.x) / 2.0, y - bar.line_width),
        Align2::CENTER_BOTTOM,
        &bar.label,
        FontId::proportional(bar.font_size),
        bar.color,
    );
}

fn paint_beam(painter: &egui::Painter, map: &ScreenMap, figure: &MomentFigure) {
    let beam = &figure.beam;
    let (hx, hy) = beam.half_extent();
    let half = Vec2::new(hx as f32, hy as f32) * map.scale;
    let center = match beam.corner {
        Corner::BottomLeft => Pos2::new(map.rect.left() + MARGIN + half.x, map.rect.bottom() - MARGIN - half.y),
        Corner::BottomRight => Pos2::new(map.rect.right() - MARGIN - half.x, map.rect.bottom() - MARGIN - half.y),
    };

    if beam.frame {
        let pad = Vec2::splat(4.0);
        let boxed = Rect::from_center_size(center, half * 2.0 + pad * 2.0);
        painter.add(Shape::convex_polygon(
            vec![boxed.left_top(), boxed.right_top(), boxed.right_bottom(), boxed.left_bottom()],
            Color32::WHITE,
            Stroke::new(1.0, Color32::BLACK),
        ));
    }

    let outline: Vec<Pos2> = beam
        .outline(BEAM_SEGMENTS)
        .into_iter()
        .map(|(dx, dy)| center + Vec2::new(dx as f32, -(dy as f32)) * map.scale)
        .collect();
    painter.add(Shape::convex_polygon(outline, beam.color, Stroke::NONE));
}

fn paint_colorbar(painter: &egui::Painter, bar: Rect, figure: &MomentFigure) {
    let colors = &figure.colorbar.colors;
    let n = colors.len().max(1) as f32;
    let step = bar.height() / n;
    for (i, color) in colors.iter().enumerate() {
        // Index 0 is the range minimum, drawn at the bottom.
        let bottom = bar.bottom() - i as f32 * step;
        let slice = Rect::from_min_max(
            Pos2::new(bar.left(), bottom - step - 0.5),
            Pos2::new(bar.right(), bottom),
        );
        painter.rect_filled(slice, 0.0, *color);
    }
    painter.add(frame(bar, Color32::BLACK));

    let text_color = painter.ctx().style().visuals.text_color();
    for (pos, label) in &figure.colorbar.ticks {
        let y = bar.bottom() - *pos as f32 * bar.height();
        painter.line_segment(
            [Pos2::new(bar.right(), y), Pos2::new(bar.right() + 4.0, y)],
            Stroke::new(1.0, text_color),
        );
        painter.text(
            Pos2::new(bar.right() + 6.0, y),
            Align2::LEFT_CENTER,
            label,
            FontId::proportional(12.0),
            text_color,
        );
    }
    painter.text(
        Pos2::new(bar.center().x, bar.top() - 4.0),
        Align2::CENTER_BOTTOM,
        &figure.colorbar.label,
        FontId::proportional(12.0),
        text_color,
    );
}

// ---------------------------------------------------------------------------
// PNG export
// ---------------------------------------------------------------------------

/// Write the pixels inside the figure's current view to a PNG file.
pub fn export_png(figure: &MomentFigure, path: &Path) -> Result<()> {
    let (w, h, pixels) = figure.view_pixels().context("cropping figure to view")?;
    let png = image::RgbaImage::from_raw(w as u32, h as u32, pixels)
        .context("pixel buffer does not match image size")?;
    png.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {w}x{h} figure to {}", path.display());
    Ok(())
}

/// Ask for a destination and export; errors become a status message.
pub fn export_dialog(figure: &MomentFigure, default_name: &str) -> Option<String> {
    let path = rfd::FileDialog::new()
        .set_title("Export figure")
        .set_file_name(default_name)
        .add_filter("PNG", &["png"])
        .save_file()?;
    export_png(figure, &path).err().map(|e| {
        log::error!("Export failed: {e:#}");
        format!("Error: {e:#}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Colormap;
    use crate::fits::header::HeaderValue;
    use crate::fits::wcs::tests::sin_header;
    use crate::fits::ImageUnit;
    use crate::pipeline::render::{Annotation, Stretch};
    use crate::pipeline::stats::finite_min_max;

    fn figure() -> MomentFigure {
        let mut h = sin_header();
        h.insert("BMAJ", HeaderValue::Float(0.1 / 3600.0));
        h.insert("BMIN", HeaderValue::Float(0.1 / 3600.0));
        let data: Vec<f64> = (0..64 * 64).map(f64::from).collect();
        let img = ImageUnit::from_parts(vec![64, 64], data.clone(), h).unwrap();
        MomentFigure::render(
            &img,
            finite_min_max(&data).unwrap(),
            Colormap::Inferno,
            Stretch::Linear,
            &Annotation {
                scale_bar_arcsec: 1.0,
                distance_pc: 140.0,
                scale_bar_color: Color32::WHITE,
            },
        )
        .unwrap()
    }

    #[test]
    fn screen_map_round_trips() {
        let fig = figure();
        let map = ScreenMap::new(Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::splat(640.0)), &fig);
        assert_eq!(map.scale, 10.0);
        // Bottom-left corner of the view is the rect's bottom-left.
        assert_eq!(map.to_screen((-0.5, -0.5)), Pos2::new(10.0, 660.0));
        let (x, y) = map.to_image(Pos2::new(330.0, 340.0));
        assert!((x - 31.5).abs() < 1e-4 && (y - 31.5).abs() < 1e-4);
    }

    #[test]
    fn export_writes_view_sized_png() {
        let mut fig = figure();
        // Centre on a pixel corner so the 20 px window lands on whole pixels.
        let (ra, dec) = fig.wcs.pixel_to_world(32.5, 32.5).unwrap();
        fig.recenter(ra, dec, 1.0 / 3600.0, 1.0 / 3600.0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mom8.png");
        export_png(&fig, &path).unwrap();

        let png = image::open(&path).unwrap();
        assert_eq!((png.width(), png.height()), (20, 20));
    }
}
