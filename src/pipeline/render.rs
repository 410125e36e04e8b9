//! Colorscale rendering of a single FITS plane.
//!
//! ```text
//!  ImageUnit ──► normalise (DisplayRange) ──► Stretch ──► Colormap LUT ──► RGBA
//!      │
//!      ├──► Colorbar   (gradient + ticks + BUNIT)
//!      ├──► ScaleBar   (arcsec → AU via distance)
//!      └──► BeamMarker (BMAJ/BMIN/BPA → pixel ellipse axes)
//! ```
//!
//! Everything here is in image pixel space; mapping to screen happens in
//! `ui::figure`.

use eframe::egui::Color32;

use super::contour::{contour_segments, Segment};
use super::stats::DisplayRange;
use super::view::ViewWindow;
use crate::color::Colormap;
use crate::error::Result;
use crate::fits::{ImageUnit, Wcs};

/// Softening parameter of the arcsinh stretch: the midpoint sits 1/30 of
/// the range below the minimum.
pub const ASINH_A: f64 = 1.0 / 30.0;
/// Entries in the per-figure colour lookup table.
const LUT_SIZE: usize = 256;
/// Colorbar gradient resolution.
const COLORBAR_STEPS: usize = 256;
const COLORBAR_TICKS: usize = 5;

pub const SCALE_BAR_LINE_WIDTH: f32 = 5.0;
pub const SCALE_BAR_FONT_SIZE: f32 = 20.0;
pub const BEAM_COLOR: Color32 = Color32::BLACK;
pub const CONTOUR_COLOR: Color32 = Color32::BLACK;

// ---------------------------------------------------------------------------
// Stretch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stretch {
    Linear,
    /// `asinh(x / a) / asinh(1 / a)`
    Arcsinh,
}

impl Stretch {
    /// Apply to a normalised value in `[0, 1]`.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Stretch::Linear => x,
            Stretch::Arcsinh => (x / ASINH_A).asinh() / (1.0 / ASINH_A).asinh(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// Fixed screen corner for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    /// Gradient from `min` (index 0) to `max`.
    pub colors: Vec<Color32>,
    /// Tick position along the bar in `[0, 1]` and its label.
    pub ticks: Vec<(f64, String)>,
    /// Physical unit of the image.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    /// Bar length in image pixels.
    pub length_px: f64,
    pub label: String,
    pub color: Color32,
    pub corner: Corner,
    pub line_width: f32,
    pub font_size: f32,
}

impl ScaleBar {
    /// Bar of `arcsec` on the sky, labelled with the projected length at
    /// `distance_pc` (1″ at 1 pc is 1 AU).
    pub fn new(arcsec: f64, distance_pc: f64, pixel_scale_deg: f64, color: Color32) -> Self {
        Self {
            length_px: arcsec / 3600.0 / pixel_scale_deg,
            label: format!("{} AU", physical_length_au(arcsec, distance_pc)),
            color,
            corner: Corner::BottomRight,
            line_width: SCALE_BAR_LINE_WIDTH,
            font_size: SCALE_BAR_FONT_SIZE,
        }
    }
}

pub fn physical_length_au(arcsec: f64, distance_pc: f64) -> f64 {
    arcsec * distance_pc
}

/// Restoring beam as two full-width pixel-space axis vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamMarker {
    pub major: (f64, f64),
    pub minor: (f64, f64),
    pub color: Color32,
    pub corner: Corner,
    pub frame: bool,
}

impl BeamMarker {
    /// `bmaj`/`bmin` FWHM and `bpa` (east of north), all degrees.
    pub fn new(wcs: &Wcs, bmaj: f64, bmin: f64, bpa: f64) -> Self {
        let pa = bpa.to_radians();
        let (sin, cos) = pa.sin_cos();
        Self {
            major: wcs.sky_offset_to_pixel(bmaj * sin, bmaj * cos),
            minor: wcs.sky_offset_to_pixel(bmin * cos, -bmin * sin),
            color: BEAM_COLOR,
            corner: Corner::BottomLeft,
            frame: true,
        }
    }

    /// Outline as `n` points relative to the beam centre, in pixels.
    pub fn outline(&self, n: usize) -> Vec<(f64, f64)> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                let (s, c) = t.sin_cos();
                (
                    0.5 * (c * self.major.0 + s * self.minor.0),
                    0.5 * (c * self.major.1 + s * self.minor.1),
                )
            })
            .collect()
    }

    /// Half extents of the outline's bounding box.
    pub fn half_extent(&self) -> (f64, f64) {
        (
            0.5 * self.major.0.hypot(self.minor.0),
            0.5 * self.major.1.hypot(self.minor.1),
        )
    }
}

/// Style and placement shared by every figure of one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub scale_bar_arcsec: f64,
    pub distance_pc: f64,
    pub scale_bar_color: Color32,
}

/// Contour lines of another image, already in this figure's pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourOverlay {
    pub segments: Vec<Segment>,
    pub color: Color32,
}

// ---------------------------------------------------------------------------
// MomentFigure
// ---------------------------------------------------------------------------

/// A rendered colorscale image with its annotations and current view.
#[derive(Debug, Clone)]
pub struct MomentFigure {
    pub width: usize,
    pub height: usize,
    /// RGBA bytes, top row first (north up).
    pub rgba: Vec<u8>,
    pub range: DisplayRange,
    pub colormap: Colormap,
    pub stretch: Stretch,
    pub colorbar: Colorbar,
    pub scale_bar: ScaleBar,
    pub beam: BeamMarker,
    pub overlays: Vec<ContourOverlay>,
    pub view: ViewWindow,
    pub wcs: Wcs,
}

impl MomentFigure {
    pub fn render(
        image: &ImageUnit,
        range: DisplayRange,
        colormap: Colormap,
        stretch: Stretch,
        annotation: &Annotation,
    ) -> Result<Self> {
        let (bmaj, bmin, bpa) = image.beam()?;
        let lut = colormap.lut(LUT_SIZE);
        let to_color = |v: f64| -> [u8; 4] {
            if !v.is_finite() {
                return [0, 0, 0, 0];
            }
            let t = stretch.apply(range.normalize(v));
            let idx = (t * (LUT_SIZE - 1) as f64).round() as usize;
            lut[idx.min(LUT_SIZE - 1)].to_array()
        };

        let (w, h) = (image.width, image.height);
        let mut rgba = Vec::with_capacity(w * h * 4);
        for row in (0..h).rev() {
            for v in &image.data[row * w..(row + 1) * w] {
                rgba.extend_from_slice(&to_color(*v));
            }
        }

        let (scale_x, _) = image.wcs.pixel_scale();
        log::debug!(
            "Rendered {w}x{h} with {colormap} / {stretch:?}, range [{}, {}]",
            range.min(),
            range.max()
        );

        Ok(Self {
            width: w,
            height: h,
            rgba,
            range,
            colormap,
            stretch,
            colorbar: build_colorbar(range, colormap, stretch, image.header.bunit()),
            scale_bar: ScaleBar::new(
                annotation.scale_bar_arcsec,
                annotation.distance_pc,
                scale_x,
                annotation.scale_bar_color,
            ),
            beam: BeamMarker::new(&image.wcs, bmaj, bmin, bpa),
            overlays: Vec::new(),
            view: ViewWindow::full(w, h),
            wcs: image.wcs.clone(),
        })
    }

    /// Overlay contours of `other` (on any grid) at `levels`.
    pub fn add_contours(&mut self, other: &ImageUnit, levels: &[f64]) {
        let to_here = |(x, y): (f64, f64)| -> Option<(f64, f64)> {
            let (ra, dec) = other.wcs.pixel_to_world(x, y)?;
            self.wcs.world_to_pixel(ra, dec)
        };
        let segments: Vec<Segment> = levels
            .iter()
            .flat_map(|&level| contour_segments(other, level))
            .filter_map(|[a, b]| Some([to_here(a)?, to_here(b)?]))
            .collect();
        log::debug!("Overlaying {} contour segments", segments.len());
        self.overlays.push(ContourOverlay {
            segments,
            color: CONTOUR_COLOR,
        });
    }

    /// RGBA of the pixel in FITS coordinates (x right, y up).
    #[cfg(test)]
    pub fn pixel_rgba(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = self.height - 1 - y;
        let i = (row * self.width + x) * 4;
        self.rgba.get(i..i + 4)?.try_into().ok()
    }
}

fn build_colorbar(range: DisplayRange, colormap: Colormap, stretch: Stretch, unit: &str) -> Colorbar {
    let colors = (0..COLORBAR_STEPS)
        .map(|i| colormap.color_at(i as f64 / (COLORBAR_STEPS - 1) as f64))
        .collect();
    let span = range.max() - range.min();
    let ticks = (0..COLORBAR_TICKS)
        .map(|i| {
            let v = range.min() + span * i as f64 / (COLORBAR_TICKS - 1) as f64;
            (stretch.apply(range.normalize(v)), format_tick(v, span))
        })
        .collect();
    Colorbar {
        colors,
        ticks,
        label: unit.to_string(),
    }
}

/// Format with enough decimals to tell ticks `span / 4` apart.
pub fn format_tick(value: f64, span: f64) -> String {
    let step = span / (COLORBAR_TICKS - 1) as f64;
    let decimals = if step > 0.0 {
        (1.0 - step.log10().floor()).clamp(0.0, 6.0) as usize
    } else {
        2
    };
    if value.abs() >= 1e4 || (value != 0.0 && value.abs() < 1e-4) {
        format!("{value:.2e}")
    } else {
        format!("{value:.decimals$}")
    }
}
