use super::render::MomentFigure;
use super::stats::PixelBounds;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// ViewWindow – the displayed part of a figure
// ---------------------------------------------------------------------------

/// Displayed region in continuous pixel coordinates: pixel `i` spans
/// `[i - 0.5, i + 0.5]`, so the whole image is `[-0.5, n - 0.5]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl ViewWindow {
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x0: -0.5,
            x1: width as f64 - 0.5,
            y0: -0.5,
            y1: height as f64 - 0.5,
        }
    }

    /// Window of `width`×`height` pixels around `(cx, cy)`, trimmed to the
    /// image. Fails when nothing is left.
    pub fn around(
        cx: f64,
        cy: f64,
        width: f64,
        height: f64,
        image_width: usize,
        image_height: usize,
    ) -> Result<Self> {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(PipelineError::InvalidWindow { width, height });
        }
        let full = Self::full(image_width, image_height);
        let trimmed = Self {
            x0: (cx - width / 2.0).max(full.x0),
            x1: (cx + width / 2.0).min(full.x1),
            y0: (cy - height / 2.0).max(full.y0),
            y1: (cy + height / 2.0).min(full.y1),
        };
        if trimmed.x1 <= trimmed.x0 || trimmed.y1 <= trimmed.y0 {
            return Err(PipelineError::RegionOutOfBounds {
                width: image_width,
                height: image_height,
            });
        }
        Ok(trimmed)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Texture coordinates `(u0, v0, u1, v1)` of this window in an image
    /// stored top row first.
    pub fn uv(&self, image_width: usize, image_height: usize) -> (f32, f32, f32, f32) {
        let (w, h) = (image_width as f64, image_height as f64);
        (
            ((self.x0 + 0.5) / w) as f32,
            (1.0 - (self.y1 + 0.5) / h) as f32,
            ((self.x1 + 0.5) / w) as f32,
            (1.0 - (self.y0 + 0.5) / h) as f32,
        )
    }

    /// Whole pixels covered by at least half their width.
    pub fn pixel_bounds(&self, image_width: usize, image_height: usize) -> Result<PixelBounds> {
        let edge = |v: f64, n: usize| ((v + 0.5).round().max(0.0) as usize).min(n);
        let b = PixelBounds {
            x0: edge(self.x0, image_width),
            x1: edge(self.x1, image_width),
            y0: edge(self.y0, image_height),
            y1: edge(self.y1, image_height),
        };
        if b.x1 <= b.x0 || b.y1 <= b.y0 {
            return Err(PipelineError::RegionOutOfBounds {
                width: image_width,
                height: image_height,
            });
        }
        Ok(b)
    }
}

// ---------------------------------------------------------------------------
// View controller
// ---------------------------------------------------------------------------

impl MomentFigure {
    /// Show a `width_deg`×`height_deg` window centred on (`ra`, `dec`).
    /// Only the view changes; pixels, range and annotations are untouched.
    pub fn recenter(&mut self, ra: f64, dec: f64, width_deg: f64, height_deg: f64) -> Result<()> {
        if !(width_deg > 0.0 && height_deg > 0.0) {
            return Err(PipelineError::InvalidWindow {
                width: width_deg,
                height: height_deg,
            });
        }
        let (cx, cy) = self
            .wcs
            .world_to_pixel(ra, dec)
            .ok_or(PipelineError::Unprojectable { ra, dec })?;
        let (sx, sy) = self.wcs.pixel_scale();
        self.view = ViewWindow::around(
            cx,
            cy,
            width_deg / sx,
            height_deg / sy,
            self.width,
            self.height,
        )?;
        log::debug!(
            "Recentered on ({ra:.6}, {dec:.6}) {:.2}″ window: {:?}",
            width_deg * 3600.0,
            self.view
        );
        Ok(())
    }

    /// RGBA bytes and size of the pixels inside the current view, top row
    /// first.
    pub fn view_pixels(&self) -> Result<(usize, usize, Vec<u8>)> {
        let b = self.view.pixel_bounds(self.width, self.height)?;
        let (w, h) = (b.x1 - b.x0, b.y1 - b.y0);
        let mut out = Vec::with_capacity(w * h * 4);
        // Buffer rows run top-down: FITS row y sits at buffer row height-1-y.
        for y in (b.y0..b.y1).rev() {
            let row = self.height - 1 - y;
            let start = (row * self.width + b.x0) * 4;
            out.extend_from_slice(&self.rgba[start..start + w * 4]);
        }
        Ok((w, h, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Colormap;
    use crate::fits::header::HeaderValue;
    use crate::fits::wcs::tests::sin_header;
    use crate::fits::ImageUnit;
    use crate::pipeline::render::{Annotation, Stretch};
    use crate::pipeline::stats::DisplayRange;
    use approx::assert_abs_diff_eq;
    use eframe::egui::Color32;

    /// 64×64 at 0.05″/px (3.2″ field), reference at the centre pixel.
    fn figure() -> (MomentFigure, (f64, f64)) {
        let mut h = sin_header();
        h.insert("BMAJ", HeaderValue::Float(0.1 / 3600.0));
        h.insert("BMIN", HeaderValue::Float(0.1 / 3600.0));
        let data: Vec<f64> = (0..64 * 64).map(|i| i as f64).collect();
        let img = ImageUnit::from_parts(vec![64, 64], data, h).unwrap();
        let centre = img.center_world().unwrap();
        let fig = MomentFigure::render(
            &img,
            DisplayRange::new(0.0, 4095.0).unwrap(),
            Colormap::SpectralR,
            Stretch::Linear,
            &Annotation {
                scale_bar_arcsec: 1.0,
                distance_pc: 140.0,
                scale_bar_color: Color32::BLACK,
            },
        )
        .unwrap();
        (fig, centre)
    }

    #[test]
    fn recenter_is_square_and_idempotent() {
        let (mut fig, (ra, dec)) = figure();
        fig.recenter(ra, dec, 2.0 / 3600.0, 2.0 / 3600.0).unwrap();
        let first = fig.view;
        assert_abs_diff_eq!(first.width(), 40.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.height(), 40.0, epsilon = 1e-6);
        assert_abs_diff_eq!((first.x0 + first.x1) / 2.0, 32.0, epsilon = 1e-6);

        fig.recenter(ra, dec, 2.0 / 3600.0, 2.0 / 3600.0).unwrap();
        assert_eq!(fig.view, first);
    }

    #[test]
    fn recenter_leaves_pixels_alone() {
        let (mut fig, (ra, dec)) = figure();
        let before = (fig.rgba.clone(), fig.range, fig.colorbar.clone(), fig.scale_bar.clone());
        fig.recenter(ra, dec, 1.0 / 3600.0, 1.0 / 3600.0).unwrap();
        assert_eq!(before, (fig.rgba.clone(), fig.range, fig.colorbar.clone(), fig.scale_bar.clone()));
    }

    #[test]
    fn oversized_window_is_trimmed() {
        let (mut fig, (ra, dec)) = figure();
        fig.recenter(ra, dec, 15.0 / 3600.0, 15.0 / 3600.0).unwrap();
        assert_eq!(fig.view, ViewWindow::full(64, 64));
        assert_eq!(fig.view.uv(64, 64), (0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn invalid_or_disjoint_windows_fail() {
        let (mut fig, (ra, dec)) = figure();
        assert!(matches!(
            fig.recenter(ra, dec, 0.0, 1.0 / 3600.0),
            Err(PipelineError::InvalidWindow { .. })
        ));
        // 10″ north of a 3.2″ field.
        assert!(matches!(
            fig.recenter(ra, dec + 10.0 / 3600.0, 1.0 / 3600.0, 1.0 / 3600.0),
            Err(PipelineError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn view_pixels_crop_the_buffer() {
        let (mut fig, (ra, dec)) = figure();
        fig.recenter(ra, dec, 0.25 / 3600.0, 0.25 / 3600.0).unwrap();
        let (w, h, px) = fig.view_pixels().unwrap();
        assert_eq!((w, h), (5, 5));
        assert_eq!(px.len(), 5 * 5 * 4);
        // Window [29.5, 34.5] keeps pixels 30..=34; top-left is FITS (30, 34).
        assert_eq!(&px[0..4], &fig.pixel_rgba(30, 34).unwrap());
        assert_eq!(ViewWindow::full(64, 64).pixel_bounds(64, 64).unwrap().x1, 64);
    }
}
