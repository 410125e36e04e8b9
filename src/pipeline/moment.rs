use std::path::Path;

use eframe::egui::Color32;

use super::contour::contour_levels;
use super::render::{Annotation, MomentFigure, Stretch};
use super::stats::{finite_min_max, percentile_range, reference_window, rms_in_region, DisplayRange, PixelRegion};
use crate::color::Colormap;
use crate::config::{RmsRegionConfig, ViewerConfig};
use crate::data::index::{FitsIndex, MomentKind};
use crate::data::model::SourceRecord;
use crate::error::Result;
use crate::fits::ImageUnit;

// ---------------------------------------------------------------------------
// Detail page inputs
// ---------------------------------------------------------------------------

/// The source picked on the overview page, handed to the detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailContext {
    pub source: SourceRecord,
}

impl DetailContext {
    pub fn new(source: SourceRecord) -> Self {
        Self { source }
    }
}

/// Everything on the detail page that triggers a rebuild when it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRequest {
    pub source: String,
    pub molecule: String,
    /// Side of the square view window, arcsec.
    pub zoom_arcsec: u32,
    pub show_continuum: bool,
    pub show_contours: bool,
}

impl DetailRequest {
    pub fn new(context: &DetailContext, config: &ViewerConfig) -> Self {
        Self {
            source: context.source.name.clone(),
            molecule: config.molecules.first().cloned().unwrap_or_default(),
            zoom_arcsec: config.zoom.default,
            show_continuum: false,
            show_contours: false,
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct DetailFigures {
    pub mom8: MomentFigure,
    pub mom9: MomentFigure,
    pub continuum: Option<MomentFigure>,
    /// Noise measured in the continuum off-source box.
    pub continuum_rms: Option<f64>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Load, render and recenter every figure of the detail page.
pub fn render_detail(
    config: &ViewerConfig,
    context: &DetailContext,
    request: &DetailRequest,
) -> Result<DetailFigures> {
    let source = &context.source;
    let index = FitsIndex::scan(config, &source.name)?;
    let window_deg = f64::from(request.zoom_arcsec) / 3600.0;

    let mut mom8 = render_moment(
        index.moment_map(&request.molecule, MomentKind::Mom8)?,
        MomentKind::Mom8,
        source,
        config,
        window_deg,
    )?;
    let mut mom9 = render_moment(
        index.moment_map(&request.molecule, MomentKind::Mom9)?,
        MomentKind::Mom9,
        source,
        config,
        window_deg,
    )?;

    let mut continuum = None;
    let mut continuum_rms = None;
    if request.show_continuum || request.show_contours {
        let image = ImageUnit::open(index.continuum()?)?;
        let rms = continuum_rms_of(&image, &config.rms_region)?;
        log::info!("Continuum RMS of {}: {rms:.3e} {}", source.name, image.header.bunit());

        if request.show_contours {
            let c = &config.contours;
            let levels = contour_levels(c.start, c.end, c.count, rms);
            mom8.add_contours(&image, &levels);
            mom9.add_contours(&image, &levels);
        }
        if request.show_continuum {
            let annotation = Annotation {
                scale_bar_arcsec: config.scale_bar_arcsec,
                distance_pc: source.distance,
                scale_bar_color: Color32::WHITE,
            };
            let range = finite_min_max(&image.data)?;
            let mut fig =
                MomentFigure::render(&image, range, Colormap::Inferno, Stretch::Arcsinh, &annotation)?;
            let (ra, dec) = image.center_world()?;
            fig.recenter(ra, dec, window_deg, window_deg)?;
            continuum = Some(fig);
        }
        continuum_rms = Some(rms);
    }

    log::info!(
        "Rendered {} / {} at {}″",
        source.name,
        request.molecule,
        request.zoom_arcsec
    );
    Ok(DetailFigures {
        mom8,
        mom9,
        continuum,
        continuum_rms,
    })
}

fn render_moment(
    path: &Path,
    kind: MomentKind,
    source: &SourceRecord,
    config: &ViewerConfig,
    window_deg: f64,
) -> Result<MomentFigure> {
    let image = ImageUnit::open(path)?;
    let (range, colormap) = match kind {
        MomentKind::Mom8 => (moment8_range(&image, config)?, Colormap::SpectralR),
        MomentKind::Mom9 => (
            reference_window(source.v_sys, config.velocity_half_window)?,
            Colormap::RdBuR,
        ),
    };
    let annotation = Annotation {
        scale_bar_arcsec: config.scale_bar_arcsec,
        distance_pc: source.distance,
        scale_bar_color: Color32::BLACK,
    };
    let mut figure = MomentFigure::render(&image, range, colormap, Stretch::Linear, &annotation)?;
    let (ra, dec) = image.center_world()?;
    figure.recenter(ra, dec, window_deg, window_deg)?;
    Ok(figure)
}

fn moment8_range(image: &ImageUnit, config: &ViewerConfig) -> Result<DisplayRange> {
    let (lo, hi) = config.percentiles;
    percentile_range(&image.data, lo, hi)
}

/// RMS in the configured off-source box, placed relative to the image
/// centre pixel `(NAXIS1 / 2, NAXIS2 / 2)`.
pub fn continuum_rms_of(image: &ImageUnit, region: &RmsRegionConfig) -> Result<f64> {
    let (sx, sy) = image.wcs.pixel_scale();
    let to_px = |arcsec: f64, scale: f64| arcsec / 3600.0 / scale;
    let pixels = PixelRegion {
        center_x: (image.width / 2) as f64 + to_px(region.offset_x_arcsec, sx),
        center_y: (image.height / 2) as f64 + to_px(region.offset_y_arcsec, sy),
        width: to_px(region.width_arcsec, sx),
        height: to_px(region.height_arcsec, sy),
    };
    rms_in_region(image, &pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::index::{continuum_file_name, moment_file_name};
    use crate::error::PipelineError;
    use crate::fits::image::tests::write_test_fits;
    use crate::pipeline::view::ViewWindow;
    use approx::assert_abs_diff_eq;

    const SOURCE: &str = "Ced110IRS4";
    /// 200 px at 0.05″ covers a 10″ field.
    const SIZE: usize = 200;

    fn source() -> SourceRecord {
        SourceRecord {
            name: SOURCE.to_string(),
            ra: "11:06:46.37".to_string(),
            dec: "-77:22:32.6".to_string(),
            distance: 189.0,
            t_bol: 68.0,
            l_bol: 1.0,
            v_sys: 4.7,
            cont_rms: 0.02,
            description: String::new(),
        }
    }

    fn disk(x: usize, y: usize) -> f32 {
        let (dx, dy) = (x as f32 - 100.0, y as f32 - 100.0);
        (-(dx * dx + dy * dy) / 400.0).exp()
    }

    /// Data root with 12CO moment maps and a continuum image.
    fn data_root() -> (tempfile::TempDir, ViewerConfig) {
        let root = tempfile::tempdir().unwrap();
        let mut config = ViewerConfig::default();
        config.data_root = root.path().to_path_buf();
        let dir = root.path().join(SOURCE);
        std::fs::create_dir(&dir).unwrap();

        let mom8 = moment_file_name(SOURCE, "12CO", MomentKind::Mom8, &config);
        write_test_fits(&dir.join(mom8), SIZE, SIZE, disk);
        let mom9 = moment_file_name(SOURCE, "12CO", MomentKind::Mom9, &config);
        write_test_fits(&dir.join(mom9), SIZE, SIZE, |x, _| 4.7 + (x as f32 - 100.0) * 0.02);
        let cont = continuum_file_name(SOURCE, &config.resolution_tag);
        write_test_fits(&dir.join(cont), SIZE, SIZE, |x, y| {
            // +-0.01 checkerboard noise plus a bright point source.
            let noise = if (x + y) % 2 == 0 { 0.01 } else { -0.01 };
            noise + 10.0 * disk(x, y).powi(4)
        });
        (root, config)
    }

    fn request(zoom: u32) -> DetailRequest {
        DetailRequest {
            source: SOURCE.to_string(),
            molecule: "12CO".to_string(),
            zoom_arcsec: zoom,
            show_continuum: false,
            show_contours: false,
        }
    }

    #[test]
    fn zoom_changes_only_the_view() {
        let (_root, config) = data_root();
        let ctx = DetailContext::new(source());

        let wide = render_detail(&config, &ctx, &request(15)).unwrap();
        let narrow = render_detail(&config, &ctx, &request(5)).unwrap();

        assert_eq!(wide.mom8.view, ViewWindow::full(SIZE, SIZE));
        assert_abs_diff_eq!(narrow.mom8.view.width(), 100.0, epsilon = 1e-6);
        assert_ne!(wide.mom8.view, narrow.mom8.view);

        for (a, b) in [(&wide.mom8, &narrow.mom8), (&wide.mom9, &narrow.mom9)] {
            assert_eq!(a.range, b.range);
            assert_eq!(a.rgba, b.rgba);
            assert_eq!(a.colorbar, b.colorbar);
            assert_eq!(a.scale_bar, b.scale_bar);
            assert_eq!(a.beam, b.beam);
        }
        assert!(wide.continuum.is_none());
        assert!(wide.continuum_rms.is_none());
    }

    #[test]
    fn moment_maps_use_their_own_ranges() {
        let (_root, config) = data_root();
        let figs = render_detail(&config, &DetailContext::new(source()), &request(15)).unwrap();

        assert_eq!(figs.mom8.colormap, Colormap::SpectralR);
        assert!(figs.mom8.range.max() <= 1.0);
        assert_eq!(figs.mom9.colormap, Colormap::RdBuR);
        assert_abs_diff_eq!(figs.mom9.range.min(), 1.7, epsilon = 1e-12);
        assert_abs_diff_eq!(figs.mom9.range.max(), 7.7, epsilon = 1e-12);
        assert_eq!(figs.mom8.scale_bar.label, "189 AU");
        assert_eq!(figs.mom8.scale_bar.color, Color32::BLACK);
    }

    #[test]
    fn continuum_and_contours() {
        let (_root, config) = data_root();
        let mut req = request(15);
        req.show_continuum = true;
        req.show_contours = true;
        let figs = render_detail(&config, &DetailContext::new(source()), &req).unwrap();

        let rms = figs.continuum_rms.unwrap();
        assert_abs_diff_eq!(rms, 0.01, epsilon = 1e-6);
        let cont = figs.continuum.unwrap();
        assert_eq!(cont.colormap, Colormap::Inferno);
        assert_eq!(cont.stretch, Stretch::Arcsinh);
        assert_eq!(cont.scale_bar.color, Color32::WHITE);
        assert_eq!(figs.mom8.overlays.len(), 1);
        assert!(!figs.mom8.overlays[0].segments.is_empty());
    }

    #[test]
    fn missing_molecule_is_reported() {
        let (_root, config) = data_root();
        let mut req = request(15);
        req.molecule = "SiO".to_string();
        let err = render_detail(&config, &DetailContext::new(source()), &req).unwrap_err();
        assert!(matches!(err, PipelineError::NoImage { .. }));
    }

    #[test]
    fn default_request_follows_config() {
        let config = ViewerConfig::default();
        let req = DetailRequest::new(&DetailContext::new(source()), &config);
        assert_eq!(req.molecule, "12CO");
        assert_eq!(req.zoom_arcsec, 15);
        assert!(!req.show_contours);
    }
}
