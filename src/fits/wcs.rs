//! Celestial world coordinate system of an image, backed by the `wcs`
//! projection library.

use std::sync::Arc;

use ::wcs::{ImgXY, LonLat, WCSParams, WCS};

use super::header::FitsHeader;
use crate::error::{PipelineError, Result};

/// Declares the header keywords handed to the projection library and the
/// function that reads them into its parameter set. Idents are the keyword
/// names in lower case.
macro_rules! projection_keywords {
    (
        integers: [$($i:ident),* $(,)?],
        texts: [$($t:ident),* $(,)?],
        floats: [$($f:ident),* $(,)?] $(,)?
    ) => {
        /// Header keywords the world coordinate system reads.
        pub const WCS_KEYWORDS: &[&str] = &[
            "ctype1", $(stringify!($i),)* $(stringify!($t),)* $(stringify!($f),)*
        ];

        /// Celestial parameters of the first two axes. Extra axes have already
        /// been collapsed, so the image is always described as 2-D.
        fn projection_params(header: &FitsHeader, ctype1: &str, width: usize, height: usize) -> WCSParams {
            WCSParams {
                naxis: 2,
                naxis1: Some(width as i64),
                naxis2: Some(height as i64),
                naxis3: None,
                naxis4: None,
                znaxis1: None,
                znaxis2: None,
                znaxis3: None,
                znaxis4: None,
                ctype1: ctype1.to_string(),
                $($i: header.integer(stringify!($i)),)*
                $($t: header.text(stringify!($t)).map(str::to_string),)*
                $($f: header.float(stringify!($f)),)*
            }
        }
    };
}

projection_keywords! {
    integers: [a_order, b_order, ap_order, bp_order],
    texts: [ctype2, ctype3, radesys],
    floats: [
        crpix1, crpix2, crpix3, crval1, crval2, crval3, crota1, crota2, crota3, cdelt1,
        cdelt2, cdelt3, lonpole, latpole, equinox, epoch, cd1_1, cd1_2, cd1_3, cd2_1,
        cd2_2, cd2_3, cd3_1, cd3_2, cd3_3, pc1_1, pc1_2, pc1_3, pc2_1, pc2_2, pc2_3, pc3_1,
        pc3_2, pc3_3,
        // Projection parameters
        pv1_0, pv1_1, pv1_2, pv1_3, pv1_4, pv1_5, pv1_6, pv1_7, pv1_8, pv1_9, pv1_10,
        pv1_11, pv1_12, pv1_13, pv1_14, pv1_15, pv1_16, pv1_17, pv1_18, pv1_19, pv1_20,
        pv1_21, pv1_22, pv1_23, pv1_24, pv1_25, pv1_26, pv1_27, pv1_28, pv1_29, pv1_30,
        pv1_31, pv1_32, pv1_33, pv1_34, pv1_35, pv1_36, pv1_37, pv1_38, pv1_39, pv2_0,
        pv2_1, pv2_2, pv2_3, pv2_4, pv2_5, pv2_6, pv2_7, pv2_8, pv2_9, pv2_10, pv2_11,
        pv2_12, pv2_13, pv2_14, pv2_15, pv2_16, pv2_17, pv2_18, pv2_19, pv2_20, pv2_21,
        pv2_22, pv2_23, pv2_24, pv2_25, pv2_26, pv2_27, pv2_28, pv2_29, pv2_30, pv2_31,
        pv2_32, pv2_33, pv2_34, pv2_35, pv2_36, pv2_37, pv2_38, pv2_39,
        // SIP distortion
        a_0_0, a_0_1, a_1_0, a_0_2, a_1_1, a_2_0, a_0_3, a_1_2, a_2_1, a_3_0, a_0_4, a_1_3,
        a_2_2, a_3_1, a_4_0, a_0_5, a_1_4, a_2_3, a_3_2, a_4_1, a_5_0, a_0_6, a_1_5, a_2_4,
        a_3_3, a_4_2, a_5_1, a_6_0, a_0_7, a_1_6, a_2_5, a_3_4, a_4_3, a_5_2, a_6_1, a_7_0,
        a_0_8, a_1_7, a_2_6, a_3_5, a_4_4, a_5_3, a_6_2, a_7_1, a_8_0, a_0_9, a_1_8, a_2_7,
        a_3_6, a_4_5, a_5_4, a_6_3, a_7_2, a_8_1, a_9_0, b_0_0, b_0_1, b_1_0, b_0_2, b_1_1,
        b_2_0, b_0_3, b_1_2, b_2_1, b_3_0, b_0_4, b_1_3, b_2_2, b_3_1, b_4_0, b_0_5, b_1_4,
        b_2_3, b_3_2, b_4_1, b_5_0, b_0_6, b_1_5, b_2_4, b_3_3, b_4_2, b_5_1, b_6_0, b_0_7,
        b_1_6, b_2_5, b_3_4, b_4_3, b_5_2, b_6_1, b_7_0, b_0_8, b_1_7, b_2_6, b_3_5, b_4_4,
        b_5_3, b_6_2, b_7_1, b_8_0, b_0_9, b_1_8, b_2_7, b_3_6, b_4_5, b_5_4, b_6_3, b_7_2,
        b_8_1, b_9_0, ap_0_0, ap_0_1, ap_1_0, ap_0_2, ap_1_1, ap_2_0, ap_0_3, ap_1_2,
        ap_2_1, ap_3_0, ap_0_4, ap_1_3, ap_2_2, ap_3_1, ap_4_0, ap_0_5, ap_1_4, ap_2_3,
        ap_3_2, ap_4_1, ap_5_0, ap_0_6, ap_1_5, ap_2_4, ap_3_3, ap_4_2, ap_5_1, ap_6_0,
        ap_0_7, ap_1_6, ap_2_5, ap_3_4, ap_4_3, ap_5_2, ap_6_1, ap_7_0, ap_0_8, ap_1_7,
        ap_2_6, ap_3_5, ap_4_4, ap_5_3, ap_6_2, ap_7_1, ap_8_0, ap_0_9, ap_1_8, ap_2_7,
        ap_3_6, ap_4_5, ap_5_4, ap_6_3, ap_7_2, ap_8_1, ap_9_0, bp_0_0, bp_0_1, bp_1_0,
        bp_0_2, bp_1_1, bp_2_0, bp_0_3, bp_1_2, bp_2_1, bp_3_0, bp_0_4, bp_1_3, bp_2_2,
        bp_3_1, bp_4_0, bp_0_5, bp_1_4, bp_2_3, bp_3_2, bp_4_1, bp_5_0, bp_0_6, bp_1_5,
        bp_2_4, bp_3_3, bp_4_2, bp_5_1, bp_6_0, bp_0_7, bp_1_6, bp_2_5, bp_3_4, bp_4_3,
        bp_5_2, bp_6_1, bp_7_0, bp_0_8, bp_1_7, bp_2_6, bp_3_5, bp_4_4, bp_5_3, bp_6_2,
        bp_7_1, bp_8_0, bp_0_9, bp_1_8, bp_2_7, bp_3_6, bp_4_5, bp_5_4, bp_6_3, bp_7_2,
        bp_8_1, bp_9_0,
    ],
}

// ---------------------------------------------------------------------------
// Wcs
// ---------------------------------------------------------------------------

/// Celestial world coordinate system of an image.
///
/// Pixel↔world goes through the projection library, which handles every
/// standard projection, LONPOLE/LATPOLE and SIP/TPV distortion. The linear
/// part is kept alongside for pixel scales and small on-sky offsets.
///
/// Pixel coordinates are 0-based (first pixel centre at 0.0) and world
/// coordinates are degrees, matching astropy's `origin=0` convention.
#[derive(Debug, Clone)]
pub struct Wcs {
    projection: Arc<WCS>,
    /// Pixel offset → intermediate world coordinate (degrees).
    cd: [[f64; 2]; 2],
    cd_inv: [[f64; 2]; 2],
}

impl Wcs {
    /// Build the celestial transform from the first two axes of a
    /// `width`×`height` image.
    ///
    /// The linear part comes from `CDi_j` when present, otherwise from
    /// `PCi_j × CDELTi`, with `CROTA2` honoured when no PC matrix is given.
    pub fn from_header(header: &FitsHeader, width: usize, height: usize) -> Result<Self> {
        let ctype1 = header.require_text("CTYPE1")?;
        header.require_text("CTYPE2")?;
        // Projection code lives in characters 5..8 ("RA---SIN").
        if !ctype1.is_ascii() || ctype1.len() < 8 {
            return Err(PipelineError::UnsupportedProjection(ctype1.to_string()));
        }
        for key in ["CRPIX1", "CRPIX2", "CRVAL1", "CRVAL2"] {
            header.require_float(key)?;
        }

        let cd = linear_transform(header)?;
        let cd_inv = invert_2x2(&cd).ok_or(PipelineError::SingularTransform)?;
        let projection = WCS::new(&projection_params(header, ctype1, width, height))?;
        Ok(Self {
            projection: Arc::new(projection),
            cd,
            cd_inv,
        })
    }

    /// Pixel (0-based) → (RA, Dec) in degrees.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let lonlat = self.projection.unproj(&ImgXY::new(x + 1.0, y + 1.0))?;
        let (ra, dec) = (lonlat.lon().to_degrees(), lonlat.lat().to_degrees());
        (ra.is_finite() && dec.is_finite()).then(|| (ra.rem_euclid(360.0), dec))
    }

    /// (RA, Dec) in degrees → pixel (0-based). `None` when the position
    /// cannot be projected, e.g. the far hemisphere of a SIN image.
    pub fn world_to_pixel(&self, ra: f64, dec: f64) -> Option<(f64, f64)> {
        let xy = self
            .projection
            .proj(&LonLat::new(ra.to_radians(), dec.to_radians()))?;
        let (x, y) = (xy.x() - 1.0, xy.y() - 1.0);
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Angular size of one pixel along each axis, in degrees.
    pub fn pixel_scale(&self) -> (f64, f64) {
        (
            self.cd[0][0].hypot(self.cd[1][0]),
            self.cd[0][1].hypot(self.cd[1][1]),
        )
    }

    /// Convert a small on-sky offset (east, north) in degrees into a pixel
    /// displacement. Valid near the reference point.
    pub fn sky_offset_to_pixel(&self, east: f64, north: f64) -> (f64, f64) {
        (
            self.cd_inv[0][0] * east + self.cd_inv[0][1] * north,
            self.cd_inv[1][0] * east + self.cd_inv[1][1] * north,
        )
    }
}

fn linear_transform(header: &FitsHeader) -> Result<[[f64; 2]; 2]> {
    if let Some(cd11) = header.float("CD1_1") {
        return Ok([
            [cd11, header.float("CD1_2").unwrap_or(0.0)],
            [header.float("CD2_1").unwrap_or(0.0), header.float("CD2_2").unwrap_or(0.0)],
        ]);
    }
    let cdelt1 = header.require_float("CDELT1")?;
    let cdelt2 = header.require_float("CDELT2")?;
    let has_pc = ["PC1_1", "PC1_2", "PC2_1", "PC2_2"]
        .iter()
        .any(|k| header.get(k).is_some());
    let pc = if has_pc {
        [
            [header.float("PC1_1").unwrap_or(1.0), header.float("PC1_2").unwrap_or(0.0)],
            [header.float("PC2_1").unwrap_or(0.0), header.float("PC2_2").unwrap_or(1.0)],
        ]
    } else {
        let rho = header.float("CROTA2").unwrap_or(0.0).to_radians();
        let ratio = cdelt2 / cdelt1;
        [
            [rho.cos(), -rho.sin() * ratio],
            [rho.sin() / ratio, rho.cos()],
        ]
    };
    Ok([
        [cdelt1 * pc[0][0], cdelt1 * pc[0][1]],
        [cdelt2 * pc[1][0], cdelt2 * pc[1][1]],
    ])
}

/// Invert a 2×2 matrix. Returns `None` if singular.
fn invert_2x2(m: &[[f64; 2]; 2]) -> Option<[[f64; 2]; 2]> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det.abs() < 1e-300 || !det.is_finite() {
        return None;
    }
    let inv = 1.0 / det;
    Some([
        [m[1][1] * inv, -m[0][1] * inv],
        [-m[1][0] * inv, m[0][0] * inv],
    ])
}
