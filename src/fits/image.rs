use std::io::Read;
use std::path::Path;

use fitrs::{Fits, FitsData};

use super::header::FitsHeader;
use super::wcs::Wcs;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// ImageUnit – one 2D plane with its header and WCS
// ---------------------------------------------------------------------------

/// Pixel data of the primary HDU plus the metadata needed to display it.
///
/// `data` is row-major in FITS order: index `y * width + x`, row 0 at the
/// bottom of the sky image.
#[derive(Debug, Clone)]
pub struct ImageUnit {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
    pub header: FitsHeader,
    pub wcs: Wcs,
}

impl ImageUnit {
    /// Open a FITS file and extract the first plane of its primary HDU.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let format_err = |reason: String| PipelineError::Format {
            path: path.to_path_buf(),
            reason,
        };

        check_signature(path).map_err(format_err)?;
        let fits = Fits::open(path).map_err(|e| format_err(e.to_string()))?;
        let hdu = fits
            .get(0)
            .ok_or_else(|| format_err("no primary HDU".to_string()))?;
        let header = FitsHeader::from_hdu(&hdu);

        let (shape, values): (Vec<usize>, Vec<f64>) = match hdu.read_data() {
            FitsData::FloatingPoint32(arr) => {
                (arr.shape.clone(), arr.data.iter().map(|&v| v as f64).collect())
            }
            FitsData::FloatingPoint64(arr) => (arr.shape.clone(), arr.data.to_vec()),
            FitsData::IntegersI32(arr) => (
                arr.shape.clone(),
                arr.data
                    .iter()
                    .map(|v| v.map_or(f64::NAN, |x| x as f64))
                    .collect(),
            ),
            FitsData::IntegersU32(arr) => (
                arr.shape.clone(),
                arr.data
                    .iter()
                    .map(|v| v.map_or(f64::NAN, |x| x as f64))
                    .collect(),
            ),
            _ => return Err(format_err("primary HDU holds no numeric image".to_string())),
        };

        let image = Self::from_parts(shape, values, header).map_err(|e| match e {
            PipelineError::Format { reason, .. } => format_err(reason),
            other => other,
        })?;
        log::info!(
            "Loaded {} ({}x{}, unit '{}')",
            path.display(),
            image.width,
            image.height,
            image.header.bunit()
        );
        Ok(image)
    }

    /// Assemble an image from an axis shape (`[NAXIS1, NAXIS2, ...]`) and
    /// flat data. Axes beyond the second are collapsed to their first plane.
    pub fn from_parts(shape: Vec<usize>, mut data: Vec<f64>, header: FitsHeader) -> Result<Self> {
        let format_err = |reason: String| PipelineError::Format {
            path: Default::default(),
            reason,
        };
        if shape.len() < 2 {
            return Err(format_err(format!("expected at least 2 axes, got {}", shape.len())));
        }
        let (width, height) = (shape[0], shape[1]);
        let plane = width * height;
        if plane == 0 {
            return Err(format_err("image has zero size".to_string()));
        }
        if data.len() < plane {
            return Err(format_err(format!(
                "data holds {} values, expected {plane}",
                data.len()
            )));
        }
        if shape[2..].iter().any(|&n| n > 1) {
            log::warn!(
                "Image has shape {shape:?}, displaying the first {width}x{height} plane only"
            );
        }
        data.truncate(plane);

        let wcs = Wcs::from_header(&header, width, height)?;
        Ok(Self {
            width,
            height,
            data,
            header,
            wcs,
        })
    }

    /// World coordinate of pixel `(NAXIS1 / 2, NAXIS2 / 2)`.
    pub fn center_world(&self) -> Result<(f64, f64)> {
        let (x, y) = ((self.width / 2) as f64, (self.height / 2) as f64);
        self.wcs
            .pixel_to_world(x, y)
            .ok_or(PipelineError::RegionOutOfBounds {
                width: self.width,
                height: self.height,
            })
    }

    /// Beam major/minor FWHM and position angle, all in degrees.
    pub fn beam(&self) -> Result<(f64, f64, f64)> {
        let bmaj = self.header.require_float("BMAJ")?;
        let bmin = self.header.require_float("BMIN")?;
        let bpa = self.header.float("BPA").unwrap_or(0.0);
        Ok((bmaj, bmin, bpa))
    }
}

/// Size of a FITS header/data block.
const BLOCK_LEN: usize = 2880;

/// A FITS file starts with a full block whose first card is `SIMPLE = T`.
fn check_signature(path: &Path) -> std::result::Result<(), String> {
    let mut block = [0u8; BLOCK_LEN];
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    file.read_exact(&mut block)
        .map_err(|_| "shorter than one FITS block".to_string())?;
    let card = String::from_utf8_lossy(&block[..80]);
    let is_simple = card.starts_with("SIMPLE")
        && card
            .split_once('=')
            .is_some_and(|(_, v)| v.trim_start().starts_with('T'));
    if is_simple {
        Ok(())
    } else {
        Err("missing SIMPLE = T primary header".to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fitrs::Hdu;

    fn projected_hdu(
        width: usize,
        height: usize,
        projection: &str,
        pixel: impl Fn(usize, usize) -> f32,
    ) -> Hdu {
        let data: Vec<f32> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| pixel(x, y))
            .collect();
        let mut hdu = Hdu::new(&[width, height], data);
        hdu.insert("BUNIT", "Jy/beam");
        hdu.insert("BMAJ", 0.1 / 3600.0);
        hdu.insert("BMIN", 0.08 / 3600.0);
        hdu.insert("BPA", 30.0);
        hdu.insert("CTYPE1", format!("RA---{projection}").as_str());
        hdu.insert("CTYPE2", format!("DEC--{projection}").as_str());
        hdu.insert("RADESYS", "ICRS");
        hdu.insert("CRPIX1", (width / 2 + 1) as f64);
        hdu.insert("CRPIX2", (height / 2 + 1) as f64);
        hdu.insert("CRVAL1", 166.693208);
        hdu.insert("CRVAL2", -77.375722);
        hdu.insert("CDELT1", -0.05 / 3600.0);
        hdu.insert("CDELT2", 0.05 / 3600.0);
        hdu
    }

    /// Write a `width`×`height` SIN-projected f32 image with beam keywords.
    pub(crate) fn write_test_fits(
        path: &Path,
        width: usize,
        height: usize,
        pixel: impl Fn(usize, usize) -> f32,
    ) {
        Fits::create(path, projected_hdu(width, height, "SIN", pixel)).unwrap();
    }

    #[test]
    fn opens_written_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.fits");
        write_test_fits(&path, 16, 8, |x, y| if x == 3 && y == 2 { f32::NAN } else { (x + 100 * y) as f32 });

        let img = ImageUnit::open(&path).unwrap();
        assert_eq!((img.width, img.height), (16, 8));
        assert_eq!(img.data.len(), 16 * 8);
        assert_eq!(img.data[4 * 16 + 5], 405.0);
        assert!(img.data[2 * 16 + 3].is_nan());
        assert_eq!(img.header.bunit(), "Jy/beam");

        let (ra, dec) = img.center_world().unwrap();
        assert!((ra - 166.693208).abs() < 1e-9);
        assert!((dec + 77.375722).abs() < 1e-9);

        let (bmaj, bmin, bpa) = img.beam().unwrap();
        assert!(bmaj > bmin);
        assert_eq!(bpa, 30.0);
    }

    #[test]
    fn opens_other_zenithal_projections() {
        let dir = tempfile::tempdir().unwrap();
        for projection in ["ARC", "NCP", "ZEA"] {
            let path = dir.path().join(format!("{projection}.fits"));
            let mut hdu = projected_hdu(16, 16, projection, |x, y| (x + y) as f32);
            hdu.insert("LONPOLE", 180.0);
            Fits::create(&path, hdu).unwrap();

            let img = ImageUnit::open(&path).unwrap();
            assert_eq!(img.header.float("LONPOLE"), Some(180.0));
            let (ra, dec) = img.center_world().unwrap();
            assert!((ra - 166.693208).abs() < 1e-9, "{projection}: {ra}");
            assert!((dec + 77.375722).abs() < 1e-9, "{projection}: {dec}");
        }
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = ImageUnit::open(Path::new("/nonexistent/x.fits")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn garbage_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fits");
        std::fs::write(&path, b"definitely not a FITS file").unwrap();
        assert!(ImageUnit::open(&path).is_err());
    }

    #[test]
    fn degenerate_axes_collapse_to_first_plane() {
        let header = crate::fits::wcs::tests::sin_header();
        let img = ImageUnit::from_parts(vec![2, 2, 1, 1], vec![1.0, 2.0, 3.0, 4.0], header.clone())
            .unwrap();
        assert_eq!(img.data.len(), 4);

        let img = ImageUnit::from_parts(vec![2, 2, 2], (0..8).map(f64::from).collect(), header.clone())
            .unwrap();
        assert_eq!(img.data, vec![0.0, 1.0, 2.0, 3.0]);

        assert!(ImageUnit::from_parts(vec![4], vec![0.0; 4], header).is_err());
    }
}
