use crate::error::{PipelineError, Result};
use crate::fits::ImageUnit;

// ---------------------------------------------------------------------------
// DisplayRange
// ---------------------------------------------------------------------------

/// Pixel-value bounds mapped onto the ends of a colormap.
/// Invariant: both finite and `min < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    min: f64,
    max: f64,
}

impl DisplayRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min.is_finite() && max.is_finite() && min < max {
            Ok(Self { min, max })
        } else {
            Err(PipelineError::DegenerateRange { min, max })
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Map `value` to `[0, 1]`, clamping outside the range. NaN stays NaN.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Range estimators
// ---------------------------------------------------------------------------

/// Minimum and maximum over the finite pixels.
pub fn finite_min_max(data: &[f64]) -> Result<DisplayRange> {
    let (min, max) = data
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return Err(PipelineError::NoFiniteValues);
    }
    DisplayRange::new(min, max)
}

/// Values at percentiles `lo` and `hi` (0-100) of the finite pixels, linear
/// interpolation between closest ranks. Non-finite pixels never take part.
pub fn percentile_range(data: &[f64], lo: f64, hi: f64) -> Result<DisplayRange> {
    if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo >= hi {
        return Err(PipelineError::InvalidPercentiles { lo, hi });
    }
    let mut finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(PipelineError::NoFiniteValues);
    }
    finite.sort_by(f64::total_cmp);
    let range = DisplayRange::new(percentile_sorted(&finite, lo), percentile_sorted(&finite, hi))?;
    log::debug!(
        "Percentiles ({lo}, {hi}) of {} finite pixels: {:?}",
        finite.len(),
        range
    );
    Ok(range)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    let frac = rank - below as f64;
    sorted[below] + (sorted[above] - sorted[below]) * frac
}

/// `(reference - offset, reference + offset)`, used to centre velocity maps
/// on the systemic velocity.
pub fn reference_window(reference: f64, offset: f64) -> Result<DisplayRange> {
    DisplayRange::new(reference - offset, reference + offset)
}

// ---------------------------------------------------------------------------
// Cutout statistics
// ---------------------------------------------------------------------------

/// Rectangular region in pixel units, centred on a (fractional) pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRegion {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel bounds `[x0, x1) × [y0, y1)` of a region trimmed to the
/// image. Fails when nothing overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl PixelRegion {
    /// Pixels whose centres fall inside the region, trimmed to a
    /// `width`×`height` image.
    pub fn trim_to(&self, width: usize, height: usize) -> Result<PixelBounds> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(PipelineError::InvalidWindow {
                width: self.width,
                height: self.height,
            });
        }
        // Exactly `round(size)` pixels starting at the first pixel centre
        // inside the box, then clipped to `[0, limit)`.
        let span = |center: f64, size: f64, limit: usize| -> Option<(usize, usize)> {
            let lo = (center - size / 2.0).ceil();
            let hi = lo + size.round();
            let (lo, hi) = (lo.max(0.0), hi.min(limit as f64));
            (hi > lo).then(|| (lo as usize, hi as usize))
        };
        let out = || PipelineError::RegionOutOfBounds { width, height };
        let (x0, x1) = span(self.center_x, self.width, width).ok_or_else(out)?;
        let (y0, y1) = span(self.center_y, self.height, height).ok_or_else(out)?;
        Ok(PixelBounds { x0, x1, y0, y1 })
    }
}

/// Root-mean-square of the finite pixels inside `region`. Regions that
/// stick out of the image are trimmed; regions with no overlap fail.
pub fn rms_in_region(image: &ImageUnit, region: &PixelRegion) -> Result<f64> {
    let b = region.trim_to(image.width, image.height)?;
    let (sum_sq, n) = (b.y0..b.y1)
        .flat_map(|y| (b.x0..b.x1).map(move |x| (x, y)))
        .map(|(x, y)| image.data[y * image.width + x])
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v * v, n + 1));
    if n == 0 {
        return Err(PipelineError::NoFiniteValues);
    }
    Ok((sum_sq / n as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::wcs::tests::sin_header;
    use approx::assert_relative_eq;

    fn image(width: usize, height: usize, data: Vec<f64>) -> ImageUnit {
        ImageUnit::from_parts(vec![width, height], data, sin_header()).unwrap()
    }

    #[test]
    fn min_max_ignores_non_finite() {
        let data = vec![f64::NAN, 3.0, -2.0, f64::INFINITY, 7.5, f64::NEG_INFINITY, f64::NAN];
        let r = finite_min_max(&data).unwrap();
        assert_eq!((r.min(), r.max()), (-2.0, 7.5));
        for v in data.iter().filter(|v| v.is_finite()) {
            assert!(r.min() <= *v && *v <= r.max());
        }

        let mut padded = vec![f64::NAN; 50];
        padded.extend([3.0, -2.0, 7.5]);
        assert_eq!(finite_min_max(&padded).unwrap(), r);
    }

    #[test]
    fn min_max_without_finite_values_fails() {
        assert!(matches!(
            finite_min_max(&[f64::NAN, f64::INFINITY]),
            Err(PipelineError::NoFiniteValues)
        ));
        assert!(matches!(
            finite_min_max(&[4.0, 4.0]),
            Err(PipelineError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn percentiles_match_linear_interpolation() {
        let data: Vec<f64> = (0..=100).map(f64::from).collect();
        let r = percentile_range(&data, 0.25, 99.75).unwrap();
        assert_relative_eq!(r.min(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(r.max(), 99.75, epsilon = 1e-12);

        let r = percentile_range(&[1.0, 2.0, 3.0, 4.0], 25.0, 50.0).unwrap();
        assert_relative_eq!(r.min(), 1.75, epsilon = 1e-12);
        assert_relative_eq!(r.max(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn percentiles_are_order_independent_and_skip_nan() {
        let data: Vec<f64> = (0..200).map(|i| ((i * 37) % 200) as f64 * 0.5).collect();
        let mut reversed = data.clone();
        reversed.reverse();
        let mut with_nan = data.clone();
        with_nan.extend([f64::NAN; 30]);
        with_nan.rotate_left(17);

        let a = percentile_range(&data, 0.25, 99.75).unwrap();
        assert_eq!(a, percentile_range(&reversed, 0.25, 99.75).unwrap());
        assert_eq!(a, percentile_range(&with_nan, 0.25, 99.75).unwrap());
        assert!(a.min() <= a.max());
    }

    #[test]
    fn percentile_cutoffs_are_validated() {
        let data = [1.0, 2.0];
        assert!(percentile_range(&data, 50.0, 50.0).is_err());
        assert!(percentile_range(&data, -1.0, 50.0).is_err());
        assert!(percentile_range(&data, 10.0, 101.0).is_err());
        assert!(matches!(
            percentile_range(&[f64::NAN], 1.0, 99.0),
            Err(PipelineError::NoFiniteValues)
        ));
    }

    #[test]
    fn reference_window_is_symmetric() {
        let r = reference_window(5.0, 3.0).unwrap();
        assert_eq!((r.min(), r.max()), (2.0, 8.0));
        assert!(reference_window(5.0, 0.0).is_err());
    }

    #[test]
    fn normalize_clamps() {
        let r = DisplayRange::new(2.0, 8.0).unwrap();
        assert_eq!(r.normalize(5.0), 0.5);
        assert_eq!(r.normalize(-10.0), 0.0);
        assert_eq!(r.normalize(10.0), 1.0);
        assert!(r.normalize(f64::NAN).is_nan());
    }

    #[test]
    fn rms_of_constant_region() {
        let mut data = vec![100.0; 64];
        for y in 0..4 {
            for x in 0..4 {
                data[y * 8 + x] = if (x + y) % 2 == 0 { 2.0 } else { -2.0 };
            }
        }
        data[0] = f64::NAN;
        let img = image(8, 8, data);
        let region = PixelRegion {
            center_x: 1.5,
            center_y: 1.5,
            width: 4.0,
            height: 4.0,
        };
        assert_relative_eq!(rms_in_region(&img, &region).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn region_covers_exactly_its_size() {
        let region = PixelRegion {
            center_x: 4.0,
            center_y: 4.0,
            width: 4.0,
            height: 4.0,
        };
        assert_eq!(
            region.trim_to(16, 16).unwrap(),
            PixelBounds { x0: 2, x1: 6, y0: 2, y1: 6 }
        );

        // Default off-source box on a 300 px, 0.05″ image: 2″ is 40 pixels.
        let noise_box = PixelRegion {
            center_x: 230.0,
            center_y: 230.0,
            width: 40.0,
            height: 40.0,
        };
        let b = noise_box.trim_to(300, 300).unwrap();
        assert_eq!((b.x1 - b.x0, b.y1 - b.y0), (40, 40));
        assert_eq!(b.x0, 210);
    }

    #[test]
    fn region_is_trimmed_or_rejected() {
        let region = PixelRegion {
            center_x: 0.0,
            center_y: 0.0,
            width: 4.0,
            height: 4.0,
        };
        assert_eq!(
            region.trim_to(8, 8).unwrap(),
            PixelBounds { x0: 0, x1: 2, y0: 0, y1: 2 }
        );

        let outside = PixelRegion {
            center_x: 50.0,
            ..region
        };
        assert!(matches!(
            outside.trim_to(8, 8),
            Err(PipelineError::RegionOutOfBounds { .. })
        ));
        let img = image(8, 8, vec![1.0; 64]);
        assert!(rms_in_region(&img, &outside).is_err());
    }
}
