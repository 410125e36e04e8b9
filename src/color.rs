use std::fmt;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn hex(c: u32) -> Srgb {
    Srgb::new((c >> 16) as u8, (c >> 8) as u8, c as u8).into_format()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Colormaps: normalised value → Color32
// ---------------------------------------------------------------------------

/// Matplotlib colormaps used by the moment-map figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Continuum images.
    Inferno,
    /// Moment 8 (peak intensity), `Spectral_r`.
    SpectralR,
    /// Moment 9 (velocity), `RdBu_r`.
    RdBuR,
}

const INFERNO: [u32; 10] = [
    0x000004, 0x1b0c41, 0x4a0c6b, 0x781c6d, 0xa52c60, 0xcf4446, 0xed6925, 0xfb9b06, 0xf7d13d,
    0xfcffa4,
];

/// ColorBrewer Spectral, already reversed (blue → red).
const SPECTRAL_R: [u32; 11] = [
    0x5e4fa2, 0x3288bd, 0x66c2a5, 0xabdda4, 0xe6f598, 0xffffbf, 0xfee08b, 0xfdae61, 0xf46d43,
    0xd53e4f, 0x9e0142,
];

/// ColorBrewer RdBu, already reversed (blue → red).
const RDBU_R: [u32; 11] = [
    0x053061, 0x2166ac, 0x4393c3, 0x92c5de, 0xd1e5f0, 0xf7f7f7, 0xfddbc7, 0xf4a582, 0xd6604d,
    0xb2182b, 0x67001f,
];

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colormap::Inferno => write!(f, "inferno"),
            Colormap::SpectralR => write!(f, "Spectral_r"),
            Colormap::RdBuR => write!(f, "RdBu_r"),
        }
    }
}

impl Colormap {
    fn stops(self) -> &'static [u32] {
        match self {
            Colormap::Inferno => &INFERNO,
            Colormap::SpectralR => &SPECTRAL_R,
            Colormap::RdBuR => &RDBU_R,
        }
    }

    /// Colour for a normalised value in `[0, 1]`, linear between stops in
    /// sRGB like matplotlib's segmented maps. Out-of-range input is clamped.
    pub fn color_at(self, t: f64) -> Color32 {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        let frac = (pos - i as f64) as f32;

        to_color32(hex(stops[i]).mix(hex(stops[i + 1]), frac))
    }

    /// `n`-entry lookup table, cheaper than `color_at` per pixel.
    pub fn lut(self, n: usize) -> Vec<Color32> {
        let n = n.max(2);
        (0..n)
            .map(|i| self.color_at(i as f64 / (n - 1) as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_stops() {
        assert_eq!(Colormap::Inferno.color_at(0.0), Color32::from_rgb(0, 0, 4));
        assert_eq!(Colormap::Inferno.color_at(1.0), Color32::from_rgb(0xfc, 0xff, 0xa4));
        assert_eq!(Colormap::RdBuR.color_at(0.5), Color32::from_rgb(0xf7, 0xf7, 0xf7));
        assert_eq!(Colormap::SpectralR.color_at(0.0), Color32::from_rgb(0x5e, 0x4f, 0xa2));
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(Colormap::RdBuR.color_at(-3.0), Colormap::RdBuR.color_at(0.0));
        assert_eq!(Colormap::RdBuR.color_at(7.0), Colormap::RdBuR.color_at(1.0));
    }

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(3);
        assert_eq!(p.len(), 3);
        assert_ne!(p[0], p[1]);
        assert_eq!(Colormap::Inferno.lut(256).len(), 256);
    }
}
