use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fitrs::{Fits, Hdu};

/// Pixels per side: 15″ cutouts at 0.05″/px.
const SIZE: usize = 300;
const PIXEL_ARCSEC: f64 = 0.05;
const RESOLUTION_TAG: &str = "robust_2.0";
const CUTOUT_TAG: &str = "15arcsec";
const MOLECULES: [&str; 4] = ["12CO", "13CO", "C18O", "SO"];

struct SampleSource {
    name: &'static str,
    ra: &'static str,
    dec: &'static str,
    distance: f64,
    t_bol: f64,
    l_bol: f64,
    v_sys: f64,
    cont_rms: f64,
    /// Disk position angle, degrees east of north.
    pa: f64,
    description: &'static str,
}

const SOURCES: [SampleSource; 3] = [
    SampleSource {
        name: "Ced110IRS4",
        ra: "11:06:46.37",
        dec: "-77:22:32.6",
        distance: 189.0,
        t_bol: 68.0,
        l_bol: 1.0,
        v_sys: 4.7,
        cont_rms: 2.2e-5,
        pa: 104.0,
        description: "Class 0/I binary in Chamaeleon I.",
    },
    SampleSource {
        name: "L1489IRS",
        ra: "04:04:43.07",
        dec: "26:18:56.2",
        distance: 146.0,
        t_bol: 213.0,
        l_bol: 3.4,
        v_sys: 7.3,
        cont_rms: 3.0e-5,
        pa: 67.0,
        description: "Class I protostar with a large Keplerian disk in Taurus.",
    },
    SampleSource {
        name: "TMC1A",
        ra: "04:39:35.20",
        dec: "25:41:44.2",
        distance: 140.0,
        t_bol: 164.0,
        l_bol: 2.5,
        v_sys: 6.4,
        cont_rms: 2.5e-5,
        pa: 75.0,
        description: "Class I disk with a wide-angle outflow.",
    },
];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// `[-]a:b:c` → `a + b/60 + c/3600` with the sign applied to the whole.
fn sexagesimal(s: &str) -> Option<f64> {
    let negative = s.starts_with('-');
    let fields: Vec<&str> = s.trim_start_matches('-').split(':').collect();
    if fields.len() != 3 {
        return None;
    }
    let mut value = 0.0;
    for (field, div) in fields.iter().zip([1.0, 60.0, 3600.0]) {
        value += field.trim().parse::<f64>().ok()? / div;
    }
    Some(if negative { -value } else { value })
}

/// Source position in degrees.
fn sky_position(src: &SampleSource) -> Result<(f64, f64)> {
    let ra = sexagesimal(src.ra).with_context(|| format!("bad RA '{}' for {}", src.ra, src.name))?;
    let dec =
        sexagesimal(src.dec).with_context(|| format!("bad Dec '{}' for {}", src.dec, src.name))?;
    Ok((ra * 15.0, dec))
}

/// Offsets in arcsec from the image centre along (major, minor) disk axes.
fn disk_coords(x: usize, y: usize, pa_deg: f64) -> (f64, f64) {
    let c = (SIZE / 2) as f64;
    // East is -x on the sky.
    let east = -(x as f64 - c) * PIXEL_ARCSEC;
    let north = (y as f64 - c) * PIXEL_ARCSEC;
    let (s, co) = pa_deg.to_radians().sin_cos();
    (east * s + north * co, east * co - north * s)
}

struct Plane {
    data: Vec<f32>,
    unit: &'static str,
}

fn write_fits(path: &Path, src: &SampleSource, plane: Plane) -> Result<()> {
    let (ra, dec) = sky_position(src)?;
    let mut hdu = Hdu::new(&[SIZE, SIZE], plane.data);
    hdu.insert("BUNIT", plane.unit);
    hdu.insert("OBJECT", src.name);
    hdu.insert("BMAJ", 0.08 / 3600.0);
    hdu.insert("BMIN", 0.06 / 3600.0);
    hdu.insert("BPA", 20.0);
    hdu.insert("CTYPE1", "RA---SIN");
    hdu.insert("CTYPE2", "DEC--SIN");
    hdu.insert("RADESYS", "ICRS");
    hdu.insert("CRPIX1", (SIZE / 2 + 1) as f64);
    hdu.insert("CRPIX2", (SIZE / 2 + 1) as f64);
    hdu.insert("CRVAL1", ra);
    hdu.insert("CRVAL2", dec);
    hdu.insert("CDELT1", -PIXEL_ARCSEC / 3600.0);
    hdu.insert("CDELT2", PIXEL_ARCSEC / 3600.0);
    hdu.insert("CUNIT1", "deg");
    hdu.insert("CUNIT2", "deg");
    Fits::create(path, hdu).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn moment_maps(src: &SampleSource, peak: f64, rng: &mut SimpleRng) -> (Plane, Plane) {
    let noise = 0.05 * peak;
    let mut mom8 = Vec::with_capacity(SIZE * SIZE);
    let mut mom9 = Vec::with_capacity(SIZE * SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let (major, minor) = disk_coords(x, y, src.pa);
            let r = major.hypot(minor * 2.5);
            let intensity = gaussian(r, 0.0, 1.2, peak) + rng.gauss(0.0, noise);
            mom8.push(intensity as f32);

            // Keplerian-like rotation along the major axis, blanked where faint.
            let v = if intensity > 3.0 * noise {
                let speed = 2.0 / (major.abs() + 0.3).sqrt();
                src.v_sys + speed * major.signum() + rng.gauss(0.0, 0.1)
            } else {
                f64::NAN
            };
            mom9.push(v as f32);
        }
    }
    (
        Plane { data: mom8, unit: "K" },
        Plane { data: mom9, unit: "km/s" },
    )
}

fn continuum(src: &SampleSource, rng: &mut SimpleRng) -> Plane {
    let data = (0..SIZE * SIZE)
        .map(|i| {
            let (major, minor) = disk_coords(i % SIZE, i / SIZE, src.pa);
            let disk = gaussian(major.hypot(minor * 3.0), 0.0, 0.25, 400.0 * src.cont_rms);
            (disk + rng.gauss(0.0, src.cont_rms)) as f32
        })
        .collect();
    Plane { data, unit: "Jy/beam" }
}

fn write_catalog(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Source", "RA", "Dec", "Distance", "T_bol", "L_bol", "v_sys", "cont_rms", "Description",
    ])?;
    for src in &SOURCES {
        writer.write_record([
            src.name.to_string(),
            src.ra.to_string(),
            src.dec.to_string(),
            src.distance.to_string(),
            src.t_bol.to_string(),
            src.l_bol.to_string(),
            src.v_sys.to_string(),
            src.cont_rms.to_string(),
            src.description.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let data_root = root.join("fits_files");
    let mut rng = SimpleRng::new(42);
    let mut files = 0;

    for src in &SOURCES {
        let dir = data_root.join(src.name);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        for (i, mol) in MOLECULES.iter().enumerate() {
            let (mom8, mom9) = moment_maps(src, 40.0 / (i + 1) as f64, &mut rng);
            for (tag, plane) in [("mom8", mom8), ("mom9", mom9)] {
                let name = format!(
                    "{}_SBLB_{mol}_{RESOLUTION_TAG}_{tag}_{CUTOUT_TAG}.fits",
                    src.name
                );
                write_fits(&dir.join(name), src, plane)?;
                files += 1;
            }
        }

        let name = format!("{}_SBLB_continuum_{RESOLUTION_TAG}.pbcor.tt0.fits", src.name);
        write_fits(&dir.join(name), src, continuum(src, &mut rng))?;
        files += 1;
    }

    let catalog = root.join("eDisk_sources_overview.csv");
    write_catalog(&catalog)?;

    let config = serde_json::json!({
        "catalog_path": catalog,
        "data_root": data_root,
        "molecules": MOLECULES,
    });
    let config_path = root.join("edisk-viewer.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)
        .with_context(|| format!("writing {}", config_path.display()))?;

    println!(
        "Wrote {} sources ({files} FITS files) under {}; run with EDISK_VIEWER_CONFIG={}",
        SOURCES.len(),
        root.display(),
        config_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sexagesimal_rejects_malformed_fields() {
        let ra = sexagesimal("04:04:43.5").unwrap();
        assert!((ra - (4.0 + 4.0 / 60.0 + 43.5 / 3600.0)).abs() < 1e-12);
        let dec = sexagesimal("-77:22:30").unwrap();
        assert!((dec + 77.375).abs() < 1e-12);
        assert_eq!(sexagesimal("04:xx:43.07"), None);
        assert_eq!(sexagesimal("04:04"), None);
    }

    #[test]
    fn bad_position_fails_instead_of_writing_zero() {
        let src = SampleSource {
            dec: "-77:22:??",
            ..SOURCES[0]
        };
        let err = sky_position(&src).unwrap_err();
        assert!(format!("{err:#}").contains("bad Dec"));

        let (ra, dec) = sky_position(&SOURCES[0]).unwrap();
        assert!((ra - 166.693208).abs() < 1e-5);
        assert!((dec + 77.375722).abs() < 1e-5);
    }
}
