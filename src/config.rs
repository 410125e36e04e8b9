use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable pointing at a JSON config file.
pub const CONFIG_ENV: &str = "EDISK_VIEWER_CONFIG";
/// Config file looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "edisk-viewer.json";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Runtime configuration. Every field falls back to its default so a partial
/// JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Source catalog (comma-separated).
    pub catalog_path: PathBuf,
    /// Directory holding one sub-directory of FITS files per source.
    pub data_root: PathBuf,
    /// Imaging weighting tag embedded in file names, e.g. `robust_2.0`.
    pub resolution_tag: String,
    /// Cutout tag trailing moment-map file names, e.g. `15arcsec`.
    pub cutout_tag: String,
    /// Molecular line labels offered in the molecule selector.
    pub molecules: Vec<String>,
    pub zoom: ZoomConfig,
    /// Percentile cutoffs for moment 8 maps.
    pub percentiles: (f64, f64),
    /// Half-width in km/s of the moment 9 colour window around v_sys.
    pub velocity_half_window: f64,
    /// Angular length of the scale bar in arcsec.
    pub scale_bar_arcsec: f64,
    pub contours: ContourConfig,
    pub rms_region: RmsRegionConfig,
    /// Free-text lines shown in the page footer.
    pub footer: Vec<String>,
}

/// Zoom slider bounds, in arcsec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

/// Contour level generation: `count` levels per sign from `start` to `end`
/// noise multiples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Off-source box used for the continuum noise estimate, relative to the
/// image centre. Offsets follow the pixel axes (x right, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RmsRegionConfig {
    pub offset_x_arcsec: f64,
    pub offset_y_arcsec: f64,
    pub width_arcsec: f64,
    pub height_arcsec: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("eDisk_sources_overview.csv"),
            data_root: PathBuf::from("fits_files"),
            resolution_tag: "robust_2.0".to_string(),
            cutout_tag: "15arcsec".to_string(),
            molecules: default_molecules(),
            zoom: ZoomConfig::default(),
            percentiles: (0.25, 99.75),
            velocity_half_window: 3.0,
            scale_bar_arcsec: 1.0,
            contours: ContourConfig::default(),
            rms_region: RmsRegionConfig::default(),
            footer: Vec::new(),
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 2,
            max: 15,
            default: 15,
        }
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            start: 5.0,
            end: 405.0,
            count: 7,
        }
    }
}

impl Default for RmsRegionConfig {
    fn default() -> Self {
        Self {
            offset_x_arcsec: 4.0,
            offset_y_arcsec: 4.0,
            width_arcsec: 2.0,
            height_arcsec: 2.0,
        }
    }
}

/// The eDisk line set.
pub fn default_molecules() -> Vec<String> {
    [
        "12CO",
        "13CO",
        "C18O",
        "DCN",
        "CH3OH",
        "SiO",
        "SO",
        "H2CO_3_03-2_02_218.22GHz",
        "H2CO_3_21-2_20_218.76GHz",
        "H2CO_3_22-2_21_218.47GHz",
        "C3H2_217.82",
        "C3H2_217.94",
        "C3H2_218.16",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl ViewerConfig {
    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config from `EDISK_VIEWER_CONFIG`, then the working
    /// directory, then defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        let z = &self.zoom;
        anyhow::ensure!(
            z.min > 0 && z.min <= z.default && z.default <= z.max,
            "zoom bounds must satisfy 0 < min <= default <= max, got {}/{}/{}",
            z.min,
            z.default,
            z.max
        );
        anyhow::ensure!(!self.molecules.is_empty(), "molecule list is empty");
        anyhow::ensure!(
            self.velocity_half_window > 0.0,
            "velocity_half_window must be positive"
        );
        anyhow::ensure!(self.contours.count > 0, "contour count must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "data_root": "/data/edisk", "zoom": { "default": 10 } }"#)
            .unwrap();

        let cfg = ViewerConfig::from_file(&path).unwrap();
        assert_eq!(cfg.data_root, PathBuf::from("/data/edisk"));
        assert_eq!(cfg.zoom.default, 10);
        assert_eq!(cfg.zoom.min, 2);
        assert_eq!(cfg.molecules.len(), 13);
        assert_eq!(cfg.percentiles, (0.25, 99.75));
    }

    #[test]
    fn rejects_inverted_zoom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "zoom": { "min": 10, "max": 5, "default": 7 } }"#).unwrap();
        assert!(ViewerConfig::from_file(&path).is_err());
    }
}
