use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ViewerConfig;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// MomentKind
// ---------------------------------------------------------------------------

/// The two displayed moment maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MomentKind {
    /// Peak intensity.
    Mom8,
    /// Velocity at peak intensity.
    Mom9,
}

impl MomentKind {
    pub const ALL: [MomentKind; 2] = [MomentKind::Mom8, MomentKind::Mom9];

    /// Marker used in file names.
    pub fn tag(self) -> &'static str {
        match self {
            MomentKind::Mom8 => "mom8",
            MomentKind::Mom9 => "mom9",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            MomentKind::Mom8 => 8,
            MomentKind::Mom9 => 9,
        }
    }
}

impl fmt::Display for MomentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "moment {}", self.number())
    }
}

// ---------------------------------------------------------------------------
// FitsIndex – explicit (molecule, moment) → file lookup
// ---------------------------------------------------------------------------

/// Lookup table of the FITS products available for one source.
#[derive(Debug, Clone, Default)]
pub struct FitsIndex {
    dir: PathBuf,
    moments: BTreeMap<(String, MomentKind), PathBuf>,
    continuum: Option<PathBuf>,
}

impl FitsIndex {
    /// Scan `<data_root>/<source>/` once and classify every file name.
    pub fn scan(config: &ViewerConfig, source: &str) -> Result<Self> {
        let dir = config.data_root.join(source);
        let entries = std::fs::read_dir(&dir).map_err(|_| PipelineError::FileNotFound(dir.clone()))?;

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();

        let index = Self::from_file_names(config, source, &dir, &names);
        log::info!(
            "Indexed {} moment maps for {source} (continuum: {})",
            index.len(),
            index.continuum.is_some()
        );
        Ok(index)
    }

    /// Build the index from a listing of file names inside `dir`.
    pub fn from_file_names(
        config: &ViewerConfig,
        source: &str,
        dir: &Path,
        names: &[String],
    ) -> Self {
        let continuum_name = continuum_file_name(source, &config.resolution_tag);
        let mut index = FitsIndex {
            dir: dir.to_path_buf(),
            ..Default::default()
        };

        for name in names {
            if *name == continuum_name {
                index.continuum = Some(dir.join(name));
                continue;
            }
            match classify_moment_file(name, config) {
                Some(key) => {
                    if let Some(prev) = index.moments.insert(key.clone(), dir.join(name)) {
                        log::warn!(
                            "Duplicate {} {} file, keeping {name} over {}",
                            key.0,
                            key.1,
                            prev.display()
                        );
                    }
                }
                None => log::debug!("Skipping unrecognised file {name}"),
            }
        }
        index
    }

    pub fn moment_map(&self, molecule: &str, kind: MomentKind) -> Result<&Path> {
        self.moments
            .get(&(molecule.to_string(), kind))
            .map(PathBuf::as_path)
            .ok_or_else(|| PipelineError::NoImage {
                molecule: molecule.to_string(),
                kind: kind.to_string(),
                dir: self.dir.clone(),
            })
    }

    pub fn continuum(&self) -> Result<&Path> {
        self.continuum
            .as_deref()
            .ok_or_else(|| PipelineError::NoImage {
                molecule: "continuum".to_string(),
                kind: "continuum".to_string(),
                dir: self.dir.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.moments.len()
    }
}

pub fn continuum_file_name(source: &str, resolution_tag: &str) -> String {
    format!("{source}_SBLB_continuum_{resolution_tag}.pbcor.tt0.fits")
}

#[cfg(test)]
pub fn moment_file_name(source: &str, molecule: &str, kind: MomentKind, config: &ViewerConfig) -> String {
    format!(
        "{source}_SBLB_{molecule}_{}_{}_{}.fits",
        config.resolution_tag,
        kind.tag(),
        config.cutout_tag
    )
}

/// Recognise `<prefix>_<molecule>_<resolution>_<momN>_<cutout>.fits`. The
/// molecule is the longest configured label the stem ends with, so labels
/// that share a suffix (`SO` / `SiO`) never collide.
fn classify_moment_file(name: &str, config: &ViewerConfig) -> Option<(String, MomentKind)> {
    let stem = name.strip_suffix(".fits")?;
    for kind in MomentKind::ALL {
        let suffix = format!("_{}_{}_{}", config.resolution_tag, kind.tag(), config.cutout_tag);
        let Some(head) = stem.strip_suffix(suffix.as_str()) else {
            continue;
        };
        let molecule = config
            .molecules
            .iter()
            .filter(|mol| {
                head.strip_suffix(mol.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.ends_with('_'))
            })
            .max_by_key(|mol| mol.len())?;
        return Some((molecule.clone(), kind));
    }
    None
}
