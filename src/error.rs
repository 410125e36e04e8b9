use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Failures of the moment-map pipeline. Every variant aborts the render that
/// raised it; nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{}: not a usable FITS image: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("missing header keyword {0}")]
    MissingKeyword(&'static str),

    #[error("pixel-to-world matrix is singular")]
    SingularTransform,

    #[error("malformed celestial axis type '{0}'")]
    UnsupportedProjection(String),

    #[error("world coordinate system: {0}")]
    Wcs(#[from] ::wcs::error::Error),

    #[error("image contains no finite pixel values")]
    NoFiniteValues,

    #[error("display range is degenerate: min {min} must be below max {max}")]
    DegenerateRange { min: f64, max: f64 },

    #[error("invalid percentile cutoffs ({lo}, {hi})")]
    InvalidPercentiles { lo: f64, hi: f64 },

    #[error("invalid window size {width} x {height}")]
    InvalidWindow { width: f64, height: f64 },

    #[error("region does not overlap the {width}x{height} image")]
    RegionOutOfBounds { width: usize, height: usize },

    #[error("world coordinate ({ra:.6}, {dec:.6}) cannot be projected onto the image")]
    Unprojectable { ra: f64, dec: f64 },

    #[error("no {kind} image for molecule '{molecule}' in {}", dir.display())]
    NoImage {
        molecule: String,
        kind: String,
        dir: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
