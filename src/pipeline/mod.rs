//! Moment-map pipeline, run once per detail-page interaction.
//!
//! ```text
//!  FitsIndex ──► ImageUnit::open ──► stats (DisplayRange) ──► MomentFigure::render
//!                      │                                           │
//!                      └──► contour (continuum levels) ────────────┤
//!                                                                  ▼
//!                                                         MomentFigure::recenter
//! ```

pub mod contour;
pub mod moment;
pub mod render;
pub mod stats;
pub mod view;
