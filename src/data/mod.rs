/// Data layer: catalog types, catalog loading, and FITS file lookup.
///
/// Architecture:
/// ```text
///  eDisk_sources_overview.csv        fits_files/<Source>/*.fits
///        │                                   │
///        ▼                                   ▼
///   ┌──────────┐                      ┌───────────┐
///   │  loader   │  parse rows          │   index    │  (molecule, moment) → path
///   └──────────┘                      └───────────┘
///        │                                   │
///        ▼                                   ▼
///   ┌──────────────┐                  pipeline::moment
///   │ SourceCatalog │  Vec<SourceRecord>
///   └──────────────┘
/// ```

pub mod index;
pub mod loader;
pub mod model;
