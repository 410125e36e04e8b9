//! FITS image access: primary-HDU loading, header keywords and the celestial
//! WCS used to place pixels on the sky.

pub mod header;
pub mod image;
pub mod wcs;

pub use header::FitsHeader;
pub use self::image::ImageUnit;
pub use self::wcs::Wcs;
