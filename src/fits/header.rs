use std::collections::BTreeMap;

use super::wcs::WCS_KEYWORDS;
use crate::error::{PipelineError, Result};

/// Non-coordinate keywords copied out of the primary HDU. Together with
/// [`WCS_KEYWORDS`] anything else in the header is ignored.
pub const KNOWN_KEYWORDS: &[&str] = &[
    "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "NAXIS4", "BITPIX", "BUNIT", "BMAJ", "BMIN", "BPA",
    "OBJECT", "RESTFRQ",
];

/// A header card value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Logical(bool),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&fitrs::HeaderValue> for HeaderValue {
    fn from(value: &fitrs::HeaderValue) -> Self {
        match value {
            fitrs::HeaderValue::CharacterString(s) => HeaderValue::Text(s.trim().to_string()),
            fitrs::HeaderValue::Logical(b) => HeaderValue::Logical(*b),
            fitrs::HeaderValue::IntegerNumber(i) => HeaderValue::Integer(*i as i64),
            fitrs::HeaderValue::RealFloatingNumber(v) => HeaderValue::Float(*v),
            other => HeaderValue::Text(format!("{other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// FitsHeader
// ---------------------------------------------------------------------------

/// Keyword → value metadata of an image. Keywords are stored upper-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: BTreeMap<String, HeaderValue>,
}

impl FitsHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the known keywords out of a fitrs HDU.
    pub fn from_hdu(hdu: &fitrs::Hdu) -> Self {
        let mut header = Self::new();
        let wcs_keys = WCS_KEYWORDS.iter().map(|k| k.to_ascii_uppercase());
        for key in KNOWN_KEYWORDS.iter().map(|k| k.to_string()).chain(wcs_keys) {
            if let Some(value) = hdu.value(&key) {
                header.insert(&key, HeaderValue::from(value));
            }
        }
        header
    }

    pub fn insert(&mut self, key: &str, value: HeaderValue) {
        self.cards.insert(key.to_ascii_uppercase(), value);
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.cards.get(&key.to_ascii_uppercase())
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(HeaderValue::as_f64)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            HeaderValue::Integer(i) => Some(*i),
            HeaderValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    pub fn require_float(&self, key: &'static str) -> Result<f64> {
        self.float(key).ok_or(PipelineError::MissingKeyword(key))
    }

    pub fn require_text(&self, key: &'static str) -> Result<&str> {
        self.text(key).ok_or(PipelineError::MissingKeyword(key))
    }

    /// Physical unit of the pixel values, empty when absent.
    pub fn bunit(&self) -> &str {
        self.text("BUNIT").unwrap_or("")
    }
}
