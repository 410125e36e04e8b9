use std::fmt;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// SourceRecord – one row of the catalog
// ---------------------------------------------------------------------------

/// A single protostar as listed in the survey catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "Source")]
    pub name: String,
    /// Right ascension, `hh:mm:ss.s`.
    #[serde(rename = "RA")]
    pub ra: String,
    /// Declination, `dd:mm:ss.s`.
    #[serde(rename = "Dec")]
    pub dec: String,
    /// Distance in parsecs.
    #[serde(rename = "Distance")]
    pub distance: f64,
    /// Bolometric temperature in K.
    #[serde(rename = "T_bol")]
    pub t_bol: f64,
    /// Bolometric luminosity in solar units.
    #[serde(rename = "L_bol")]
    pub l_bol: f64,
    /// Systemic velocity in km/s.
    #[serde(rename = "v_sys")]
    pub v_sys: f64,
    /// Continuum RMS noise level.
    #[serde(rename = "cont_rms")]
    pub cont_rms: f64,
    #[serde(rename = "Description", default)]
    pub description: String,
}

impl SourceRecord {
    /// Sky position in degrees, if both coordinates parse.
    pub fn position_deg(&self) -> Option<(f64, f64)> {
        let ra = parse_sexagesimal(&self.ra)? * 15.0;
        let dec = parse_sexagesimal(&self.dec)?;
        Some((ra, dec))
    }

    pub fn class(&self) -> ProtostarClass {
        ProtostarClass::from_t_bol(self.t_bol)
    }
}

/// Parse `dd:mm:ss.s` (or space separated) into decimal units of the first
/// field. The sign of the first field applies to the whole value.
pub fn parse_sexagesimal(s: &str) -> Option<f64> {
    let s = s.trim();
    let negative = s.starts_with('-');
    let parts: Vec<f64> = s
        .trim_start_matches(['-', '+'])
        .split([':', ' '])
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let value = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(v, div)| v / div)
        .sum::<f64>();
    Some(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// ProtostarClass – evolutionary class from T_bol
// ---------------------------------------------------------------------------

/// Standard T_bol class boundaries (Chen et al. 1995).
pub const CLASS_0_MAX_TBOL: f64 = 70.0;
pub const CLASS_I_MAX_TBOL: f64 = 650.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtostarClass {
    Class0,
    ClassI,
    ClassII,
}

impl ProtostarClass {
    pub fn from_t_bol(t_bol: f64) -> Self {
        if t_bol < CLASS_0_MAX_TBOL {
            ProtostarClass::Class0
        } else if t_bol < CLASS_I_MAX_TBOL {
            ProtostarClass::ClassI
        } else {
            ProtostarClass::ClassII
        }
    }
}

impl fmt::Display for ProtostarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtostarClass::Class0 => write!(f, "Class 0"),
            ProtostarClass::ClassI => write!(f, "Class I"),
            ProtostarClass::ClassII => write!(f, "Class II"),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceCatalog – the complete loaded catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    pub sources: Vec<SourceRecord>,
}

impl SourceCatalog {
    pub fn new(sources: Vec<SourceRecord>) -> Self {
        Self { sources }
    }

    pub fn find(&self, name: &str) -> Option<&SourceRecord> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sexagesimal_hours_and_degrees() {
        assert_relative_eq!(parse_sexagesimal("11:06:46.37").unwrap(), 11.112880, epsilon = 1e-6);
        assert_relative_eq!(parse_sexagesimal("-77:22:32.6").unwrap(), -77.375722, epsilon = 1e-6);
        assert_relative_eq!(parse_sexagesimal("-00:30:00").unwrap(), -0.5);
        assert!(parse_sexagesimal("abc").is_none());
        assert!(parse_sexagesimal("").is_none());
    }

    #[test]
    fn class_boundaries() {
        assert_eq!(ProtostarClass::from_t_bol(56.0), ProtostarClass::Class0);
        assert_eq!(ProtostarClass::from_t_bol(70.0), ProtostarClass::ClassI);
        assert_eq!(ProtostarClass::from_t_bol(649.9), ProtostarClass::ClassI);
        assert_eq!(ProtostarClass::from_t_bol(900.0), ProtostarClass::ClassII);
    }
}
