use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{SourceCatalog, SourceRecord};

/// Columns the catalog must provide, in display order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Source",
    "RA",
    "Dec",
    "Distance",
    "T_bol",
    "L_bol",
    "v_sys",
    "cont_rms",
    "Description",
];

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Load the source catalog from a comma-separated file with a header row.
pub fn load_catalog(path: &Path) -> Result<SourceCatalog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    read_catalog(file).with_context(|| format!("reading catalog {}", path.display()))
}

/// Parse catalog rows from any reader. Extra columns are ignored; missing
/// required columns or unparsable numbers are an error.
pub fn read_catalog<R: Read>(reader: R) -> Result<SourceCatalog> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("reading CSV headers")?.clone();
    for col in REQUIRED_COLUMNS {
        if col != "Description" && !headers.iter().any(|h| h == col) {
            bail!("catalog missing '{col}' column");
        }
    }

    let mut sources = Vec::new();
    for (row_no, result) in reader.deserialize::<SourceRecord>().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.position_deg().is_none() {
            log::warn!(
                "Source {} has unparsable coordinates '{}' '{}'",
                record.name,
                record.ra,
                record.dec
            );
        }
        sources.push(record);
    }

    if sources.is_empty() {
        bail!("catalog contains no sources");
    }
    Ok(SourceCatalog::new(sources))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Source,RA,Dec,Distance,T_bol,L_bol,v_sys,cont_rms,Description
Ced110IRS4,11:06:46.37,-77:22:32.6,189,56,1.0,4.7,0.02,\"Class 0 protostar, Chamaeleon I\"
L1489IRS,04:04:43.08,+26:18:56.1,146,213,3.4,7.3,0.03,Class I
";

    #[test]
    fn reads_rows_with_quoted_description() {
        let cat = read_catalog(CSV.as_bytes()).unwrap();
        assert_eq!(cat.len(), 2);

        let ced = cat.find("Ced110IRS4").unwrap();
        assert_eq!(ced.distance, 189.0);
        assert_eq!(ced.v_sys, 4.7);
        assert_eq!(ced.description, "Class 0 protostar, Chamaeleon I");

        let (ra, dec) = cat.find("L1489IRS").unwrap().position_deg().unwrap();
        assert!((ra - 61.179500).abs() < 1e-5);
        assert!(dec > 26.0);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "Source,RA,Dec\nX,00:00:00,00:00:00\n";
        let err = read_catalog(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("Distance"));
    }

    #[test]
    fn bad_number_is_an_error() {
        let csv = "\
Source,RA,Dec,Distance,T_bol,L_bol,v_sys,cont_rms,Description
X,00:00:00,00:00:00,far,56,1.0,4.7,0.02,x
";
        assert!(read_catalog(csv.as_bytes()).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(load_catalog(&path).unwrap().len(), 2);
        assert!(load_catalog(&dir.path().join("nope.csv")).is_err());
    }
}
