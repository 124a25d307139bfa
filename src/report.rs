//! CSV export of [`RunRecord`]s.

use crate::error::Result;
use crate::experiment::RunRecord;
use std::io::Write;
use std::path::Path;

/// Writes a header row and one row per record.
pub fn write_records<W: Write>(writer: W, records: &[RunRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv(path: impl AsRef<Path>, records: &[RunRecord]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    write_records(file, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<RunRecord> {
        vec![
            RunRecord {
                dataset: "MNIST".to_string(),
                algorithm: "nc".to_string(),
                pca: false,
                accuracy: 0.82,
                seconds: 1.5,
            },
            RunRecord {
                dataset: "MNIST".to_string(),
                algorithm: "nsc-2".to_string(),
                pca: true,
                accuracy: 0.25,
                seconds: 0.125,
            },
        ]
    }

    #[test]
    fn test_write_records() {
        let mut out = Vec::new();
        write_records(&mut out, &records()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "dataset,algorithm,pca,accuracy,seconds");
        assert_eq!(lines[1], "MNIST,nc,false,0.82,1.5");
        assert_eq!(lines[2], "MNIST,nsc-2,true,0.25,0.125");
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_csv(&path, &records()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "nsc-2");
    }

    #[test]
    fn test_empty_report_has_no_rows() {
        let mut out = Vec::new();
        write_records(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }
}
