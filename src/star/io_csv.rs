// Primitives for reading CSV files.

use crate::star::{io_common::rows_to_ballots, *};

pub fn read_csv_scores(path: &str, cfs: &FileSource) -> StarResult<ParsedFile> {
    // Short rows are kept: the validation rejects them as invalid ballots.
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for line_r in rdr.into_records() {
        let line = line_r.context(CsvLineParseSnafu {})?;
        rows.push(line.iter().map(|s| s.to_string()).collect());
    }
    debug!("read_csv_scores: {}: {} rows", path, rows.len());
    rows_to_ballots(rows, path, cfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_simple_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "Alice,Bob,Charlie").unwrap();
        writeln!(f, "5,3,").unwrap();
        writeln!(f, "0,5,4").unwrap();
        writeln!(f, "1").unwrap();
        let path = f.path().to_str().unwrap().to_string();
        let cfs = FileSource::simple("csv", &path, None);
        let pf = read_csv_scores(&path, &cfs).unwrap();
        assert_eq!(
            pf.header,
            Some(vec!["Alice".to_string(), "Bob".to_string(), "Charlie".to_string()])
        );
        assert_eq!(pf.ballots.len(), 3);
        assert_eq!(pf.ballots[0].choices, vec!["5", "3", ""]);
        assert_eq!(pf.ballots[2].choices, vec!["1"]);
    }

    #[test]
    fn missing_file() {
        let cfs = FileSource::simple("csv", "/nonexistent/ballots.csv", None);
        assert!(read_csv_scores("/nonexistent/ballots.csv", &cfs).is_err());
    }
}
