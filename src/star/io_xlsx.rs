// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::star::{io_common::rows_to_ballots, *};

pub fn read_excel_scores(path: &str, cfs: &FileSource) -> StarResult<ParsedFile> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &cfs.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    debug!("read_excel_scores: {}: {:?} cells", path, wrange.get_size());

    let rows: Vec<Vec<String>> = wrange
        .rows()
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    rows_to_ballots(rows, path, cfs)
}

// Scores typed as numbers come back as floats. Whole values are turned back into
// integers, anything else is kept as text and rejected by the validation.
fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::Empty => "".to_string(),
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
            (*f as u64).to_string()
        }
        DataType::Float(f) => f.to_string(),
        x => format!("{:?}", x),
    }
}
