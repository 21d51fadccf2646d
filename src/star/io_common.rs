use std::path::Path;

use crate::star::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Cuts the rows of a spreadsheet into ballots, following the layout of the source.
///
/// Rows are numbered from 1. The row just above the first ballot, if any, is taken as
/// the header with the names of the candidates.
pub fn rows_to_ballots(
    rows: Vec<Vec<String>>,
    path: &str,
    cfs: &FileSource,
) -> StarResult<ParsedFile> {
    let default_id = make_default_id(path);
    let id_idx_o = cfs.id_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let header: Option<Vec<String>> = first_row
        .checked_sub(1)
        .and_then(|idx| rows.get(idx))
        .map(|row| {
            row.iter()
                .skip(choices_start_col)
                .map(|s| s.trim().to_string())
                .collect()
        });

    let mut ballots: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in rows.into_iter().enumerate().skip(first_row) {
        let lineno = idx + 1;
        let id = match id_idx_o {
            Some(id_idx) => match row.get(id_idx) {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => whatever!("{}: line {} has no ballot id in column {}", path, lineno, id_idx + 1),
            },
            None => default_id(lineno),
        };
        let choices: Vec<String> = row.into_iter().skip(choices_start_col).collect();
        debug!("rows_to_ballots: lineno: {:?} row: {:?}", lineno, &choices);
        ballots.push(ParsedBallot { id, choices });
    }
    Ok(ParsedFile { header, ballots })
}
