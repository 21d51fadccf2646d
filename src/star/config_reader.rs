use crate::star::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: u32,
    pub quota: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    /// A source with the default layout: names of the candidates in the first row,
    /// one ballot per row after that, no id column.
    pub fn simple(provider: &str, file_path: &str, excel_worksheet_name: Option<String>) -> Self {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
            excel_worksheet_name,
        }
    }

    /// 0-based index of the first column holding scores. Defaults to the first column.
    pub fn first_vote_column_index(&self) -> StarResult<usize> {
        match &self._first_vote_column_index {
            None => Ok(0),
            x => read_js_index(x),
        }
    }

    /// 0-based index of the first row holding a ballot. Defaults to the second row, the
    /// first one being the header.
    pub fn first_vote_row_index(&self) -> StarResult<usize> {
        match &self._first_vote_row_index {
            None => Ok(1),
            x => read_js_index(x),
        }
    }

    pub fn id_column_index_int(&self) -> StarResult<Option<usize>> {
        match &self.id_column_index {
            None => Ok(None),
            x => read_js_index(x).map(Some),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StarCandidate {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StarRules {
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: u32,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: String,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
    #[serde(rename = "fiveStarTiebreaker")]
    pub five_star_tiebreaker: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StarConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources")]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Vec<StarCandidate>,
    pub rules: StarRules,
}

pub fn read_config(path: &str) -> StarResult<StarConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: StarConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_reference(path: &str) -> StarResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Indexes follow the spreadsheet conventions: numbers start at 1, and columns may
// also be given by their letters (A, B, ..., Z, AA, ...).
fn read_js_index(x: &Option<JSValue>) -> StarResult<usize> {
    let one_based: usize = match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_lowercase()
                .chars()
                .fold(0, |acc, c| acc * 26 + (c as usize - 'a' as usize + 1))
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {})?,
        _ => None.context(ParsingJsonNumberSnafu {})?,
    };
    one_based.checked_sub(1).context(ParsingJsonNumberSnafu {})
}
