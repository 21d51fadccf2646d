use log::{debug, info, warn};

use allocated_score::reorder::sort_summary_data;
use allocated_score::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::star::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum StarError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet in file {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in file {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Could not read a row or column index"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Tabulation failed: {source}"))]
    Tabulation { source: AllocationErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type StarResult<T> = Result<T, StarError>;

/// A row of an input file, before validation. The choices are the raw cells of the
/// vote columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    pub choices: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedFile {
    pub header: Option<Vec<String>>,
    pub ballots: Vec<ParsedBallot>,
}

// Everything needed to run an election, once the configuration and the flags have
// been merged.
#[derive(Debug, Clone)]
struct ElectionSetup {
    output_settings: OutputSettings,
    candidates: Option<Vec<String>>,
    rules: AllocationRules,
    root_path: PathBuf,
    sources: Vec<FileSource>,
}

enum BallotStatus {
    Valid(Vec<u32>),
    Invalid(String),
    Undervote,
}

fn read_score(cell: &str) -> Result<Option<u32>, String> {
    let c = cell.trim();
    if c.is_empty() {
        return Ok(None);
    }
    match c.parse::<u32>() {
        Ok(x) if x <= MAX_SCORE => Ok(Some(x)),
        _ => Err(format!("{:?} is not a score between 0 and {}", c, MAX_SCORE)),
    }
}

fn check_ballot(pb: &ParsedBallot, num_candidates: usize) -> BallotStatus {
    if pb.choices.len() != num_candidates {
        return BallotStatus::Invalid(format!(
            "{} cells for {} candidates",
            pb.choices.len(),
            num_candidates
        ));
    }
    let mut scores: Vec<u32> = Vec::with_capacity(num_candidates);
    let mut all_blank = true;
    for cell in pb.choices.iter() {
        match read_score(cell) {
            Ok(Some(x)) => {
                all_blank = false;
                scores.push(x);
            }
            Ok(None) => scores.push(0),
            Err(msg) => return BallotStatus::Invalid(msg),
        }
    }
    if all_blank {
        BallotStatus::Undervote
    } else {
        BallotStatus::Valid(scores)
    }
}

/// Turns the parsed rows into the scores used by the tabulation. Rejected and blank
/// ballots are only counted.
pub fn validate_ballots(parsed_ballots: &[ParsedBallot], num_candidates: usize) -> BallotSet {
    let mut res = BallotSet::default();
    for pb in parsed_ballots.iter() {
        match check_ballot(pb, num_candidates) {
            BallotStatus::Valid(scores) => {
                debug!("validate_ballots: {}: {:?}", pb.id, scores);
                res.scores.push(scores);
            }
            BallotStatus::Invalid(reason) => {
                warn!("Invalid ballot {}: {}", pb.id, reason);
                res.invalid += 1;
            }
            BallotStatus::Undervote => {
                debug!("validate_ballots: {}: undervote", pb.id);
                res.undervotes += 1;
            }
        }
    }
    info!(
        "validate_ballots: {} valid, {} invalid, {} undervotes",
        res.scores.len(),
        res.invalid,
        res.undervotes
    );
    res
}

fn validate_rules(star_rules: &StarRules) -> StarResult<AllocationRules> {
    let res = AllocationRules {
        number_of_winners: match star_rules.number_of_winners {
            0 => whatever!("numberOfWinners must be at least 1"),
            x => x,
        },
        tiebreak_mode: match star_rules.tiebreak_mode.as_str() {
            "useCandidateOrder" => TieBreakMode::UseCandidateOrder,
            "random" => {
                let seed = match star_rules.random_seed.clone().map(|s| s.parse::<u64>()) {
                    Some(Result::Ok(x)) => x,
                    x => {
                        whatever!("Tiebreak mode random requires a numeric randomSeed, got {:?}", x)
                    }
                };
                TieBreakMode::Random(seed)
            }
            x => {
                whatever!("Cannot use tiebreak mode {:?}: not implemented", x)
            }
        },
        five_star_tiebreaker: star_rules.five_star_tiebreaker.unwrap_or(true),
    };
    Ok(res)
}

fn read_score_data(root_path: &Path, cfs: &FileSource) -> StarResult<ParsedFile> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read score file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_scores(&p2, cfs),
        "xlsx" => io_xlsx::read_excel_scores(&p2, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

/// The fingerprint of the validated ballots: one line per ballot, scores separated by
/// commas.
pub fn ballots_digest(ballots: &BallotSet) -> String {
    let lines: Vec<String> = ballots
        .scores
        .iter()
        .map(|row| {
            row.iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>()
                .join(",")
        })
        .collect();
    sha256::digest(lines.join("\n"))
}

fn names(cands: &[Candidate]) -> Vec<String> {
    cands.iter().map(|c| c.name.clone()).collect()
}

fn summary_to_json(sd: &SummaryData) -> JSValue {
    json!({
        "candidates": names(&sd.candidates),
        "totalScores": sd.total_scores,
        "scoreHist": sd.score_hist,
        "preferenceMatrix": sd.preference_matrix,
        "pairwiseMatrix": sd.pairwise_matrix,
        "nValidVotes": sd.n_valid_votes,
        "nInvalidVotes": sd.n_invalid_votes,
        "nUnderVotes": sd.n_under_votes,
        "nBulletVotes": sd.n_bullet_votes,
        "splitPoints": sd.split_points,
        "spentAboves": sd.spent_aboves,
        "weightOnSplits": sd.weight_on_splits,
    })
}

fn rounds_to_json(res: &AllocationResult) -> Vec<JSValue> {
    let sd = &res.summary_data;
    let mut l: Vec<JSValue> = Vec::new();
    for (idx, winner) in res.elected.iter().enumerate() {
        let mut scores: JSMap<String, JSValue> = JSMap::new();
        if let (Some(running), Some(sums)) = (
            sd.candidates_by_round.get(idx),
            sd.weighted_scores_by_round.get(idx),
        ) {
            for c in running.iter() {
                scores.insert(c.name.clone(), json!(sums[c.index]));
            }
        }
        l.push(json!({
            "round": idx + 1,
            "winner": winner.name,
            "tied": res.tied.get(idx).map(|t| names(t)).unwrap_or_default(),
            "weightedScores": scores,
            "splitPoint": sd.split_points.get(idx),
            "spentAbove": sd.spent_aboves.get(idx),
            "weightOnSplit": sd.weight_on_splits.get(idx),
        }));
    }
    l
}

/// Assembles the report of an election.
pub fn result_to_json(
    output_settings: &OutputSettings,
    rules: &AllocationRules,
    ballots: &BallotSet,
    res: &AllocationResult,
) -> StarResult<JSValue> {
    let c = OutputConfig {
        contest: output_settings.contest_name.clone(),
        date: output_settings.contest_date.clone(),
        jurisdiction: output_settings.contest_jurisdiction.clone(),
        office: output_settings.contest_office.clone(),
        number_of_winners: rules.number_of_winners,
        quota: res.summary_data.n_valid_votes as f64 / rules.number_of_winners as f64,
    };
    let sorted = sort_summary_data(&res.summary_data, &res.display_order())
        .context(TabulationSnafu {})?;
    Ok(json!({
        "config": c,
        "ballotsDigest": ballots_digest(ballots),
        "results": {
            "elected": names(&res.elected),
            "tied": res.tied.iter().map(|t| names(t)).collect::<Vec<_>>(),
            "other": names(&res.other),
        },
        "summary": summary_to_json(&sorted),
        "rounds": rounds_to_json(res),
    }))
}

fn setup_from_args(args: &Args) -> StarResult<ElectionSetup> {
    let mut setup = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_path = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            let candidates: Vec<String> =
                config.candidates.iter().map(|c| c.name.clone()).collect();
            ElectionSetup {
                rules: validate_rules(&config.rules)?,
                output_settings: config.output_settings,
                candidates: if candidates.is_empty() {
                    None
                } else {
                    Some(candidates)
                },
                root_path,
                sources: config.cvr_file_sources,
            }
        }
        None => ElectionSetup {
            output_settings: OutputSettings::default(),
            candidates: None,
            rules: AllocationRules::DEFAULT_RULES,
            root_path: PathBuf::new(),
            sources: Vec::new(),
        },
    };

    // The flags take precedence over the configuration.
    if let Some(input) = &args.input {
        let input_type = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
        setup.root_path = PathBuf::new();
        setup.sources = vec![FileSource::simple(
            &input_type,
            input,
            args.excel_worksheet_name.clone(),
        )];
    }
    if let Some(cands) = &args.candidates {
        setup.candidates = Some(cands.clone());
    }
    if let Some(n) = args.winners {
        setup.rules.number_of_winners = n;
    }
    if let Some(seed) = args.random_seed {
        setup.rules.tiebreak_mode = TieBreakMode::Random(seed);
    }
    if args.no_five_star {
        setup.rules.five_star_tiebreaker = false;
    }

    if setup.sources.is_empty() {
        whatever!("No input: pass a configuration file with --config or a ballot file with --input")
    }
    Ok(setup)
}

fn write_output(out: &Option<String>, pretty_js: &str) -> StarResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            fs::write(path, pretty_js).context(WritingOutputSnafu { path })?;
            info!("Summary written to {}", path);
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> StarResult<()> {
    let summary_ref = read_reference(reference_path)?;
    debug!("reference: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    // Both sides go through the same parser so that floats compare equal.
    let stats: JSValue = serde_json::from_str(pretty_js_stats).context(ParsingJsonSnafu {})?;
    let pretty_js_stats = serde_json::to_string_pretty(&stats).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats.as_str(), "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

pub fn run_election(args: &Args) -> StarResult<()> {
    let setup = setup_from_args(args)?;
    info!("setup: {:?}", setup);

    let mut header: Option<Vec<String>> = None;
    let mut parsed_ballots: Vec<ParsedBallot> = Vec::new();
    for cfs in setup.sources.iter() {
        let mut pf = read_score_data(&setup.root_path, cfs)?;
        if header.is_none() {
            header = pf.header;
        }
        parsed_ballots.append(&mut pf.ballots);
    }

    let candidates: Vec<String> = match (setup.candidates, header) {
        (Some(cands), _) => cands,
        (None, Some(h)) if !h.is_empty() => h,
        _ => whatever!("No candidates: list them in the configuration, with --candidates or in the header of the input"),
    };
    info!("candidates: {:?}", candidates);

    let ballots = validate_ballots(&parsed_ballots, candidates.len());
    let result =
        run_allocated_score(&candidates, &ballots, &setup.rules).context(TabulationSnafu {})?;

    let result_js = result_to_json(&setup.output_settings, &setup.rules, &ballots, &result)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(&args.out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}
