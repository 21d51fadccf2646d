// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The highest score a voter may give to a candidate.
pub const MAX_SCORE: u32 = 5;

/// A set of validated ballots, as handed over by the ballot validator.
///
/// Each row holds one score per candidate, in candidate order. The counts of
/// invalid ballots and undervotes are only carried through to the statistics:
/// those ballots take no part in the tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BallotSet {
    pub scores: Vec<Vec<u32>>,
    pub invalid: u64,
    pub undervotes: u64,
}

// ******** Output data structures *********

/// A candidate and its position in the ballots.
///
/// The index is the identity used by all the matrices of the summary. It does not
/// change during the tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct Candidate {
    pub index: usize,
    pub name: String,
}

/// Aggregated statistics over the valid ballots, and the telemetry of each round.
#[derive(PartialEq, Debug, Clone)]
pub struct SummaryData {
    pub candidates: Vec<Candidate>,
    /// Sum of the raw scores, per candidate.
    pub total_scores: Vec<u64>,
    /// Number of ballots giving each score (0 to MAX_SCORE), per candidate.
    pub score_hist: Vec<Vec<u64>>,
    /// preference_matrix[i][j] is the number of ballots scoring i strictly above j.
    pub preference_matrix: Vec<Vec<u64>>,
    /// pairwise_matrix[i][j] is true if i beats j head to head.
    pub pairwise_matrix: Vec<Vec<bool>>,
    pub n_valid_votes: u64,
    pub n_invalid_votes: u64,
    pub n_under_votes: u64,
    pub n_bullet_votes: u64,
    // Round telemetry. One entry per round.
    pub split_points: Vec<f64>,
    pub spent_aboves: Vec<f64>,
    pub weight_on_splits: Vec<f64>,
    /// Weighted sums of each round, on the 0..MAX_SCORE scale, in candidate order.
    pub weighted_scores_by_round: Vec<Vec<f64>>,
    /// The candidates still running at the start of each round.
    pub candidates_by_round: Vec<Vec<Candidate>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllocationResult {
    /// The winners, in the order in which they were elected.
    pub elected: Vec<Candidate>,
    /// For each round, the candidates that tied for the highest score.
    /// Empty if the round had a single leader.
    pub tied: Vec<Vec<Candidate>>,
    /// The candidates that were not elected.
    pub other: Vec<Candidate>,
    pub summary_data: SummaryData,
}

impl AllocationResult {
    /// The winners followed by the other candidates.
    ///
    /// This is the order in which results are usually presented, see
    /// [crate::reorder::sort_summary_data].
    pub fn display_order(&self) -> Vec<Candidate> {
        self.elected
            .iter()
            .chain(self.other.iter())
            .cloned()
            .collect()
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AllocationErrors {
    /// The rules or the shape of the input do not describe a valid election.
    InvalidConfiguration(String),
    /// There is not a single valid ballot to tabulate.
    InsufficientBallots,
    /// A score outside of 0..=MAX_SCORE.
    InvalidBallotScore {
        ballot: usize,
        candidate: usize,
        score: u32,
    },
    /// Should never happen: the state of the tabulation is inconsistent.
    InternalInvariantViolation(String),
}

impl Error for AllocationErrors {}

impl Display for AllocationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationErrors::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
            AllocationErrors::InsufficientBallots => write!(f, "no valid ballot to tabulate"),
            AllocationErrors::InvalidBallotScore {
                ballot,
                candidate,
                score,
            } => write!(
                f,
                "ballot {}: score {} for candidate {} is outside of 0..={}",
                ballot, score, candidate, MAX_SCORE
            ),
            AllocationErrors::InternalInvariantViolation(msg) => {
                write!(f, "internal invariant violated: {}", msg)
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// The candidate listed first wins the tie.
    UseCandidateOrder,
    /// A winner is drawn uniformly among the tied candidates. The value is the seed
    /// of the generator.
    Random(u64),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AllocationRules {
    pub number_of_winners: u32,
    pub tiebreak_mode: TieBreakMode,
    /// Among tied candidates, prefer the ones with the most ballots at MAX_SCORE.
    pub five_star_tiebreaker: bool,
}

impl AllocationRules {
    pub const DEFAULT_RULES: AllocationRules = AllocationRules {
        number_of_winners: 3,
        tiebreak_mode: TieBreakMode::UseCandidateOrder,
        five_star_tiebreaker: true,
    };
}
