mod config;
mod engine;
use log::{debug, info};
use rand_core::RngCore;
use std::collections::HashSet;

pub mod builder;
pub mod manual;
pub mod normalize;
pub mod reorder;
pub mod summary;
pub mod tiebreak;

pub use crate::config::*;

/// Runs the Allocated Score (STAR-PR) method on a set of validated ballots.
///
/// Arguments:
/// * `candidates` the names of the candidates. The position of a name is the position
/// of the matching score in every ballot.
/// * `ballots` the ballots that passed validation, with the counts of rejected ones
/// * `rules` the rules that govern this election
///
/// When the rules ask for random tiebreaks, the generator is seeded from the rules so
/// that the same input always gives the same result.
pub fn run_allocated_score(
    candidates: &[String],
    ballots: &BallotSet,
    rules: &AllocationRules,
) -> Result<AllocationResult, AllocationErrors> {
    let seed = match rules.tiebreak_mode {
        TieBreakMode::Random(seed) => seed,
        TieBreakMode::UseCandidateOrder => 0,
    };
    let mut rng = tiebreak::seeded_rng(seed);
    run_allocated_score_with_rng(candidates, ballots, rules, &mut rng)
}

/// Same as [run_allocated_score], with the random generator used for tiebreaks provided
/// by the caller. The seed in the rules is then ignored.
pub fn run_allocated_score_with_rng<R: RngCore + ?Sized>(
    candidates: &[String],
    ballots: &BallotSet,
    rules: &AllocationRules,
    rng: &mut R,
) -> Result<AllocationResult, AllocationErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        ballots.scores.len(),
        candidates,
        rules
    );
    checks(candidates, ballots, rules)?;
    for (idx, name) in candidates.iter().enumerate() {
        debug!("Candidate: {}: {}", idx, name);
    }

    let summary = summary::summary_data(candidates, ballots)?;
    let res = engine::run_allocation(summary, ballots, rules, rng)?;
    info!(
        "Elected: {:?}",
        res.elected.iter().map(|c| &c.name).collect::<Vec<_>>()
    );
    Ok(res)
}

// Everything that can be wrong with the input is caught here, before any computation.
fn checks(
    candidates: &[String],
    ballots: &BallotSet,
    rules: &AllocationRules,
) -> Result<(), AllocationErrors> {
    if candidates.is_empty() {
        return Err(AllocationErrors::InvalidConfiguration(
            "no candidate".to_string(),
        ));
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for name in candidates.iter() {
        if !seen.insert(name.as_str()) {
            return Err(AllocationErrors::InvalidConfiguration(format!(
                "duplicate candidate name {:?}",
                name
            )));
        }
    }
    let num_winners = rules.number_of_winners as usize;
    if num_winners == 0 || num_winners > candidates.len() {
        return Err(AllocationErrors::InvalidConfiguration(format!(
            "cannot elect {} winners out of {} candidates",
            num_winners,
            candidates.len()
        )));
    }
    if ballots.scores.is_empty() {
        return Err(AllocationErrors::InsufficientBallots);
    }
    normalize::check_scores(&ballots.scores, candidates.len())
}
