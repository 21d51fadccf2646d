use log::debug;

use crate::config::{AllocationErrors, MAX_SCORE};

/// Checks that every ballot has one score per candidate and that all the scores are
/// within 0..=MAX_SCORE.
pub fn check_scores(scores: &[Vec<u32>], num_candidates: usize) -> Result<(), AllocationErrors> {
    for (b, ballot) in scores.iter().enumerate() {
        if ballot.len() != num_candidates {
            return Err(AllocationErrors::InvalidConfiguration(format!(
                "ballot {} has {} scores but there are {} candidates",
                b,
                ballot.len(),
                num_candidates
            )));
        }
        if let Some((c, &score)) = ballot.iter().enumerate().find(|(_, &s)| s > MAX_SCORE) {
            return Err(AllocationErrors::InvalidBallotScore {
                ballot: b,
                candidate: c,
                score,
            });
        }
    }
    debug!("check_scores: {} ballots checked", scores.len());
    Ok(())
}

/// Rescales the scores to the [0, 1] range.
pub fn normalize_scores(scores: &[Vec<u32>], max_score: u32) -> Vec<Vec<f64>> {
    let max = max_score as f64;
    scores
        .iter()
        .map(|ballot| ballot.iter().map(|&s| s as f64 / max).collect())
        .collect()
}
