use log::debug;

use crate::config::{AllocationErrors, BallotSet, Candidate, SummaryData, MAX_SCORE};
use crate::normalize::check_scores;

/// Compresses the valid ballots into the statistics needed to run and audit an election.
///
/// Fails if a ballot does not have one score per candidate, or has a score above
/// MAX_SCORE.
pub fn summary_data(
    candidate_names: &[String],
    ballots: &BallotSet,
) -> Result<SummaryData, AllocationErrors> {
    check_scores(&ballots.scores, candidate_names.len())?;
    let n = candidate_names.len();
    let mut total_scores: Vec<u64> = vec![0; n];
    let mut score_hist: Vec<Vec<u64>> = vec![vec![0; MAX_SCORE as usize + 1]; n];
    let mut preference_matrix: Vec<Vec<u64>> = vec![vec![0; n]; n];
    let mut n_bullet_votes: u64 = 0;

    for ballot in ballots.scores.iter() {
        let mut num_supported = 0;
        for (i, &score) in ballot.iter().enumerate() {
            total_scores[i] += score as u64;
            score_hist[i][score as usize] += 1;
            for (j, &other) in ballot.iter().enumerate() {
                if i != j && score > other {
                    preference_matrix[i][j] += 1;
                }
            }
            if score > 0 {
                num_supported += 1;
            }
        }
        if num_supported == 1 {
            n_bullet_votes += 1;
        }
    }

    let pairwise_matrix: Vec<Vec<bool>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| preference_matrix[i][j] > preference_matrix[j][i])
                .collect()
        })
        .collect();

    debug!(
        "summary_data: total scores: {:?} bullet votes: {:?}",
        total_scores, n_bullet_votes
    );

    Ok(SummaryData {
        candidates: candidate_names
            .iter()
            .enumerate()
            .map(|(index, name)| Candidate {
                index,
                name: name.clone(),
            })
            .collect(),
        total_scores,
        score_hist,
        preference_matrix,
        pairwise_matrix,
        n_valid_votes: ballots.scores.len() as u64,
        n_invalid_votes: ballots.invalid,
        n_under_votes: ballots.undervotes,
        n_bullet_votes,
        split_points: Vec::new(),
        spent_aboves: Vec::new(),
        weight_on_splits: Vec::new(),
        weighted_scores_by_round: Vec::new(),
        candidates_by_round: Vec::new(),
    })
}
