use crate::config::{AllocationErrors, Candidate, SummaryData};

/// Returns a copy of the summary with the candidates in the given order.
///
/// The candidates, their totals, histograms and the preference and pairwise matrices
/// are permuted, and the candidate indexes are rewritten to their new positions. The
/// round telemetry is passed through untouched. `order` must contain every candidate
/// of the summary exactly once.
pub fn sort_summary_data(
    summary: &SummaryData,
    order: &[Candidate],
) -> Result<SummaryData, AllocationErrors> {
    let n = summary.candidates.len();
    let index_order: Vec<usize> = order.iter().map(|c| c.index).collect();
    let mut seen = vec![false; n];
    for &idx in index_order.iter() {
        if idx >= n || seen[idx] {
            return Err(AllocationErrors::InvalidConfiguration(format!(
                "candidate order {:?} is not a permutation of {} candidates",
                index_order, n
            )));
        }
        seen[idx] = true;
    }
    if index_order.len() != n {
        return Err(AllocationErrors::InvalidConfiguration(format!(
            "candidate order has {} candidates, expected {}",
            index_order.len(),
            n
        )));
    }

    Ok(SummaryData {
        candidates: index_order
            .iter()
            .enumerate()
            .map(|(pos, &idx)| Candidate {
                index: pos,
                name: summary.candidates[idx].name.clone(),
            })
            .collect(),
        total_scores: index_order
            .iter()
            .map(|&idx| summary.total_scores[idx])
            .collect(),
        score_hist: index_order
            .iter()
            .map(|&idx| summary.score_hist[idx].clone())
            .collect(),
        preference_matrix: sort_matrix(&summary.preference_matrix, &index_order),
        pairwise_matrix: sort_matrix(&summary.pairwise_matrix, &index_order),
        n_valid_votes: summary.n_valid_votes,
        n_invalid_votes: summary.n_invalid_votes,
        n_under_votes: summary.n_under_votes,
        n_bullet_votes: summary.n_bullet_votes,
        split_points: summary.split_points.clone(),
        spent_aboves: summary.spent_aboves.clone(),
        weight_on_splits: summary.weight_on_splits.clone(),
        weighted_scores_by_round: summary.weighted_scores_by_round.clone(),
        candidates_by_round: summary.candidates_by_round.clone(),
    })
}

fn sort_matrix<T: Copy>(matrix: &[Vec<T>], order: &[usize]) -> Vec<Vec<T>> {
    order
        .iter()
        .map(|&i| order.iter().map(|&j| matrix[i][j]).collect())
        .collect()
}
