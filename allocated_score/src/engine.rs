use log::{debug, info};
use rand_core::RngCore;

use crate::config::*;
use crate::normalize::normalize_scores;
use crate::tiebreak::break_tie;

// The contribution of one ballot to the winner of a round.
#[derive(PartialEq, Debug, Clone, Copy)]
struct WinnerScore {
    index: usize,
    ballot_weight: f64,
    weighted_score: f64,
}

/// How the weight of the ballots was spent on the winner of a round.
#[derive(PartialEq, Debug, Clone, Copy)]
pub(crate) struct SplitOutcome {
    pub split_point: f64,
    pub spent_above: f64,
    pub weight_on_split: f64,
}

// The working state of one tabulation. Owned by a single run and dropped at the end.
struct AllocationState {
    // Indexed by candidate. False once the candidate is elected.
    active: Vec<bool>,
    scores_norm: Vec<Vec<f64>>,
    ballot_weights: Vec<f64>,
    elected: Vec<usize>,
    tied: Vec<Vec<usize>>,
    quota: f64,
}

/// Runs the rounds of the Allocated Score method until all the seats are filled.
///
/// The ballots must have been checked beforehand (see [crate::normalize::check_scores]),
/// and there must be at least one ballot and one seat per winner.
pub(crate) fn run_allocation<R: RngCore + ?Sized>(
    mut summary: SummaryData,
    ballots: &BallotSet,
    rules: &AllocationRules,
    rng: &mut R,
) -> Result<AllocationResult, AllocationErrors> {
    let num_candidates = summary.candidates.len();
    let num_winners = rules.number_of_winners as usize;
    let num_ballots = ballots.scores.len();

    let mut state = AllocationState {
        active: vec![true; num_candidates],
        scores_norm: normalize_scores(&ballots.scores, MAX_SCORE),
        ballot_weights: vec![1.0; num_ballots],
        elected: Vec::new(),
        tied: Vec::new(),
        quota: num_ballots as f64 / num_winners as f64,
    };
    info!(
        "run_allocation: {} ballots, {} winners, quota: {}",
        num_ballots, num_winners, state.quota
    );

    let five_star_counts: Vec<u64> = summary
        .score_hist
        .iter()
        .map(|h| h[MAX_SCORE as usize])
        .collect();

    while state.elected.len() < num_winners {
        let round_id = state.elected.len() + 1;

        let sums = weighted_sums(&state.scores_norm, &state.ballot_weights);
        debug!("Round {}: weighted sums: {:?}", round_id, sums);
        summary.candidates_by_round.push(
            summary
                .candidates
                .iter()
                .filter(|c| state.active[c.index])
                .cloned()
                .collect(),
        );
        summary.weighted_scores_by_round.push(sums.clone());

        let ties = find_leaders(&sums, &state.active);
        if ties.is_empty() {
            return Err(AllocationErrors::InternalInvariantViolation(format!(
                "no candidate left in round {} with {} seats filled out of {}",
                round_id,
                state.elected.len(),
                num_winners
            )));
        }
        let winner = break_tie(&ties, rules, &five_star_counts, rng);
        if ties.len() > 1 {
            info!("Round {}: tie between {:?}", round_id, ties);
            state.tied.push(ties);
        } else {
            state.tied.push(Vec::new());
        }
        info!(
            "Round {}: elected {} with weighted score {}",
            round_id,
            summary.candidates[winner].name,
            sums[winner] * MAX_SCORE as f64
        );

        // Contributions to the winner, taken before its column is cleared.
        let records: Vec<WinnerScore> = state
            .scores_norm
            .iter()
            .zip(state.ballot_weights.iter())
            .enumerate()
            .map(|(index, (ballot, &ballot_weight))| WinnerScore {
                index,
                ballot_weight,
                weighted_score: ballot[winner] * ballot_weight,
            })
            .collect();

        state.elected.push(winner);
        state.active[winner] = false;
        for ballot in state.scores_norm.iter_mut() {
            ballot[winner] = 0.0;
        }

        let outcome = reweight(&records, &mut state.ballot_weights, state.quota);
        debug!("Round {}: {:?}", round_id, outcome);
        summary.split_points.push(outcome.split_point);
        summary.spent_aboves.push(outcome.spent_above);
        summary.weight_on_splits.push(outcome.weight_on_split);
    }

    for row in summary.weighted_scores_by_round.iter_mut() {
        for x in row.iter_mut() {
            *x *= MAX_SCORE as f64;
        }
    }

    let to_candidates = |idxs: &[usize]| -> Vec<Candidate> {
        idxs.iter().map(|&i| summary.candidates[i].clone()).collect()
    };
    let elected = to_candidates(&state.elected);
    let tied: Vec<Vec<Candidate>> = state.tied.iter().map(|t| to_candidates(t)).collect();
    let other: Vec<Candidate> = summary
        .candidates
        .iter()
        .filter(|c| state.active[c.index])
        .cloned()
        .collect();

    Ok(AllocationResult {
        elected,
        tied,
        other,
        summary_data: summary,
    })
}

/// Per-candidate sum of the weighted scores. The ballots are accumulated in order so
/// that the result does not depend on anything but the input.
fn weighted_sums(scores_norm: &[Vec<f64>], ballot_weights: &[f64]) -> Vec<f64> {
    let num_candidates = scores_norm.first().map(|b| b.len()).unwrap_or(0);
    let mut sums = vec![0.0; num_candidates];
    for (ballot, &weight) in scores_norm.iter().zip(ballot_weights.iter()) {
        for (c, &score) in ballot.iter().enumerate() {
            sums[c] += score * weight;
        }
    }
    sums
}

/// All the active candidates sharing the highest sum, in candidate order.
fn find_leaders(sums: &[f64], active: &[bool]) -> Vec<usize> {
    let mut leaders: Vec<usize> = Vec::new();
    let mut max = f64::NEG_INFINITY;
    for (c, &s) in sums.iter().enumerate() {
        if !active[c] {
            continue;
        }
        if s > max {
            max = s;
            leaders.clear();
            leaders.push(c);
        } else if s == max {
            leaders.push(c);
        }
    }
    leaders
}

/// The weighted score at which the cumulative weight of the supporters of the winner
/// reaches the quota.
///
/// `sorted` is in decreasing order of weighted score. This is the lowest score among
/// the leading ballots whose cumulative weight is still strictly below the quota. If
/// the first ballot alone reaches the quota, it is the score of that ballot.
fn find_split_point(sorted: &[WinnerScore], quota: f64) -> f64 {
    let mut cumsum = 0.0;
    let mut split_point: Option<f64> = None;
    for ws in sorted.iter() {
        cumsum += ws.ballot_weight;
        if cumsum < quota {
            split_point = Some(match split_point {
                Some(sp) if sp <= ws.weighted_score => sp,
                _ => ws.weighted_score,
            });
        }
    }
    split_point
        .or_else(|| sorted.first().map(|ws| ws.weighted_score))
        .unwrap_or(0.0)
}

/// Spends the weight of the ballots that elected the winner, and updates the weights
/// in place.
///
/// The ballots strictly above the split point are entirely spent. The ballots exactly
/// on the split point pay the fraction of their weight needed to complete the quota.
fn reweight(records: &[WinnerScore], ballot_weights: &mut [f64], quota: f64) -> SplitOutcome {
    let mut sorted: Vec<WinnerScore> = records.to_vec();
    // Stable: equal scores keep the order of the ballots.
    sorted.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));

    let split_point = find_split_point(&sorted, quota);

    let mut new_weights: Vec<f64> = records.iter().map(|r| r.ballot_weight).collect();
    let mut spent_above = 0.0;
    for r in records.iter() {
        if r.weighted_score > split_point {
            spent_above += r.ballot_weight;
            new_weights[r.index] = 0.0;
        }
    }

    let weight_on_split: f64 = records
        .iter()
        .filter(|r| r.weighted_score == split_point)
        .map(|r| r.ballot_weight)
        .sum();

    if weight_on_split > 0.0 {
        let spend_fraction = (quota - spent_above) / weight_on_split;
        debug!(
            "reweight: spending {} of the weight on the split point",
            spend_fraction
        );
        for r in records.iter() {
            if r.weighted_score == split_point {
                new_weights[r.index] = r.ballot_weight * (1.0 - spend_fraction);
            }
        }
    }

    for (w, nw) in ballot_weights.iter_mut().zip(new_weights.into_iter()) {
        *w = nw.clamp(0.0, 1.0);
    }

    SplitOutcome {
        split_point,
        spent_above,
        weight_on_split,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summary_data;
    use crate::tiebreak::seeded_rng;
    use proptest::prelude::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn run(
        names: &[&str],
        scores: Vec<Vec<u32>>,
        rules: &AllocationRules,
    ) -> AllocationResult {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let ballots = BallotSet {
            scores,
            ..BallotSet::default()
        };
        let summary = summary_data(&names, &ballots).unwrap();
        let mut rng = seeded_rng(0);
        run_allocation(summary, &ballots, rules, &mut rng).unwrap()
    }

    fn rules(n: u32) -> AllocationRules {
        AllocationRules {
            number_of_winners: n,
            tiebreak_mode: TieBreakMode::UseCandidateOrder,
            five_star_tiebreaker: false,
        }
    }

    fn ws(index: usize, ballot_weight: f64, weighted_score: f64) -> WinnerScore {
        WinnerScore {
            index,
            ballot_weight,
            weighted_score,
        }
    }

    fn names_of(cs: &[Candidate]) -> Vec<&str> {
        cs.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn three_way_tie_goes_to_first_candidate() {
        init();
        let res = run(
            &["A", "B", "C"],
            vec![vec![5, 0, 0], vec![0, 5, 0], vec![0, 0, 5]],
            &rules(2),
        );
        assert_eq!(names_of(&res.tied[0]), vec!["A", "B", "C"]);
        assert_eq!(names_of(&res.elected), vec!["A", "B"]);
        assert_eq!(names_of(&res.tied[1]), vec!["B", "C"]);
        assert_eq!(names_of(&res.other), vec!["C"]);
        assert_eq!(
            res.summary_data.weighted_scores_by_round[0],
            vec![5.0, 5.0, 5.0]
        );
    }

    #[test]
    fn unsupported_candidate_is_never_elected() {
        init();
        let res = run(
            &["A", "B", "Z"],
            vec![vec![5, 1, 0], vec![2, 5, 0], vec![4, 4, 0], vec![0, 3, 0]],
            &rules(2),
        );
        assert_eq!(names_of(&res.other), vec!["Z"]);
        for round in res.summary_data.weighted_scores_by_round.iter() {
            assert_eq!(round[2], 0.0);
        }
    }

    #[test]
    fn supporters_on_the_split_share_the_seat() {
        init();
        // 4 ballots, 2 seats: quota 2. Three ballots give A the maximum.
        let res = run(
            &["A", "B"],
            vec![vec![5, 0], vec![5, 1], vec![5, 2], vec![0, 5]],
            &rules(2),
        );
        assert_eq!(names_of(&res.elected), vec!["A", "B"]);
        let sd = &res.summary_data;
        // Cumulative weight: 1, 2, 3. Only the first ballot is strictly below the quota.
        assert_eq!(sd.split_points[0], 1.0);
        assert_eq!(sd.spent_aboves[0], 0.0);
        assert_eq!(sd.weight_on_splits[0], 3.0);
        // Each of the three supporters keeps a third of its weight.
        let b_round2 = sd.weighted_scores_by_round[1][1];
        let expected = (1.0 / 3.0) * (1.0 + 2.0) + 5.0;
        assert!((b_round2 - expected).abs() < 1e-9, "{}", b_round2);
    }

    #[test]
    fn ballots_above_split_are_spent() {
        init();
        // 6 ballots, 2 seats: quota 3. One ballot gives A the maximum, three give 3.
        let res = run(
            &["A", "B"],
            vec![
                vec![5, 0],
                vec![3, 0],
                vec![3, 0],
                vec![3, 0],
                vec![0, 5],
                vec![0, 5],
            ],
            &rules(2),
        );
        assert_eq!(names_of(&res.elected), vec!["A", "B"]);
        let sd = &res.summary_data;
        // Cumulative weight: 1, 2, 3. The split is at the score of the second ballot.
        assert_eq!(sd.split_points[0], 0.6);
        assert_eq!(sd.spent_aboves[0], 1.0);
        assert_eq!(sd.weight_on_splits[0], 3.0);
        // The three ballots on the split keep a third of their weight: A is out, so
        // B only gets the two full ballots in the second round.
        assert!((sd.weighted_scores_by_round[0][0] - 14.0).abs() < 1e-9);
        assert!((sd.weighted_scores_by_round[1][1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn strong_supporters_lose_all_weight() {
        // Cumulative weights 1, 2, 3 are below a quota of 3.5: the split is at 0.6.
        let records = vec![
            ws(0, 1.0, 1.0),
            ws(1, 1.0, 1.0),
            ws(2, 1.0, 0.6),
            ws(3, 1.0, 0.6),
            ws(4, 1.0, 0.6),
            ws(5, 1.0, 0.0),
        ];
        let mut weights = vec![1.0; 6];
        let outcome = reweight(&records, &mut weights, 3.5);
        assert_eq!(outcome.split_point, 0.6);
        assert_eq!(outcome.spent_above, 2.0);
        assert_eq!(outcome.weight_on_split, 3.0);
        assert_eq!(weights[0], 0.0);
        assert_eq!(weights[1], 0.0);
        for w in &weights[2..5] {
            assert!((w - 0.5).abs() < 1e-12);
        }
        assert_eq!(weights[5], 1.0);
        let spent: f64 = 6.0 - weights.iter().sum::<f64>();
        assert!((spent - 3.5).abs() < 1e-9);
    }

    #[test]
    fn split_point_uses_strict_bound() {
        let sorted = vec![ws(0, 1.0, 1.0), ws(1, 1.0, 0.8), ws(2, 1.0, 0.4)];
        // Cumulative weights 1, 2, 3: with a quota of 2, only the first one counts.
        assert_eq!(find_split_point(&sorted, 2.0), 1.0);
        assert_eq!(find_split_point(&sorted, 2.5), 0.8);
    }

    #[test]
    fn split_point_when_first_ballot_fills_quota() {
        let sorted = vec![ws(0, 1.0, 1.0), ws(1, 1.0, 0.4)];
        assert_eq!(find_split_point(&sorted, 1.0), 1.0);
        assert_eq!(find_split_point(&[], 1.0), 0.0);
    }

    #[test]
    fn equal_scores_keep_ballot_order() {
        // Ballots 1 and 2 share a score. Taken in ballot order, the heavier one comes
        // first and already crosses the quota, so the split stays at 0.9.
        let records = vec![ws(0, 0.5, 0.9), ws(1, 0.6, 0.5), ws(2, 0.2, 0.5)];
        let mut weights = vec![0.5, 0.6, 0.2];
        let outcome = reweight(&records, &mut weights, 1.0);
        assert_eq!(outcome.split_point, 0.9);
        assert_eq!(outcome.spent_above, 0.0);
        assert_eq!(outcome.weight_on_split, 0.5);
        assert_eq!(weights, vec![0.0, 0.6, 0.2]);
    }

    #[test]
    fn elected_candidate_cannot_win_again() {
        init();
        // Everybody runs out of support: the second seat goes to B, not back to A.
        let res = run(&["A", "B"], vec![vec![5, 0]], &rules(2));
        assert_eq!(names_of(&res.elected), vec!["A", "B"]);
        assert!(res.other.is_empty());
    }

    #[test]
    fn random_tiebreak_is_reproducible() {
        init();
        let names: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let ballots = BallotSet {
            scores: vec![
                vec![5, 0, 0, 0],
                vec![0, 5, 0, 0],
                vec![0, 0, 5, 0],
                vec![0, 0, 0, 5],
            ],
            ..BallotSet::default()
        };
        let r = AllocationRules {
            number_of_winners: 3,
            tiebreak_mode: TieBreakMode::Random(11),
            five_star_tiebreaker: false,
        };
        let first = run_allocation(
            summary_data(&names, &ballots).unwrap(),
            &ballots,
            &r,
            &mut seeded_rng(11),
        )
        .unwrap();
        let second = run_allocation(
            summary_data(&names, &ballots).unwrap(),
            &ballots,
            &r,
            &mut seeded_rng(11),
        )
        .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.tied[0].len(), 4);
    }

    #[test]
    fn telemetry_has_one_entry_per_round() {
        init();
        let res = run(
            &["A", "B", "C", "D"],
            vec![vec![5, 4, 1, 0], vec![0, 3, 5, 2], vec![1, 1, 1, 1], vec![5, 5, 0, 3]],
            &rules(3),
        );
        let sd = &res.summary_data;
        assert_eq!(res.elected.len(), 3);
        assert_eq!(res.tied.len(), 3);
        assert_eq!(sd.split_points.len(), 3);
        assert_eq!(sd.spent_aboves.len(), 3);
        assert_eq!(sd.weight_on_splits.len(), 3);
        assert_eq!(sd.weighted_scores_by_round.len(), 3);
        assert_eq!(sd.candidates_by_round[0].len(), 4);
        assert_eq!(sd.candidates_by_round[2].len(), 2);
        for row in sd.weighted_scores_by_round.iter() {
            assert_eq!(row.len(), 4);
        }
    }

    proptest! {
        #[test]
        fn weights_stay_in_unit_range(
            raw in prop::collection::vec(prop::collection::vec(0u32..=5, 4), 1..30),
            seats in 1u32..=4,
        ) {
            let ballots = BallotSet { scores: raw, ..BallotSet::default() };
            let mut weights = vec![1.0; ballots.scores.len()];
            let quota = ballots.scores.len() as f64 / seats as f64;
            let mut norm = normalize_scores(&ballots.scores, MAX_SCORE);
            let mut active = vec![true; 4];
            let mut elected = Vec::new();
            for _ in 0..seats {
                let sums = weighted_sums(&norm, &weights);
                let leaders = find_leaders(&sums, &active);
                prop_assert!(!leaders.is_empty());
                let w = leaders[0];
                let records: Vec<WinnerScore> = norm
                    .iter()
                    .zip(weights.iter())
                    .enumerate()
                    .map(|(i, (b, &bw))| ws(i, bw, b[w] * bw))
                    .collect();
                let before: Vec<f64> = weights.clone();
                let outcome = reweight(&records, &mut weights, quota);
                for (i, &x) in weights.iter().enumerate() {
                    prop_assert!((0.0..=1.0).contains(&x));
                    prop_assert!(x <= before[i] + 1e-12);
                }
                if outcome.weight_on_split > 0.0 {
                    let fraction = (quota - outcome.spent_above) / outcome.weight_on_split;
                    if (0.0..=1.0).contains(&fraction) {
                        let spent: f64 = before
                            .iter()
                            .zip(weights.iter())
                            .map(|(b, a)| b - a)
                            .sum();
                        prop_assert!(
                            (spent - quota).abs() < 1e-9,
                            "spent {} quota {}",
                            spent,
                            quota
                        );
                    }
                }
                prop_assert!(!elected.contains(&w));
                elected.push(w);
                active[w] = false;
                for b in norm.iter_mut() {
                    b[w] = 0.0;
                }
            }
            prop_assert_eq!(elected.len(), seats as usize);
        }
    }
}
