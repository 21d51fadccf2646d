use log::debug;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::config::{AllocationRules, TieBreakMode};

/// The generator used for random tiebreaks when the caller does not provide one.
///
/// The 64-bit seed goes little-endian into the first 8 bytes of the ChaCha20 seed,
/// the rest is zero. The mapping is explicit so that a seed gives the same stream
/// on every platform.
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    let mut seed32 = [0u8; 32];
    seed32[..8].copy_from_slice(&seed.to_le_bytes());
    ChaCha20Rng::from_seed(seed32)
}

/// Unbiased integer in [0, n), or None if n == 0.
///
/// Rejection sampling: draws below 2^64 mod n are discarded so that every residue
/// is equally likely.
pub fn choose_index<R: RngCore + ?Sized>(rng: &mut R, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let n = n as u64;
    let threshold = n.wrapping_neg() % n;
    loop {
        let x = rng.next_u64();
        if x >= threshold {
            return Some((x % n) as usize);
        }
    }
}

/// Picks the winner among the candidates that share the highest score of a round.
///
/// `ties` holds candidate indexes in increasing order and is never empty.
/// `five_star_counts` is the number of ballots giving MAX_SCORE, per candidate.
pub(crate) fn break_tie<R: RngCore + ?Sized>(
    ties: &[usize],
    rules: &AllocationRules,
    five_star_counts: &[u64],
    rng: &mut R,
) -> usize {
    let mut contenders: Vec<usize> = ties.to_vec();
    if rules.five_star_tiebreaker && contenders.len() > 1 {
        let most = contenders
            .iter()
            .map(|&c| five_star_counts[c])
            .max()
            .unwrap_or(0);
        contenders.retain(|&c| five_star_counts[c] == most);
        debug!(
            "break_tie: five-star tiebreaker kept {:?} out of {:?}",
            contenders, ties
        );
    }
    match (rules.tiebreak_mode, contenders.as_slice()) {
        (_, [single]) => *single,
        (TieBreakMode::Random(_), _) => {
            let idx = choose_index(rng, contenders.len()).unwrap_or(0);
            debug!("break_tie: random pick {} in {:?}", idx, contenders);
            contenders[idx]
        }
        (TieBreakMode::UseCandidateOrder, _) => contenders[0],
    }
}
