use rand_core::RngCore;
use std::collections::HashSet;

pub use crate::config::*;

/// A builder for assembling the ballots of an election.
///
/// ```
/// use allocated_score::builder::Builder;
/// use allocated_score::AllocationRules;
/// # use allocated_score::AllocationErrors;
///
/// let mut builder = Builder::new(&AllocationRules::DEFAULT_RULES)?
///     .number_of_winners(1)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot(&[5, 2])?;
/// builder.add_ballot(&[3, 1])?;
/// builder.add_undervote();
///
/// let result = builder.run()?;
/// assert_eq!(result.elected[0].name, "Anna");
/// # Ok::<(), AllocationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AllocationRules,
    pub(crate) _candidates: Vec<String>,
    pub(crate) _ballots: BallotSet,
}

impl Builder {
    pub fn new(rules: &AllocationRules) -> Result<Builder, AllocationErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: BallotSet::default(),
        })
    }

    pub fn number_of_winners(self, num_winners: u32) -> Result<Builder, AllocationErrors> {
        if num_winners == 0 {
            return Err(AllocationErrors::InvalidConfiguration(
                "the number of winners must be positive".to_string(),
            ));
        }
        Ok(Builder {
            _rules: AllocationRules {
                number_of_winners: num_winners,
                ..self._rules
            },
            ..self
        })
    }

    /// Sets the candidates. Any ballot added so far is discarded.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, AllocationErrors> {
        if cands.is_empty() {
            return Err(AllocationErrors::InvalidConfiguration(
                "no candidate".to_string(),
            ));
        }
        let mut seen: HashSet<&String> = HashSet::new();
        if let Some(dup) = cands.iter().find(|&c| !seen.insert(c)) {
            return Err(AllocationErrors::InvalidConfiguration(format!(
                "duplicate candidate name {:?}",
                dup
            )));
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _ballots: BallotSet::default(),
        })
    }

    /// Adds a ballot with one score per candidate, in the order of the candidates.
    pub fn add_ballot(&mut self, scores: &[u32]) -> Result<(), AllocationErrors> {
        if scores.len() != self._candidates.len() {
            return Err(AllocationErrors::InvalidConfiguration(format!(
                "expected {} scores, got {}",
                self._candidates.len(),
                scores.len()
            )));
        }
        if let Some((candidate, &score)) = scores.iter().enumerate().find(|(_, &s)| s > MAX_SCORE)
        {
            return Err(AllocationErrors::InvalidBallotScore {
                ballot: self._ballots.scores.len(),
                candidate,
                score,
            });
        }
        self._ballots.scores.push(scores.to_vec());
        Ok(())
    }

    /// Records a ballot rejected by the validation. It only shows in the statistics.
    pub fn add_invalid(&mut self) {
        self._ballots.invalid += 1;
    }

    /// Records a ballot left entirely blank. It only shows in the statistics.
    pub fn add_undervote(&mut self) {
        self._ballots.undervotes += 1;
    }

    pub fn run(&self) -> Result<AllocationResult, AllocationErrors> {
        crate::run_allocated_score(&self._candidates, &self._ballots, &self._rules)
    }

    pub fn run_with_rng<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<AllocationResult, AllocationErrors> {
        crate::run_allocated_score_with_rng(&self._candidates, &self._ballots, &self._rules, rng)
    }
}
