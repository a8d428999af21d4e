pub use crate::config::*;

/// A builder for adding the votes of the political groups.
///
/// ```
/// pub use apportionment::builder::Builder;
/// pub use apportionment::ApportionmentRules;
/// # use apportionment::ApportionmentError;
///
/// let mut builder = Builder::new(&ApportionmentRules::DEFAULT_RULES)?.seats(3)?;
///
/// builder.add_political_group(1, 2000)?;
/// builder.add_political_group(2, 1000)?;
///
/// let result = builder.seat_assignment()?;
/// assert_eq!(result.total_seats(), vec![2, 1]);
/// # Ok::<(), ApportionmentError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ApportionmentRules,
    pub(crate) _seats: u32,
    pub(crate) _political_groups: Vec<PoliticalGroupVotes>,
}

impl Builder {
    pub fn new(rules: &ApportionmentRules) -> Result<Builder, ApportionmentError> {
        Ok(Builder {
            _rules: rules.clone(),
            _seats: 0,
            _political_groups: Vec::new(),
        })
    }

    pub fn seats(self, seats: u32) -> Result<Builder, ApportionmentError> {
        if seats == 0 {
            return Err(ApportionmentError::ZeroSeats);
        }
        Ok(Builder {
            _seats: seats,
            ..self
        })
    }

    /// Adds the votes of a political group. The groups keep the order in which
    /// they are added.
    pub fn add_political_group(
        &mut self,
        number: u32,
        votes: u32,
    ) -> Result<(), ApportionmentError> {
        self.add_political_group_2(&PoliticalGroupVotes {
            number,
            votes,
            candidate_count: None,
        })
    }

    /// Adds a political group with the number of candidates on its list.
    pub fn add_political_group_with_candidates(
        &mut self,
        number: u32,
        votes: u32,
        candidate_count: u32,
    ) -> Result<(), ApportionmentError> {
        self.add_political_group_2(&PoliticalGroupVotes {
            number,
            votes,
            candidate_count: Some(candidate_count),
        })
    }

    pub fn add_political_group_2(
        &mut self,
        pg: &PoliticalGroupVotes,
    ) -> Result<(), ApportionmentError> {
        if pg.number == 0 {
            return Err(ApportionmentError::InvalidPoliticalGroupNumber {
                pg_number: pg.number,
            });
        }
        if self._political_groups.iter().any(|p| p.number == pg.number) {
            return Err(ApportionmentError::DuplicatePoliticalGroup {
                pg_number: pg.number,
            });
        }
        self._political_groups.push(pg.clone());
        Ok(())
    }

    pub fn build(&self) -> ApportionmentInput {
        ApportionmentInput {
            seats: self._seats,
            political_groups: self._political_groups.clone(),
        }
    }

    /// Runs the apportionment on the groups added so far.
    pub fn seat_assignment(&self) -> Result<SeatAssignmentResult, ApportionmentError> {
        crate::seat_assignment(&self.build(), &self._rules)
    }
}
