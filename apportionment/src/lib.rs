/*!
Seat apportionment for list elections, computed with exact fractions.

The full seats are given by the quota (the number of votes per seat). The
residual seats are then assigned one at a time, and every assignment is
recorded with the standings of all the political groups, so that the outcome
can be audited and published.

```
use apportionment::builder::Builder;
use apportionment::{ApportionmentError, ApportionmentRules};

let mut builder = Builder::new(&ApportionmentRules::DEFAULT_RULES)?.seats(23)?;
for (number, votes) in [(1, 600), (2, 302), (3, 98), (4, 99), (5, 101)] {
    builder.add_political_group(number, votes)?;
}
let result = builder.seat_assignment()?;
assert_eq!(result.total_seats(), vec![12, 6, 1, 2, 2]);
assert_eq!(result.quota.to_string(), "52 4/23");
# Ok::<(), ApportionmentError>(())
```
*/
mod config;
pub mod builder;
pub mod fraction;
pub mod manual;

use log::{debug, info, warn};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::fraction::Fraction;

// **** Private structures ****

// The running state of a political group during the residual seat rounds.
#[derive(Eq, PartialEq, Debug, Clone)]
struct GroupState {
    standing: PoliticalGroupStanding,
    // Only set when the rules limit the seats to the candidates.
    candidate_limit: Option<u32>,
    // Set once the group got a seat in the unique highest average phase.
    unique_average_seat: bool,
}

impl GroupState {
    fn is_exhausted(&self) -> bool {
        matches!(self.candidate_limit, Some(limit) if self.standing.total_seats() >= limit)
    }

    fn set_residual_seats(&mut self, residual_seats: u32) {
        self.standing.residual_seats = residual_seats;
        self.standing.next_votes_per_seat =
            votes_per_seat(self.standing.votes_cast, self.standing.total_seats());
    }
}

/// The rule used for one residual seat. The remainders method goes through
/// the phases in order, switching when nobody is eligible anymore.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Phase {
    LargestRemainder,
    UniqueLargestAverage,
    LargestAverage,
}

impl Phase {
    const AVERAGES: [Phase; 1] = [Phase::LargestAverage];
    const REMAINDERS: [Phase; 3] = [
        Phase::LargestRemainder,
        Phase::UniqueLargestAverage,
        Phase::LargestAverage,
    ];

    fn is_eligible(&self, group: &GroupState) -> bool {
        if group.is_exhausted() {
            return false;
        }
        let pg = &group.standing;
        match self {
            Phase::LargestRemainder => pg.meets_remainder_threshold && pg.residual_seats == 0,
            Phase::UniqueLargestAverage => pg.votes_cast > 0 && !group.unique_average_seat,
            Phase::LargestAverage => pg.votes_cast > 0,
        }
    }

    fn value(&self, group: &GroupState) -> Fraction {
        match self {
            Phase::LargestRemainder => group.standing.remainder_votes,
            Phase::UniqueLargestAverage | Phase::LargestAverage => {
                group.standing.next_votes_per_seat
            }
        }
    }

    fn change(
        &self,
        selected_pg_number: u32,
        pg_options: Vec<u32>,
        pg_assigned: Vec<u32>,
        value: Fraction,
    ) -> SeatChange {
        match self {
            Phase::LargestRemainder => {
                SeatChange::LargestRemainderAssignment(LargestRemainderAssignedSeat {
                    selected_pg_number,
                    pg_options,
                    pg_assigned,
                    remainder_votes: value,
                })
            }
            Phase::UniqueLargestAverage => {
                SeatChange::UniqueLargestAverageAssignment(LargestAverageAssignedSeat {
                    selected_pg_number,
                    pg_options,
                    pg_assigned,
                    votes_per_seat: value,
                })
            }
            Phase::LargestAverage => {
                SeatChange::LargestAverageAssignment(LargestAverageAssignedSeat {
                    selected_pg_number,
                    pg_options,
                    pg_assigned,
                    votes_per_seat: value,
                })
            }
        }
    }
}

/// Runs the seat apportionment with the given rules.
///
/// Arguments:
/// * `input` the number of seats and the votes of every political group. The
/// order of the groups is kept in all the standings.
/// * `rules` the rules that govern this election
pub fn seat_assignment(
    input: &ApportionmentInput,
    rules: &ApportionmentRules,
) -> Result<SeatAssignmentResult, ApportionmentError> {
    info!(
        "Processing {:?} political groups for {:?} seats, rules: {:?}",
        input.political_groups.len(),
        input.seats,
        rules
    );

    let cr = checks(input, rules)?;
    let seats = input.seats;
    let quota = Fraction::new(cr.total_votes, seats as u64);
    info!("Quota: {} ({} votes)", quota, cr.total_votes);

    let mut groups: Vec<GroupState> = input
        .political_groups
        .iter()
        .map(|pg| initial_state(pg, seats, cr.total_votes, rules))
        .collect();
    for g in groups.iter() {
        info!(
            "Political group {}: {} votes, {} full seats, remainder {}",
            g.standing.pg_number,
            g.standing.votes_cast,
            g.standing.full_seats,
            g.standing.remainder_votes
        );
    }

    let full_seats: u32 = groups.iter().map(|g| g.standing.full_seats).sum();
    // The sum of the floors never exceeds the number of seats.
    assert!(full_seats <= seats);
    let residual_seats = seats - full_seats;

    let phases: &[Phase] = if rules.residual_seat_method.uses_averages(seats) {
        &Phase::AVERAGES
    } else {
        &Phase::REMAINDERS
    };
    info!(
        "Full seats: {}, residual seats: {}, phases: {:?}",
        full_seats, residual_seats, phases
    );

    let mut steps: Vec<AssignmentStep> = Vec::new();
    for residual_seat_number in 1..=residual_seats {
        let remaining_seats = residual_seats - residual_seat_number + 1;
        let step = assign_residual_seat(
            &mut groups,
            phases,
            rules.tiebreak_mode,
            residual_seat_number,
            remaining_seats,
        )?;
        info!(
            "Residual seat {}: political group {} ({:?})",
            residual_seat_number,
            step.change.selected_pg_number(),
            step.change
        );
        steps.push(step);
    }

    let corrections = if rules.absolute_majority_correction {
        absolute_majority_correction(
            &mut groups,
            &steps,
            cr.total_votes,
            seats,
            rules.tiebreak_mode,
        )?
    } else {
        Vec::new()
    };

    let final_standing: Vec<PoliticalGroupSeatAssignment> = groups
        .iter()
        .map(|g| PoliticalGroupSeatAssignment::from(&g.standing))
        .collect();
    debug_assert_eq!(
        final_standing.iter().map(|pg| pg.total_seats).sum::<u32>(),
        seats
    );

    Ok(SeatAssignmentResult {
        seats,
        full_seats,
        residual_seats,
        quota,
        steps,
        final_standing,
        corrections,
    })
}

fn votes_per_seat(votes_cast: u64, seats: u32) -> Fraction {
    Fraction::new(votes_cast, seats as u64 + 1)
}

// votes >= threshold * total_votes / seats, without any division.
fn meets_threshold(votes: u64, total_votes: u64, seats: u32, threshold: &Fraction) -> bool {
    votes as u128 * seats as u128 * threshold.denominator() as u128
        >= threshold.raw_numerator() as u128 * total_votes as u128
}

fn initial_state(
    pg: &PoliticalGroupVotes,
    seats: u32,
    total_votes: u64,
    rules: &ApportionmentRules,
) -> GroupState {
    let votes = pg.votes as u64;
    let candidate_limit = if rules.limit_seats_to_candidates {
        pg.candidate_count
    } else {
        None
    };
    // floor(votes / quota), with quota = total_votes / seats
    let quota_seats = (votes * seats as u64) / total_votes;
    let full_seats = match candidate_limit {
        Some(limit) if (limit as u64) < quota_seats => {
            debug!(
                "initial_state: political group {} is limited to {} candidates",
                pg.number, limit
            );
            limit
        }
        // Bounded by the number of seats.
        _ => quota_seats as u32,
    };
    let remainder_votes = Fraction::new(
        votes * seats as u64 - full_seats as u64 * total_votes,
        seats as u64,
    );

    GroupState {
        standing: PoliticalGroupStanding {
            pg_number: pg.number,
            votes_cast: votes,
            remainder_votes,
            meets_remainder_threshold: meets_threshold(
                votes,
                total_votes,
                seats,
                &rules.remainder_threshold,
            ),
            next_votes_per_seat: votes_per_seat(votes, full_seats),
            full_seats,
            residual_seats: 0,
        },
        candidate_limit,
        unique_average_seat: false,
    }
}

fn standings(groups: &[GroupState]) -> Vec<PoliticalGroupStanding> {
    groups.iter().map(|g| g.standing.clone()).collect()
}

fn assign_residual_seat(
    groups: &mut [GroupState],
    phases: &[Phase],
    tiebreak: TieBreakMode,
    residual_seat_number: u32,
    remaining_seats: u32,
) -> Result<AssignmentStep, ApportionmentError> {
    let no_eligible_group = |groups: &[GroupState]| ApportionmentError::NoEligiblePoliticalGroup {
        residual_seat_number,
        standings: standings(groups),
    };

    let phase = phases
        .iter()
        .copied()
        .find(|p| groups.iter().any(|g| p.is_eligible(g)))
        .ok_or_else(|| no_eligible_group(groups))?;

    let best: Fraction = groups
        .iter()
        .filter(|g| phase.is_eligible(g))
        .map(|g| phase.value(g))
        .max()
        .ok_or_else(|| no_eligible_group(groups))?;

    let pg_options: Vec<u32> = groups
        .iter()
        .filter(|g| phase.is_eligible(g) && phase.value(g) == best)
        .map(|g| g.standing.pg_number)
        .collect();
    debug!(
        "assign_residual_seat: seat {} phase {:?} best {} options {:?}",
        residual_seat_number, phase, best, pg_options
    );

    let pg_assigned: Vec<u32> = if pg_options.len() <= remaining_seats as usize {
        pg_options.clone()
    } else {
        let ranked = rank_tied_groups(&pg_options, groups, tiebreak).ok_or_else(|| {
            ApportionmentError::DrawingOfLotsRequired {
                residual_seat_number: Some(residual_seat_number),
                pg_options: pg_options.clone(),
            }
        })?;
        debug!(
            "assign_residual_seat: tie between {:?} for {} seats resolved with {:?}: {:?}",
            pg_options, remaining_seats, tiebreak, ranked
        );
        ranked.into_iter().take(remaining_seats as usize).collect()
    };

    let selected = pg_assigned
        .first()
        .copied()
        .ok_or_else(|| no_eligible_group(groups))?;
    let Some(idx) = groups.iter().position(|g| g.standing.pg_number == selected) else {
        return Err(no_eligible_group(groups));
    };
    let g = &mut groups[idx];
    // Equal to the best value, in the terms of the selected group.
    let value = phase.value(g);
    g.set_residual_seats(g.standing.residual_seats + 1);
    if phase == Phase::UniqueLargestAverage {
        g.unique_average_seat = true;
    }

    Ok(AssignmentStep {
        residual_seat_number,
        change: phase.change(selected, pg_options, pg_assigned, value),
        standings: standings(groups),
    })
}

/// Orders tied political groups with the tie-break mode. Returns nothing when
/// the tie must be resolved outside of this program.
fn rank_tied_groups(
    tied: &[u32],
    groups: &[GroupState],
    tiebreak: TieBreakMode,
) -> Option<Vec<u32>> {
    // The input order is the base order of all the modes.
    let mut ranked: Vec<&GroupState> = groups
        .iter()
        .filter(|g| tied.contains(&g.standing.pg_number))
        .collect();
    match tiebreak {
        TieBreakMode::Reject => return None,
        TieBreakMode::PoliticalGroupOrder => {}
        TieBreakMode::MostVotes => {
            ranked.sort_by_key(|g| std::cmp::Reverse(g.standing.votes_cast));
        }
        TieBreakMode::Lots(seed) => {
            let numbers: Vec<u32> = ranked.iter().map(|g| g.standing.pg_number).collect();
            return Some(political_group_permutation_crypto(&numbers, seed));
        }
    }
    Some(ranked.iter().map(|g| g.standing.pg_number).collect())
}

/// Generates a "random" permutation of the political groups. Random in this context
/// means hard to guess in advance. The order only depends on the seed and on the list
/// numbers, so the same groups are always drawn in the same order.
fn political_group_permutation_crypto(pg_numbers: &[u32], seed: u32) -> Vec<u32> {
    let mut data: Vec<(u32, String)> = pg_numbers
        .iter()
        .map(|pg| (*pg, sha256::digest(format!("{:08}{:08}", seed, pg).as_str())))
        .collect();
    data.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    data.iter().map(|p| p.0).collect()
}

fn absolute_majority_correction(
    groups: &mut [GroupState],
    steps: &[AssignmentStep],
    total_votes: u64,
    seats: u32,
    tiebreak: TieBreakMode,
) -> Result<Vec<SeatCorrection>, ApportionmentError> {
    let Some(majority_idx) = groups
        .iter()
        .position(|g| 2 * g.standing.votes_cast > total_votes)
    else {
        return Ok(Vec::new());
    };
    let majority = &groups[majority_idx];
    let majority_pg = majority.standing.pg_number;
    if 2 * majority.standing.total_seats() > seats {
        return Ok(Vec::new());
    }
    if majority.is_exhausted() {
        warn!(
            "absolute_majority_correction: political group {} has no candidate left for the extra seat",
            majority_pg
        );
        return Ok(Vec::new());
    }
    let Some(last) = steps.last() else {
        warn!(
            "absolute_majority_correction: no residual seat to move to political group {}",
            majority_pg
        );
        return Ok(Vec::new());
    };

    // The groups that got the last seats for the same reason as the last one.
    let tied: HashSet<u32> = steps
        .iter()
        .rev()
        .take_while(|s| {
            s.change.same_rule(&last.change)
                && s.change.winning_value() == last.change.winning_value()
        })
        .map(|s| s.change.selected_pg_number())
        .filter(|pg| *pg != majority_pg)
        .collect();
    let donors: Vec<u32> = groups
        .iter()
        .map(|g| g.standing.pg_number)
        .filter(|pg| tied.contains(pg))
        .collect();
    debug!(
        "absolute_majority_correction: political group {} needs a seat, candidates to give it up: {:?}",
        majority_pg, donors
    );

    let donor = match donors.as_slice() {
        [] => {
            warn!(
                "absolute_majority_correction: no residual seat can be moved to political group {}",
                majority_pg
            );
            return Ok(Vec::new());
        }
        [single] => *single,
        _ => {
            let ranked = rank_tied_groups(&donors, groups, tiebreak).ok_or_else(|| {
                ApportionmentError::DrawingOfLotsRequired {
                    residual_seat_number: None,
                    pg_options: donors.clone(),
                }
            })?;
            // The last of the ranking gives up its seat.
            match ranked.last() {
                Some(pg) => *pg,
                None => return Ok(Vec::new()),
            }
        }
    };

    for g in groups.iter_mut() {
        if g.standing.pg_number == donor {
            g.set_residual_seats(g.standing.residual_seats - 1);
        } else if g.standing.pg_number == majority_pg {
            g.set_residual_seats(g.standing.residual_seats + 1);
        }
    }
    info!(
        "Absolute majority correction: seat moved from political group {} to {}",
        donor, majority_pg
    );
    Ok(vec![SeatCorrection::AbsoluteMajorityReassignment {
        pg_retracted_seat: donor,
        pg_assigned_seat: majority_pg,
    }])
}

struct CheckResult {
    total_votes: u64,
}

fn checks(
    input: &ApportionmentInput,
    rules: &ApportionmentRules,
) -> Result<CheckResult, ApportionmentError> {
    debug!("checks: {:?}", input);
    if input.seats == 0 {
        return Err(ApportionmentError::ZeroSeats);
    }
    if input.political_groups.is_empty() {
        return Err(ApportionmentError::NoPoliticalGroups);
    }

    let mut seen: HashSet<u32> = HashSet::new();
    for pg in input.political_groups.iter() {
        if pg.number == 0 {
            return Err(ApportionmentError::InvalidPoliticalGroupNumber {
                pg_number: pg.number,
            });
        }
        if !seen.insert(pg.number) {
            return Err(ApportionmentError::DuplicatePoliticalGroup {
                pg_number: pg.number,
            });
        }
    }

    let total_votes: u64 = input
        .political_groups
        .iter()
        .map(|pg| pg.votes as u64)
        .sum();
    if total_votes > u32::MAX as u64 {
        return Err(ApportionmentError::TotalVotesOverflow);
    }
    if total_votes == 0 {
        return Err(ApportionmentError::ZeroVotes);
    }

    let threshold = rules.remainder_threshold;
    if threshold > Fraction::from(1u64) || threshold.denominator() > u32::MAX as u64 {
        return Err(ApportionmentError::InvalidRemainderThreshold);
    }

    Ok(CheckResult { total_votes })
}
