// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::fraction::Fraction;

/// The votes cast for one political group (list).
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PoliticalGroupVotes {
    /// The list number. It identifies the group in all the outputs.
    pub number: u32,
    pub votes: u32,
    /// The number of candidates on the list. Only used when
    /// [`ApportionmentRules::limit_seats_to_candidates`] is set.
    pub candidate_count: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApportionmentInput {
    pub seats: u32,
    pub political_groups: Vec<PoliticalGroupVotes>,
}

// ******** Output data structures *********

/// The state of one political group after a given step.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PoliticalGroupStanding {
    pub pg_number: u32,
    pub votes_cast: u64,
    pub remainder_votes: Fraction,
    pub meets_remainder_threshold: bool,
    /// The average number of votes per seat if this group got one more seat.
    pub next_votes_per_seat: Fraction,
    pub full_seats: u32,
    pub residual_seats: u32,
}

impl PoliticalGroupStanding {
    pub fn total_seats(&self) -> u32 {
        self.full_seats + self.residual_seats
    }
}

/// How a residual seat was assigned. Serialized with the `changed_by` tag.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "changed_by")]
pub enum SeatChange {
    LargestAverageAssignment(LargestAverageAssignedSeat),
    /// Highest average, at most one such seat per group.
    UniqueLargestAverageAssignment(LargestAverageAssignedSeat),
    LargestRemainderAssignment(LargestRemainderAssignedSeat),
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LargestAverageAssignedSeat {
    pub selected_pg_number: u32,
    /// All the groups that shared the highest average.
    pub pg_options: Vec<u32>,
    /// The groups that get a seat for this average, after the tie-break.
    pub pg_assigned: Vec<u32>,
    pub votes_per_seat: Fraction,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LargestRemainderAssignedSeat {
    pub selected_pg_number: u32,
    pub pg_options: Vec<u32>,
    pub pg_assigned: Vec<u32>,
    pub remainder_votes: Fraction,
}

impl SeatChange {
    pub fn selected_pg_number(&self) -> u32 {
        match self {
            SeatChange::LargestAverageAssignment(s)
            | SeatChange::UniqueLargestAverageAssignment(s) => s.selected_pg_number,
            SeatChange::LargestRemainderAssignment(s) => s.selected_pg_number,
        }
    }

    pub fn pg_options(&self) -> &[u32] {
        match self {
            SeatChange::LargestAverageAssignment(s)
            | SeatChange::UniqueLargestAverageAssignment(s) => &s.pg_options,
            SeatChange::LargestRemainderAssignment(s) => &s.pg_options,
        }
    }

    pub fn pg_assigned(&self) -> &[u32] {
        match self {
            SeatChange::LargestAverageAssignment(s)
            | SeatChange::UniqueLargestAverageAssignment(s) => &s.pg_assigned,
            SeatChange::LargestRemainderAssignment(s) => &s.pg_assigned,
        }
    }

    /// The value that won the comparison: an average or a remainder.
    pub fn winning_value(&self) -> Fraction {
        match self {
            SeatChange::LargestAverageAssignment(s)
            | SeatChange::UniqueLargestAverageAssignment(s) => s.votes_per_seat,
            SeatChange::LargestRemainderAssignment(s) => s.remainder_votes,
        }
    }

    pub(crate) fn same_rule(&self, other: &SeatChange) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Statistics for one residual seat
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentStep {
    pub residual_seat_number: u32,
    pub change: SeatChange,
    /// The standings of all the groups after this seat was assigned.
    pub standings: Vec<PoliticalGroupStanding>,
}

/// A seat moved to a group that has the absolute majority of the votes.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "changed_by")]
pub enum SeatCorrection {
    AbsoluteMajorityReassignment {
        pg_retracted_seat: u32,
        pg_assigned_seat: u32,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PoliticalGroupSeatAssignment {
    pub pg_number: u32,
    pub votes_cast: u64,
    pub remainder_votes: Fraction,
    pub meets_remainder_threshold: bool,
    pub full_seats: u32,
    pub residual_seats: u32,
    pub total_seats: u32,
}

impl From<&PoliticalGroupStanding> for PoliticalGroupSeatAssignment {
    fn from(pg: &PoliticalGroupStanding) -> Self {
        PoliticalGroupSeatAssignment {
            pg_number: pg.pg_number,
            votes_cast: pg.votes_cast,
            remainder_votes: pg.remainder_votes,
            meets_remainder_threshold: pg.meets_remainder_threshold,
            full_seats: pg.full_seats,
            residual_seats: pg.residual_seats,
            total_seats: pg.total_seats(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SeatAssignmentResult {
    pub seats: u32,
    pub full_seats: u32,
    pub residual_seats: u32,
    pub quota: Fraction,
    pub steps: Vec<AssignmentStep>,
    pub final_standing: Vec<PoliticalGroupSeatAssignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<SeatCorrection>,
}

impl SeatAssignmentResult {
    /// The total number of seats of every group, in input order.
    pub fn total_seats(&self) -> Vec<u32> {
        self.final_standing.iter().map(|pg| pg.total_seats).collect()
    }

    pub fn standing_for(&self, pg_number: u32) -> Option<&PoliticalGroupSeatAssignment> {
        self.final_standing
            .iter()
            .find(|pg| pg.pg_number == pg_number)
    }
}

/// Errors that prevent the apportionment from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ApportionmentError {
    ZeroSeats,
    NoPoliticalGroups,
    ZeroVotes,
    InvalidPoliticalGroupNumber {
        pg_number: u32,
    },
    DuplicatePoliticalGroup {
        pg_number: u32,
    },
    /// The total number of votes does not fit the 32-bit vote counters.
    TotalVotesOverflow,
    InvalidRemainderThreshold,
    /// A residual seat is left but no group may receive it.
    NoEligiblePoliticalGroup {
        residual_seat_number: u32,
        standings: Vec<PoliticalGroupStanding>,
    },
    /// More groups are tied than there are seats left, and the rules ask
    /// for the drawing of lots to be done outside of this program.
    /// No residual seat number is set when it happens in the absolute majority correction.
    DrawingOfLotsRequired {
        residual_seat_number: Option<u32>,
        pg_options: Vec<u32>,
    },
}

impl Error for ApportionmentError {}

impl Display for ApportionmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApportionmentError::ZeroSeats => write!(f, "there are no seats to assign"),
            ApportionmentError::NoPoliticalGroups => write!(f, "there are no political groups"),
            ApportionmentError::ZeroVotes => write!(f, "no votes were cast on any political group"),
            ApportionmentError::InvalidPoliticalGroupNumber { pg_number } => {
                write!(f, "invalid political group number {}", pg_number)
            }
            ApportionmentError::DuplicatePoliticalGroup { pg_number } => {
                write!(f, "political group {} appears more than once", pg_number)
            }
            ApportionmentError::TotalVotesOverflow => {
                write!(f, "the total number of votes is too large")
            }
            ApportionmentError::InvalidRemainderThreshold => {
                write!(f, "the remainder threshold must be a fraction between 0 and 1")
            }
            ApportionmentError::NoEligiblePoliticalGroup {
                residual_seat_number,
                ..
            } => write!(
                f,
                "no political group is eligible for residual seat {}",
                residual_seat_number
            ),
            ApportionmentError::DrawingOfLotsRequired {
                residual_seat_number: Some(n),
                pg_options,
            } => write!(
                f,
                "drawing of lots is required for residual seat {} between political groups {:?}",
                n, pg_options
            ),
            ApportionmentError::DrawingOfLotsRequired {
                residual_seat_number: None,
                pg_options,
            } => write!(
                f,
                "drawing of lots is required for the absolute majority correction between political groups {:?}",
                pg_options
            ),
        }
    }
}

// ********* Configuration **********

/// How to order the political groups that are tied when fewer seats are left
/// than there are tied groups.
///
/// All the modes give a fixed order of the groups, so that a tie spanning
/// several residual seats is resolved the same way at every seat.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Stop and report the tie: the lots are drawn by the electoral body.
    Reject,
    /// The order of the political groups in the input.
    PoliticalGroupOrder,
    /// The most votes first, then the order of the input.
    MostVotes,
    /// A reproducible drawing of lots: the groups are sorted by a cryptographic
    /// hash of the seed and of their list number.
    Lots(u32),
}

/// The method used for the seats left after the full seats.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ResidualSeatMethod {
    /// D'Hondt: every seat goes to the highest average.
    LargestAverages,
    /// Largest remainders for the groups meeting the threshold (at most one seat each),
    /// then unique highest averages (at most one seat each), then highest averages.
    LargestRemainders,
    /// Largest averages when there are at least that many seats, otherwise largest remainders.
    BySeatCount { minimum_seats_for_averages: u32 },
}

impl ResidualSeatMethod {
    /// True when the residual seats of an election with that many seats go to the highest averages.
    pub fn uses_averages(&self, seats: u32) -> bool {
        match self {
            ResidualSeatMethod::LargestAverages => true,
            ResidualSeatMethod::LargestRemainders => false,
            ResidualSeatMethod::BySeatCount {
                minimum_seats_for_averages,
            } => seats >= *minimum_seats_for_averages,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ApportionmentRules {
    pub residual_seat_method: ResidualSeatMethod,
    /// The share of the quota that the votes of a group must reach to be
    /// eligible for a largest remainder seat.
    pub remainder_threshold: Fraction,
    pub tiebreak_mode: TieBreakMode,
    /// Gives a seat to a group with more than half of the votes that did not
    /// get more than half of the seats.
    pub absolute_majority_correction: bool,
    /// A group cannot get more seats than it has candidates.
    pub limit_seats_to_candidates: bool,
}

impl ApportionmentRules {
    pub const DEFAULT_RULES: ApportionmentRules = ApportionmentRules {
        residual_seat_method: ResidualSeatMethod::BySeatCount {
            minimum_seats_for_averages: 19,
        },
        remainder_threshold: Fraction::THREE_QUARTERS,
        tiebreak_mode: TieBreakMode::PoliticalGroupOrder,
        absolute_majority_correction: false,
        limit_seats_to_candidates: false,
    };

    /// The rules of the Dutch elections law for municipal councils.
    pub const DUTCH_MUNICIPAL: ApportionmentRules = ApportionmentRules {
        residual_seat_method: ResidualSeatMethod::BySeatCount {
            minimum_seats_for_averages: 19,
        },
        remainder_threshold: Fraction::THREE_QUARTERS,
        tiebreak_mode: TieBreakMode::Reject,
        absolute_majority_correction: true,
        limit_seats_to_candidates: true,
    };
}
