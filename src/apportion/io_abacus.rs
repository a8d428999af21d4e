// Reader for the JSON files of the Abacus election software.

use crate::apportion::io_common::read_json;
use crate::apportion::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AbacusCandidate {
    pub number: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AbacusPoliticalGroup {
    pub number: u32,
    pub name: Option<String>,
    pub candidates: Vec<AbacusCandidate>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AbacusElection {
    pub name: Option<String>,
    pub number_of_seats: u32,
    pub political_groups: Vec<AbacusPoliticalGroup>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VotesCounts {
    pub votes_candidates_count: i64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateVotes {
    pub number: u32,
    pub votes: i64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PoliticalGroupTotal {
    pub number: u32,
    pub total: i64,
    pub candidate_votes: Vec<CandidateVotes>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AbacusSummary {
    pub votes_counts: VotesCounts,
    pub political_group_votes: Vec<PoliticalGroupTotal>,
}

pub struct AbacusInput {
    pub name: Option<String>,
    pub input: ApportionmentInput,
}

pub fn read_abacus_input(election_path: &str, summary_path: &str) -> ApportionResult<AbacusInput> {
    let election: AbacusElection = read_json(election_path)?;
    let summary: AbacusSummary = read_json(summary_path)?;
    debug!("read_abacus_input: election {:?}", election);
    let input = validate_summary(&election, &summary)?;
    Ok(AbacusInput {
        name: election.name,
        input,
    })
}

fn validate_summary(
    election: &AbacusElection,
    summary: &AbacusSummary,
) -> ApportionResult<ApportionmentInput> {
    for pgv in summary.political_group_votes.iter() {
        ensure!(
            election
                .political_groups
                .iter()
                .any(|pg| pg.number == pgv.number),
            UnknownPoliticalGroupSnafu {
                pg_number: pgv.number
            }
        );
        ensure!(
            pgv.total >= 0 && pgv.candidate_votes.iter().all(|cv| cv.votes >= 0),
            NegativeVotesSnafu {
                pg_number: pgv.number
            }
        );
        let candidate_total: i64 = pgv.candidate_votes.iter().map(|cv| cv.votes).sum();
        ensure!(
            candidate_total == pgv.total,
            CandidateVotesMismatchSnafu {
                pg_number: pgv.number,
                total: pgv.total,
                candidate_total,
            }
        );
    }

    let actual: i64 = summary.political_group_votes.iter().map(|pgv| pgv.total).sum();
    ensure!(
        actual == summary.votes_counts.votes_candidates_count,
        VotesCountMismatchSnafu {
            expected: summary.votes_counts.votes_candidates_count,
            actual,
        }
    );

    // The order of the lists in the election is kept.
    let mut political_groups: Vec<PoliticalGroupVotes> = Vec::new();
    for pg in election.political_groups.iter() {
        let total = match summary
            .political_group_votes
            .iter()
            .find(|pgv| pgv.number == pg.number)
        {
            Some(pgv) => pgv.total,
            None => whatever!("No votes in the summary for political group {}", pg.number),
        };
        let votes = match u32::try_from(total) {
            Ok(x) => x,
            Err(_) => whatever!("Too many votes for political group {}: {}", pg.number, total),
        };
        political_groups.push(PoliticalGroupVotes {
            number: pg.number,
            votes,
            candidate_count: Some(pg.candidates.len() as u32),
        });
    }

    Ok(ApportionmentInput {
        seats: election.number_of_seats,
        political_groups,
    })
}
