use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{CandidateId, ElectionId},
    db::{Candidate, Election},
};

/// Tallied results of a closed election, as consumed by the reporting layer.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ElectionResult {
    pub election: ElectionSummary,
    /// Per-candidate results, in candidate ID order.
    pub candidates: Vec<CandidateResult>,
    pub outcome: Outcome,
    /// Sum of all candidate counters.
    pub total_votes: u64,
    pub total_registered_voters: u64,
    /// `total_votes / total_registered_voters * 100`, to 2 decimal places.
    pub turnout_percentage: f64,
    /// Number of ballot rows behind the counters. Equal to `total_votes`
    /// unless the counters have drifted from the ballots.
    pub ballots_recorded: u64,
}

/// Headline information about an election.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: ElectionId,
    pub name: String,
    pub end_time: DateTime<Utc>,
    pub result_time: DateTime<Utc>,
}

impl From<&Election> for ElectionSummary {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id,
            name: election.name.clone(),
            end_time: election.end_time,
            result_time: election.result_time,
        }
    }
}

/// One candidate's share of the vote.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: CandidateId,
    pub name: String,
    pub course: String,
    pub major: String,
    pub symbol: String,
    pub vote_count: u64,
    /// Share of `total_votes`, to 2 decimal places.
    pub percentage: f64,
    /// True only for the sole winner; tied candidates are not winners.
    pub is_winner: bool,
}

impl CandidateResult {
    pub fn new(candidate: &Candidate, percentage: f64, is_winner: bool) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            course: candidate.course.clone(),
            major: candidate.major.clone(),
            symbol: candidate.symbol.clone(),
            vote_count: candidate.vote_count,
            percentage,
            is_winner,
        }
    }
}

/// Who won.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Nobody won, for the given reason.
    NoWinner { reason: NoWinnerReason },
    /// A single candidate has strictly more votes than every other.
    Winner {
        candidate_id: CandidateId,
        name: String,
        vote_count: u64,
        percentage: f64,
        /// Votes ahead of the runner-up; the full count if unopposed.
        margin: u64,
    },
    /// Two or more candidates share the highest count.
    Tie {
        candidate_ids: Vec<CandidateId>,
        names: Vec<String>,
        vote_count: u64,
        percentage: f64,
    },
}

/// Why an election has no winner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoWinnerReason {
    NoVotesCast,
}

/// A closed election in the results listing.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ClosedElection {
    pub id: ElectionId,
    pub name: String,
    pub end_time: DateTime<Utc>,
    pub total_votes: u64,
}
