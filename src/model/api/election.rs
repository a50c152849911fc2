use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{CandidateId, ElectionId, ElectionStatus},
    db::{Candidate, Election},
};

/// An election's schedule and live status, suitable for client consumption.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: ElectionId,
    pub name: String,
    /// Status according to the clock at the time of the request.
    pub status: ElectionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub result_time: DateTime<Utc>,
}

impl ElectionDescription {
    /// Describe `election` as having the given (already computed) status.
    pub fn new(election: &Election, status: ElectionStatus) -> Self {
        Self {
            id: election.id,
            name: election.name.clone(),
            status,
            start_time: election.start_time,
            end_time: election.end_time,
            result_time: election.result_time,
        }
    }
}

/// A candidate as shown on the ballot paper.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: CandidateId,
    pub name: String,
    pub roll_no: String,
    pub course: String,
    pub major: String,
    pub year: u8,
    pub symbol: String,
    pub vote_count: u64,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            roll_no: candidate.roll_no,
            course: candidate.course,
            major: candidate.major,
            year: candidate.year,
            symbol: candidate.symbol,
            vote_count: candidate.vote_count,
        }
    }
}

/// Everything a voter needs to decide whether and how to vote.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VoteStatus {
    pub election: ElectionDescription,
    pub candidates: Vec<CandidateDescription>,
    /// Whether the requesting voter already has a ballot in this election.
    pub has_voted: bool,
}
