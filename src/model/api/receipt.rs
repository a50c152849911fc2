use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{CandidateId, ElectionId, VoterId},
    db::{Candidate, NewBallot},
    mongodb::Id,
};

/// Proof handed back to a voter whose ballot was recorded.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// Ballot ID, as a hex string.
    pub ballot_id: String,
    pub voter_id: VoterId,
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub cast_at: DateTime<Utc>,
}

impl VoteReceipt {
    /// Construct a receipt for a ballot that has just been inserted.
    pub fn new(ballot_id: Id, ballot: &NewBallot, candidate: &Candidate) -> Self {
        Self {
            ballot_id: ballot_id.to_string(),
            voter_id: ballot.voter_id,
            election_id: ballot.election_id,
            candidate_id: ballot.candidate_id,
            candidate_name: candidate.name.clone(),
            cast_at: ballot.cast_at,
        }
    }
}

/// A vote as submitted by a voter.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub candidate_id: CandidateId,
}
