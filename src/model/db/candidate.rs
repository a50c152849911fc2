use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateId, ElectionId};

/// A candidate standing in exactly one election, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: CandidateId,
    /// Foreign Key election ID. Never changes after creation.
    pub election_id: ElectionId,
    /// Display name.
    pub name: String,
    /// Student roll number.
    pub roll_no: String,
    pub course: String,
    pub major: String,
    /// Year of study.
    pub year: u8,
    /// Relative path of the uploaded symbol image.
    pub symbol: String,
    /// Denormalised count of ballots cast for this candidate.
    /// Only ever changed by an atomic increment inside a vote transaction.
    #[serde(default)]
    pub vote_count: u64,
}
