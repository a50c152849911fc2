use rocket::{http::Status, response::status::Custom, response::Responder, Request};
use thiserror::Error;

use crate::model::{
    common::election::{CandidateId, ElectionId, ElectionStatus},
    store::StoreError,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a vote submission can be rejected.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Candidate {candidate_id} is not standing in election {election_id}")]
    CandidateElectionMismatch {
        candidate_id: CandidateId,
        election_id: ElectionId,
    },
    #[error("Voting is not open for election {election_id} (status {status:?})")]
    VotingNotOpen {
        election_id: ElectionId,
        status: ElectionStatus,
    },
    #[error("Voter has already voted in this election")]
    AlreadyVoted,
    #[error("Failed to record vote: {0}")]
    Internal(StoreError),
}

impl From<StoreError> for VoteError {
    /// The unique ballot constraint firing means another ballot won the race.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateBallot => VoteError::AlreadyVoted,
            other => VoteError::Internal(other),
        }
    }
}

/// Reasons election results cannot be produced.
#[derive(Debug, Error)]
pub enum ResultError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Results for election {election_id} are not available until it closes (status {status:?})")]
    ResultsNotAvailable {
        election_id: ElectionId,
        status: ElectionStatus,
    },
    #[error("Failed to compute results: {0}")]
    Internal(#[from] StoreError),
}

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error(transparent)]
    Results(#[from] ResultError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Vote(err) => match err {
                VoteError::NotFound(_) => Status::NotFound,
                VoteError::CandidateElectionMismatch { .. } => Status::BadRequest,
                VoteError::VotingNotOpen { .. } => Status::Forbidden,
                VoteError::AlreadyVoted => Status::Conflict,
                VoteError::Internal(_) => Status::InternalServerError,
            },
            Self::Results(err) => match err {
                ResultError::NotFound(_) => Status::NotFound,
                ResultError::ResultsNotAvailable { .. } => Status::Forbidden,
                ResultError::Internal(_) => Status::InternalServerError,
            },
            Self::Store(_) => Status::InternalServerError,
            Self::NotFound(_) => Status::NotFound,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
            // Don't leak storage internals to the client.
            Custom(status, "Internal server error".to_string()).respond_to(req)
        } else {
            debug!("{self}");
            Custom(status, self.to_string()).respond_to(req)
        }
    }
}
