//! The storage contract the vote and tally services are written against.
//!
//! The production implementation is [`MongoStore`](crate::model::mongodb::MongoStore);
//! tests use an in-memory implementation that enforces the same constraints.

use std::ops::Deref;
use std::sync::Arc;

use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use thiserror::Error;

use crate::model::{
    common::election::{CandidateId, ElectionId, ElectionStatus, VoterId},
    db::{Ballot, Candidate, Election, NewBallot},
    mongodb::Id,
};

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique (voter, election) ballot constraint rejected an insert.
    #[error("A ballot already exists for this voter and election")]
    DuplicateBallot,
    /// The transaction lost a race with a concurrent one and was aborted;
    /// re-running it from the start may succeed.
    #[error("Transaction aborted by a concurrent write: {0}")]
    Conflict(String),
    /// A candidate disappeared between being read and being incremented.
    #[error("Candidate {0} no longer exists")]
    MissingCandidate(CandidateId),
    #[error(transparent)]
    Db(DbError),
    /// Any other backend failure.
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Point lookups and aggregate reads outside of any transaction, plus the
/// ability to start one.
#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    /// Start a transaction. Nothing written through it is visible to other
    /// readers until it commits, and dropping it without committing discards
    /// every write.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Look up an election by ID.
    async fn election(&self, id: ElectionId) -> Result<Option<Election>, StoreError>;

    /// All elections, in ID order.
    async fn elections(&self) -> Result<Vec<Election>, StoreError>;

    /// All candidates standing in the given election, in ID order.
    async fn candidates(&self, election_id: ElectionId) -> Result<Vec<Candidate>, StoreError>;

    /// The ballot cast by the given voter in the given election, if any.
    async fn ballot(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<Ballot>, StoreError>;

    /// Number of ballot rows recorded for the given election.
    async fn count_ballots(&self, election_id: ElectionId) -> Result<u64, StoreError>;

    /// Number of registered voters.
    async fn count_voters(&self) -> Result<u64, StoreError>;

    /// Persist `status` for the election, but only if its persisted status is
    /// earlier in the lifecycle. Returns true iff anything changed.
    async fn advance_status(
        &self,
        election_id: ElectionId,
        status: ElectionStatus,
    ) -> Result<bool, StoreError>;
}

/// Reads and writes grouped into a single atomic unit.
#[rocket::async_trait]
pub trait StoreTransaction: Send {
    /// Look up an election by ID.
    async fn election(&mut self, id: ElectionId) -> Result<Option<Election>, StoreError>;

    /// Look up a candidate by ID.
    async fn candidate(&mut self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;

    /// The ballot cast by the given voter in the given election, if any.
    async fn ballot(
        &mut self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<Ballot>, StoreError>;

    /// Insert a ballot. Fails with [`StoreError::DuplicateBallot`] if the
    /// voter already has a ballot for this election, even one written by a
    /// transaction that committed after this one started.
    async fn insert_ballot(&mut self, ballot: &NewBallot) -> Result<Id, StoreError>;

    /// Add exactly one to the candidate's vote counter.
    async fn increment_vote_count(&mut self, candidate_id: CandidateId) -> Result<(), StoreError>;

    /// Make every write in this transaction durable and visible, or none of them.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every write in this transaction.
    async fn abort(&mut self) -> Result<(), StoreError>;
}

/// A shared handle on whichever [`ElectionStore`] the server was launched with.
///
/// Managed by Rocket and available to handlers as a request guard.
#[derive(Clone)]
pub struct Store(Arc<dyn ElectionStore>);

impl Store {
    pub fn new(store: impl ElectionStore + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl Deref for Store {
    type Target = dyn ElectionStore;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from the managed state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.rocket().state::<Store>() {
            Some(store) => request::Outcome::Success(store.clone()),
            None => {
                error!("No election store is managed; was the database fairing attached?");
                request::Outcome::Failure((Status::InternalServerError, ()))
            }
        }
    }
}
