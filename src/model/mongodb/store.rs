use mongodb::{
    bson::{doc, Bson},
    error::UNKNOWN_TRANSACTION_COMMIT_RESULT,
    options::{Acknowledgment, FindOptions, ReadConcern, TransactionOptions, WriteConcern},
    Client, ClientSession, Database,
};
use rocket::futures::TryStreamExt;

use crate::model::{
    common::election::{CandidateId, ElectionId, ElectionStatus, VoterId},
    db::{Ballot, Candidate, Election, NewBallot, Voter},
    mongodb::{Coll, Id},
    store::{ElectionStore, StoreError, StoreTransaction},
};

/// How many times to retry a commit whose outcome the server could not report.
const COMMIT_RETRIES: usize = 3;

/// An [`ElectionStore`] backed by MongoDB.
///
/// Transactions need a replica set or sharded cluster; a standalone server
/// rejects `start_transaction`.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        Self { client, db }
    }
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let options = TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build();
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(options).await?;

        Ok(Box::new(MongoTransaction {
            session,
            elections: Coll::from_db(&self.db),
            candidates: Coll::from_db(&self.db),
            ballots: Coll::from_db(&self.db),
            new_ballots: Coll::from_db(&self.db),
        }))
    }

    async fn election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        let election = Coll::<Election>::from_db(&self.db)
            .find_one(doc! { "_id": id }, None)
            .await?;
        Ok(election)
    }

    async fn elections(&self) -> Result<Vec<Election>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let elections: Vec<Election> = Coll::<Election>::from_db(&self.db)
            .find(None, options)
            .await?
            .try_collect()
            .await?;
        Ok(elections)
    }

    async fn candidates(&self, election_id: ElectionId) -> Result<Vec<Candidate>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let candidates: Vec<Candidate> = Coll::<Candidate>::from_db(&self.db)
            .find(doc! { "election_id": election_id }, options)
            .await?
            .try_collect()
            .await?;
        Ok(candidates)
    }

    async fn ballot(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<Ballot>, StoreError> {
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
        };
        let ballot = Coll::<Ballot>::from_db(&self.db)
            .find_one(filter, None)
            .await?;
        Ok(ballot)
    }

    async fn count_ballots(&self, election_id: ElectionId) -> Result<u64, StoreError> {
        let count = Coll::<Ballot>::from_db(&self.db)
            .count_documents(doc! { "election_id": election_id }, None)
            .await?;
        Ok(count)
    }

    async fn count_voters(&self) -> Result<u64, StoreError> {
        let count = Coll::<Voter>::from_db(&self.db)
            .count_documents(None, None)
            .await?;
        Ok(count)
    }

    async fn advance_status(
        &self,
        election_id: ElectionId,
        status: ElectionStatus,
    ) -> Result<bool, StoreError> {
        // Only match elections that are behind, so concurrent refreshes can
        // never move an election backwards.
        let earlier: Vec<Bson> = status.predecessors().iter().map(|s| Bson::from(*s)).collect();
        let filter = doc! {
            "_id": election_id,
            "status": { "$in": earlier },
        };
        let update = doc! {
            "$set": { "status": status },
        };
        let result = Coll::<Election>::from_db(&self.db)
            .update_one(filter, update, None)
            .await?;
        Ok(result.modified_count == 1)
    }
}

/// A vote transaction running in a MongoDB client session.
///
/// If dropped while still in progress, the driver aborts the transaction.
struct MongoTransaction {
    session: ClientSession,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
    new_ballots: Coll<NewBallot>,
}

#[rocket::async_trait]
impl StoreTransaction for MongoTransaction {
    async fn election(&mut self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        let election = self
            .elections
            .find_one_with_session(doc! { "_id": id }, None, &mut self.session)
            .await?;
        Ok(election)
    }

    async fn candidate(&mut self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        let candidate = self
            .candidates
            .find_one_with_session(doc! { "_id": id }, None, &mut self.session)
            .await?;
        Ok(candidate)
    }

    async fn ballot(
        &mut self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<Ballot>, StoreError> {
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
        };
        let ballot = self
            .ballots
            .find_one_with_session(filter, None, &mut self.session)
            .await?;
        Ok(ballot)
    }

    async fn insert_ballot(&mut self, ballot: &NewBallot) -> Result<Id, StoreError> {
        let inserted_id = self
            .new_ballots
            .insert_one_with_session(ballot, None, &mut self.session)
            .await?
            .inserted_id;
        inserted_id
            .as_object_id()
            .map(Id::from)
            .ok_or_else(|| StoreError::Backend(format!("Unexpected ballot ID {inserted_id}")))
    }

    async fn increment_vote_count(&mut self, candidate_id: CandidateId) -> Result<(), StoreError> {
        let update = doc! {
            "$inc": { "vote_count": 1 }
        };
        let result = self
            .candidates
            .update_one_with_session(doc! { "_id": candidate_id }, update, None, &mut self.session)
            .await?;
        if result.matched_count == 1 {
            Ok(())
        } else {
            Err(StoreError::MissingCandidate(candidate_id))
        }
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            match self.session.commit_transaction().await {
                Ok(()) => return Ok(()),
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && attempt < COMMIT_RETRIES =>
                {
                    warn!("Commit outcome unknown (attempt {attempt}), retrying: {e}");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        self.session.abort_transaction().await?;
        Ok(())
    }
}
