//! An in-memory [`ElectionStore`] for tests.
//!
//! Writes made through a transaction are buffered and applied under a single
//! lock at commit, and the (voter, election) ballot uniqueness constraint is
//! checked both at insert time and again at commit, matching what a unique
//! index does to racing transactions.

use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard,
};

use crate::model::{
    common::election::{CandidateId, ElectionId, ElectionStatus, VoterId},
    db::{Ballot, Candidate, Election, NewBallot},
    mongodb::Id,
    store::{ElectionStore, StoreError, StoreTransaction},
};

#[derive(Debug, Default)]
struct MemoryState {
    elections: BTreeMap<ElectionId, Election>,
    candidates: BTreeMap<CandidateId, Candidate>,
    ballots: Vec<Ballot>,
    voter_count: u64,
}

impl MemoryState {
    fn has_ballot(&self, voter_id: VoterId, election_id: ElectionId) -> bool {
        self.ballots
            .iter()
            .any(|b| b.voter_id == voter_id && b.election_id == election_id)
    }
}

/// Faults that tests can switch on.
#[derive(Debug, Default)]
struct Faults {
    /// Transactions never see committed ballots, as if every pre-check lost a race.
    stale_ballot_reads: AtomicBool,
    /// The next counter increment fails with a backend error.
    fail_next_increment: AtomicBool,
    /// The next commits abort with a write conflict.
    conflicting_commits: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn insert_election(&self, election: Election) {
        self.lock().elections.insert(election.id, election);
    }

    pub fn insert_candidate(&self, candidate: Candidate) {
        self.lock().candidates.insert(candidate.id, candidate);
    }

    pub fn set_voter_count(&self, voter_count: u64) {
        self.lock().voter_count = voter_count;
    }

    /// Snapshot of every committed ballot.
    pub fn all_ballots(&self) -> Vec<Ballot> {
        self.lock().ballots.clone()
    }

    /// The committed vote counter of a candidate.
    pub fn vote_count(&self, candidate_id: CandidateId) -> u64 {
        self.lock().candidates[&candidate_id].vote_count
    }

    /// The persisted status of an election.
    pub fn persisted_status(&self, election_id: ElectionId) -> ElectionStatus {
        self.lock().elections[&election_id].status
    }

    pub fn make_ballot_reads_stale(&self) {
        self.faults.stale_ballot_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_increment(&self) {
        self.faults.fail_next_increment.store(true, Ordering::SeqCst);
    }

    /// Make the next `count` commits abort as if they lost a write race.
    pub fn conflict_next_commits(&self, count: usize) {
        self.faults.conflicting_commits.store(count, Ordering::SeqCst);
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            pending_ballots: Vec::new(),
            pending_increments: Vec::new(),
        }))
    }

    async fn election(&self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.lock().elections.get(&id).cloned())
    }

    async fn elections(&self) -> Result<Vec<Election>, StoreError> {
        Ok(self.lock().elections.values().cloned().collect())
    }

    async fn candidates(&self, election_id: ElectionId) -> Result<Vec<Candidate>, StoreError> {
        Ok(self
            .lock()
            .candidates
            .values()
            .filter(|c| c.election_id == election_id)
            .cloned()
            .collect())
    }

    async fn ballot(
        &self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<Ballot>, StoreError> {
        Ok(self
            .lock()
            .ballots
            .iter()
            .find(|b| b.voter_id == voter_id && b.election_id == election_id)
            .cloned())
    }

    async fn count_ballots(&self, election_id: ElectionId) -> Result<u64, StoreError> {
        let count = self
            .lock()
            .ballots
            .iter()
            .filter(|b| b.election_id == election_id)
            .count();
        Ok(count as u64)
    }

    async fn count_voters(&self) -> Result<u64, StoreError> {
        Ok(self.lock().voter_count)
    }

    async fn advance_status(
        &self,
        election_id: ElectionId,
        status: ElectionStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        match state.elections.get_mut(&election_id) {
            Some(election) if election.status < status => {
                election.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

struct MemoryTransaction {
    store: MemoryStore,
    pending_ballots: Vec<Ballot>,
    pending_increments: Vec<CandidateId>,
}

#[rocket::async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn election(&mut self, id: ElectionId) -> Result<Option<Election>, StoreError> {
        Ok(self.store.lock().elections.get(&id).cloned())
    }

    async fn candidate(&mut self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.store.lock().candidates.get(&id).cloned())
    }

    async fn ballot(
        &mut self,
        voter_id: VoterId,
        election_id: ElectionId,
    ) -> Result<Option<Ballot>, StoreError> {
        if self.store.faults.stale_ballot_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.store.ballot(voter_id, election_id).await
    }

    async fn insert_ballot(&mut self, ballot: &NewBallot) -> Result<Id, StoreError> {
        let duplicate_pending = self
            .pending_ballots
            .iter()
            .any(|b| b.voter_id == ballot.voter_id && b.election_id == ballot.election_id);
        if duplicate_pending || self.store.lock().has_ballot(ballot.voter_id, ballot.election_id) {
            return Err(StoreError::DuplicateBallot);
        }
        let id = Id::new();
        self.pending_ballots.push(Ballot {
            id,
            ballot: ballot.clone(),
        });
        Ok(id)
    }

    async fn increment_vote_count(&mut self, candidate_id: CandidateId) -> Result<(), StoreError> {
        if self.store.faults.fail_next_increment.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected increment failure".to_string()));
        }
        if !self.store.lock().candidates.contains_key(&candidate_id) {
            return Err(StoreError::MissingCandidate(candidate_id));
        }
        self.pending_increments.push(candidate_id);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let conflicted = self
            .store
            .faults
            .conflicting_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflicted {
            return Err(StoreError::Conflict("injected write conflict".to_string()));
        }
        // Let other transactions run between their checks and this commit.
        rocket::tokio::task::yield_now().await;
        let mut state = self.store.lock();
        // Check every constraint before applying anything.
        for ballot in self.pending_ballots.iter() {
            if state.has_ballot(ballot.voter_id, ballot.election_id) {
                return Err(StoreError::DuplicateBallot);
            }
        }
        for candidate_id in self.pending_increments.iter() {
            if !state.candidates.contains_key(candidate_id) {
                return Err(StoreError::MissingCandidate(*candidate_id));
            }
        }
        state.ballots.append(&mut self.pending_ballots);
        for candidate_id in self.pending_increments.drain(..) {
            if let Some(candidate) = state.candidates.get_mut(&candidate_id) {
                candidate.vote_count += 1;
            }
        }
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        self.pending_ballots.clear();
        self.pending_increments.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn ballot_for(voter_id: VoterId, candidate_id: CandidateId) -> NewBallot {
        NewBallot {
            voter_id,
            election_id: 1,
            candidate_id,
            cast_at: Utc::now(),
        }
    }

    #[rocket::async_test]
    async fn second_commit_of_same_ballot_key_fails() {
        let store = MemoryStore::new();
        store.insert_election(Election::active_example(1));
        store.insert_candidate(Candidate::example(10, 1, 0));
        store.insert_candidate(Candidate::example(11, 1, 0));

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        for (tx, candidate_id) in [(&mut first, 10), (&mut second, 11)] {
            assert!(tx.ballot(5, 1).await.unwrap().is_none());
            tx.insert_ballot(&ballot_for(5, candidate_id)).await.unwrap();
            tx.increment_vote_count(candidate_id).await.unwrap();
        }

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateBallot), "{err}");

        assert_eq!(store.all_ballots().len(), 1);
        assert_eq!(store.vote_count(10), 1);
        assert_eq!(store.vote_count(11), 0);
    }

    #[rocket::async_test]
    async fn uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        store.insert_election(Election::active_example(1));
        store.insert_candidate(Candidate::example(10, 1, 0));

        let mut tx = store.begin().await.unwrap();
        tx.insert_ballot(&ballot_for(5, 10)).await.unwrap();
        tx.increment_vote_count(10).await.unwrap();
        assert!(store.all_ballots().is_empty());
        assert_eq!(store.vote_count(10), 0);

        tx.abort().await.unwrap();
        assert!(store.all_ballots().is_empty());
        assert_eq!(store.vote_count(10), 0);
    }
}
