//! Vote submission.
//!
//! A vote is accepted by a single store transaction that re-checks every
//! precondition, inserts the ballot and bumps the candidate's counter. The
//! unique (voter, election) index on ballots is what finally decides a race
//! between two submissions from the same voter; the read check beforehand
//! only exists to give the common case a clean rejection.

use chrono::{DateTime, Utc};
use rand::Rng;
use rocket::tokio::time::{sleep, Duration};

use crate::error::VoteError;
use crate::model::{
    api::{CandidateDescription, ElectionDescription, VoteReceipt, VoteStatus},
    common::election::{CandidateId, ElectionId, ElectionStatus, VoterId},
    db::NewBallot,
    store::{ElectionStore, StoreError, StoreTransaction},
};
use crate::service::clock;

/// Record a vote by `voter_id` for `candidate_id` in `election_id` at time `now`.
///
/// A transaction that aborts because of a concurrent write is re-run from the
/// start, up to `attempts` times in total.
pub async fn submit_vote(
    store: &dyn ElectionStore,
    voter_id: VoterId,
    election_id: ElectionId,
    candidate_id: CandidateId,
    now: DateTime<Utc>,
    attempts: u32,
) -> Result<VoteReceipt, VoteError> {
    let mut attempt = 1;
    loop {
        match try_submit_vote(store, voter_id, election_id, candidate_id, now).await {
            Err(VoteError::Internal(StoreError::Conflict(e))) if attempt < attempts => {
                debug!(
                    "Vote by voter {voter_id} in election {election_id} conflicted \
(attempt {attempt}/{attempts}): {e}"
                );
                // Jitter so that colliding submissions don't retry in lockstep.
                let delay = rand::thread_rng().gen_range(5..=25);
                sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// One attempt at recording a vote, in its own transaction.
async fn try_submit_vote(
    store: &dyn ElectionStore,
    voter_id: VoterId,
    election_id: ElectionId,
    candidate_id: CandidateId,
    now: DateTime<Utc>,
) -> Result<VoteReceipt, VoteError> {
    let mut tx = store.begin().await?;

    match cast_ballot(tx.as_mut(), voter_id, election_id, candidate_id, now).await {
        Ok(receipt) => {
            tx.commit().await?;
            info!(
                "Voter {voter_id} cast ballot {} in election {election_id}",
                receipt.ballot_id
            );
            Ok(receipt)
        }
        Err(err) => {
            if let Err(abort_err) = tx.abort().await {
                warn!("Failed to abort vote transaction cleanly: {abort_err}");
            }
            if let VoteError::VotingNotOpen {
                status: ElectionStatus::Closed,
                ..
            } = err
            {
                // Opportunistically persist the closure we just observed.
                if let Err(e) = store.advance_status(election_id, ElectionStatus::Closed).await {
                    warn!("Failed to mark election {election_id} as closed: {e}");
                }
            }
            Err(err)
        }
    }
}

/// Check every precondition in order and stage the writes. Nothing is
/// visible to anyone else until the caller commits.
async fn cast_ballot(
    tx: &mut dyn StoreTransaction,
    voter_id: VoterId,
    election_id: ElectionId,
    candidate_id: CandidateId,
    now: DateTime<Utc>,
) -> Result<VoteReceipt, VoteError> {
    let election = tx
        .election(election_id)
        .await?
        .ok_or_else(|| VoteError::NotFound(format!("Election {election_id}")))?;

    let candidate = tx
        .candidate(candidate_id)
        .await?
        .ok_or_else(|| VoteError::NotFound(format!("Candidate {candidate_id}")))?;
    if candidate.election_id != election_id {
        return Err(VoteError::CandidateElectionMismatch {
            candidate_id,
            election_id,
        });
    }

    if !clock::accepts_votes(&election, now) {
        // A persisted ACTIVE outside the window is reported as the schedule sees it.
        let status = match clock::status_of(&election, now) {
            ElectionStatus::Active => election.scheduled_status(now),
            status => status,
        };
        return Err(VoteError::VotingNotOpen {
            election_id,
            status,
        });
    }

    if tx.ballot(voter_id, election_id).await?.is_some() {
        return Err(VoteError::AlreadyVoted);
    }

    let ballot = NewBallot {
        voter_id,
        election_id,
        candidate_id,
        cast_at: now,
    };
    // A duplicate key here means a concurrent submission got in first.
    let ballot_id = tx.insert_ballot(&ballot).await?;
    tx.increment_vote_count(candidate_id).await?;

    Ok(VoteReceipt::new(ballot_id, &ballot, &candidate))
}

/// The election as the voter currently sees it, its candidates, and whether
/// the voter has already voted in it.
pub async fn vote_status(
    store: &dyn ElectionStore,
    voter_id: VoterId,
    election_id: ElectionId,
    now: DateTime<Utc>,
) -> Result<VoteStatus, VoteError> {
    let mut election = store
        .election(election_id)
        .await?
        .ok_or_else(|| VoteError::NotFound(format!("Election {election_id}")))?;
    let status = clock::refresh_status(store, &mut election, now).await?;

    let candidates = store
        .candidates(election_id)
        .await?
        .into_iter()
        .map(CandidateDescription::from)
        .collect();
    let has_voted = store.ballot(voter_id, election_id).await?.is_some();

    Ok(VoteStatus {
        election: ElectionDescription::new(&election, status),
        candidates,
        has_voted,
    })
}
