//! The election clock: what state an election is in right now.
//!
//! The status persisted on an election is only a cache. The schedule is the
//! source of truth, and callers that notice the cache lagging behind write the
//! newer status back.

use chrono::{DateTime, Utc};

use crate::model::{
    common::election::ElectionStatus,
    db::Election,
    store::{ElectionStore, StoreError},
};

/// The status of `election` at `now`.
///
/// Never earlier than the persisted status, so once an election has been seen
/// as closed it is never reported as active again.
pub fn status_of(election: &Election, now: DateTime<Utc>) -> ElectionStatus {
    election.scheduled_status(now).max(election.status)
}

/// Whether a ballot cast at `now` may be accepted: the election must be
/// active and `now` must lie within its voting window.
pub fn accepts_votes(election: &Election, now: DateTime<Utc>) -> bool {
    status_of(election, now) == ElectionStatus::Active
        && election.scheduled_status(now) == ElectionStatus::Active
}

/// Compute the status of `election` at `now`, persisting it if the stored
/// status lags behind. `election` is updated to match.
pub async fn refresh_status(
    store: &dyn ElectionStore,
    election: &mut Election,
    now: DateTime<Utc>,
) -> Result<ElectionStatus, StoreError> {
    let status = status_of(election, now);
    if status > election.status {
        if store.advance_status(election.id, status).await? {
            info!(
                "Election {} moved from {:?} to {:?}",
                election.id, election.status, status
            );
        }
        election.status = status;
    }
    Ok(status)
}
