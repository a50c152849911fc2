//! Result tabulation for closed elections.

use chrono::{DateTime, Utc};

use crate::error::ResultError;
use crate::model::{
    api::{CandidateResult, ClosedElection, ElectionResult, ElectionSummary, NoWinnerReason, Outcome},
    common::election::{ElectionId, ElectionStatus},
    db::{Candidate, Election},
    store::{ElectionStore, StoreError},
};
use crate::service::clock;

/// Round to two decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `part` as a percentage of `whole`, or zero if `whole` is zero.
fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 * 100.0 / whole as f64)
    }
}

/// Tabulate an election from its candidates' counters.
///
/// Pure: the result depends only on the arguments, not on the order of
/// `candidates`.
pub fn tabulate(
    election: &Election,
    mut candidates: Vec<Candidate>,
    registered_voters: u64,
    ballots_recorded: u64,
) -> ElectionResult {
    candidates.sort_by_key(|c| c.id);

    let total_votes: u64 = candidates.iter().map(|c| c.vote_count).sum();
    let max_votes = candidates.iter().map(|c| c.vote_count).max().unwrap_or(0);
    let leaders: Vec<&Candidate> = if max_votes > 0 {
        candidates
            .iter()
            .filter(|c| c.vote_count == max_votes)
            .collect()
    } else {
        Vec::new()
    };

    if ballots_recorded != total_votes {
        warn!(
            "Election {} has {ballots_recorded} ballots but its counters sum to {total_votes}",
            election.id
        );
    }

    let outcome = match leaders.as_slice() {
        [] => Outcome::NoWinner {
            reason: NoWinnerReason::NoVotesCast,
        },
        [winner] => {
            let runner_up = candidates
                .iter()
                .filter(|c| c.id != winner.id)
                .map(|c| c.vote_count)
                .max()
                .unwrap_or(0);
            Outcome::Winner {
                candidate_id: winner.id,
                name: winner.name.clone(),
                vote_count: winner.vote_count,
                percentage: percentage(winner.vote_count, total_votes),
                margin: winner.vote_count - runner_up,
            }
        }
        tied => Outcome::Tie {
            candidate_ids: tied.iter().map(|c| c.id).collect(),
            names: tied.iter().map(|c| c.name.clone()).collect(),
            vote_count: max_votes,
            percentage: percentage(max_votes, total_votes),
        },
    };

    let sole_winner = match &outcome {
        Outcome::Winner { candidate_id, .. } => Some(*candidate_id),
        _ => None,
    };
    let candidate_results = candidates
        .iter()
        .map(|c| {
            CandidateResult::new(
                c,
                percentage(c.vote_count, total_votes),
                sole_winner == Some(c.id),
            )
        })
        .collect();

    ElectionResult {
        election: ElectionSummary::from(election),
        candidates: candidate_results,
        outcome,
        total_votes,
        total_registered_voters: registered_voters,
        turnout_percentage: percentage(total_votes, registered_voters),
        ballots_recorded,
    }
}

/// Results of the given election, which must have closed by `now`.
pub async fn compute_results(
    store: &dyn ElectionStore,
    election_id: ElectionId,
    now: DateTime<Utc>,
) -> Result<ElectionResult, ResultError> {
    let mut election = store
        .election(election_id)
        .await?
        .ok_or_else(|| ResultError::NotFound(format!("Election {election_id}")))?;

    let status = clock::refresh_status(store, &mut election, now).await?;
    if status != ElectionStatus::Closed {
        return Err(ResultError::ResultsNotAvailable {
            election_id,
            status,
        });
    }

    let candidates = store.candidates(election_id).await?;
    let registered_voters = store.count_voters().await?;
    let ballots_recorded = store.count_ballots(election_id).await?;

    Ok(tabulate(
        &election,
        candidates,
        registered_voters,
        ballots_recorded,
    ))
}

/// Every election that has closed by `now`, most recently ended first.
pub async fn closed_elections(
    store: &dyn ElectionStore,
    now: DateTime<Utc>,
) -> Result<Vec<ClosedElection>, StoreError> {
    let mut closed = Vec::new();
    for mut election in store.elections().await? {
        if clock::refresh_status(store, &mut election, now).await? != ElectionStatus::Closed {
            continue;
        }
        let total_votes: u64 = store
            .candidates(election.id)
            .await?
            .iter()
            .map(|c| c.vote_count)
            .sum();
        closed.push(ClosedElection {
            id: election.id,
            name: election.name,
            end_time: election.end_time,
            total_votes,
        });
    }
    closed.sort_by(|a, b| b.end_time.cmp(&a.end_time).then(a.id.cmp(&b.id)));
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::memory::MemoryStore;

    fn candidates(election_id: ElectionId, counts: &[u64]) -> Vec<Candidate> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Candidate::example(i as u32 + 1, election_id, count))
            .collect()
    }

    #[test]
    fn clear_winner() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, candidates(1, &[7, 3]), 20, 10);

        assert_eq!(result.total_votes, 10);
        assert_eq!(result.turnout_percentage, 50.0);
        assert_eq!(
            result.outcome,
            Outcome::Winner {
                candidate_id: 1,
                name: "Candidate 1".to_string(),
                vote_count: 7,
                percentage: 70.0,
                margin: 4,
            }
        );
        assert_eq!(result.candidates[0].percentage, 70.0);
        assert_eq!(result.candidates[1].percentage, 30.0);
        assert!(result.candidates[0].is_winner);
        assert!(!result.candidates[1].is_winner);
    }

    #[test]
    fn tie_for_first() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, candidates(1, &[10, 10, 5]), 25, 25);

        assert_eq!(result.total_votes, 25);
        assert_eq!(result.turnout_percentage, 100.0);
        assert_eq!(
            result.outcome,
            Outcome::Tie {
                candidate_ids: vec![1, 2],
                names: vec!["Candidate 1".to_string(), "Candidate 2".to_string()],
                vote_count: 10,
                percentage: 40.0,
            }
        );
        assert!(result.candidates.iter().all(|c| !c.is_winner));
        assert_eq!(result.candidates[2].percentage, 20.0);
    }

    #[test]
    fn no_votes_cast() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, candidates(1, &[0, 0, 0]), 30, 0);

        assert_eq!(result.total_votes, 0);
        assert_eq!(result.turnout_percentage, 0.0);
        assert_eq!(
            result.outcome,
            Outcome::NoWinner {
                reason: NoWinnerReason::NoVotesCast
            }
        );
        assert!(result.candidates.iter().all(|c| c.percentage == 0.0));
    }

    #[test]
    fn no_candidates() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, Vec::new(), 0, 0);

        assert!(result.candidates.is_empty());
        assert_eq!(result.total_votes, 0);
        assert_eq!(result.turnout_percentage, 0.0);
        assert!(matches!(result.outcome, Outcome::NoWinner { .. }));
    }

    #[test]
    fn unopposed_winner_margin_is_full_count() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, candidates(1, &[4]), 8, 4);

        assert!(matches!(
            result.outcome,
            Outcome::Winner {
                margin: 4,
                percentage,
                ..
            } if percentage == 100.0
        ));
    }

    #[test]
    fn percentages_round_to_two_places() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, candidates(1, &[1, 1, 1]), 7, 3);

        assert_eq!(result.candidates[0].percentage, 33.33);
        assert_eq!(result.turnout_percentage, 42.86);
    }

    #[test]
    fn independent_of_candidate_order() {
        let election = Election::finished_example(1);
        let forward = candidates(1, &[3, 9, 9, 1]);
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            tabulate(&election, forward, 40, 22),
            tabulate(&election, reversed, 40, 22)
        );
    }

    #[test]
    fn reports_ballot_count_alongside_counters() {
        let election = Election::finished_example(1);
        let result = tabulate(&election, candidates(1, &[2, 1]), 10, 4);

        assert_eq!(result.total_votes, 3);
        assert_eq!(result.ballots_recorded, 4);
    }

    #[rocket::async_test]
    async fn results_are_withheld_until_closed() {
        let store = MemoryStore::new();
        store.insert_election(Election::active_example(1));
        store.insert_election(Election::upcoming_example(2));

        for id in [1, 2] {
            let err = compute_results(&store, id, Utc::now()).await.unwrap_err();
            assert!(
                matches!(err, ResultError::ResultsNotAvailable { election_id, .. } if election_id == id),
                "{err}"
            );
        }
    }

    #[rocket::async_test]
    async fn unknown_election() {
        let store = MemoryStore::new();
        let err = compute_results(&store, 42, Utc::now()).await.unwrap_err();
        assert!(matches!(err, ResultError::NotFound(_)), "{err}");
    }

    #[rocket::async_test]
    async fn results_after_close() {
        let store = MemoryStore::new();
        store.insert_election(Election::finished_example(1));
        for candidate in candidates(1, &[7, 3]) {
            store.insert_candidate(candidate);
        }
        store.set_voter_count(20);

        let result = compute_results(&store, 1, Utc::now()).await.unwrap();
        assert_eq!(result.election.id, 1);
        assert_eq!(result.total_votes, 10);
        assert_eq!(result.total_registered_voters, 20);
        assert_eq!(result.ballots_recorded, 0);
        assert!(matches!(result.outcome, Outcome::Winner { candidate_id: 1, .. }));
        assert_eq!(store.persisted_status(1), ElectionStatus::Closed);
    }

    #[rocket::async_test]
    async fn closed_listing_is_most_recent_first() {
        let store = MemoryStore::new();
        store.insert_election(Election::example(1, Duration::days(-10), Duration::days(-5)));
        store.insert_election(Election::example(2, Duration::days(-3), Duration::days(-1)));
        store.insert_election(Election::active_example(3));
        store.insert_election(Election::upcoming_example(4));
        store.insert_candidate(Candidate::example(10, 1, 4));
        store.insert_candidate(Candidate::example(11, 1, 2));
        store.insert_candidate(Candidate::example(20, 2, 5));
        store.insert_candidate(Candidate::example(30, 3, 1));

        let closed = closed_elections(&store, Utc::now()).await.unwrap();
        let summary: Vec<_> = closed.iter().map(|e| (e.id, e.total_votes)).collect();
        assert_eq!(summary, vec![(2, 5), (1, 6)]);

        // Listing persisted the closures it observed.
        assert_eq!(store.persisted_status(1), ElectionStatus::Closed);
        assert_eq!(store.persisted_status(2), ElectionStatus::Closed);
        assert_eq!(store.persisted_status(3), ElectionStatus::Active);
    }
}
