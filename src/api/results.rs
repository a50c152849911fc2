use chrono::Utc;
use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{ClosedElection, ElectionDescription, ElectionResult},
    common::election::ElectionId,
    store::Store,
};
use crate::service::{clock, tally};

pub fn routes() -> Vec<Route> {
    routes![election_status, election_results, closed_elections]
}

#[get("/elections/<election_id>/status")]
async fn election_status(election_id: ElectionId, store: Store) -> Result<Json<ElectionDescription>> {
    let mut election = store
        .election(election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    let status = clock::refresh_status(&*store, &mut election, Utc::now()).await?;
    Ok(Json(ElectionDescription::new(&election, status)))
}

#[get("/elections/<election_id>/results")]
async fn election_results(election_id: ElectionId, store: Store) -> Result<Json<ElectionResult>> {
    let results = tally::compute_results(&*store, election_id, Utc::now()).await?;
    Ok(Json(results))
}

#[get("/elections/results/closed")]
async fn closed_elections(store: Store) -> Result<Json<Vec<ClosedElection>>> {
    let closed = tally::closed_elections(&*store, Utc::now()).await?;
    Ok(Json(closed))
}
