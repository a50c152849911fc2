use chrono::Utc;
use rocket::{response::status::Created, serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{VoteReceipt, VoteRequest, VoteStatus},
    auth::AuthToken,
    common::election::ElectionId,
    store::Store,
};
use crate::service::voting;
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![cast_vote, vote_status]
}

#[post("/elections/<election_id>/vote", data = "<vote>", format = "json")]
async fn cast_vote(
    token: AuthToken,
    election_id: ElectionId,
    vote: Json<VoteRequest>,
    store: Store,
    config: &State<Config>,
) -> Result<Created<Json<VoteReceipt>>> {
    let receipt = voting::submit_vote(
        &*store,
        token.voter_id(),
        election_id,
        vote.candidate_id,
        Utc::now(),
        config.transaction_retries(),
    )
    .await?;

    let location = uri!(vote_status(election_id)).to_string();
    Ok(Created::new(location).body(Json(receipt)))
}

#[get("/elections/<election_id>/vote-status")]
async fn vote_status(
    token: AuthToken,
    election_id: ElectionId,
    store: Store,
) -> Result<Json<VoteStatus>> {
    let status = voting::vote_status(&*store, token.voter_id(), election_id, Utc::now()).await?;
    Ok(Json(status))
}
