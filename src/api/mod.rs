use rocket::Route;

use crate::error::Result;
use crate::model::{api::topic::TopicResults, db::Topic};
use crate::voting::BallotLedger;

mod admin;
mod auth;
mod group;
mod public;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes.extend(group::routes());
    routes
}

/// Bundle a topic with its current tally and outcome.
async fn topic_results(ledger: &BallotLedger, topic: Topic) -> Result<TopicResults> {
    let tally = ledger.tally_for(&topic).await?;
    let outcome = BallotLedger::derive_outcome(&topic, &tally);
    Ok(TopicResults {
        topic: topic.into(),
        tally,
        outcome,
    })
}
