use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            topic::{ActiveTopic, TopicDescription},
            vote::{BallotReceipt, VoteRequest},
        },
        common::tally::{Outcome, Tally},
        mongodb::Id,
    },
    voting::{BallotLedger, TopicRegistry},
    Config,
};

use super::topic_results;

pub fn routes() -> Vec<Route> {
    routes![active_topic, topic, tally, outcome, cast_vote]
}

/// The topic delegates and the public display should show, if any.
///
/// `has_voted` is only true when a credential is given and has a ballot on
/// the topic.
#[get("/topics/active?<event>&<credential>")]
pub async fn active_topic(
    event: Option<String>,
    credential: Option<String>,
    registry: TopicRegistry,
    ledger: BallotLedger,
    config: &State<Config>,
) -> Result<Json<Option<ActiveTopic>>> {
    let event_id = event.as_deref().unwrap_or(config.event_id());
    let topic = match registry.active_topic(event_id).await? {
        Some(topic) => topic,
        None => return Ok(Json(None)),
    };

    let has_voted = match credential {
        Some(credential) => ledger.has_voted(topic.id, credential.trim()).await?,
        None => false,
    };
    let results = topic_results(&ledger, topic).await?;
    Ok(Json(Some(ActiveTopic { results, has_voted })))
}

#[get("/topics/<topic_id>")]
pub async fn topic(topic_id: Id, registry: TopicRegistry) -> Result<Json<TopicDescription>> {
    let topic = registry.topic(topic_id).await?;
    Ok(Json(topic.into()))
}

#[get("/topics/<topic_id>/tally")]
pub async fn tally(topic_id: Id, ledger: BallotLedger) -> Result<Json<Tally>> {
    Ok(Json(ledger.tally(topic_id).await?))
}

#[get("/topics/<topic_id>/outcome")]
pub async fn outcome(topic_id: Id, ledger: BallotLedger) -> Result<Json<Outcome>> {
    Ok(Json(ledger.outcome(topic_id).await?))
}

#[post("/votes", data = "<vote>", format = "json")]
pub async fn cast_vote(vote: Json<VoteRequest>, ledger: BallotLedger) -> Result<Json<BallotReceipt>> {
    let VoteRequest {
        credential,
        topic_id,
        choice,
    } = vote.into_inner();
    let ballot = ledger
        .cast_vote(topic_id.into(), credential.trim(), choice)
        .await?;
    Ok(Json(ballot.into()))
}
