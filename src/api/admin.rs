use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            topic::{StatusChange, TopicDescription, TopicSpec, TopicSummary},
        },
        common::topic::TopicStatus,
        mongodb::Id,
    },
    voting::{BallotLedger, DelegateRoll, TopicRegistry},
    Config,
};

use super::topic_results;

pub fn routes() -> Vec<Route> {
    routes![create_topic, set_topic_status, delete_topic, topic_dashboard]
}

#[post("/topics", data = "<spec>", format = "json")]
async fn create_topic(
    _token: AuthToken,
    spec: Json<TopicSpec>,
    registry: TopicRegistry,
    config: &State<Config>,
) -> Result<Json<TopicDescription>> {
    let event_id = spec.event_id.as_deref().unwrap_or(config.event_id());
    let topic = registry
        .create_topic(event_id, &spec.title, spec.kind())
        .await?;
    Ok(Json(topic.into()))
}

#[post("/topics/<topic_id>/status", data = "<change>", format = "json")]
async fn set_topic_status(
    _token: AuthToken,
    topic_id: Id,
    change: Json<StatusChange>,
    registry: TopicRegistry,
) -> Result<Json<TopicDescription>> {
    let status: TopicStatus = change.status.parse()?;
    let topic = registry.set_status(topic_id, status).await?;
    Ok(Json(topic.into()))
}

#[delete("/topics/<topic_id>")]
async fn delete_topic(_token: AuthToken, topic_id: Id, registry: TopicRegistry) -> Result<()> {
    registry.delete_topic(topic_id).await
}

/// Every topic of an event, newest first, with its results so far.
#[get("/admin/topics?<event>")]
async fn topic_dashboard(
    _token: AuthToken,
    event: Option<String>,
    registry: TopicRegistry,
    ledger: BallotLedger,
    roll: DelegateRoll,
    config: &State<Config>,
) -> Result<Json<Vec<TopicSummary>>> {
    let event_id = event.as_deref().unwrap_or(config.event_id());
    let expected_votes = roll.expected_voters().await?;

    let mut summaries = Vec::new();
    for topic in registry.topics(event_id).await? {
        summaries.push(TopicSummary {
            results: topic_results(&ledger, topic).await?,
            expected_votes,
        });
    }
    Ok(Json(summaries))
}
