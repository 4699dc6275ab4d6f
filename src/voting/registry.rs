use rocket::request::{FromRequest, Outcome, Request};

use crate::error::{Error, Result};
use crate::model::{
    common::topic::{TopicKind, TopicStatus},
    db::{NewTopic, Topic},
    mongodb::Id,
};
use crate::store::Storage;

/// Holds every topic of every event and enforces that at most one topic per
/// event is open.
#[derive(Clone)]
pub struct TopicRegistry {
    store: Storage,
}

impl TopicRegistry {
    pub fn new(store: Storage) -> Self {
        Self { store }
    }

    /// Create a topic in the `WAITING` state.
    pub async fn create_topic(&self, event_id: &str, title: &str, kind: TopicKind) -> Result<Topic> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::BadRequest("Topic title must not be empty".to_string()));
        }

        let topic = NewTopic::new(event_id.to_string(), title.to_string(), kind);
        let topic = self.store.insert_topic(topic).await?;
        info!(
            "Created topic {} '{}' in event '{}'",
            topic.id, topic.title, topic.event_id
        );
        Ok(topic)
    }

    /// Move a topic to a new status. Opening a topic closes whichever other
    /// topic of the same event was open, in the same step.
    pub async fn set_status(&self, id: Id, status: TopicStatus) -> Result<Topic> {
        let topic = match status {
            TopicStatus::Open => self.store.open_topic(id).await?,
            _ => self.store.set_topic_status(id, status).await?,
        }
        .ok_or_else(|| Error::not_found(format!("Topic {id}")))?;
        info!("Topic {id} is now {status}");
        Ok(topic)
    }

    /// The topic delegates should be looking at: the open one, or failing
    /// that the newest topic of the event if it has closed. A newest topic
    /// still waiting to be opened yields `None`.
    pub async fn active_topic(&self, event_id: &str) -> Result<Option<Topic>> {
        let mut topics = self.store.topics(event_id).await?;
        if let Some(index) = topics
            .iter()
            .position(|topic| topic.status == TopicStatus::Open)
        {
            return Ok(Some(topics.swap_remove(index)));
        }
        Ok(topics
            .pop()
            .filter(|topic| topic.status == TopicStatus::Closed))
    }

    /// All topics of an event, newest first.
    pub async fn topics(&self, event_id: &str) -> Result<Vec<Topic>> {
        let mut topics = self.store.topics(event_id).await?;
        topics.reverse();
        Ok(topics)
    }

    pub async fn topic(&self, id: Id) -> Result<Topic> {
        self.store
            .topic(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Topic {id}")))
    }

    /// Delete a topic along with all of its ballots.
    pub async fn delete_topic(&self, id: Id) -> Result<()> {
        if !self.store.delete_topic(id).await? {
            return Err(Error::not_found(format!("Topic {id}")));
        }
        info!("Deleted topic {id}");
        Ok(())
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for TopicRegistry {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        req.guard::<Storage>().await.map(Self::new)
    }
}
