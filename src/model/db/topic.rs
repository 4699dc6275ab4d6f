use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        topic::{TopicKind, TopicStatus},
        EventId,
    },
    mongodb::Id,
};

/// Core topic data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCore {
    /// The event this topic is voted in.
    pub event_id: EventId,
    /// The question put to vote.
    pub title: String,
    /// Simple or election.
    pub kind: TopicKind,
    /// Lifecycle state.
    pub status: TopicStatus,
    /// Creation time, which orders the topics of an event.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl TopicCore {
    /// Create a new topic, waiting to be opened.
    pub fn new(event_id: EventId, title: String, kind: TopicKind) -> Self {
        Self {
            event_id,
            title,
            kind,
            status: TopicStatus::Waiting,
            created_at: Utc::now(),
        }
    }
}

/// A topic without an ID.
pub type NewTopic = TopicCore;

/// A topic from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub topic: TopicCore,
}

impl Topic {
    pub fn new(id: Id, topic: TopicCore) -> Self {
        Self { id, topic }
    }
}

impl Deref for Topic {
    type Target = TopicCore;

    fn deref(&self) -> &Self::Target {
        &self.topic
    }
}

impl DerefMut for Topic {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.topic
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl TopicCore {
        pub fn example_simple() -> Self {
            Self::new(
                "assembleia".to_string(),
                "Aprovação das contas de 2025".to_string(),
                TopicKind::Simple,
            )
        }

        pub fn example_election() -> Self {
            Self::new(
                "assembleia".to_string(),
                "Eleição da diretoria regional".to_string(),
                TopicKind::Election {
                    candidates: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                    max_choices: 2,
                },
            )
        }
    }
}
