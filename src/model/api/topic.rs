use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{
        tally::{Outcome, Tally},
        topic::{TopicKind, TopicStatus},
        CandidateId, EventId,
    },
    db::topic::Topic,
};

/// The type of topic requested by an admin.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicType {
    #[default]
    Simple,
    Election,
}

/// An admin's request to create a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    /// Defaults to the configured event.
    #[serde(default)]
    pub event_id: Option<EventId>,
    pub title: String,
    #[serde(default, rename = "type")]
    pub topic_type: TopicType,
    /// Only used by elections.
    #[serde(default)]
    pub candidates: Option<Vec<CandidateId>>,
    /// Only used by elections; defaults to 1.
    #[serde(default)]
    pub max_choices: Option<u32>,
}

impl TopicSpec {
    /// The topic kind this spec describes. Candidate data is ignored for simple topics.
    pub fn kind(&self) -> TopicKind {
        match self.topic_type {
            TopicType::Simple => TopicKind::Simple,
            TopicType::Election => TopicKind::Election {
                candidates: self.candidates.clone().unwrap_or_default(),
                max_choices: self.max_choices.unwrap_or(1),
            },
        }
    }
}

/// An admin's request to change a topic's status. Kept as a raw string so
/// that unknown values can be reported as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// An API-friendly topic description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescription {
    pub id: ApiId,
    pub event_id: EventId,
    pub title: String,
    #[serde(flatten)]
    pub kind: TopicKind,
    pub status: TopicStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Topic> for TopicDescription {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id.into(),
            event_id: topic.topic.event_id,
            title: topic.topic.title,
            kind: topic.topic.kind,
            status: topic.topic.status,
            created_at: topic.topic.created_at,
        }
    }
}

/// A topic together with its current results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResults {
    pub topic: TopicDescription,
    pub tally: Tally,
    pub outcome: Outcome,
}

/// What the delegate screen and the public display show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTopic {
    #[serde(flatten)]
    pub results: TopicResults,
    /// Whether the querying credential has a ballot on this topic.
    pub has_voted: bool,
}

/// One row of the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    #[serde(flatten)]
    pub results: TopicResults,
    /// How many delegates could vote.
    pub expected_votes: u64,
}

#[cfg(test)]
mod examples {
    use super::*;

    impl TopicSpec {
        pub fn simple(title: &str) -> Self {
            Self {
                event_id: None,
                title: title.to_string(),
                topic_type: TopicType::Simple,
                candidates: None,
                max_choices: None,
            }
        }

        pub fn election(title: &str, candidates: &[&str], max_choices: u32) -> Self {
            Self {
                event_id: None,
                title: title.to_string(),
                topic_type: TopicType::Election,
                candidates: Some(candidates.iter().map(|c| c.to_string()).collect()),
                max_choices: Some(max_choices),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn spec_defaults() {
        let spec: TopicSpec = serde_json::from_str(r#"{"title": "Pauta 1"}"#).unwrap();
        assert_eq!(spec, TopicSpec::simple("Pauta 1"));
        assert_eq!(spec.kind(), TopicKind::Simple);

        let spec: TopicSpec =
            serde_json::from_str(r#"{"title": "Eleição", "type": "ELECTION", "candidates": ["A"]}"#)
                .unwrap();
        assert_eq!(
            spec.kind(),
            TopicKind::Election {
                candidates: vec!["A".to_string()],
                max_choices: 1,
            }
        );
    }
}
