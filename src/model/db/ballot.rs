use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{ballot::BallotChoice, Credential},
    mongodb::Id,
};

/// One delegate's recorded choice for one topic. Never modified once stored.
///
/// The pair (`topic_id`, `credential`) is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Foreign key topic ID.
    pub topic_id: Id,
    /// The credential that cast this ballot.
    pub credential: Credential,
    /// What was chosen.
    pub choice: BallotChoice,
    /// When the ballot was accepted.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl Ballot {
    pub fn new(topic_id: Id, credential: Credential, choice: BallotChoice) -> Self {
        Self {
            topic_id,
            credential,
            choice,
            cast_at: Utc::now(),
        }
    }
}
