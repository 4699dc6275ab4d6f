use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{
        ballot::{BallotChoice, RawChoice},
        Credential,
    },
    db::ballot::Ballot,
};

/// A delegate's vote, as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub credential: Credential,
    pub topic_id: ApiId,
    pub choice: RawChoice,
}

/// Confirmation of an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotReceipt {
    pub topic_id: ApiId,
    pub credential: Credential,
    pub choice: BallotChoice,
    pub cast_at: DateTime<Utc>,
}

impl From<Ballot> for BallotReceipt {
    fn from(ballot: Ballot) -> Self {
        Self {
            topic_id: ballot.topic_id.into(),
            credential: ballot.credential,
            choice: ballot.choice,
            cast_at: ballot.cast_at,
        }
    }
}
