use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::common::CandidateId;

/// States in the topic lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicStatus {
    /// Created, not yet put to vote.
    #[serde(alias = "AGUARDANDO", alias = "CRIADA")]
    Waiting,
    /// Accepting ballots. At most one per event.
    #[serde(alias = "ABERTA")]
    Open,
    /// No longer accepting ballots; results are final.
    #[serde(alias = "ENCERRADA")]
    Closed,
}

impl TopicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl Display for TopicStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicStatus {
    type Err = Error;

    /// Parse a status name, accepting the Portuguese names used by the assembly frontend.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WAITING" | "AGUARDANDO" | "CRIADA" => Ok(Self::Waiting),
            "OPEN" | "ABERTA" => Ok(Self::Open),
            "CLOSED" | "ENCERRADA" => Ok(Self::Closed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

impl From<TopicStatus> for Bson {
    fn from(status: TopicStatus) -> Self {
        Bson::String(status.as_str().to_string())
    }
}

/// What kind of question a topic puts to vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicKind {
    /// Favor / contra / abstencao.
    Simple,
    /// Pick up to `max_choices` of the `candidates`.
    Election {
        candidates: Vec<CandidateId>,
        max_choices: u32,
    },
}

impl TopicKind {
    pub fn is_election(&self) -> bool {
        matches!(self, Self::Election { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status() {
        assert_eq!("OPEN".parse::<TopicStatus>().unwrap(), TopicStatus::Open);
        assert_eq!("ABERTA".parse::<TopicStatus>().unwrap(), TopicStatus::Open);
        assert_eq!(" closed ".parse::<TopicStatus>().unwrap(), TopicStatus::Closed);
        assert_eq!(
            "AGUARDANDO".parse::<TopicStatus>().unwrap(),
            TopicStatus::Waiting
        );
        assert!(matches!(
            "PAUSED".parse::<TopicStatus>(),
            Err(Error::InvalidStatus(s)) if s == "PAUSED"
        ));
    }

    #[test]
    fn kind_wire_format() {
        let kind: TopicKind = rocket::serde::json::serde_json::from_str(
            r#"{"type": "ELECTION", "candidates": ["A", "B"], "max_choices": 1}"#,
        )
        .unwrap();
        assert_eq!(
            kind,
            TopicKind::Election {
                candidates: vec!["A".to_string(), "B".to_string()],
                max_choices: 1,
            }
        );
        let simple = rocket::serde::json::serde_json::to_string(&TopicKind::Simple).unwrap();
        assert_eq!(simple, r#"{"type":"SIMPLE"}"#);
    }
}
