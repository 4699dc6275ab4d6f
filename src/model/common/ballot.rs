use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::common::{topic::TopicKind, CandidateId};

/// The options of a simple topic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleChoice {
    Favor,
    Contra,
    Abstencao,
}

impl SimpleChoice {
    pub const ALL: [SimpleChoice; 3] = [Self::Favor, Self::Contra, Self::Abstencao];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favor => "favor",
            Self::Contra => "contra",
            Self::Abstencao => "abstencao",
        }
    }
}

impl Display for SimpleChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimpleChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.as_str() == s)
            .ok_or_else(|| Error::InvalidChoice(format!("'{s}' is not favor, contra or abstencao")))
    }
}

/// The validated content of a ballot. The variant always matches the kind of
/// the topic the ballot was cast on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotChoice {
    Simple(SimpleChoice),
    /// Distinct candidate names; may be empty for a blank ballot.
    Election(Vec<CandidateId>),
}

impl BallotChoice {
    /// The tally keys this ballot contributes to.
    pub fn selections(&self) -> Vec<&str> {
        match self {
            Self::Simple(choice) => vec![choice.as_str()],
            Self::Election(candidates) => candidates.iter().map(String::as_str).collect(),
        }
    }
}

/// A choice as submitted by a delegate: a single option for simple topics, a
/// list of candidates for elections. Only becomes a [`BallotChoice`] once
/// validated against the topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChoice {
    Single(String),
    Multiple(Vec<String>),
}

impl RawChoice {
    /// Validate this choice against the kind of topic it is cast on.
    pub fn validate(self, kind: &TopicKind) -> Result<BallotChoice, Error> {
        match (kind, self) {
            (TopicKind::Simple, Self::Single(option)) => {
                Ok(BallotChoice::Simple(option.parse()?))
            }
            (TopicKind::Simple, Self::Multiple(_)) => Err(Error::InvalidChoice(
                "a simple topic takes a single option".to_string(),
            )),
            (TopicKind::Election { .. }, Self::Single(_)) => Err(Error::InvalidChoice(
                "an election takes a list of candidates".to_string(),
            )),
            (
                TopicKind::Election {
                    candidates,
                    max_choices,
                },
                Self::Multiple(selected),
            ) => {
                if selected.len() > *max_choices as usize {
                    return Err(Error::InvalidChoice(format!(
                        "{} candidates selected, at most {} allowed",
                        selected.len(),
                        max_choices
                    )));
                }
                for (i, name) in selected.iter().enumerate() {
                    if !candidates.contains(name) {
                        return Err(Error::InvalidChoice(format!(
                            "'{name}' is not a candidate"
                        )));
                    }
                    if selected[..i].contains(name) {
                        return Err(Error::InvalidChoice(format!(
                            "'{name}' selected more than once"
                        )));
                    }
                }
                Ok(BallotChoice::Election(selected))
            }
        }
    }
}
