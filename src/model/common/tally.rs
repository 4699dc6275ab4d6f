use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::common::{
    ballot::{BallotChoice, SimpleChoice},
    topic::{TopicKind, TopicStatus},
};

/// Raw vote counts for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Count per option (simple topics) or per candidate (elections).
    pub counts: BTreeMap<String, u64>,
    /// Number of ballots cast.
    pub ballots: u64,
}

impl Tally {
    /// A tally with every option of the given topic kind present and zeroed.
    pub fn empty(kind: &TopicKind) -> Self {
        let counts = match kind {
            TopicKind::Simple => SimpleChoice::ALL
                .iter()
                .map(|choice| (choice.as_str().to_string(), 0))
                .collect(),
            TopicKind::Election { candidates, .. } => candidates
                .iter()
                .map(|candidate| (candidate.clone(), 0))
                .collect(),
        };
        Self { counts, ballots: 0 }
    }

    /// Count every ballot in `choices` against a fresh tally for `kind`.
    pub fn count<'a>(kind: &TopicKind, choices: impl IntoIterator<Item = &'a BallotChoice>) -> Self {
        let mut tally = Self::empty(kind);
        for choice in choices {
            tally.record(choice);
        }
        tally
    }

    /// Add one ballot. An election ballot increments every candidate it selects.
    pub fn record(&mut self, choice: &BallotChoice) {
        self.ballots += 1;
        for selection in choice.selections() {
            *self.counts.entry(selection.to_string()).or_insert(0) += 1;
        }
    }

    /// The count for a single option or candidate.
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total_selections(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// The result label of a topic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The topic is not closed yet.
    InProgress,
    Approved,
    Rejected,
    NoVotes,
    /// An election has closed; the counts speak for themselves.
    Concluded,
}

impl Outcome {
    /// Derive the outcome of a topic from its state and tally.
    pub fn derive(status: TopicStatus, kind: &TopicKind, tally: &Tally) -> Self {
        if status != TopicStatus::Closed {
            return Self::InProgress;
        }
        match kind {
            TopicKind::Election { .. } => Self::Concluded,
            TopicKind::Simple => {
                let favor = tally.get(SimpleChoice::Favor.as_str());
                let contra = tally.get(SimpleChoice::Contra.as_str());
                if tally.ballots == 0 {
                    Self::NoVotes
                } else if favor > contra {
                    Self::Approved
                } else {
                    Self::Rejected
                }
            }
        }
    }
}
