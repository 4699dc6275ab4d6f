use serde::{Deserialize, Serialize};

use crate::model::common::Credential;

/// A registered scout group, entitled to a number of delegates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// The group numeral, e.g. `"107"`.
    #[serde(rename = "_id")]
    pub number: String,
    /// How many delegates the group sends.
    pub quantity: u32,
}

impl Group {
    pub fn new(number: String, quantity: u32) -> Self {
        Self { number, quantity }
    }

    /// The delegates this group is entitled to, none of them checked in yet.
    pub fn delegates(&self) -> Vec<Delegate> {
        (1..=self.quantity)
            .map(|seat| Delegate {
                credential: format!("{}-{}", self.number, seat),
                name: format!("Delegado {} - GE {}/PE", seat, self.number),
                group: self.number.clone(),
                checked_in: false,
            })
            .collect()
    }

    /// Sort key placing numeric group numbers first, in numeric order.
    pub fn sort_key(&self) -> (u64, &str) {
        (self.number.parse().unwrap_or(u64::MAX), &self.number)
    }
}

/// A delegate, identified by their credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    #[serde(rename = "_id")]
    pub credential: Credential,
    /// Display name.
    pub name: String,
    /// Number of the group the delegate represents.
    pub group: String,
    /// Whether the delegate has presented themselves at the check-in desk.
    pub checked_in: bool,
}
