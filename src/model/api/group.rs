use serde::{Deserialize, Serialize};

use crate::model::{
    common::Credential,
    db::delegate::{Delegate, Group},
};

/// An admin's request to register a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub number: String,
    /// Defaults to the configured number of delegates per group.
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// A registered group and the credentials issued to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescription {
    pub number: String,
    pub quantity: u32,
    pub credentials: Vec<Credential>,
}

impl From<Group> for GroupDescription {
    fn from(group: Group) -> Self {
        let credentials = group
            .delegates()
            .into_iter()
            .map(|delegate| delegate.credential)
            .collect();
        Self {
            number: group.number,
            quantity: group.quantity,
            credentials,
        }
    }
}

/// An API-friendly delegate description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateDescription {
    pub id: Credential,
    pub name: String,
    pub group: String,
    pub checked_in: bool,
}

impl From<Delegate> for DelegateDescription {
    fn from(delegate: Delegate) -> Self {
        Self {
            id: delegate.credential,
            name: delegate.name,
            group: delegate.group,
            checked_in: delegate.checked_in,
        }
    }
}

/// A delegate identifying themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateLogin {
    pub credential: Credential,
}

/// An admin's request to mark a delegate as present or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    #[serde(default = "present")]
    pub checked_in: bool,
}

fn present() -> bool {
    true
}
