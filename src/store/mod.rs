//! Storage behind the topic registry, ballot ledger and delegate roll.
//!
//! Every mutation the voting rules depend on is a single atomic operation
//! here: opening a topic closes the others in one step, and inserting a
//! ballot fails if one already exists for the same topic and credential.

use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::{
    common::topic::TopicStatus,
    db::{Ballot, Delegate, Group, NewTopic, Topic},
    mongodb::Id,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Insert a new topic, assigning it an ID.
    async fn insert_topic(&self, topic: NewTopic) -> Result<Topic>;

    async fn topic(&self, id: Id) -> Result<Option<Topic>>;

    /// All topics of an event, oldest first.
    async fn topics(&self, event_id: &str) -> Result<Vec<Topic>>;

    /// Atomically close every other open topic of the same event and open
    /// this one. Returns `None` if the topic does not exist.
    async fn open_topic(&self, id: Id) -> Result<Option<Topic>>;

    /// Set a topic's status with no side effects on other topics.
    async fn set_topic_status(&self, id: Id, status: TopicStatus) -> Result<Option<Topic>>;

    /// Delete a topic and all of its ballots. Returns false if it did not exist.
    async fn delete_topic(&self, id: Id) -> Result<bool>;

    /// Record a ballot, failing with `AlreadyVoted` if the credential already
    /// has one on this topic. Also fails with `NotFound` or `VotingClosed` if
    /// the topic has disappeared or stopped accepting ballots.
    async fn insert_ballot(&self, ballot: Ballot) -> Result<()>;

    async fn ballots(&self, topic_id: Id) -> Result<Vec<Ballot>>;

    async fn has_ballot(&self, topic_id: Id, credential: &str) -> Result<bool>;

    /// Register a group and its delegates. Fails with `BadRequest` if the
    /// group number is taken.
    async fn insert_group(&self, group: Group) -> Result<()>;

    async fn groups(&self) -> Result<Vec<Group>>;

    /// Remove a group and its delegates. Returns false if it did not exist.
    async fn delete_group(&self, number: &str) -> Result<bool>;

    async fn delegate(&self, credential: &str) -> Result<Option<Delegate>>;

    async fn set_checked_in(&self, credential: &str, checked_in: bool)
        -> Result<Option<Delegate>>;

    async fn delegate_count(&self) -> Result<u64>;
}

/// A shared handle on the store, placed in Rocket's managed state.
#[derive(Clone)]
pub struct Storage(Arc<dyn Store>);

impl Storage {
    pub fn new(store: impl Store + 'static) -> Self {
        Self(Arc::new(store))
    }

    /// A fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self::new(MemoryStore::default())
    }
}

impl Deref for Storage {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Storage {
    type Error = ();

    /// Get the store from the managed state.
    ///
    /// Panics iff the [`Storage`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let storage = req.guard::<&State<Storage>>().await.unwrap();
        request::Outcome::Success(storage.inner().clone())
    }
}
