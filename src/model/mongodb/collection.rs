use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::common::topic::TopicStatus;
use crate::model::db::{
    ballot::Ballot,
    delegate::{Delegate, Group},
    topic::Topic,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Topic collections
const TOPICS: &str = "topics";
impl MongoCollection for Topic {
    const NAME: &'static str = TOPICS;
}

// Ballot collection
const BALLOTS: &str = "ballots";
impl MongoCollection for Ballot {
    const NAME: &'static str = BALLOTS;
}

// Delegate roll collections
const DELEGATES: &str = "delegates";
impl MongoCollection for Delegate {
    const NAME: &'static str = DELEGATES;
}

const GROUPS: &str = "groups";
impl MongoCollection for Group {
    const NAME: &'static str = GROUPS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // One ballot per credential per topic.
    let ballot_index = IndexModel::builder()
        .keys(doc! {"topic_id": 1, "credential": 1})
        .options(unique)
        .build();
    Coll::<Ballot>::from_db(db)
        .create_index(ballot_index, None)
        .await?;

    // Topic lookups by event, in creation order.
    let topic_index = IndexModel::builder()
        .keys(doc! {"event_id": 1, "created_at": 1})
        .build();
    Coll::<Topic>::from_db(db)
        .create_index(topic_index, None)
        .await?;

    // At most one open topic per event. Two transactions opening different
    // topics of the same event collide on this index.
    let single_open = IndexOptions::builder()
        .name("single_open_topic".to_string())
        .unique(true)
        .partial_filter_expression(doc! {"status": TopicStatus::Open})
        .build();
    let open_index = IndexModel::builder()
        .keys(doc! {"event_id": 1})
        .options(single_open)
        .build();
    Coll::<Topic>::from_db(db)
        .create_index(open_index, None)
        .await?;

    // Delegates are removed by group.
    let delegate_index = IndexModel::builder().keys(doc! {"group": 1}).build();
    Coll::<Delegate>::from_db(db)
        .create_index(delegate_index, None)
        .await?;

    Ok(())
}
