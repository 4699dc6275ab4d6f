use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Client, ClientSession, Database,
};
use rand::Rng;
use rocket::{futures::TryStreamExt, tokio::time::sleep};

use crate::error::{Error, Result};
use crate::model::{
    common::topic::TopicStatus,
    db::{Ballot, Delegate, Group, NewTopic, Topic},
    mongodb::{
        ensure_indexes_exist, is_duplicate_key_error, is_transient_transaction_error,
        is_unknown_commit_result, Coll, Id,
    },
};

use super::Store;

/// How many times a transaction that lost a write conflict is retried.
const MAX_TRANSACTION_ATTEMPTS: u32 = 16;

/// A store backed by MongoDB.
///
/// Ballot uniqueness is enforced by a unique index on `(topic_id, credential)`,
/// and a partial unique index allows one open topic per event. Every write
/// touching more than one document runs in a transaction, so the deployment
/// must be a replica set.
///
/// Casting a ballot bumps a counter on its topic inside the same transaction.
/// A status change racing with a ballot therefore conflicts with it instead of
/// interleaving, and a ballot is never stored on a topic that closed first.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect to the given deployment and make sure the indexes exist.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(database);
        ensure_indexes_exist(&db).await?;
        Ok(Self { client, db })
    }

    fn topic_coll(&self) -> Coll<Topic> {
        Coll::from_db(&self.db)
    }

    fn ballot_coll(&self) -> Coll<Ballot> {
        Coll::from_db(&self.db)
    }

    fn group_coll(&self) -> Coll<Group> {
        Coll::from_db(&self.db)
    }

    fn delegate_coll(&self) -> Coll<Delegate> {
        Coll::from_db(&self.db)
    }

    async fn start_transaction(&self) -> Result<ClientSession> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(session)
    }

    async fn try_open_topic(&self, id: Id) -> Result<Option<Topic>> {
        let topics = self.topic_coll();
        let mut session = self.start_transaction().await?;

        let mut topic = match topics
            .find_one_with_session(id.as_doc(), None, &mut session)
            .await?
        {
            Some(topic) => topic,
            None => {
                session.abort_transaction().await?;
                return Ok(None);
            }
        };

        // Close whatever else is open in this event.
        let others = doc! {
            "event_id": topic.event_id.clone(),
            "status": TopicStatus::Open,
            "_id": { "$ne": id },
        };
        let close = doc! {
            "$set": { "status": TopicStatus::Closed },
        };
        let closed = topics
            .update_many_with_session(others, close, None, &mut session)
            .await?;
        if closed.modified_count > 0 {
            debug!("Closed {} topic(s) to open {}", closed.modified_count, id);
        }

        let open = doc! {
            "$set": { "status": TopicStatus::Open },
        };
        topics
            .update_one_with_session(id.as_doc(), open, None, &mut session)
            .await?;

        commit(&mut session).await?;
        topic.status = TopicStatus::Open;
        Ok(Some(topic))
    }

    async fn try_delete_topic(&self, id: Id) -> Result<bool> {
        let mut session = self.start_transaction().await?;

        let result = self
            .topic_coll()
            .delete_one_with_session(id.as_doc(), None, &mut session)
            .await?;
        if result.deleted_count == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }
        self.ballot_coll()
            .delete_many_with_session(doc! { "topic_id": id }, None, &mut session)
            .await?;

        commit(&mut session).await?;
        Ok(true)
    }

    async fn try_insert_ballot(&self, ballot: &Ballot) -> Result<()> {
        let topic_id = ballot.topic_id;
        let mut session = self.start_transaction().await?;

        // Only matches while the topic is open, and writes the topic so that
        // a concurrent status change conflicts with this transaction.
        let filter = doc! {
            "_id": topic_id,
            "status": TopicStatus::Open,
        };
        let bump = doc! {
            "$inc": { "ballot_count": 1 },
        };
        let bumped = self
            .topic_coll()
            .update_one_with_session(filter, bump, None, &mut session)
            .await?;
        if bumped.matched_count == 0 {
            let exists = self
                .topic_coll()
                .find_one_with_session(topic_id.as_doc(), None, &mut session)
                .await?
                .is_some();
            session.abort_transaction().await?;
            return Err(if exists {
                Error::VotingClosed(topic_id)
            } else {
                Error::not_found(format!("Topic {topic_id}"))
            });
        }

        match self
            .ballot_coll()
            .insert_one_with_session(ballot, None, &mut session)
            .await
        {
            Ok(_) => {}
            // The server aborts the transaction on a write error.
            Err(e) if is_duplicate_key_error(&e) => {
                return Err(Error::AlreadyVoted {
                    topic_id,
                    credential: ballot.credential.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        commit(&mut session).await
    }

    async fn try_insert_group(&self, group: &Group) -> Result<()> {
        let delegates = group.delegates();
        let mut session = self.start_transaction().await?;

        let inserted = match self
            .group_coll()
            .insert_one_with_session(group, None, &mut session)
            .await
        {
            Ok(_) if delegates.is_empty() => Ok(()),
            Ok(_) => self
                .delegate_coll()
                .insert_many_with_session(&delegates, None, &mut session)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        match inserted {
            Ok(()) => commit(&mut session).await,
            Err(e) if is_duplicate_key_error(&e) => Err(Error::BadRequest(format!(
                "Group {} or one of its credentials is already registered",
                group.number
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn try_delete_group(&self, number: &str) -> Result<bool> {
        let mut session = self.start_transaction().await?;

        let result = self
            .group_coll()
            .delete_one_with_session(doc! { "_id": number }, None, &mut session)
            .await?;
        if result.deleted_count == 0 {
            session.abort_transaction().await?;
            return Ok(false);
        }
        self.delegate_coll()
            .delete_many_with_session(doc! { "group": number }, None, &mut session)
            .await?;

        commit(&mut session).await?;
        Ok(true)
    }
}

/// Commit a transaction, retrying the commit alone while its result is unknown.
async fn commit(session: &mut ClientSession) -> Result<()> {
    let mut attempt = 1;
    loop {
        match session.commit_transaction().await {
            Err(e) if attempt < MAX_TRANSACTION_ATTEMPTS && is_unknown_commit_result(&e) => {
                debug!("Retrying commit with unknown result: {e}");
                attempt += 1;
            }
            result => return result.map_err(Error::from),
        }
    }
}

/// Run a transaction, retrying it from the start when it loses a write
/// conflict to a concurrent one.
///
/// A racing open of another topic in the same event surfaces as a duplicate
/// key on the single-open index, so that is retried too when `retry_duplicates`
/// is set. The retry then sees the winner's topic and closes it.
macro_rules! retry_transaction {
    ($op:expr, retry_duplicates = $dup:expr) => {{
        let mut attempt = 1;
        loop {
            match $op.await {
                Err(Error::Db(e))
                    if attempt < MAX_TRANSACTION_ATTEMPTS
                        && (is_transient_transaction_error(&e)
                            || ($dup && is_duplicate_key_error(&e))) =>
                {
                    debug!("Transaction attempt {attempt} failed, retrying: {e}");
                    backoff(attempt).await;
                    attempt += 1;
                }
                result => break result,
            }
        }
    }};
}

/// Sleep for a short, randomised time growing with the attempt number.
async fn backoff(attempt: u32) {
    let millis = {
        let mut rng = rand::thread_rng();
        rng.gen_range(0..=5 * u64::from(attempt))
    };
    sleep(Duration::from_millis(millis)).await;
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_topic(&self, topic: NewTopic) -> Result<Topic> {
        let topic = Topic::new(Id::new(), topic);
        self.topic_coll().insert_one(&topic, None).await?;
        Ok(topic)
    }

    async fn topic(&self, id: Id) -> Result<Option<Topic>> {
        Ok(self.topic_coll().find_one(id.as_doc(), None).await?)
    }

    async fn topics(&self, event_id: &str) -> Result<Vec<Topic>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1, "_id": 1 })
            .build();
        let topics = self
            .topic_coll()
            .find(doc! { "event_id": event_id }, options)
            .await?
            .try_collect()
            .await?;
        Ok(topics)
    }

    async fn open_topic(&self, id: Id) -> Result<Option<Topic>> {
        retry_transaction!(self.try_open_topic(id), retry_duplicates = true)
    }

    async fn set_topic_status(&self, id: Id, status: TopicStatus) -> Result<Option<Topic>> {
        let update = doc! {
            "$set": { "status": status },
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .topic_coll()
            .find_one_and_update(id.as_doc(), update, options)
            .await?)
    }

    async fn delete_topic(&self, id: Id) -> Result<bool> {
        retry_transaction!(self.try_delete_topic(id), retry_duplicates = false)
    }

    async fn insert_ballot(&self, ballot: Ballot) -> Result<()> {
        retry_transaction!(self.try_insert_ballot(&ballot), retry_duplicates = false)
    }

    async fn ballots(&self, topic_id: Id) -> Result<Vec<Ballot>> {
        let ballots = self
            .ballot_coll()
            .find(doc! { "topic_id": topic_id }, None)
            .await?
            .try_collect()
            .await?;
        Ok(ballots)
    }

    async fn has_ballot(&self, topic_id: Id, credential: &str) -> Result<bool> {
        let filter = doc! {
            "topic_id": topic_id,
            "credential": credential,
        };
        Ok(self.ballot_coll().count_documents(filter, None).await? > 0)
    }

    async fn insert_group(&self, group: Group) -> Result<()> {
        retry_transaction!(self.try_insert_group(&group), retry_duplicates = false)
    }

    async fn groups(&self) -> Result<Vec<Group>> {
        let groups = self.group_coll().find(None, None).await?.try_collect().await?;
        Ok(groups)
    }

    async fn delete_group(&self, number: &str) -> Result<bool> {
        retry_transaction!(self.try_delete_group(number), retry_duplicates = false)
    }

    async fn delegate(&self, credential: &str) -> Result<Option<Delegate>> {
        Ok(self
            .delegate_coll()
            .find_one(doc! { "_id": credential }, None)
            .await?)
    }

    async fn set_checked_in(
        &self,
        credential: &str,
        checked_in: bool,
    ) -> Result<Option<Delegate>> {
        let update = doc! {
            "$set": { "checked_in": checked_in },
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .delegate_coll()
            .find_one_and_update(doc! { "_id": credential }, update, options)
            .await?)
    }

    async fn delegate_count(&self) -> Result<u64> {
        Ok(self.delegate_coll().count_documents(None, None).await?)
    }
}
