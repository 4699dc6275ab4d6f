use std::collections::{btree_map::Entry, BTreeMap, HashMap};

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    common::{topic::TopicStatus, Credential},
    db::{Ballot, Delegate, Group, NewTopic, Topic},
    mongodb::Id,
};

use super::Store;

#[derive(Default)]
struct State {
    /// In creation order.
    topics: Vec<Topic>,
    ballots: HashMap<Id, BTreeMap<Credential, Ballot>>,
    groups: BTreeMap<String, Group>,
    delegates: BTreeMap<Credential, Delegate>,
}

impl State {
    fn topic_mut(&mut self, id: Id) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|topic| topic.id == id)
    }
}

/// A store living entirely in process memory. All state sits behind one
/// lock, so every operation is atomic with respect to every other.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_topic(&self, topic: NewTopic) -> Result<Topic> {
        let topic = Topic::new(Id::new(), topic);
        self.state.write().await.topics.push(topic.clone());
        Ok(topic)
    }

    async fn topic(&self, id: Id) -> Result<Option<Topic>> {
        let state = self.state.read().await;
        Ok(state.topics.iter().find(|topic| topic.id == id).cloned())
    }

    async fn topics(&self, event_id: &str) -> Result<Vec<Topic>> {
        let state = self.state.read().await;
        Ok(state
            .topics
            .iter()
            .filter(|topic| topic.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn open_topic(&self, id: Id) -> Result<Option<Topic>> {
        let mut state = self.state.write().await;
        let event_id = match state.topic_mut(id) {
            Some(topic) => topic.event_id.clone(),
            None => return Ok(None),
        };
        for other in state.topics.iter_mut() {
            if other.id != id && other.event_id == event_id && other.status == TopicStatus::Open {
                debug!("Closing topic {} to open {}", other.id, id);
                other.status = TopicStatus::Closed;
            }
        }
        Ok(state.topic_mut(id).map(|topic| {
            topic.status = TopicStatus::Open;
            topic.clone()
        }))
    }

    async fn set_topic_status(&self, id: Id, status: TopicStatus) -> Result<Option<Topic>> {
        let mut state = self.state.write().await;
        Ok(state.topic_mut(id).map(|topic| {
            topic.status = status;
            topic.clone()
        }))
    }

    async fn delete_topic(&self, id: Id) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.topics.len();
        state.topics.retain(|topic| topic.id != id);
        let removed = state.topics.len() != before;
        if removed {
            state.ballots.remove(&id);
        }
        Ok(removed)
    }

    async fn insert_ballot(&self, ballot: Ballot) -> Result<()> {
        let mut state = self.state.write().await;
        let topic_id = ballot.topic_id;
        let status = state
            .topic_mut(topic_id)
            .map(|topic| topic.status)
            .ok_or_else(|| Error::not_found(format!("Topic {topic_id}")))?;
        if status != TopicStatus::Open {
            return Err(Error::VotingClosed(topic_id));
        }
        match state
            .ballots
            .entry(topic_id)
            .or_default()
            .entry(ballot.credential.clone())
        {
            Entry::Occupied(_) => Err(Error::AlreadyVoted {
                topic_id,
                credential: ballot.credential,
            }),
            Entry::Vacant(slot) => {
                slot.insert(ballot);
                Ok(())
            }
        }
    }

    async fn ballots(&self, topic_id: Id) -> Result<Vec<Ballot>> {
        let state = self.state.read().await;
        Ok(state
            .ballots
            .get(&topic_id)
            .map(|ballots| ballots.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn has_ballot(&self, topic_id: Id, credential: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .ballots
            .get(&topic_id)
            .map_or(false, |ballots| ballots.contains_key(credential)))
    }

    async fn insert_group(&self, group: Group) -> Result<()> {
        let mut state = self.state.write().await;
        if state.groups.contains_key(&group.number) {
            return Err(Error::BadRequest(format!(
                "Group {} already registered",
                group.number
            )));
        }
        for delegate in group.delegates() {
            state.delegates.insert(delegate.credential.clone(), delegate);
        }
        state.groups.insert(group.number.clone(), group);
        Ok(())
    }

    async fn groups(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.values().cloned().collect())
    }

    async fn delete_group(&self, number: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.groups.remove(number).is_none() {
            return Ok(false);
        }
        state.delegates.retain(|_, delegate| delegate.group != number);
        Ok(true)
    }

    async fn delegate(&self, credential: &str) -> Result<Option<Delegate>> {
        let state = self.state.read().await;
        Ok(state.delegates.get(credential).cloned())
    }

    async fn set_checked_in(
        &self,
        credential: &str,
        checked_in: bool,
    ) -> Result<Option<Delegate>> {
        let mut state = self.state.write().await;
        Ok(state.delegates.get_mut(credential).map(|delegate| {
            delegate.checked_in = checked_in;
            delegate.clone()
        }))
    }

    async fn delegate_count(&self) -> Result<u64> {
        Ok(self.state.read().await.delegates.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::common::{ballot::BallotChoice, ballot::SimpleChoice};

    use super::*;

    fn favor(topic_id: Id, credential: &str) -> Ballot {
        Ballot::new(
            topic_id,
            credential.to_string(),
            BallotChoice::Simple(SimpleChoice::Favor),
        )
    }

    #[rocket::async_test]
    async fn open_closes_others_in_event_only() {
        let store = MemoryStore::default();
        let first = store.insert_topic(NewTopic::example_simple()).await.unwrap();
        let second = store.insert_topic(NewTopic::example_simple()).await.unwrap();
        let mut elsewhere = NewTopic::example_simple();
        elsewhere.event_id = "outro-evento".to_string();
        let elsewhere = store.insert_topic(elsewhere).await.unwrap();

        store.open_topic(first.id).await.unwrap().unwrap();
        store.open_topic(elsewhere.id).await.unwrap().unwrap();
        let opened = store.open_topic(second.id).await.unwrap().unwrap();
        assert_eq!(opened.status, TopicStatus::Open);

        for (id, expected) in [
            (first.id, TopicStatus::Closed),
            (second.id, TopicStatus::Open),
            (elsewhere.id, TopicStatus::Open),
        ] {
            let topic = store.topic(id).await.unwrap().unwrap();
            assert_eq!(topic.status, expected);
        }

        assert!(store.open_topic(Id::new()).await.unwrap().is_none());
    }

    #[rocket::async_test]
    async fn ballot_uniqueness() {
        let store = MemoryStore::default();
        let topic = store.insert_topic(NewTopic::example_simple()).await.unwrap();

        // Not open yet.
        assert!(matches!(
            store.insert_ballot(favor(topic.id, "107-1")).await,
            Err(Error::VotingClosed(_))
        ));
        assert!(matches!(
            store.insert_ballot(favor(Id::new(), "107-1")).await,
            Err(Error::NotFound(_))
        ));

        store.open_topic(topic.id).await.unwrap();
        store.insert_ballot(favor(topic.id, "107-1")).await.unwrap();
        assert!(matches!(
            store.insert_ballot(favor(topic.id, "107-1")).await,
            Err(Error::AlreadyVoted { .. })
        ));
        store.insert_ballot(favor(topic.id, "107-2")).await.unwrap();

        assert_eq!(store.ballots(topic.id).await.unwrap().len(), 2);
        assert!(store.has_ballot(topic.id, "107-1").await.unwrap());
        assert!(!store.has_ballot(topic.id, "14-1").await.unwrap());

        // Deleting the topic takes its ballots with it.
        assert!(store.delete_topic(topic.id).await.unwrap());
        assert!(store.ballots(topic.id).await.unwrap().is_empty());
        assert!(!store.delete_topic(topic.id).await.unwrap());
    }

    #[rocket::async_test]
    async fn groups_and_delegates() {
        let store = MemoryStore::default();
        store.insert_group(Group::new("107".into(), 2)).await.unwrap();
        store.insert_group(Group::new("14".into(), 3)).await.unwrap();
        assert!(matches!(
            store.insert_group(Group::new("107".into(), 1)).await,
            Err(Error::BadRequest(_))
        ));
        assert_eq!(store.delegate_count().await.unwrap(), 5);

        let delegate = store.set_checked_in("14-3", true).await.unwrap().unwrap();
        assert!(delegate.checked_in);
        assert!(store.set_checked_in("14-4", true).await.unwrap().is_none());

        assert!(store.delete_group("14").await.unwrap());
        assert!(!store.delete_group("14").await.unwrap());
        assert!(store.delegate("14-3").await.unwrap().is_none());
        assert!(store.delegate("107-2").await.unwrap().is_some());
        assert_eq!(store.delegate_count().await.unwrap(), 2);
    }
}
