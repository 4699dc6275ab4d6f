use std::sync::Arc;

use rocket::{
    request::{FromRequest, Outcome as RequestOutcome, Request},
    State,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    common::{
        ballot::RawChoice,
        tally::{Outcome, Tally},
        topic::TopicStatus,
    },
    db::{Ballot, Topic},
    mongodb::Id,
};
use crate::store::Storage;

use super::{DelegateRoll, Eligibility};

/// Records ballots, one per credential per topic, and counts them.
#[derive(Clone)]
pub struct BallotLedger {
    store: Storage,
    electorate: Arc<dyn Eligibility>,
}

impl BallotLedger {
    pub fn new(store: Storage, electorate: impl Eligibility + 'static) -> Self {
        Self {
            store,
            electorate: Arc::new(electorate),
        }
    }

    /// Cast a ballot on a topic.
    ///
    /// Checks run in a fixed order: the topic must exist, be open, the
    /// credential must be eligible and not have voted yet, and only then is
    /// the choice itself validated. The final insert fails with
    /// `AlreadyVoted` if a concurrent call got there first.
    pub async fn cast_vote(
        &self,
        topic_id: Id,
        credential: &str,
        choice: RawChoice,
    ) -> Result<Ballot> {
        let topic = self.topic(topic_id).await?;
        if topic.status != TopicStatus::Open {
            return Err(Error::VotingClosed(topic_id));
        }
        if !self.electorate.is_eligible(credential).await? {
            return Err(Error::Unauthorized(format!(
                "Credential '{credential}' may not vote"
            )));
        }
        if self.store.has_ballot(topic_id, credential).await? {
            return Err(Error::AlreadyVoted {
                topic_id,
                credential: credential.to_string(),
            });
        }
        let choice = choice.validate(&topic.kind)?;

        let ballot = Ballot::new(topic_id, credential.to_string(), choice);
        self.store.insert_ballot(ballot.clone()).await?;
        debug!("Recorded ballot of {credential} on topic {topic_id}");
        Ok(ballot)
    }

    /// Count the ballots of a topic.
    pub async fn tally(&self, topic_id: Id) -> Result<Tally> {
        let topic = self.topic(topic_id).await?;
        self.tally_for(&topic).await
    }

    /// Count the ballots of an already fetched topic.
    pub async fn tally_for(&self, topic: &Topic) -> Result<Tally> {
        let ballots = self.store.ballots(topic.id).await?;
        Ok(Tally::count(
            &topic.kind,
            ballots.iter().map(|ballot| &ballot.choice),
        ))
    }

    pub async fn outcome(&self, topic_id: Id) -> Result<Outcome> {
        let topic = self.topic(topic_id).await?;
        let tally = self.tally_for(&topic).await?;
        Ok(Self::derive_outcome(&topic, &tally))
    }

    pub fn derive_outcome(topic: &Topic, tally: &Tally) -> Outcome {
        Outcome::derive(topic.status, &topic.kind, tally)
    }

    pub async fn has_voted(&self, topic_id: Id, credential: &str) -> Result<bool> {
        self.store.has_ballot(topic_id, credential).await
    }

    async fn topic(&self, topic_id: Id) -> Result<Topic> {
        self.store
            .topic(topic_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Topic {topic_id}")))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BallotLedger {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();
        req.guard::<Storage>().await.map(|store| {
            let roll = DelegateRoll::new(store.clone(), config);
            Self::new(store, roll)
        })
    }
}

#[cfg(test)]
mod tests {
    use rocket::futures::future::join_all;

    use crate::model::common::{ballot::BallotChoice, topic::TopicKind};
    use crate::voting::TopicRegistry;

    use super::*;

    const EVENT: &str = "assembleia";

    struct Assembly {
        registry: TopicRegistry,
        roll: DelegateRoll,
        ledger: BallotLedger,
    }

    impl Assembly {
        /// Groups 107 and 14, two delegates each.
        async fn new(config: Config) -> Self {
            let store = Storage::memory();
            let roll = DelegateRoll::new(store.clone(), &config);
            roll.register_group("107", None).await.unwrap();
            roll.register_group("14", None).await.unwrap();
            Self {
                registry: TopicRegistry::new(store.clone()),
                ledger: BallotLedger::new(store, roll.clone()),
                roll,
            }
        }

        async fn open(&self, kind: TopicKind) -> Topic {
            let topic = self
                .registry
                .create_topic(EVENT, "Pauta", kind)
                .await
                .unwrap();
            self.registry
                .set_status(topic.id, TopicStatus::Open)
                .await
                .unwrap()
        }

        async fn close(&self, topic: &Topic) -> Topic {
            self.registry
                .set_status(topic.id, TopicStatus::Closed)
                .await
                .unwrap()
        }
    }

    fn single(option: &str) -> RawChoice {
        RawChoice::Single(option.to_string())
    }

    fn multiple(candidates: &[&str]) -> RawChoice {
        RawChoice::Multiple(candidates.iter().map(|c| c.to_string()).collect())
    }

    fn election() -> TopicKind {
        TopicKind::Election {
            candidates: vec!["A".into(), "B".into(), "C".into()],
            max_choices: 2,
        }
    }

    #[rocket::async_test]
    async fn simple_vote_approves() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(TopicKind::Simple).await;

        for (credential, option) in [("107-1", "favor"), ("107-2", "favor"), ("14-1", "contra")] {
            let ballot = assembly
                .ledger
                .cast_vote(topic.id, credential, single(option))
                .await
                .unwrap();
            assert_eq!(ballot.credential, credential);
        }

        let tally = assembly.ledger.tally(topic.id).await.unwrap();
        assert_eq!(tally.get("favor"), 2);
        assert_eq!(tally.get("contra"), 1);
        assert_eq!(tally.get("abstencao"), 0);
        assert_eq!(tally.ballots, 3);
        assert_eq!(
            assembly.ledger.outcome(topic.id).await.unwrap(),
            Outcome::InProgress
        );

        assembly.close(&topic).await;
        assert_eq!(
            assembly.ledger.outcome(topic.id).await.unwrap(),
            Outcome::Approved
        );
    }

    #[rocket::async_test]
    async fn unknown_credential_rejected() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(TopicKind::Simple).await;

        assert!(matches!(
            assembly
                .ledger
                .cast_vote(topic.id, "999-1", single("favor"))
                .await,
            Err(Error::Unauthorized(_))
        ));
        let tally = assembly.ledger.tally(topic.id).await.unwrap();
        assert_eq!(tally, Tally::empty(&TopicKind::Simple));
    }

    #[rocket::async_test]
    async fn election_choices_validated() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(election()).await;
        let ledger = &assembly.ledger;

        for invalid in [multiple(&["A", "B", "D"]), multiple(&["A", "D"]), single("A")] {
            assert!(matches!(
                ledger.cast_vote(topic.id, "107-1", invalid).await,
                Err(Error::InvalidChoice(_))
            ));
        }
        // A rejected choice does not use up the credential.
        assert!(!ledger.has_voted(topic.id, "107-1").await.unwrap());

        let ballot = ledger
            .cast_vote(topic.id, "107-1", multiple(&["A", "C"]))
            .await
            .unwrap();
        assert_eq!(
            ballot.choice,
            BallotChoice::Election(vec!["A".into(), "C".into()])
        );
        ledger
            .cast_vote(topic.id, "107-2", multiple(&["C"]))
            .await
            .unwrap();
        ledger
            .cast_vote(topic.id, "14-1", multiple(&[]))
            .await
            .unwrap();

        let tally = ledger.tally(topic.id).await.unwrap();
        assert_eq!(tally.get("A"), 1);
        assert_eq!(tally.get("B"), 0);
        assert_eq!(tally.get("C"), 2);
        assert_eq!(tally.ballots, 3);

        assembly.close(&topic).await;
        assert_eq!(ledger.outcome(topic.id).await.unwrap(), Outcome::Concluded);
    }

    #[rocket::async_test]
    async fn closed_topics_reject_votes() {
        let assembly = Assembly::new(Config::example()).await;
        let waiting = assembly
            .registry
            .create_topic(EVENT, "Depois", TopicKind::Simple)
            .await
            .unwrap();
        let topic = assembly.open(TopicKind::Simple).await;
        assembly.close(&topic).await;

        for id in [waiting.id, topic.id] {
            assert!(matches!(
                assembly.ledger.cast_vote(id, "107-1", single("favor")).await,
                Err(Error::VotingClosed(_))
            ));
            assert!(!assembly.ledger.has_voted(id, "107-1").await.unwrap());
        }
        assert!(matches!(
            assembly
                .ledger
                .cast_vote(Id::new(), "107-1", single("favor"))
                .await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(
            assembly.ledger.outcome(topic.id).await.unwrap(),
            Outcome::NoVotes
        );
    }

    #[rocket::async_test]
    async fn checks_run_in_order() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(TopicKind::Simple).await;
        assembly.close(&topic).await;

        // Closed beats unknown credential and garbage choice.
        assert!(matches!(
            assembly
                .ledger
                .cast_vote(topic.id, "999-1", single("talvez"))
                .await,
            Err(Error::VotingClosed(_))
        ));

        let topic = assembly.open(TopicKind::Simple).await;
        // Unknown credential beats garbage choice.
        assert!(matches!(
            assembly
                .ledger
                .cast_vote(topic.id, "999-1", single("talvez"))
                .await,
            Err(Error::Unauthorized(_))
        ));

        // Already voted beats garbage choice.
        assembly
            .ledger
            .cast_vote(topic.id, "107-1", single("abstencao"))
            .await
            .unwrap();
        assert!(matches!(
            assembly
                .ledger
                .cast_vote(topic.id, "107-1", single("talvez"))
                .await,
            Err(Error::AlreadyVoted { .. })
        ));
    }

    #[rocket::async_test]
    async fn concurrent_votes_counted_once() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(TopicKind::Simple).await;

        let attempts = (0..10).map(|_| {
            assembly
                .ledger
                .cast_vote(topic.id, "107-1", single("favor"))
        });
        let results = join_all(attempts).await;

        let accepted = results.iter().filter(|result| result.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|result| matches!(result, Err(Error::AlreadyVoted { .. })))
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(duplicates, 9);

        let tally = assembly.ledger.tally(topic.id).await.unwrap();
        assert_eq!(tally.ballots, 1);
        assert_eq!(tally.get("favor"), 1);
    }

    #[rocket::async_test]
    async fn reopening_keeps_ballots() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(TopicKind::Simple).await;
        assembly
            .ledger
            .cast_vote(topic.id, "107-1", single("contra"))
            .await
            .unwrap();
        assembly.close(&topic).await;

        assembly
            .registry
            .set_status(topic.id, TopicStatus::Open)
            .await
            .unwrap();
        assert!(matches!(
            assembly
                .ledger
                .cast_vote(topic.id, "107-1", single("favor"))
                .await,
            Err(Error::AlreadyVoted { .. })
        ));
        assembly
            .ledger
            .cast_vote(topic.id, "107-2", single("favor"))
            .await
            .unwrap();

        assembly.close(&topic).await;
        let tally = assembly.ledger.tally(topic.id).await.unwrap();
        assert_eq!(tally.ballots, 2);
        // One each way is not a majority.
        assert_eq!(
            assembly.ledger.outcome(topic.id).await.unwrap(),
            Outcome::Rejected
        );
    }

    #[rocket::async_test]
    async fn check_in_required() {
        let assembly = Assembly::new(Config::with_check_in()).await;
        let topic = assembly.open(TopicKind::Simple).await;

        assert!(matches!(
            assembly
                .ledger
                .cast_vote(topic.id, "107-1", single("favor"))
                .await,
            Err(Error::Unauthorized(_))
        ));

        assembly.roll.check_in("107-1", true).await.unwrap();
        assembly
            .ledger
            .cast_vote(topic.id, "107-1", single("favor"))
            .await
            .unwrap();
        assert!(assembly.ledger.has_voted(topic.id, "107-1").await.unwrap());
    }

    #[rocket::async_test]
    async fn tally_totals_match_ballots() {
        let assembly = Assembly::new(Config::example()).await;
        let topic = assembly.open(TopicKind::Simple).await;
        for (credential, option) in [
            ("107-1", "favor"),
            ("107-2", "abstencao"),
            ("14-1", "contra"),
            ("14-2", "abstencao"),
        ] {
            assembly
                .ledger
                .cast_vote(topic.id, credential, single(option))
                .await
                .unwrap();
        }

        let tally = assembly.ledger.tally(topic.id).await.unwrap();
        assert_eq!(tally.total_selections(), tally.ballots);
        assert_eq!(tally.ballots, 4);
        assert_eq!(tally.get("abstencao"), 2);
    }
}
