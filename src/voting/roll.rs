use rocket::{
    request::{FromRequest, Outcome, Request},
    State,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::db::{Delegate, Group};
use crate::store::Storage;

use super::Eligibility;

/// Upper bound on the delegates a single group is issued credentials for.
pub const MAX_DELEGATES_PER_GROUP: u32 = 100;

/// The registered groups and their delegates.
#[derive(Clone)]
pub struct DelegateRoll {
    store: Storage,
    require_check_in: bool,
    delegates_per_group: u32,
}

impl DelegateRoll {
    pub fn new(store: Storage, config: &Config) -> Self {
        Self {
            store,
            require_check_in: config.require_check_in(),
            delegates_per_group: config.delegates_per_group(),
        }
    }

    /// Register a group, issuing credentials to its delegates.
    pub async fn register_group(&self, number: &str, quantity: Option<u32>) -> Result<Group> {
        let number = number.trim();
        if number.is_empty() {
            return Err(Error::BadRequest("Group number must not be empty".to_string()));
        }

        let quantity = quantity.unwrap_or(self.delegates_per_group);
        if quantity > MAX_DELEGATES_PER_GROUP {
            return Err(Error::BadRequest(format!(
                "A group may send at most {MAX_DELEGATES_PER_GROUP} delegates, not {quantity}"
            )));
        }

        let group = Group::new(number.to_string(), quantity);
        self.store.insert_group(group.clone()).await?;
        info!(
            "Registered group {} with {} delegate(s)",
            group.number, group.quantity
        );
        Ok(group)
    }

    /// All groups, numeric group numbers first in numeric order.
    pub async fn groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.store.groups().await?;
        groups.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(groups)
    }

    /// Remove a group and its delegates. Ballots already cast stay counted.
    pub async fn remove_group(&self, number: &str) -> Result<()> {
        if !self.store.delete_group(number).await? {
            return Err(Error::not_found(format!("Group {number}")));
        }
        info!("Removed group {number}");
        Ok(())
    }

    /// Identify a delegate by credential.
    pub async fn login(&self, credential: &str) -> Result<Delegate> {
        self.store
            .delegate(credential.trim())
            .await?
            .ok_or_else(|| Error::Unauthorized(format!("Unknown credential '{credential}'")))
    }

    /// Mark a delegate as present or absent.
    pub async fn check_in(&self, credential: &str, checked_in: bool) -> Result<Delegate> {
        let delegate = self
            .store
            .set_checked_in(credential, checked_in)
            .await?
            .ok_or_else(|| Error::not_found(format!("Delegate {credential}")))?;
        info!(
            "Delegate {credential} {}",
            if checked_in {
                "checked in"
            } else {
                "checked out"
            }
        );
        Ok(delegate)
    }

    /// How many ballots a topic can expect at most.
    pub async fn expected_voters(&self) -> Result<u64> {
        self.store.delegate_count().await
    }
}

#[rocket::async_trait]
impl Eligibility for DelegateRoll {
    async fn is_eligible(&self, credential: &str) -> Result<bool> {
        Ok(self
            .store
            .delegate(credential)
            .await?
            .map_or(false, |delegate| {
                delegate.checked_in || !self.require_check_in
            }))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DelegateRoll {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();
        req.guard::<Storage>()
            .await
            .map(|store| Self::new(store, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn register_and_remove_groups() {
        let roll = DelegateRoll::new(Storage::memory(), &Config::example());
        let group = roll.register_group(" 107 ", None).await.unwrap();
        assert_eq!(group.number, "107");
        assert_eq!(group.quantity, 2);
        roll.register_group("14", Some(3)).await.unwrap();
        roll.register_group("Distrital", Some(1)).await.unwrap();

        assert!(matches!(
            roll.register_group("", None).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            roll.register_group("107", None).await,
            Err(Error::BadRequest(_))
        ));

        let numbers: Vec<_> = roll
            .groups()
            .await
            .unwrap()
            .into_iter()
            .map(|group| group.number)
            .collect();
        assert_eq!(numbers, vec!["14", "107", "Distrital"]);
        assert_eq!(roll.expected_voters().await.unwrap(), 6);

        roll.remove_group("14").await.unwrap();
        assert_eq!(roll.expected_voters().await.unwrap(), 3);
        assert!(matches!(
            roll.remove_group("14").await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn oversized_groups_rejected() {
        let roll = DelegateRoll::new(Storage::memory(), &Config::example());
        assert!(matches!(
            roll.register_group("107", Some(u32::MAX)).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            roll.register_group("107", Some(MAX_DELEGATES_PER_GROUP + 1)).await,
            Err(Error::BadRequest(_))
        ));
        assert!(roll.groups().await.unwrap().is_empty());

        let group = roll
            .register_group("107", Some(MAX_DELEGATES_PER_GROUP))
            .await
            .unwrap();
        assert_eq!(group.delegates().len(), MAX_DELEGATES_PER_GROUP as usize);
    }

    #[rocket::async_test]
    async fn login_and_check_in() {
        let roll = DelegateRoll::new(Storage::memory(), &Config::example());
        roll.register_group("107", None).await.unwrap();

        let delegate = roll.login("107-2").await.unwrap();
        assert_eq!(delegate.name, "Delegado 2 - GE 107/PE");
        assert!(!delegate.checked_in);
        assert!(matches!(
            roll.login("107-3").await,
            Err(Error::Unauthorized(_))
        ));

        assert!(roll.check_in("107-2", true).await.unwrap().checked_in);
        assert!(!roll.check_in("107-2", false).await.unwrap().checked_in);
        assert!(matches!(
            roll.check_in("999-1", true).await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn eligibility() {
        let store = Storage::memory();
        let open = DelegateRoll::new(store.clone(), &Config::example());
        let gated = DelegateRoll::new(store, &Config::with_check_in());
        open.register_group("107", None).await.unwrap();

        assert!(open.is_eligible("107-1").await.unwrap());
        assert!(!open.is_eligible("107-9").await.unwrap());

        assert!(!gated.is_eligible("107-1").await.unwrap());
        gated.check_in("107-1", true).await.unwrap();
        assert!(gated.is_eligible("107-1").await.unwrap());
        assert!(!gated.is_eligible("107-2").await.unwrap());
    }
}
