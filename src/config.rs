use chrono::Duration;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{api::admin::verify_password, common::EventId};
use crate::store::{MongoStore, Storage};

/// Name of the MongoDB database, when one is configured.
const DATABASE: &str = "assembleia";

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    event_id: EventId,
    #[serde(default)]
    require_check_in: bool,
    #[serde(default = "default_delegates_per_group")]
    delegates_per_group: u32,
    auth_ttl: u32,
    // secrets
    jwt_secret: String,
    admin_password_hash: String,
}

fn default_delegates_per_group() -> u32 {
    2
}

impl Config {
    /// The event topics belong to when a request does not name one.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Whether delegates must be checked in before they may vote.
    pub fn require_check_in(&self) -> bool {
        self.require_check_in
    }

    /// Number of delegates a group gets when registered without a quantity.
    pub fn delegates_per_group(&self) -> u32 {
        self.delegates_per_group
    }

    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Check a password against the configured admin password hash.
    pub fn verify_admin_password(&self, password: &str) -> Result<bool> {
        verify_password(&self.admin_password_hash, password)
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the store fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!(
            "Serving event '{}' (check-in {})",
            config.event_id,
            if config.require_check_in {
                "required"
            } else {
                "not required"
            }
        );

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the store.
#[derive(Deserialize)]
struct StoreConfig {
    // secrets
    #[serde(default)]
    db_uri: Option<String>,
}

/// A fairing that picks the store: MongoDB if `db_uri` is configured,
/// otherwise a fresh in-memory store. The chosen store is placed into
/// managed state as a [`Storage`].
///
/// Does nothing if a [`Storage`] is already managed.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        if rocket.state::<Storage>().is_some() {
            return Ok(rocket);
        }

        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let storage = match config.db_uri {
            Some(db_uri) => {
                info!("Loaded database config, connecting...");
                match MongoStore::connect(&db_uri, DATABASE).await {
                    Ok(store) => {
                        info!("...database connection online!");
                        Storage::new(store)
                    }
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
            None => {
                warn!("No `db_uri` configured, votes will only be kept in memory");
                Storage::memory()
            }
        };

        // Manage the state.
        rocket = rocket.manage(storage);
        Ok(rocket)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self {
                event_id: "assembleia".to_string(),
                require_check_in: false,
                delegates_per_group: 2,
                auth_ttl: 3600,
                jwt_secret: "test-secret".to_string(),
                admin_password_hash: String::new(),
            }
        }

        pub fn with_check_in() -> Self {
            Self {
                require_check_in: true,
                ..Self::example()
            }
        }
    }
}
