#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{figment::Figment, Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::store::Storage;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod voting;

pub use config::Config;

/// Build the server from the default figment. The store is picked by
/// [`StoreFairing`] during ignition.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

/// Build the server from the given figment, over an existing store.
pub fn build_with_storage(figment: Figment, storage: Storage) -> Rocket<Build> {
    assemble(rocket::custom(figment)).manage(storage)
}

fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing)
}
