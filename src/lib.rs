#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;

pub use config::Config;

/// Assemble the server: logging, config, database and every route.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
}

/// The same server, backed by an in-memory store instead of MongoDB.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: model::memory::MemoryStore, config: Config) -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .manage(config)
        .manage(model::store::Store::new(store))
        .mount("/", api::routes())
}
