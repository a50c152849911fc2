pub mod api;
pub mod auth;
pub mod common;
pub mod db;
#[cfg(test)]
pub mod memory;
pub mod mongodb;
pub mod store;
