//! Data types, split by where they live.
//!
//! - `common`: domain types shared by the API and the database.
//! - `db`: documents as stored.
//! - `api`: request and response bodies.
//! - `mongodb`: database plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
