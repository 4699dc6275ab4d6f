pub mod admin;
pub mod auth;
pub mod group;
pub mod id;
pub mod topic;
pub mod vote;
