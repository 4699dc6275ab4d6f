//! The voting rules, independent of how requests arrive.
//!
//! [`TopicRegistry`] owns topic lifecycles, [`BallotLedger`] records and
//! counts ballots, and [`DelegateRoll`] decides who may vote. All three are
//! thin handles over the shared [`Storage`](crate::store::Storage) and can be
//! taken directly as request guards.

use crate::error::Result;

mod ledger;
mod registry;
mod roll;

pub use ledger::BallotLedger;
pub use registry::TopicRegistry;
pub use roll::DelegateRoll;

/// Decides whether a credential may cast ballots.
#[rocket::async_trait]
pub trait Eligibility: Send + Sync {
    async fn is_eligible(&self, credential: &str) -> Result<bool>;
}
