pub mod ballot;
pub mod delegate;
pub mod topic;

pub use ballot::Ballot;
pub use delegate::{Delegate, Group};
pub use topic::{NewTopic, Topic, TopicCore};
