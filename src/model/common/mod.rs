pub mod ballot;
pub mod tally;
pub mod topic;

/// Topics belong to an event (an assembly), identified by name.
pub type EventId = String;
/// Candidates are identified by their names.
pub type CandidateId = String;
/// A delegate's credential, e.g. `"107-1"`.
pub type Credential = String;
