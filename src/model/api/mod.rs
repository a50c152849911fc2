//! API-friendly types.
//!
//! These are serialised as plain JSON for clients, e.g. datetimes as RFC 3339
//! strings rather than MongoDB's own format.

mod election;
pub use election::{CandidateDescription, ElectionDescription, VoteStatus};

mod receipt;
pub use receipt::{VoteReceipt, VoteRequest};

mod results;
pub use results::{
    CandidateResult, ClosedElection, ElectionResult, ElectionSummary, NoWinnerReason, Outcome,
};
