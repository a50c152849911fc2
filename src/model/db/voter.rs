use serde::{Deserialize, Serialize};

use crate::model::common::election::VoterId;

/// A registered voter, as stored in the database.
///
/// Registration and credentials are handled elsewhere; this crate only needs
/// the identity, e.g. to count the electorate for turnout.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Voter {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: VoterId,
}
