use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::election::{ElectionId, ElectionStatus};

/// An election, as stored in the database.
///
/// Elections are written by the admin layer; this crate only ever advances
/// the persisted `status`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Election {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: ElectionId,
    /// Election name.
    pub name: String,
    /// Persisted lifecycle status. This may lag behind the clock until refreshed.
    pub status: ElectionStatus,
    /// Voting opens at this time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Voting closes after this time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Results are advertised as published from this time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub result_time: DateTime<Utc>,
}

impl Election {
    /// The status this election's schedule dictates at `now`, ignoring the persisted status.
    pub fn scheduled_status(&self, now: DateTime<Utc>) -> ElectionStatus {
        ElectionStatus::scheduled(self.start_time, self.end_time, now)
    }
}
