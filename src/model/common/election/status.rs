use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// States in the Election lifecycle.
///
/// The ordering follows the lifecycle, so a later state compares greater.
/// Transitions only ever move forwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElectionStatus {
    /// Voting has not started yet.
    Upcoming,
    /// Voting is open.
    Active,
    /// Voting has finished and results may be computed.
    Closed,
}

impl ElectionStatus {
    /// The status an election with the given voting window has at `now`.
    /// Both ends of the window are inclusive.
    pub fn scheduled(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        if now < start_time {
            Self::Upcoming
        } else if now <= end_time {
            Self::Active
        } else {
            Self::Closed
        }
    }

    /// Every status strictly earlier in the lifecycle than this one.
    pub fn predecessors(self) -> &'static [ElectionStatus] {
        match self {
            Self::Upcoming => &[],
            Self::Active => &[Self::Upcoming],
            Self::Closed => &[Self::Upcoming, Self::Active],
        }
    }
}

impl From<ElectionStatus> for Bson {
    fn from(status: ElectionStatus) -> Self {
        let name = match status {
            ElectionStatus::Upcoming => "UPCOMING",
            ElectionStatus::Active => "ACTIVE",
            ElectionStatus::Closed => "CLOSED",
        };
        Bson::String(name.to_string())
    }
}
