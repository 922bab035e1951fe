//! Queue audit log rows.
//!
//! Append-oriented ledger of time spent in each queue. A row is created
//! exactly when a membership's `queue_id` transitions to a concrete queue
//! and closed exactly when that membership leaves it (removal, transfer or
//! hospital discharge). Rows are never deleted, and closed rows are never
//! mutated by this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ward_types::{LogId, MembershipId, ProfessionalId, QueueId};

/// A closed or open record of time spent in one queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLog {
    pub id: LogId,
    pub queue_id: QueueId,
    pub membership_id: MembershipId,
    pub queue_entry: DateTime<Utc>,
    /// `None` while the membership is still in the queue.
    pub queue_exit: Option<DateTime<Utc>>,
    /// The professional who handled the exit, when attributed.
    pub professional_id: Option<ProfessionalId>,
}

impl QueueLog {
    /// Whether this entry is the membership's current queue occupancy.
    pub fn is_open(&self) -> bool {
        self.queue_exit.is_none()
    }
}
