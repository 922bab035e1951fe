//! Queue membership rows.
//!
//! One row per hospital stay: created at first enqueue, reused while the
//! patient moves between queues, and closed when `hospital_exit` is set at
//! discharge. `hospital_exit IS NULL` is the predicate selecting currently
//! admitted memberships; a patient has at most one such row at any time.
//!
//! The display status is derived at read time from `(queue_id,
//! hospital_exit)` plus the queue catalog instead of being stored, so a
//! queue rename can never leave stale labels behind.

use crate::catalog::QueueCatalog;
use crate::triage::{PriorityType, RiskClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ward_types::{MembershipId, PatientId, QueueId};

/// Display status label for a membership that is admitted but not waiting
/// in any queue (for example, currently being seen).
pub const STATUS_WAITING: &str = "Waiting";

/// Display status label for a closed membership.
pub const STATUS_DISCHARGED: &str = "Discharged";

/// The record of a patient's current (or most recent, pre-discharge)
/// admission and queue state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMembership {
    pub id: MembershipId,
    pub patient_id: PatientId,
    /// `None` means the patient is inside the hospital but not currently
    /// waiting in any queue.
    pub queue_id: Option<QueueId>,
    /// Set at first enqueue and retained across transfers.
    pub priority_type: Option<PriorityType>,
    /// Timestamp of the most recent queue assignment; the FIFO tie-break.
    pub last_queue_entry: DateTime<Utc>,
    /// Non-null marks the membership closed (patient discharged).
    pub hospital_exit: Option<DateTime<Utc>>,
    /// Supplied by the external triage classifier; read-only here.
    pub risk_classification: Option<RiskClassification>,
}

impl QueueMembership {
    /// Whether this membership grants queue-order preference.
    pub fn priority(&self) -> bool {
        self.priority_type.is_some()
    }

    /// Whether the patient is still admitted.
    pub fn is_open(&self) -> bool {
        self.hospital_exit.is_none()
    }

    /// Derived display status.
    ///
    /// A queue id that the catalog no longer resolves falls back to the
    /// plain waiting label rather than fabricating a name.
    pub fn status(&self, catalog: &dyn QueueCatalog) -> String {
        if self.hospital_exit.is_some() {
            return STATUS_DISCHARGED.to_string();
        }
        match self.queue_id.and_then(|id| catalog.get(id)) {
            Some(queue) => format!("Awaiting {}", queue.name),
            None => STATUS_WAITING.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryQueueCatalog;

    fn membership(queue_id: Option<QueueId>, exited: bool) -> QueueMembership {
        QueueMembership {
            id: MembershipId(1),
            patient_id: PatientId(5),
            queue_id,
            priority_type: None,
            last_queue_entry: Utc::now(),
            hospital_exit: exited.then(Utc::now),
            risk_classification: None,
        }
    }

    #[test]
    fn test_status_is_derived_from_queue_and_exit() {
        let catalog = MemoryQueueCatalog::standard();

        assert_eq!(
            membership(Some(QueueId(1)), false).status(&catalog),
            "Awaiting Reception"
        );
        assert_eq!(membership(None, false).status(&catalog), STATUS_WAITING);
        assert_eq!(
            membership(Some(QueueId(1)), true).status(&catalog),
            STATUS_DISCHARGED
        );
    }

    #[test]
    fn test_priority_derives_from_priority_type() {
        let mut m = membership(None, false);
        assert!(!m.priority());
        m.priority_type = Some(PriorityType::Elderly);
        assert!(m.priority());
    }
}
