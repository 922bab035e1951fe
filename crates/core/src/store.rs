//! Membership store and audit log with copy-on-commit transactions.
//!
//! The store is the only shared mutable state in the engine. All mutation
//! goes through [`MemoryStore::transaction`], which runs the closure
//! against a copy of the state and installs the copy only when the closure
//! returns `Ok`. A failing operation therefore leaves nothing behind — the
//! validate-then-commit discipline of the admission controller is backed by
//! all-or-nothing application here.
//!
//! The single state mutex also serializes the check-then-act sequences of
//! concurrent operations on the same patient, standing in for the
//! row-level locking a transactional relational store would provide.
//!
//! ## Invariants guarded here
//!
//! - At most one membership row per patient has no `hospital_exit`
//!   (checked by [`StoreTx::open_membership`]).
//! - A membership occupying a queue has exactly one open log row
//!   (checked by [`StoreTx::close_open_entry`] via an explicit lookup on
//!   `(membership_id, queue_exit IS NULL)` — never by traversing a loaded
//!   collection).

use crate::audit::QueueLog;
use crate::error::{QueueError, QueueResult};
use crate::membership::QueueMembership;
use crate::triage::{PriorityType, RiskClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use ward_types::{LogId, MembershipId, PatientId, ProfessionalId, QueueId};

/// The persisted rows plus id counters. Serializable so the CLI can carry
/// it in a state file between invocations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreState {
    memberships: Vec<QueueMembership>,
    logs: Vec<QueueLog>,
    next_membership_id: i64,
    next_log_id: i64,
}

impl StoreState {
    /// All open memberships currently assigned to the given queue.
    pub fn open_memberships_in_queue(&self, queue_id: QueueId) -> Vec<QueueMembership> {
        self.memberships
            .iter()
            .filter(|m| m.is_open() && m.queue_id == Some(queue_id))
            .cloned()
            .collect()
    }

    /// Count of open log rows for a membership, via the explicit
    /// `(membership_id, queue_exit IS NULL)` lookup.
    pub fn open_log_count(&self, membership_id: MembershipId) -> usize {
        self.logs
            .iter()
            .filter(|l| l.membership_id == membership_id && l.is_open())
            .count()
    }

    /// Count of open memberships for a patient.
    pub fn open_membership_count(&self, patient_id: PatientId) -> usize {
        self.memberships
            .iter()
            .filter(|m| m.is_open() && m.patient_id == patient_id)
            .count()
    }

    pub fn memberships(&self) -> &[QueueMembership] {
        &self.memberships
    }

    pub fn logs(&self) -> &[QueueLog] {
        &self.logs
    }
}

/// A mutable view over one in-flight transaction.
///
/// Carries the membership-store contract (`open_membership`, `create`,
/// `save`) and the audit-log contract (`open_entry`, `close_open_entry`).
/// Nothing written through this view is observable until the enclosing
/// [`MemoryStore::transaction`] commits.
pub struct StoreTx<'a> {
    state: &'a mut StoreState,
}

impl StoreTx<'_> {
    /// The patient's open membership, if any.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if more than one open membership row
    /// exists for the patient.
    pub fn open_membership(&self, patient_id: PatientId) -> QueueResult<Option<QueueMembership>> {
        let mut open = self
            .state
            .memberships
            .iter()
            .filter(|m| m.is_open() && m.patient_id == patient_id);

        let first = open.next().cloned();
        if open.next().is_some() {
            return Err(QueueError::InvariantViolation(format!(
                "patient {patient_id} has multiple open memberships"
            )));
        }
        Ok(first)
    }

    /// Create a new membership row assigned to a queue.
    pub fn create_membership(
        &mut self,
        patient_id: PatientId,
        queue_id: QueueId,
        priority_type: Option<PriorityType>,
        now: DateTime<Utc>,
    ) -> QueueMembership {
        self.state.next_membership_id += 1;
        let membership = QueueMembership {
            id: MembershipId(self.state.next_membership_id),
            patient_id,
            queue_id: Some(queue_id),
            priority_type,
            last_queue_entry: now,
            hospital_exit: None,
            risk_classification: None,
        };
        self.state.memberships.push(membership.clone());
        membership
    }

    /// Persist changes to an existing membership row.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the row id is unknown: memberships
    /// are only ever created through this store.
    pub fn save_membership(&mut self, membership: &QueueMembership) -> QueueResult<()> {
        match self
            .state
            .memberships
            .iter_mut()
            .find(|m| m.id == membership.id)
        {
            Some(row) => {
                *row = membership.clone();
                Ok(())
            }
            None => Err(QueueError::InvariantViolation(format!(
                "membership {} does not exist",
                membership.id
            ))),
        }
    }

    /// Append an open audit log entry for a membership entering a queue.
    pub fn open_entry(
        &mut self,
        queue_id: QueueId,
        membership_id: MembershipId,
        now: DateTime<Utc>,
    ) -> QueueLog {
        self.state.next_log_id += 1;
        let entry = QueueLog {
            id: LogId(self.state.next_log_id),
            queue_id,
            membership_id,
            queue_entry: now,
            queue_exit: None,
            professional_id: None,
        };
        self.state.logs.push(entry.clone());
        entry
    }

    /// Close the unique open log entry for a membership, optionally
    /// attributing the handling professional.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if zero or more than one open row is
    /// found. With the admission controller as the sole writer this cannot
    /// happen; if it does, a non-transactional write path has corrupted
    /// the ledger and the operation must abort.
    pub fn close_open_entry(
        &mut self,
        membership_id: MembershipId,
        professional_id: Option<ProfessionalId>,
        now: DateTime<Utc>,
    ) -> QueueResult<QueueLog> {
        let open_count = self.state.open_log_count(membership_id);
        if open_count != 1 {
            return Err(QueueError::InvariantViolation(format!(
                "membership {membership_id} has {open_count} open log entries, expected exactly 1"
            )));
        }

        let entry = self
            .state
            .logs
            .iter_mut()
            .find(|l| l.membership_id == membership_id && l.is_open());
        match entry {
            Some(entry) => {
                entry.queue_exit = Some(now);
                entry.professional_id = professional_id;
                Ok(entry.clone())
            }
            // Unreachable given the count check above, but never repair
            // silently.
            None => Err(QueueError::InvariantViolation(format!(
                "open log entry for membership {membership_id} vanished mid-transaction"
            ))),
        }
    }

}

/// Mutex-guarded store over [`StoreState`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a previously captured state snapshot.
    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Run a closure against a copy of the state; commit the copy only on
    /// `Ok`. An `Err` (or a panic inside the closure) leaves the store
    /// exactly as it was.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut StoreTx) -> QueueResult<R>) -> QueueResult<R> {
        let mut guard = self.lock();
        let mut working = guard.clone();
        let result = f(&mut StoreTx {
            state: &mut working,
        })?;
        *guard = working;
        Ok(result)
    }

    /// Run a read-only closure against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.lock())
    }

    /// Capture a snapshot of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    /// Record the externally computed triage result on the patient's open
    /// membership. This is the write-through seam for the triage
    /// classifier; the column is read-only to everything else in this
    /// engine.
    ///
    /// # Errors
    ///
    /// Returns `PatientNotEnteredHospital` if the patient has no open
    /// membership.
    pub fn record_risk_classification(
        &self,
        patient_id: PatientId,
        classification: RiskClassification,
    ) -> QueueResult<()> {
        self.transaction(|tx| {
            let mut membership = tx
                .open_membership(patient_id)?
                .ok_or(QueueError::PatientNotEnteredHospital(patient_id))?;
            membership.risk_classification = Some(classification);
            tx.save_membership(&membership)
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A poisoning panic can only have happened inside a transaction
        // closure, which works on a discarded copy; the committed state is
        // still consistent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
