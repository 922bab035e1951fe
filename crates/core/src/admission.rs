//! Admission controller: the queue state machine.
//!
//! The controller is the single writer over the membership store and audit
//! log. Each operation validates its preconditions fully, then mutates
//! inside one store transaction, so a partially applied transition
//! (membership updated but log not closed, say) is unreachable by
//! construction rather than by compensating logic.
//!
//! Per-patient states are derived, never stored: no open membership means
//! not admitted; an open membership without a queue means admitted but not
//! waiting; an open membership with a queue means waiting in that queue; a
//! closed membership means discharged.

use crate::catalog::QueueCatalog;
use crate::config::CoreConfig;
use crate::directory::{PatientDirectory, ProfessionalDirectory};
use crate::error::{QueueError, QueueResult};
use crate::membership::QueueMembership;
use crate::ordering::{rank_queue, QueuePage};
use crate::store::MemoryStore;
use crate::triage::PriorityType;
use chrono::Utc;
use std::sync::Arc;
use ward_types::{PatientId, ProfessionalId, QueueId};

/// Orchestrates the queue state transitions and enforces the cross-entity
/// invariants transactionally.
#[derive(Clone)]
pub struct AdmissionController {
    cfg: Arc<CoreConfig>,
    store: Arc<MemoryStore>,
    catalog: Arc<dyn QueueCatalog>,
    patients: Arc<dyn PatientDirectory>,
    professionals: Arc<dyn ProfessionalDirectory>,
}

impl AdmissionController {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<MemoryStore>,
        catalog: Arc<dyn QueueCatalog>,
        patients: Arc<dyn PatientDirectory>,
        professionals: Arc<dyn ProfessionalDirectory>,
    ) -> Self {
        Self {
            cfg,
            store,
            catalog,
            patients,
            professionals,
        }
    }

    /// Place a patient into a queue.
    ///
    /// Creates the membership on first contact; re-enters an admitted
    /// patient who is not currently queued. The priority type is adopted
    /// at first enqueue and retained afterwards.
    ///
    /// # Errors
    ///
    /// - `QueueNotFound` if the queue does not exist.
    /// - `PatientNotFound` if the patient directory does not know the id.
    /// - `PatientAlreadyInQueue` if the patient is already waiting
    ///   somewhere; the existing state is left untouched.
    pub fn enqueue(
        &self,
        patient_id: PatientId,
        queue_id: QueueId,
        priority_type: Option<PriorityType>,
    ) -> QueueResult<QueueMembership> {
        let queue = self
            .catalog
            .get(queue_id)
            .ok_or(QueueError::QueueNotFound(queue_id))?;
        if !self.patients.exists(patient_id) {
            return Err(QueueError::PatientNotFound(patient_id));
        }

        let now = Utc::now();
        let membership = self.store.transaction(|tx| {
            match tx.open_membership(patient_id)? {
                None => {
                    let membership =
                        tx.create_membership(patient_id, queue_id, priority_type, now);
                    tx.open_entry(queue_id, membership.id, now);
                    Ok(membership)
                }
                Some(mut membership) if membership.queue_id.is_none() => {
                    membership.queue_id = Some(queue_id);
                    membership.last_queue_entry = now;
                    if membership.priority_type.is_none() {
                        membership.priority_type = priority_type;
                    }
                    tx.save_membership(&membership)?;
                    tx.open_entry(queue_id, membership.id, now);
                    Ok(membership)
                }
                Some(_) => Err(QueueError::PatientAlreadyInQueue(patient_id)),
            }
        })?;

        tracing::info!(
            patient = %patient_id,
            queue = %queue.name,
            priority = membership.priority(),
            "patient enqueued"
        );
        Ok(membership)
    }

    /// Whether the patient is currently waiting in the given queue.
    ///
    /// # Errors
    ///
    /// Returns `PatientNotFound` if the patient directory does not know
    /// the id.
    pub fn is_in_queue(&self, patient_id: PatientId, queue_id: QueueId) -> QueueResult<bool> {
        if !self.patients.exists(patient_id) {
            return Err(QueueError::PatientNotFound(patient_id));
        }

        self.store.transaction(|tx| {
            Ok(tx
                .open_membership(patient_id)?
                .is_some_and(|m| m.queue_id == Some(queue_id)))
        })
    }

    /// Ranked, paginated view of a queue.
    ///
    /// `page` is 1-based; `per_page` falls back to the configured default
    /// and is clamped to the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns `QueueNotFound` if the queue does not exist.
    pub fn list_queue(
        &self,
        queue_id: QueueId,
        page: usize,
        per_page: Option<usize>,
    ) -> QueueResult<QueuePage> {
        if self.catalog.get(queue_id).is_none() {
            return Err(QueueError::QueueNotFound(queue_id));
        }

        let per_page = self.cfg.effective_per_page(per_page);
        let memberships = self
            .store
            .read(|state| state.open_memberships_in_queue(queue_id));
        Ok(rank_queue(&memberships, self.catalog.as_ref(), page, per_page))
    }

    /// Take a patient out of their current queue, leaving them admitted
    /// but unqueued. The open audit entry is closed, attributing the
    /// handling professional when given.
    ///
    /// # Errors
    ///
    /// - `PatientNotEnteredHospital` if there is no open membership.
    /// - `PatientNotInQueue` if the membership is not assigned to a queue.
    /// - `ProfessionalNotFound` if an attributed professional is unknown.
    pub fn remove(
        &self,
        patient_id: PatientId,
        professional_id: Option<ProfessionalId>,
    ) -> QueueResult<QueueMembership> {
        self.check_professional(professional_id)?;

        let now = Utc::now();
        let membership = self.store.transaction(|tx| {
            let mut membership = tx
                .open_membership(patient_id)?
                .ok_or(QueueError::PatientNotEnteredHospital(patient_id))?;
            if membership.queue_id.is_none() {
                return Err(QueueError::PatientNotInQueue(patient_id));
            }

            tx.close_open_entry(membership.id, professional_id, now)?;
            membership.queue_id = None;
            tx.save_membership(&membership)?;
            Ok(membership)
        })?;

        tracing::info!(patient = %patient_id, "patient removed from queue");
        Ok(membership)
    }

    /// Move a patient from their current queue to another in one step:
    /// the current audit entry is closed and a new one opened atomically.
    /// The FIFO position restarts in the destination queue; the priority
    /// type is retained.
    ///
    /// # Errors
    ///
    /// - `QueueNotFound` if the destination queue does not exist.
    /// - `PatientNotEnteredHospital` if there is no open membership.
    /// - `PatientNotInQueue` if the membership is not assigned to a queue.
    /// - `PatientAlreadyInDestinationQueue` if the destination equals the
    ///   current queue (a no-op would silently reset the FIFO position).
    /// - `ProfessionalNotFound` if an attributed professional is unknown.
    pub fn transfer(
        &self,
        patient_id: PatientId,
        new_queue_id: QueueId,
        professional_id: Option<ProfessionalId>,
    ) -> QueueResult<QueueMembership> {
        let destination = self
            .catalog
            .get(new_queue_id)
            .ok_or(QueueError::QueueNotFound(new_queue_id))?;
        self.check_professional(professional_id)?;

        let now = Utc::now();
        let membership = self.store.transaction(|tx| {
            let mut membership = tx
                .open_membership(patient_id)?
                .ok_or(QueueError::PatientNotEnteredHospital(patient_id))?;
            let current = membership
                .queue_id
                .ok_or(QueueError::PatientNotInQueue(patient_id))?;
            if current == new_queue_id {
                return Err(QueueError::PatientAlreadyInDestinationQueue(patient_id));
            }

            tx.close_open_entry(membership.id, professional_id, now)?;
            membership.queue_id = Some(new_queue_id);
            membership.last_queue_entry = now;
            tx.save_membership(&membership)?;
            tx.open_entry(new_queue_id, membership.id, now);
            Ok(membership)
        })?;

        tracing::info!(
            patient = %patient_id,
            destination = %destination.name,
            "patient transferred"
        );
        Ok(membership)
    }

    /// Hospital discharge: close the patient's membership.
    ///
    /// A queued patient must be removed first so the audit trail records
    /// who took them out of the queue.
    ///
    /// # Errors
    ///
    /// - `PatientNotEnteredHospital` if there is no open membership.
    /// - `PatientInQueue` if the membership is still assigned to a queue.
    pub fn close(&self, patient_id: PatientId) -> QueueResult<QueueMembership> {
        let now = Utc::now();
        let membership = self.store.transaction(|tx| {
            let mut membership = tx
                .open_membership(patient_id)?
                .ok_or(QueueError::PatientNotEnteredHospital(patient_id))?;
            if membership.queue_id.is_some() {
                return Err(QueueError::PatientInQueue(patient_id));
            }

            membership.hospital_exit = Some(now);
            tx.save_membership(&membership)?;
            Ok(membership)
        })?;

        tracing::info!(patient = %patient_id, "patient discharged");
        Ok(membership)
    }

    /// The patient's open membership, if any. Read-only convenience for
    /// outer surfaces showing a patient's derived status.
    pub fn current_membership(
        &self,
        patient_id: PatientId,
    ) -> QueueResult<Option<QueueMembership>> {
        self.store.transaction(|tx| tx.open_membership(patient_id))
    }

    fn check_professional(&self, professional_id: Option<ProfessionalId>) -> QueueResult<()> {
        if let Some(id) = professional_id {
            if !self.professionals.exists(id) {
                return Err(QueueError::ProfessionalNotFound(id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryQueueCatalog;
    use crate::directory::{MemoryPatientDirectory, MemoryProfessionalDirectory};
    use crate::triage::RiskClassification;

    fn setup() -> (AdmissionController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let controller = AdmissionController::new(
            Arc::new(CoreConfig::default()),
            store.clone(),
            Arc::new(MemoryQueueCatalog::standard()),
            Arc::new(MemoryPatientDirectory::new(
                (1..=9).map(PatientId),
            )),
            Arc::new(MemoryProfessionalDirectory::new([ProfessionalId(100)])),
        );
        (controller, store)
    }

    /// I1 and I2 from the data model: at most one open membership per
    /// patient, and an open log entry exactly when a queue is occupied.
    fn assert_invariants(store: &MemoryStore) {
        store.read(|state| {
            for m in state.memberships() {
                assert!(
                    state.open_membership_count(m.patient_id) <= 1,
                    "patient {} has multiple open memberships",
                    m.patient_id
                );
                let expected_open_logs = usize::from(m.is_open() && m.queue_id.is_some());
                assert_eq!(
                    state.open_log_count(m.id),
                    expected_open_logs,
                    "membership {} breaks the open-log invariant",
                    m.id
                );
            }
        });
    }

    #[test]
    fn test_enqueue_creates_membership_and_log() {
        let (controller, store) = setup();

        let membership = controller
            .enqueue(PatientId(5), QueueId(1), Some(PriorityType::Elderly))
            .unwrap();
        assert!(membership.priority());
        assert_eq!(membership.queue_id, Some(QueueId(1)));

        let catalog = MemoryQueueCatalog::standard();
        assert_eq!(membership.status(&catalog), "Awaiting Reception");

        assert!(controller.is_in_queue(PatientId(5), QueueId(1)).unwrap());
        assert!(!controller.is_in_queue(PatientId(5), QueueId(2)).unwrap());
        assert_invariants(&store);
    }

    #[test]
    fn test_enqueue_rejects_unknown_queue_and_patient() {
        let (controller, store) = setup();

        let err = controller.enqueue(PatientId(5), QueueId(99), None).unwrap_err();
        assert!(matches!(err, QueueError::QueueNotFound(_)));

        let err = controller.enqueue(PatientId(77), QueueId(1), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotFound(_)));

        store.read(|state| assert!(state.memberships().is_empty()));
    }

    #[test]
    fn test_enqueue_twice_fails_and_leaves_state_unchanged() {
        let (controller, store) = setup();

        controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        let before = store.snapshot();

        let err = controller.enqueue(PatientId(5), QueueId(1), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientAlreadyInQueue(_)));
        // Also rejected into a different queue.
        let err = controller.enqueue(PatientId(5), QueueId(2), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientAlreadyInQueue(_)));

        let after = store.snapshot();
        assert_eq!(before.memberships(), after.memberships());
        assert_eq!(before.logs(), after.logs());
        assert_invariants(&store);
    }

    #[test]
    fn test_remove_closes_log_and_clears_queue() {
        let (controller, store) = setup();

        let membership = controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        let removed = controller
            .remove(PatientId(5), Some(ProfessionalId(100)))
            .unwrap();
        assert_eq!(removed.queue_id, None);

        let catalog = MemoryQueueCatalog::standard();
        assert_eq!(removed.status(&catalog), "Waiting");

        store.read(|state| {
            let log = &state.logs()[0];
            assert_eq!(log.membership_id, membership.id);
            assert!(log.queue_exit.is_some());
            assert_eq!(log.professional_id, Some(ProfessionalId(100)));
        });
        assert_invariants(&store);
    }

    #[test]
    fn test_remove_requires_admission_and_queue() {
        let (controller, _store) = setup();

        let err = controller.remove(PatientId(5), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotEnteredHospital(_)));

        controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        controller.remove(PatientId(5), None).unwrap();

        let err = controller.remove(PatientId(5), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotInQueue(_)));
    }

    #[test]
    fn test_remove_rejects_unknown_professional() {
        let (controller, store) = setup();
        controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        let before = store.snapshot();

        let err = controller
            .remove(PatientId(5), Some(ProfessionalId(999)))
            .unwrap_err();
        assert!(matches!(err, QueueError::ProfessionalNotFound(_)));

        let after = store.snapshot();
        assert_eq!(before.logs(), after.logs());
        assert_invariants(&store);
    }

    #[test]
    fn test_transfer_closes_and_opens_atomically() {
        let (controller, store) = setup();

        let membership = controller
            .enqueue(PatientId(5), QueueId(1), Some(PriorityType::Elderly))
            .unwrap();
        let transferred = controller
            .transfer(PatientId(5), QueueId(2), Some(ProfessionalId(100)))
            .unwrap();

        assert_eq!(transferred.queue_id, Some(QueueId(2)));
        // Priority type is retained across transfers.
        assert_eq!(transferred.priority_type, Some(PriorityType::Elderly));
        assert!(transferred.last_queue_entry >= membership.last_queue_entry);

        store.read(|state| {
            let closed: Vec<_> = state.logs().iter().filter(|l| !l.is_open()).collect();
            let open: Vec<_> = state.logs().iter().filter(|l| l.is_open()).collect();
            assert_eq!(closed.len(), 1);
            assert_eq!(closed[0].queue_id, QueueId(1));
            assert_eq!(closed[0].professional_id, Some(ProfessionalId(100)));
            assert_eq!(open.len(), 1);
            assert_eq!(open[0].queue_id, QueueId(2));
        });
        assert_invariants(&store);
    }

    #[test]
    fn test_transfer_into_same_queue_is_an_error() {
        let (controller, store) = setup();

        controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        let before = store.snapshot();

        let err = controller.transfer(PatientId(5), QueueId(1), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientAlreadyInDestinationQueue(_)));

        let after = store.snapshot();
        assert_eq!(before.memberships(), after.memberships());
        assert_eq!(before.logs(), after.logs());
    }

    #[test]
    fn test_transfer_preconditions() {
        let (controller, _store) = setup();

        let err = controller.transfer(PatientId(5), QueueId(2), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotEnteredHospital(_)));

        controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        let err = controller.transfer(PatientId(5), QueueId(99), None).unwrap_err();
        assert!(matches!(err, QueueError::QueueNotFound(_)));

        controller.remove(PatientId(5), None).unwrap();
        let err = controller.transfer(PatientId(5), QueueId(2), None).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotInQueue(_)));
    }

    #[test]
    fn test_close_requires_remove_first() {
        let (controller, store) = setup();

        controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        let err = controller.close(PatientId(5)).unwrap_err();
        assert!(matches!(err, QueueError::PatientInQueue(_)));

        controller.remove(PatientId(5), None).unwrap();
        let closed = controller.close(PatientId(5)).unwrap();
        assert!(closed.hospital_exit.is_some());

        let catalog = MemoryQueueCatalog::standard();
        assert_eq!(closed.status(&catalog), "Discharged");

        // Discharged patients are no longer admitted.
        let err = controller.close(PatientId(5)).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotEnteredHospital(_)));
        assert_invariants(&store);
    }

    #[test]
    fn test_new_admission_after_discharge_creates_new_membership() {
        let (controller, store) = setup();

        let first = controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        controller.remove(PatientId(5), None).unwrap();
        controller.close(PatientId(5)).unwrap();

        let second = controller.enqueue(PatientId(5), QueueId(1), None).unwrap();
        assert_ne!(first.id, second.id);

        store.read(|state| {
            assert_eq!(state.memberships().len(), 2);
            assert_eq!(state.open_membership_count(PatientId(5)), 1);
        });
        assert_invariants(&store);
    }

    #[test]
    fn test_reenqueue_keeps_original_priority_type() {
        let (controller, store) = setup();

        controller
            .enqueue(PatientId(5), QueueId(1), Some(PriorityType::Elderly))
            .unwrap();
        controller.remove(PatientId(5), None).unwrap();

        let reentered = controller
            .enqueue(PatientId(5), QueueId(2), Some(PriorityType::Infant))
            .unwrap();
        assert_eq!(reentered.priority_type, Some(PriorityType::Elderly));
        assert_invariants(&store);
    }

    #[test]
    fn test_list_queue_ranks_priority_above_same_severity() {
        let (controller, store) = setup();

        // Patient 1 first in, no priority; patient 5 later, elderly.
        controller.enqueue(PatientId(1), QueueId(1), None).unwrap();
        controller
            .enqueue(PatientId(5), QueueId(1), Some(PriorityType::Elderly))
            .unwrap();
        store
            .record_risk_classification(PatientId(1), RiskClassification::Urgent)
            .unwrap();
        store
            .record_risk_classification(PatientId(5), RiskClassification::Urgent)
            .unwrap();

        let page = controller.list_queue(QueueId(1), 1, None).unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_priority_count, 1);
        assert_eq!(page.entries[0].patient_id, PatientId(5));
        assert_eq!(page.entries[0].status, "Awaiting Reception");
    }

    #[test]
    fn test_list_queue_excludes_other_queues_and_discharged() {
        let (controller, _store) = setup();

        controller.enqueue(PatientId(1), QueueId(1), None).unwrap();
        controller.enqueue(PatientId(2), QueueId(2), None).unwrap();
        controller.enqueue(PatientId(3), QueueId(1), None).unwrap();
        controller.remove(PatientId(3), None).unwrap();
        controller.close(PatientId(3)).unwrap();

        let page = controller.list_queue(QueueId(1), 1, None).unwrap();
        let ids: Vec<PatientId> = page.entries.iter().map(|e| e.patient_id).collect();
        assert_eq!(ids, vec![PatientId(1)]);

        let err = controller.list_queue(QueueId(99), 1, None).unwrap_err();
        assert!(matches!(err, QueueError::QueueNotFound(_)));
    }

    #[test]
    fn test_is_in_queue_requires_known_patient() {
        let (controller, _store) = setup();
        let err = controller.is_in_queue(PatientId(77), QueueId(1)).unwrap_err();
        assert!(matches!(err, QueueError::PatientNotFound(_)));
    }

    #[test]
    fn test_full_stay_scenario_holds_invariants_throughout() {
        let (controller, store) = setup();

        controller
            .enqueue(PatientId(5), QueueId(1), Some(PriorityType::Elderly))
            .unwrap();
        assert_invariants(&store);

        store
            .record_risk_classification(PatientId(5), RiskClassification::VeryUrgent)
            .unwrap();
        controller.transfer(PatientId(5), QueueId(2), None).unwrap();
        assert_invariants(&store);

        controller
            .remove(PatientId(5), Some(ProfessionalId(100)))
            .unwrap();
        assert_invariants(&store);

        controller.close(PatientId(5)).unwrap();
        assert_invariants(&store);

        // Two stints in queues, both closed.
        store.read(|state| {
            assert_eq!(state.logs().len(), 2);
            assert!(state.logs().iter().all(|l| !l.is_open()));
        });
    }
}
