//! Error taxonomy for the queue engine.
//!
//! Two classes of error live here:
//!
//! - **Domain errors** — expected, caller-facing failures of the admission
//!   operations. Each carries a stable machine-readable code (see
//!   [`QueueError::code`]) so an outer transport layer can map it to HTTP
//!   statuses or CLI exit codes without string matching.
//! - **Invariant violations** — internal consistency failures ("at most one
//!   open membership", "exactly one open log row"). These are always a bug
//!   or evidence of a non-transactional write path, never user-triggerable,
//!   and must abort the operation rather than be silently repaired.

use ward_types::{PatientId, ProfessionalId, QueueId};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("patient {0} not found")]
    PatientNotFound(PatientId),
    #[error("queue {0} not found")]
    QueueNotFound(QueueId),
    #[error("professional {0} not found")]
    ProfessionalNotFound(ProfessionalId),
    #[error("patient {0} is already waiting in a queue")]
    PatientAlreadyInQueue(PatientId),
    #[error("patient {0} has not entered the hospital")]
    PatientNotEnteredHospital(PatientId),
    #[error("patient {0} is not currently in a queue")]
    PatientNotInQueue(PatientId),
    #[error("patient {0} is already in the destination queue")]
    PatientAlreadyInDestinationQueue(PatientId),
    #[error("patient {0} is still in a queue and must be removed first")]
    PatientInQueue(PatientId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl QueueError {
    /// Stable machine-readable code for transport-layer mapping.
    pub fn code(&self) -> &'static str {
        match self {
            QueueError::PatientNotFound(_) => "PATIENT_NOT_FOUND",
            QueueError::QueueNotFound(_) => "QUEUE_NOT_FOUND",
            QueueError::ProfessionalNotFound(_) => "PROFESSIONAL_NOT_FOUND",
            QueueError::PatientAlreadyInQueue(_) => "PATIENT_ALREADY_IN_QUEUE",
            QueueError::PatientNotEnteredHospital(_) => "PATIENT_NOT_ENTERED_HOSPITAL",
            QueueError::PatientNotInQueue(_) => "PATIENT_NOT_IN_QUEUE",
            QueueError::PatientAlreadyInDestinationQueue(_) => {
                "PATIENT_ALREADY_IN_DESTINATION_QUEUE"
            }
            QueueError::PatientInQueue(_) => "PATIENT_IN_QUEUE",
            QueueError::InvalidInput(_) => "INVALID_INPUT",
            QueueError::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }

    /// True for the internal consistency failures that indicate a bug
    /// rather than a caller mistake.
    pub fn is_internal(&self) -> bool {
        matches!(self, QueueError::InvariantViolation(_))
    }
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            QueueError::PatientAlreadyInQueue(PatientId(1)).code(),
            "PATIENT_ALREADY_IN_QUEUE"
        );
        assert_eq!(
            QueueError::InvariantViolation("boom".into()).code(),
            "INVARIANT_VIOLATION"
        );
    }

    #[test]
    fn test_only_invariant_violations_are_internal() {
        assert!(QueueError::InvariantViolation("boom".into()).is_internal());
        assert!(!QueueError::PatientNotFound(PatientId(9)).is_internal());
        assert!(!QueueError::QueueNotFound(QueueId(2)).is_internal());
    }
}
