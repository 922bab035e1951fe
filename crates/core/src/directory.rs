//! External collaborator directories.
//!
//! The engine does not own patient or professional records; it only needs
//! to know whether a given id exists before acting on it. Real deployments
//! back these traits with the records service; tests and the CLI use the
//! in-memory implementations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ward_types::{PatientId, ProfessionalId};

/// Existence checks against the patient records service.
pub trait PatientDirectory: Send + Sync {
    fn exists(&self, patient_id: PatientId) -> bool;
}

/// Existence checks against the professional records service.
///
/// Consulted only when a professional is attributed to a removal or
/// transfer.
pub trait ProfessionalDirectory: Send + Sync {
    fn exists(&self, professional_id: ProfessionalId) -> bool;
}

/// In-memory patient directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryPatientDirectory {
    patients: BTreeSet<PatientId>,
}

impl MemoryPatientDirectory {
    pub fn new(patients: impl IntoIterator<Item = PatientId>) -> Self {
        Self {
            patients: patients.into_iter().collect(),
        }
    }

    pub fn register(&mut self, patient_id: PatientId) {
        self.patients.insert(patient_id);
    }
}

impl PatientDirectory for MemoryPatientDirectory {
    fn exists(&self, patient_id: PatientId) -> bool {
        self.patients.contains(&patient_id)
    }
}

/// In-memory professional directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryProfessionalDirectory {
    professionals: BTreeSet<ProfessionalId>,
}

impl MemoryProfessionalDirectory {
    pub fn new(professionals: impl IntoIterator<Item = ProfessionalId>) -> Self {
        Self {
            professionals: professionals.into_iter().collect(),
        }
    }

    pub fn register(&mut self, professional_id: ProfessionalId) {
        self.professionals.insert(professional_id);
    }
}

impl ProfessionalDirectory for MemoryProfessionalDirectory {
    fn exists(&self, professional_id: ProfessionalId) -> bool {
        self.professionals.contains(&professional_id)
    }
}
