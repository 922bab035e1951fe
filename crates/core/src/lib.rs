//! # Ward Core
//!
//! Patient queue and triage management engine.
//!
//! This crate tracks which named queue each admitted patient currently
//! occupies, orders each queue for display by a composite priority rule,
//! maintains an audit trail of queue entries and exits, and enforces the
//! cross-entity consistency invariants:
//!
//! - a patient is actively queued in at most one place at a time;
//! - every open queue occupancy has exactly one open audit log entry.
//!
//! **No API concerns**: transport surfaces (HTTP, CLI) live outside this
//! crate and map [`QueueError`] codes to their own response shapes.
//! Patient and professional records, and the clinical algorithm that
//! assigns risk classifications, are external collaborators reached
//! through the traits in [`directory`] and the classifier write-through
//! seam on the store.

pub mod admission;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod membership;
pub mod ordering;
pub mod store;
pub mod triage;

pub use admission::AdmissionController;
pub use audit::QueueLog;
pub use catalog::{MemoryQueueCatalog, Queue, QueueCatalog, QueueRole};
pub use config::CoreConfig;
pub use directory::{
    MemoryPatientDirectory, MemoryProfessionalDirectory, PatientDirectory, ProfessionalDirectory,
};
pub use error::{QueueError, QueueResult};
pub use membership::QueueMembership;
pub use ordering::{rank_queue, QueuePage, RankedEntry};
pub use store::{MemoryStore, StoreState};
pub use triage::{PriorityType, RiskClassification};
