//! Queue catalog.
//!
//! The catalog is the read-mostly set of named queues a patient can occupy.
//! Queues are immutable once referenced by memberships; no deletion is
//! modelled. Business logic never embeds numeric queue ids directly —
//! queues with a well-known purpose carry a [`QueueRole`] and are looked up
//! through [`QueueCatalog::find_by_role`].

use serde::{Deserialize, Serialize};
use ward_types::{QueueId, QueueName};

/// Well-known queue capability, replacing magic queue ids in callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueRole {
    Reception,
    MedicalAttendance,
    Observation,
    Vaccination,
}

/// A named waiting line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub name: QueueName,
    /// Set for queues with a well-known purpose; ad-hoc queues carry none.
    pub role: Option<QueueRole>,
}

/// Read access to the queue catalog.
pub trait QueueCatalog: Send + Sync {
    /// Look up a queue by id.
    fn get(&self, id: QueueId) -> Option<Queue>;

    /// Look up a queue by its well-known role.
    fn find_by_role(&self, role: QueueRole) -> Option<Queue>;
}

/// In-memory, seedable catalog implementation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryQueueCatalog {
    queues: Vec<Queue>,
}

impl MemoryQueueCatalog {
    pub fn new(queues: Vec<Queue>) -> Self {
        Self { queues }
    }

    /// The standard intake seed set: reception, medical attendance,
    /// observation and vaccination queues with ids 1 to 4.
    pub fn standard() -> Self {
        fn queue(id: i64, name: &str, role: QueueRole) -> Queue {
            Queue {
                id: QueueId(id),
                // Seed names are static and non-empty.
                name: QueueName::new(name).expect("seed queue name"),
                role: Some(role),
            }
        }

        Self {
            queues: vec![
                queue(1, "Reception", QueueRole::Reception),
                queue(2, "Medical Attendance", QueueRole::MedicalAttendance),
                queue(3, "Observation", QueueRole::Observation),
                queue(4, "Vaccination", QueueRole::Vaccination),
            ],
        }
    }

    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }
}

impl QueueCatalog for MemoryQueueCatalog {
    fn get(&self, id: QueueId) -> Option<Queue> {
        self.queues.iter().find(|q| q.id == id).cloned()
    }

    fn find_by_role(&self, role: QueueRole) -> Option<Queue> {
        self.queues.iter().find(|q| q.role == Some(role)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_resolves_roles() {
        let catalog = MemoryQueueCatalog::standard();
        let vaccination = catalog.find_by_role(QueueRole::Vaccination).unwrap();
        assert_eq!(vaccination.name.as_str(), "Vaccination");
        assert_eq!(catalog.get(vaccination.id).unwrap(), vaccination);
    }

    #[test]
    fn test_unknown_queue_id_is_none() {
        let catalog = MemoryQueueCatalog::standard();
        assert!(catalog.get(QueueId(99)).is_none());
    }
}
