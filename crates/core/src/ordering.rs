//! Queue ordering engine.
//!
//! A pure function from the open memberships of one queue to a totally
//! ordered, paginated view. Service order is decided by a composite
//! ascending key:
//!
//! 1. risk-classification rank (most severe first, unclassified last),
//! 2. priority flag (`true` before `false`),
//! 3. `last_queue_entry` ascending (FIFO within an equal band),
//! 4. membership id, a stable final tie-break for the zero-probability
//!    case of identical timestamps, so test output is reproducible.
//!
//! No mutation happens here; the admission controller feeds this engine a
//! snapshot taken inside the store lock.

use crate::catalog::QueueCatalog;
use crate::membership::QueueMembership;
use crate::triage::{PriorityType, RiskClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ward_types::{MembershipId, PatientId};

/// One ranked position in a queue listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub membership_id: MembershipId,
    pub patient_id: PatientId,
    pub priority: bool,
    pub priority_type: Option<PriorityType>,
    pub risk_classification: Option<RiskClassification>,
    pub last_queue_entry: DateTime<Utc>,
    /// Derived display status ("Awaiting <queue name>").
    pub status: String,
}

/// A paginated slice of a ranked queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePage {
    pub entries: Vec<RankedEntry>,
    pub page: usize,
    pub per_page: usize,
    /// Open memberships in the queue before pagination.
    pub total_items: usize,
    pub total_pages: usize,
    /// Open memberships in the queue with the priority flag set,
    /// regardless of pagination.
    pub total_priority_count: usize,
}

/// Rank and paginate the open memberships of one queue.
///
/// `page` is 1-based; page 0 is treated as page 1. `per_page` must be
/// non-zero (the admission controller clamps it through `CoreConfig`
/// before calling here).
pub fn rank_queue(
    memberships: &[QueueMembership],
    catalog: &dyn QueueCatalog,
    page: usize,
    per_page: usize,
) -> QueuePage {
    let total_items = memberships.len();
    let total_priority_count = memberships.iter().filter(|m| m.priority()).count();

    let mut ordered: Vec<&QueueMembership> = memberships.iter().collect();
    ordered.sort_by_key(|m| sort_key(m));

    let page = page.max(1);
    let per_page = per_page.max(1);
    let total_pages = total_items.div_ceil(per_page);

    let entries = ordered
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|m| RankedEntry {
            membership_id: m.id,
            patient_id: m.patient_id,
            priority: m.priority(),
            priority_type: m.priority_type,
            risk_classification: m.risk_classification,
            last_queue_entry: m.last_queue_entry,
            status: m.status(catalog),
        })
        .collect();

    QueuePage {
        entries,
        page,
        per_page,
        total_items,
        total_pages,
        total_priority_count,
    }
}

fn sort_key(m: &QueueMembership) -> (u8, u8, DateTime<Utc>, MembershipId) {
    (
        RiskClassification::rank_or_unclassified(m.risk_classification),
        // priority=true sorts before priority=false
        u8::from(!m.priority()),
        m.last_queue_entry,
        m.id,
    )
}
