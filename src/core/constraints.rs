use crate::models::{Conflict, ExistingAssignment};
use std::collections::HashSet;

pub const REASON_CONFLICT: &str = "Conflict of interest";
pub const REASON_ALREADY_ASSIGNED: &str = "Already assigned";

/// Outcome of the hard-constraint check for one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusion {
    pub excluded: bool,
    pub reason: &'static str,
}

impl Exclusion {
    const ELIGIBLE: Exclusion = Exclusion { excluded: false, reason: "" };

    fn because(reason: &'static str) -> Self {
        Self { excluded: true, reason }
    }
}

/// Check a single pair against conflicts and existing assignments
///
/// Rules are evaluated in order and the first match wins. Capacity is
/// deliberately absent here: it only lowers the score.
pub fn is_excluded(
    reviewer_id: &str,
    item_id: &str,
    conflicts: &[Conflict],
    assignments: &[ExistingAssignment],
) -> Exclusion {
    if conflicts
        .iter()
        .any(|c| c.reviewer_id == reviewer_id && c.item_id == item_id)
    {
        return Exclusion::because(REASON_CONFLICT);
    }

    if assignments
        .iter()
        .any(|a| a.reviewer_id == reviewer_id && a.item_id == item_id)
    {
        return Exclusion::because(REASON_ALREADY_ASSIGNED);
    }

    Exclusion::ELIGIBLE
}

/// Hashed view of the hard constraints for one round
///
/// Built once per generation pass so that each pair check is constant time.
/// Assignments from other rounds are ignored.
#[derive(Debug, Clone, Default)]
pub struct ConstraintIndex {
    conflicts: HashSet<(String, String)>,
    assigned: HashSet<(String, String)>,
}

impl ConstraintIndex {
    pub fn build(round: &str, conflicts: &[Conflict], assignments: &[ExistingAssignment]) -> Self {
        let conflicts = conflicts
            .iter()
            .map(|c| (c.reviewer_id.clone(), c.item_id.clone()))
            .collect();

        let assigned = assignments
            .iter()
            .filter(|a| a.round == round)
            .map(|a| (a.reviewer_id.clone(), a.item_id.clone()))
            .collect();

        Self { conflicts, assigned }
    }

    #[inline]
    pub fn check(&self, reviewer_id: &str, item_id: &str) -> Exclusion {
        let key = (reviewer_id.to_string(), item_id.to_string());

        if self.conflicts.contains(&key) {
            Exclusion::because(REASON_CONFLICT)
        } else if self.assigned.contains(&key) {
            Exclusion::because(REASON_ALREADY_ASSIGNED)
        } else {
            Exclusion::ELIGIBLE
        }
    }
}
