use crate::models::{ExistingAssignment, Reviewer};
use std::collections::HashMap;

/// Explicit evaluation limit, or `default_capacity` when absent
///
/// A zero limit is treated as absent to keep the penalty ratio finite.
#[inline]
pub fn effective_capacity(reviewer: &Reviewer, default_capacity: u32) -> u32 {
    match reviewer.evaluation_limit {
        Some(limit) if limit > 0 => limit,
        _ => default_capacity.max(1),
    }
}

/// Snapshot of how many active assignments each juror carries in a round
///
/// Seeded once before scoring and never mutated during a pass: suggestions
/// are advisory until an operator commits them.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    loads: HashMap<String, u32>,
    default_capacity: u32,
}

impl LoadTracker {
    /// Count non-cancelled assignments per juror for `round`
    pub fn from_assignments(
        assignments: &[ExistingAssignment],
        round: &str,
        default_capacity: u32,
    ) -> Self {
        let mut loads: HashMap<String, u32> = HashMap::new();

        for assignment in assignments
            .iter()
            .filter(|a| a.round == round && !a.is_cancelled())
        {
            *loads.entry(assignment.reviewer_id.clone()).or_insert(0) += 1;
        }

        Self {
            loads,
            default_capacity: default_capacity.max(1),
        }
    }

    #[inline]
    pub fn current_load(&self, reviewer_id: &str) -> u32 {
        self.loads.get(reviewer_id).copied().unwrap_or(0)
    }

    #[inline]
    pub fn capacity_for(&self, reviewer: &Reviewer) -> u32 {
        effective_capacity(reviewer, self.default_capacity)
    }

    pub fn remaining(&self, reviewer: &Reviewer) -> u32 {
        self.capacity_for(reviewer)
            .saturating_sub(self.current_load(&reviewer.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssignmentStatus;

    fn assignment(reviewer: &str, item: &str, round: &str, status: Option<AssignmentStatus>) -> ExistingAssignment {
        ExistingAssignment {
            id: None,
            reviewer_id: reviewer.to_string(),
            item_id: item.to_string(),
            round: round.to_string(),
            status,
            meeting_scheduled_at: None,
            created_at: None,
        }
    }

    fn reviewer(id: &str, limit: Option<u32>) -> Reviewer {
        Reviewer {
            id: id.to_string(),
            name: id.to_string(),
            target_verticals: vec![],
            preferred_stages: vec![],
            preferred_regions: vec![],
            evaluation_limit: limit,
            thesis_keywords: vec![],
        }
    }

    #[test]
    fn test_counts_only_active_assignments_in_round() {
        let assignments = vec![
            assignment("r1", "s1", "screening", None),
            assignment("r1", "s2", "screening", Some(AssignmentStatus::Scheduled)),
            assignment("r1", "s3", "screening", Some(AssignmentStatus::Cancelled)),
            assignment("r1", "s4", "pitching", None),
            assignment("r2", "s1", "screening", None),
        ];
        let tracker = LoadTracker::from_assignments(&assignments, "screening", 10);

        assert_eq!(tracker.current_load("r1"), 2);
        assert_eq!(tracker.current_load("r2"), 1);
        assert_eq!(tracker.current_load("unknown"), 0);
    }

    #[test]
    fn test_capacity_falls_back_to_default() {
        let tracker = LoadTracker::from_assignments(&[], "screening", 10);

        assert_eq!(tracker.capacity_for(&reviewer("r1", Some(4))), 4);
        assert_eq!(tracker.capacity_for(&reviewer("r1", None)), 10);
        assert_eq!(tracker.capacity_for(&reviewer("r1", Some(0))), 10);
    }

    #[test]
    fn test_remaining_saturates() {
        let assignments: Vec<_> = (0..5)
            .map(|i| assignment("r1", &format!("s{}", i), "screening", None))
            .collect();
        let tracker = LoadTracker::from_assignments(&assignments, "screening", 10);

        assert_eq!(tracker.remaining(&reviewer("r1", Some(3))), 0);
        assert_eq!(tracker.remaining(&reviewer("r1", Some(8))), 3);
    }
}
