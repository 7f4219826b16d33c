use crate::models::{AssignmentKey, ExistingAssignment, RoundKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Storage mutations needed to move from the persisted set to the desired set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// Persisted and still wanted: left untouched
    pub keep: Vec<ExistingAssignment>,
    /// Subset of `keep` that was cancelled and is wanted again: set back to pending
    pub reactivate: Vec<ExistingAssignment>,
    /// Wanted but not persisted yet
    pub insert: Vec<AssignmentKey>,
    /// No longer wanted but already progressed: soft-cancelled
    pub cancel: Vec<ExistingAssignment>,
    /// No longer wanted and never progressed: removed
    pub delete: Vec<ExistingAssignment>,
    /// Older duplicate rows of a pair, removed by id
    ///
    /// Outside the by-key partition: the pair itself lives on in one of the
    /// groups above through its newest record.
    pub superseded: Vec<ExistingAssignment>,
    pub duplicates_removed: usize,
}

impl ReconciliationPlan {
    pub fn is_noop(&self) -> bool {
        self.operation_count() == 0
    }

    /// Number of storage operations the plan requires
    pub fn operation_count(&self) -> usize {
        self.insert.len()
            + self.reactivate.len()
            + self.cancel.len()
            + self.delete.len()
            + self.superseded.len()
    }
}

/// Diff a desired assignment set against persisted assignments
///
/// Every key of `desired ∪ existing` lands in exactly one of the four groups.
/// There is no update-in-place: records are kept, cancelled, deleted, or
/// freshly inserted.
pub fn reconcile(
    desired: &[AssignmentKey],
    existing: &[ExistingAssignment],
    round_kind: RoundKind,
) -> ReconciliationPlan {
    let Deduped {
        survivors: existing,
        superseded,
        duplicates: duplicates_removed,
    } = dedupe_existing(existing);
    if duplicates_removed > 0 {
        tracing::warn!(
            "Removed {} duplicate assignment records before reconciliation",
            duplicates_removed
        );
    }

    let mut desired_keys: HashSet<&AssignmentKey> = HashSet::with_capacity(desired.len());
    let mut desired_ordered: Vec<&AssignmentKey> = Vec::with_capacity(desired.len());
    for key in desired {
        if desired_keys.insert(key) {
            desired_ordered.push(key);
        }
    }

    let mut plan = ReconciliationPlan {
        superseded,
        duplicates_removed,
        ..ReconciliationPlan::default()
    };
    let mut existing_keys: HashSet<AssignmentKey> = HashSet::with_capacity(existing.len());

    for record in existing {
        let key = record.key();
        if desired_keys.contains(&key) {
            if record.is_cancelled() {
                plan.reactivate.push(record.clone());
            }
            plan.keep.push(record);
        } else if round_kind.tracks_progression() && record.has_progressed() {
            plan.cancel.push(record);
        } else {
            plan.delete.push(record);
        }
        existing_keys.insert(key);
    }

    plan.insert = desired_ordered
        .into_iter()
        .filter(|key| !existing_keys.contains(*key))
        .cloned()
        .collect();

    tracing::debug!(
        "Reconciliation plan: keep={} (reactivate={}), insert={}, cancel={}, delete={}, superseded={}",
        plan.keep.len(),
        plan.reactivate.len(),
        plan.insert.len(),
        plan.cancel.len(),
        plan.delete.len(),
        plan.superseded.len()
    );

    plan
}

struct Deduped {
    survivors: Vec<ExistingAssignment>,
    superseded: Vec<ExistingAssignment>,
    duplicates: usize,
}

/// Keep one record per (item, reviewer), preferring the newest `created_at`
///
/// Missing timestamps count as oldest; on equal timestamps the later record
/// wins. First-seen order of keys is preserved. Losers that carry an id are
/// returned for removal; id-less losers cannot be addressed on their own and
/// go with their survivor when it is deleted by key.
fn dedupe_existing(existing: &[ExistingAssignment]) -> Deduped {
    let mut slots: HashMap<AssignmentKey, usize> = HashMap::with_capacity(existing.len());
    let mut survivors: Vec<ExistingAssignment> = Vec::with_capacity(existing.len());
    let mut losers: Vec<ExistingAssignment> = Vec::new();

    for record in existing {
        match slots.get(&record.key()) {
            Some(&slot) => {
                if record.created_at >= survivors[slot].created_at {
                    losers.push(std::mem::replace(&mut survivors[slot], record.clone()));
                } else {
                    losers.push(record.clone());
                }
            }
            None => {
                slots.insert(record.key(), survivors.len());
                survivors.push(record.clone());
            }
        }
    }

    let duplicates = losers.len();
    let (superseded, unaddressable): (Vec<_>, Vec<_>) =
        losers.into_iter().partition(|record| record.id.is_some());
    if !unaddressable.is_empty() {
        tracing::warn!(
            "{} duplicate assignment records have no id and are left to key-based removal",
            unaddressable.len()
        );
    }

    Deduped {
        survivors,
        superseded,
        duplicates,
    }
}

/// Operation group of a reconciliation plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationGroup {
    Keep,
    Insert,
    Reactivate,
    Cancel,
    Delete,
    Superseded,
}

impl fmt::Display for OperationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationGroup::Keep => "keep",
            OperationGroup::Insert => "insert",
            OperationGroup::Reactivate => "reactivate",
            OperationGroup::Cancel => "cancel",
            OperationGroup::Delete => "delete",
            OperationGroup::Superseded => "superseded",
        };
        f.write_str(label)
    }
}

/// Per-group counts of applied operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyCounts {
    pub kept: usize,
    pub inserted: usize,
    #[serde(default)]
    pub reactivated: usize,
    pub cancelled: usize,
    pub deleted: usize,
    #[serde(default)]
    pub superseded: usize,
}

impl ApplyCounts {
    pub fn total(&self) -> usize {
        self.kept + self.operations()
    }

    /// Storage mutations only; kept records need no write
    pub fn operations(&self) -> usize {
        self.inserted + self.reactivated + self.cancelled + self.deleted + self.superseded
    }
}

/// Reconciliation apply failed and was rolled back
///
/// `applied` reflects what is persisted after the rollback: kept records
/// only. `failed` counts every planned mutation, since none of them stuck.
#[derive(Debug, Error)]
#[error(
    "Reconciliation failed in {group} group and was rolled back ({attempted_before_failure} operations undone, {failed} not applied): {source}"
)]
pub struct ReconcileError {
    pub group: OperationGroup,
    pub applied: ApplyCounts,
    pub failed: usize,
    /// Operations that had succeeded inside the transaction before the failure
    pub attempted_before_failure: usize,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Tracks how far the application of a plan got
///
/// Storage adapters record each successful operation and convert the first
/// failure into a [`ReconcileError`]. The plan is applied in one
/// transaction, so a failure undoes everything recorded so far.
#[derive(Debug, Clone)]
pub struct ApplyProgress {
    applied: ApplyCounts,
    planned: ApplyCounts,
}

impl ApplyProgress {
    pub fn new(plan: &ReconciliationPlan) -> Self {
        Self {
            applied: ApplyCounts {
                kept: plan.keep.len(),
                ..ApplyCounts::default()
            },
            planned: ApplyCounts {
                kept: plan.keep.len(),
                inserted: plan.insert.len(),
                reactivated: plan.reactivate.len(),
                cancelled: plan.cancel.len(),
                deleted: plan.delete.len(),
                superseded: plan.superseded.len(),
            },
        }
    }

    pub fn record(&mut self, group: OperationGroup) {
        match group {
            OperationGroup::Keep => {}
            OperationGroup::Insert => self.applied.inserted += 1,
            OperationGroup::Reactivate => self.applied.reactivated += 1,
            OperationGroup::Cancel => self.applied.cancelled += 1,
            OperationGroup::Delete => self.applied.deleted += 1,
            OperationGroup::Superseded => self.applied.superseded += 1,
        }
    }

    pub fn applied(&self) -> ApplyCounts {
        self.applied
    }

    /// Convert a storage error into a report of the rolled-back state
    pub fn fail<E>(&self, group: OperationGroup, err: E) -> ReconcileError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ReconcileError {
            group,
            applied: ApplyCounts {
                kept: self.planned.kept,
                ..ApplyCounts::default()
            },
            failed: self.planned.operations(),
            attempted_before_failure: self.applied.operations(),
            source: Box::new(err),
        }
    }
}
