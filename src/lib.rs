//! Jury Match - juror/startup matching engine
//!
//! Normalizes free-text taxonomy labels, filters conflicted or already
//! assigned pairs, scores every remaining juror/startup pair and returns
//! ranked per-juror suggestions. Operator-approved sets are reconciled
//! against persisted assignments.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_match_score, is_excluded, reconcile, LoadTracker, SuggestionEngine, Taxonomy};
pub use models::{
    AssignmentKey, Conflict, ExistingAssignment, Item, MatchConfig, MatchScore, Reviewer,
    RoundKind, RoundSnapshot, SuggestionSet,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let taxonomy = Taxonomy::standard();
        assert_eq!(taxonomy.normalize(core::Category::Vertical, "fintech"), "Fintech");
        assert_eq!(MatchConfig::default().weight_sum(), 100.0);
    }
}
