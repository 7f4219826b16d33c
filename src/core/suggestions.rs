use crate::core::{
    constraints::ConstraintIndex,
    load::LoadTracker,
    scoring::{score_profiles, ItemProfile, ReviewerProfile},
    taxonomy::Taxonomy,
};
use crate::models::{
    CoverageGap, ExclusionRecord, Item, Reviewer, RoundSnapshot, Suggestion, SuggestionSet,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while setting up the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to build scoring thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result of one suggestion generation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub round: String,
    pub suggestions: Vec<SuggestionSet>,
    pub exclusions: Vec<ExclusionRecord>,
    pub coverage_gaps: Vec<CoverageGap>,
    pub seed: Option<u64>,
}

/// Main suggestion orchestrator
///
/// # Pipeline Stages (per juror, independent of other jurors)
/// 1. Hard-constraint filtering (conflicts, existing assignments)
/// 2. Scoring against the juror's current load
/// 3. Ranking by score, ties broken by ascending startup id
/// 4. Truncation to the round's top-K
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    taxonomy: Arc<Taxonomy>,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl SuggestionEngine {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy: Arc::new(taxonomy),
            pool: None,
        }
    }

    pub fn with_standard_taxonomy() -> Self {
        Self::new(Taxonomy::standard().clone())
    }

    /// Bound per-juror scoring to a dedicated pool of `threads` workers
    pub fn with_parallelism(mut self, threads: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("jury-score-{}", i))
            .build()?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Produce ranked shortlists and exclusion records for a round
    ///
    /// Output depends only on the snapshot: jurors keep input order, each
    /// shortlist is fully ordered, and exclusions follow (juror, startup)
    /// input order.
    pub fn generate(&self, snapshot: &RoundSnapshot) -> GenerationOutcome {
        let round = snapshot.round.as_str();
        let config = &snapshot.config;

        let constraints = ConstraintIndex::build(round, &snapshot.conflicts, &snapshot.assignments);
        let loads = LoadTracker::from_assignments(&snapshot.assignments, round, config.default_capacity);
        let item_profiles: Vec<ItemProfile> = snapshot
            .items
            .iter()
            .map(|item| ItemProfile::new(item, &self.taxonomy))
            .collect();

        let per_reviewer = |reviewer: &Reviewer| {
            self.rank_for_reviewer(reviewer, snapshot, &item_profiles, &constraints, &loads)
        };

        let ranked: Vec<(SuggestionSet, Vec<ExclusionRecord>)> = match &self.pool {
            Some(pool) => pool.install(|| snapshot.reviewers.par_iter().map(per_reviewer).collect()),
            None => snapshot.reviewers.par_iter().map(per_reviewer).collect(),
        };

        let mut suggestions = Vec::with_capacity(ranked.len());
        let mut exclusions = Vec::new();
        for (set, excluded) in ranked {
            suggestions.push(set);
            exclusions.extend(excluded);
        }

        let coverage_gaps = coverage_gaps(snapshot, &suggestions);

        tracing::debug!(
            "Generated suggestions for round {}: {} jurors, {} startups, {} exclusions, {} coverage gaps",
            round,
            suggestions.len(),
            snapshot.items.len(),
            exclusions.len(),
            coverage_gaps.len()
        );

        GenerationOutcome {
            round: round.to_string(),
            suggestions,
            exclusions,
            coverage_gaps,
            seed: config.deterministic_seed,
        }
    }

    fn rank_for_reviewer(
        &self,
        reviewer: &Reviewer,
        snapshot: &RoundSnapshot,
        item_profiles: &[ItemProfile],
        constraints: &ConstraintIndex,
        loads: &LoadTracker,
    ) -> (SuggestionSet, Vec<ExclusionRecord>) {
        let profile = ReviewerProfile::new(reviewer, &self.taxonomy);
        let current_load = loads.current_load(&reviewer.id);
        let mut exclusions = Vec::new();

        let mut scored: Vec<Suggestion> = snapshot
            .items
            .iter()
            .zip(item_profiles)
            // Stage 1: hard constraints
            .filter(|(item, _)| {
                let check = constraints.check(&reviewer.id, &item.id);
                if check.excluded {
                    exclusions.push(ExclusionRecord {
                        item_id: item.id.clone(),
                        item_name: item.name.clone(),
                        reviewer_id: reviewer.id.clone(),
                        reviewer_name: reviewer.name.clone(),
                        reason: check.reason.to_string(),
                    });
                }
                !check.excluded
            })
            // Stage 2: scoring
            .map(|(item, item_profile)| Suggestion {
                item: item.clone(),
                score: score_profiles(
                    reviewer,
                    &profile,
                    item,
                    item_profile,
                    current_load,
                    &snapshot.config,
                ),
            })
            .collect();

        // Stage 3: ranking
        scored.sort_by(compare_suggestions);

        // Stage 4: top-K
        scored.truncate(snapshot.config.top_k_per_reviewer);

        let set = SuggestionSet {
            reviewer_id: reviewer.id.clone(),
            reviewer_name: reviewer.name.clone(),
            current_load,
            capacity: loads.capacity_for(reviewer),
            suggestions: scored,
        };

        (set, exclusions)
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::with_standard_taxonomy()
    }
}

/// Descending score, then ascending startup id, then ascending name
fn compare_suggestions(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.score
        .total_score
        .total_cmp(&a.score.total_score)
        .then_with(|| a.item.id.cmp(&b.item.id))
        .then_with(|| a.item.name.cmp(&b.item.name))
}

/// Startups that would stay below the round's reviewer target
///
/// Counts distinct jurors across shortlists plus active assignments.
pub fn coverage_gaps(snapshot: &RoundSnapshot, suggestions: &[SuggestionSet]) -> Vec<CoverageGap> {
    let target = snapshot.config.target_reviewers_per_item;
    let mut reviewers_per_item: HashMap<&str, HashSet<&str>> = HashMap::new();

    for assignment in snapshot
        .assignments
        .iter()
        .filter(|a| a.round == snapshot.round && !a.is_cancelled())
    {
        reviewers_per_item
            .entry(assignment.item_id.as_str())
            .or_default()
            .insert(assignment.reviewer_id.as_str());
    }

    for set in suggestions {
        for suggestion in &set.suggestions {
            reviewers_per_item
                .entry(suggestion.item.id.as_str())
                .or_default()
                .insert(set.reviewer_id.as_str());
        }
    }

    let mut gaps: Vec<CoverageGap> = snapshot
        .items
        .iter()
        .filter_map(|item: &Item| {
            let count = reviewers_per_item
                .get(item.id.as_str())
                .map(HashSet::len)
                .unwrap_or(0);
            (count < target).then(|| CoverageGap {
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                reviewer_count: count,
                target,
            })
        })
        .collect();

    gaps.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    gaps.dedup_by(|a, b| a.item_id == b.item_id);
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraints::{REASON_ALREADY_ASSIGNED, REASON_CONFLICT};
    use crate::models::{Conflict, ExistingAssignment, MatchConfig};

    fn create_item(id: &str, vertical: &str, stage: &str) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Startup {}", id),
            verticals: vec![vertical.to_string()],
            stage: Some(stage.to_string()),
            regions: vec!["Europe".to_string()],
            description: None,
        }
    }

    fn create_reviewer(id: &str) -> Reviewer {
        Reviewer {
            id: id.to_string(),
            name: format!("Juror {}", id),
            target_verticals: vec!["Fintech".to_string()],
            preferred_stages: vec!["Seed".to_string()],
            preferred_regions: vec!["Europe".to_string()],
            evaluation_limit: Some(5),
            thesis_keywords: vec![],
        }
    }

    fn create_snapshot() -> RoundSnapshot {
        RoundSnapshot {
            round: "screening".to_string(),
            items: vec![
                create_item("s3", "Healthtech", "Seed"),
                create_item("s1", "Fintech", "Seed"),
                create_item("s2", "Fintech", "Series A"),
                create_item("s4", "Edtech", "Growth"),
            ],
            reviewers: vec![create_reviewer("r1"), create_reviewer("r2")],
            conflicts: vec![],
            assignments: vec![],
            config: MatchConfig::default(),
        }
    }

    #[test]
    fn test_generate_ranks_and_truncates() {
        let engine = SuggestionEngine::default();
        let outcome = engine.generate(&create_snapshot());

        assert_eq!(outcome.suggestions.len(), 2);
        let ids: Vec<&str> = outcome.suggestions[0]
            .suggestions
            .iter()
            .map(|s| s.item.id.as_str())
            .collect();
        // s1 full match, s2 misses stage, s3 misses vertical, s4 misses both
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        assert!(outcome.exclusions.is_empty());
    }

    #[test]
    fn test_ties_break_on_item_id() {
        let mut snapshot = create_snapshot();
        snapshot.items = vec![
            create_item("b", "Fintech", "Seed"),
            create_item("a", "Fintech", "Seed"),
            create_item("c", "Fintech", "Seed"),
        ];

        let outcome = SuggestionEngine::default().generate(&snapshot);
        let ids: Vec<&str> = outcome.suggestions[0]
            .suggestions
            .iter()
            .map(|s| s.item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_exclusions_are_recorded_and_skipped() {
        let mut snapshot = create_snapshot();
        snapshot.conflicts.push(Conflict {
            reviewer_id: "r1".to_string(),
            item_id: "s1".to_string(),
            conflict_type: "advisor".to_string(),
        });
        snapshot.assignments.push(ExistingAssignment {
            id: Some("a1".to_string()),
            reviewer_id: "r2".to_string(),
            item_id: "s2".to_string(),
            round: "screening".to_string(),
            status: None,
            meeting_scheduled_at: None,
            created_at: None,
        });

        let outcome = SuggestionEngine::default().generate(&snapshot);

        assert_eq!(outcome.exclusions.len(), 2);
        assert_eq!(outcome.exclusions[0].reviewer_id, "r1");
        assert_eq!(outcome.exclusions[0].reason, REASON_CONFLICT);
        assert_eq!(outcome.exclusions[1].reviewer_id, "r2");
        assert_eq!(outcome.exclusions[1].reason, REASON_ALREADY_ASSIGNED);

        assert!(outcome.suggestions[0].suggestions.iter().all(|s| s.item.id != "s1"));
        assert!(outcome.suggestions[1].suggestions.iter().all(|s| s.item.id != "s2"));
        assert_eq!(outcome.suggestions[1].current_load, 1);
    }

    #[test]
    fn test_dedicated_pool_matches_global_pool() {
        let snapshot = create_snapshot();
        let pooled = SuggestionEngine::default()
            .with_parallelism(2)
            .unwrap()
            .generate(&snapshot);
        let global = SuggestionEngine::default().generate(&snapshot);

        assert_eq!(pooled, global);
    }

    #[test]
    fn test_coverage_gaps_counts_suggestions_and_assignments() {
        let mut snapshot = create_snapshot();
        snapshot.config.top_k_per_reviewer = 1;
        snapshot.config.target_reviewers_per_item = 2;

        let outcome = SuggestionEngine::default().generate(&snapshot);

        // Both jurors shortlist s1 only, so every other startup is short
        let gap_ids: Vec<&str> = outcome.coverage_gaps.iter().map(|g| g.item_id.as_str()).collect();
        assert_eq!(gap_ids, vec!["s2", "s3", "s4"]);
        assert!(outcome.coverage_gaps.iter().all(|g| g.reviewer_count == 0 && g.target == 2));
    }

    #[test]
    fn test_empty_inputs_give_empty_outcome() {
        let snapshot = RoundSnapshot {
            round: "screening".to_string(),
            ..RoundSnapshot::default()
        };

        let outcome = SuggestionEngine::default().generate(&snapshot);
        assert!(outcome.suggestions.is_empty());
        assert!(outcome.exclusions.is_empty());
        assert!(outcome.coverage_gaps.is_empty());
    }
}
