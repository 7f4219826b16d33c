// Core engine exports
pub mod constraints;
pub mod load;
pub mod reconciler;
pub mod scoring;
pub mod suggestions;
pub mod taxonomy;

pub use constraints::{is_excluded, ConstraintIndex, Exclusion};
pub use load::LoadTracker;
pub use reconciler::{reconcile, ApplyCounts, ApplyProgress, OperationGroup, ReconcileError, ReconciliationPlan};
pub use scoring::calculate_match_score;
pub use suggestions::{EngineError, GenerationOutcome, SuggestionEngine};
pub use taxonomy::{Category, Taxonomy, TaxonomyError, TaxonomyTable};
