use serde::{Deserialize, Serialize};
use crate::core::reconciler::ApplyCounts;
use crate::models::domain::{CoverageGap, ExclusionRecord, Participant, SuggestionSet};

/// Response for suggestion generation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub round: String,
    pub suggestions: Vec<SuggestionSet>,
    pub exclusions: Vec<ExclusionRecord>,
    pub coverage_gaps: Vec<CoverageGap>,
    pub seed: Option<u64>,
    pub warnings: Vec<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Response for the confirm endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub round: String,
    pub applied: ApplyCounts,
    pub duplicates_removed: usize,
}

/// Jurors and startups of a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantsResponse {
    pub round: String,
    pub participants: Vec<Participant>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Error response for a failed reconciliation apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub group: String,
    pub applied: ApplyCounts,
    pub failed: usize,
    pub attempted_before_failure: usize,
}
