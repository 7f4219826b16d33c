use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Conflict, ExistingAssignment, Item, MatchConfig, Reviewer};

/// Request to score a round supplied entirely in the request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PreviewSuggestionsRequest {
    #[validate(length(min = 1))]
    pub round: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub assignments: Vec<ExistingAssignment>,
    #[serde(default)]
    pub config: Option<MatchConfig>,
}

/// Request to generate suggestions for a stored round
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GenerateSuggestionsRequest {
    #[validate(range(min = 1, max = 50))]
    #[serde(alias = "topK", default)]
    pub top_k: Option<u16>,
    #[serde(alias = "reviewerIds", default)]
    pub reviewer_ids: Vec<String>,
}

/// One approved juror/startup pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignmentPair {
    #[validate(length(min = 1))]
    #[serde(alias = "itemId", alias = "startup_id")]
    pub item_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "reviewerId", alias = "juror_id")]
    pub reviewer_id: String,
}

/// Operator-approved assignment set for a round
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmAssignmentsRequest {
    #[validate(nested)]
    #[serde(default)]
    pub assignments: Vec<AssignmentPair>,
}
