// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AssignmentKey, AssignmentStatus, Conflict, CoverageGap, ExclusionRecord, ExistingAssignment,
    Item, MatchConfig, MatchScore, Participant, ParticipantKind, Reviewer, RoundKind,
    RoundSnapshot, ScoreComponents, Suggestion, SuggestionSet,
};
pub use requests::{AssignmentPair, ConfirmAssignmentsRequest, GenerateSuggestionsRequest, PreviewSuggestionsRequest};
pub use responses::{ConfirmResponse, ErrorResponse, HealthResponse, ParticipantsResponse, ReconcileErrorResponse, SuggestionsResponse};
