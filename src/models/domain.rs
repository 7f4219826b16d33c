use serde::{Deserialize, Serialize};

/// Startup under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub verticals: Vec<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Juror evaluating startups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: String,
    pub name: String,
    #[serde(alias = "targetVerticals", default)]
    pub target_verticals: Vec<String>,
    #[serde(alias = "preferredStages", default)]
    pub preferred_stages: Vec<String>,
    #[serde(alias = "preferredRegions", default)]
    pub preferred_regions: Vec<String>,
    #[serde(alias = "evaluationLimit", default)]
    pub evaluation_limit: Option<u32>,
    #[serde(alias = "thesisKeywords", default)]
    pub thesis_keywords: Vec<String>,
}

/// Either side of a juror/startup pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Participant {
    Juror(Reviewer),
    Startup(Item),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    Juror,
    Startup,
}

impl Participant {
    pub fn id(&self) -> &str {
        match self {
            Participant::Juror(reviewer) => &reviewer.id,
            Participant::Startup(item) => &item.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Participant::Juror(reviewer) => &reviewer.name,
            Participant::Startup(item) => &item.name,
        }
    }

    pub fn kind(&self) -> ParticipantKind {
        match self {
            Participant::Juror(_) => ParticipantKind::Juror,
            Participant::Startup(_) => ParticipantKind::Startup,
        }
    }
}

/// Declared conflict of interest between a juror and a startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(alias = "reviewerId", alias = "juror_id")]
    pub reviewer_id: String,
    #[serde(alias = "itemId", alias = "startup_id")]
    pub item_id: String,
    #[serde(alias = "conflictType", default = "default_conflict_type")]
    pub conflict_type: String,
}

fn default_conflict_type() -> String {
    "declared".to_string()
}

/// Lifecycle status of a persisted assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
    InReview,
    #[serde(other)]
    Other,
}

impl AssignmentStatus {
    /// Parse a stored status string, tolerating case and separator variants
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" | "assigned" => AssignmentStatus::Pending,
            "scheduled" => AssignmentStatus::Scheduled,
            "completed" => AssignmentStatus::Completed,
            "cancelled" | "canceled" => AssignmentStatus::Cancelled,
            "in_review" => AssignmentStatus::InReview,
            _ => AssignmentStatus::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Scheduled => "scheduled",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Cancelled => "cancelled",
            AssignmentStatus::InReview => "in_review",
            AssignmentStatus::Other => "other",
        }
    }

    /// Statuses that mean work has started on the assignment
    pub fn is_progressed(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Scheduled
                | AssignmentStatus::Completed
                | AssignmentStatus::Cancelled
                | AssignmentStatus::InReview
        )
    }
}

/// Persisted juror/startup pairing for a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingAssignment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "reviewerId", alias = "juror_id")]
    pub reviewer_id: String,
    #[serde(alias = "itemId", alias = "startup_id")]
    pub item_id: String,
    pub round: String,
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
    #[serde(alias = "meetingScheduledAt", default)]
    pub meeting_scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(alias = "createdAt", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ExistingAssignment {
    pub fn is_cancelled(&self) -> bool {
        self.status == Some(AssignmentStatus::Cancelled)
    }

    /// True once a meeting was booked or the status moved past pending
    pub fn has_progressed(&self) -> bool {
        self.meeting_scheduled_at.is_some()
            || self.status.map(|s| s.is_progressed()).unwrap_or(false)
    }

    pub fn key(&self) -> AssignmentKey {
        AssignmentKey::new(&self.item_id, &self.reviewer_id)
    }
}

/// (item, reviewer) identity of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentKey {
    #[serde(alias = "itemId", alias = "startup_id")]
    pub item_id: String,
    #[serde(alias = "reviewerId", alias = "juror_id")]
    pub reviewer_id: String,
}

impl AssignmentKey {
    pub fn new(item_id: &str, reviewer_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            reviewer_id: reviewer_id.to_string(),
        }
    }
}

/// Kind of evaluation round, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundKind {
    Screening,
    Pitching,
}

impl RoundKind {
    pub fn from_round_name(round: &str) -> Self {
        let lowered = round.trim().to_lowercase();
        if lowered.contains("pitch") || lowered.contains("final") {
            RoundKind::Pitching
        } else {
            RoundKind::Screening
        }
    }

    /// Pitching rounds schedule meetings, so removed assignments are cancelled, not deleted
    pub fn tracks_progression(&self) -> bool {
        matches!(self, RoundKind::Pitching)
    }
}

/// Per-round matching configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_vertical_weight")]
    pub vertical_weight: f64,
    #[serde(default = "default_stage_weight")]
    pub stage_weight: f64,
    #[serde(default = "default_region_weight")]
    pub region_weight: f64,
    #[serde(default = "default_thesis_weight")]
    pub thesis_weight: f64,
    #[serde(default = "default_load_penalty_weight")]
    pub load_penalty_weight: f64,
    #[serde(default = "default_target_reviewers")]
    pub target_reviewers_per_item: usize,
    #[serde(default = "default_top_k")]
    pub top_k_per_reviewer: usize,
    #[serde(default = "default_capacity")]
    pub default_capacity: u32,
    #[serde(default)]
    pub deterministic_seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            vertical_weight: default_vertical_weight(),
            stage_weight: default_stage_weight(),
            region_weight: default_region_weight(),
            thesis_weight: default_thesis_weight(),
            load_penalty_weight: default_load_penalty_weight(),
            target_reviewers_per_item: default_target_reviewers(),
            top_k_per_reviewer: default_top_k(),
            default_capacity: default_capacity(),
            deterministic_seed: None,
        }
    }
}

impl MatchConfig {
    pub fn weight_sum(&self) -> f64 {
        self.vertical_weight
            + self.stage_weight
            + self.region_weight
            + self.thesis_weight
            + self.load_penalty_weight
    }
}

fn default_vertical_weight() -> f64 { 40.0 }
fn default_stage_weight() -> f64 { 20.0 }
fn default_region_weight() -> f64 { 20.0 }
fn default_thesis_weight() -> f64 { 10.0 }
fn default_load_penalty_weight() -> f64 { 10.0 }
fn default_target_reviewers() -> usize { 3 }
fn default_top_k() -> usize { 3 }
fn default_capacity() -> u32 { 10 }

/// Per-criterion contributions to a match score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub vertical: f64,
    pub stage: f64,
    pub region: f64,
    pub thesis: f64,
    pub load: f64,
}

impl ScoreComponents {
    pub fn sum(&self) -> f64 {
        self.vertical + self.stage + self.region + self.thesis + self.load
    }
}

/// Explainable compatibility score for one juror/startup pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub reviewer_id: String,
    pub item_id: String,
    pub total_score: f64,
    pub components: ScoreComponents,
    pub reason: String,
}

/// One ranked candidate in a juror's shortlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub item: Item,
    pub score: MatchScore,
}

/// Ranked shortlist for a single juror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub current_load: u32,
    pub capacity: u32,
    pub suggestions: Vec<Suggestion>,
}

/// Why a pair was left out of the suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub item_id: String,
    pub item_name: String,
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub reason: String,
}

/// Startup that would end up with fewer jurors than the round targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub item_id: String,
    pub item_name: String,
    pub reviewer_count: usize,
    pub target: usize,
}

/// Immutable inputs for one generation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundSnapshot {
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
    pub config: MatchConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_variants() {
        assert_eq!(AssignmentStatus::parse("Scheduled"), AssignmentStatus::Scheduled);
        assert_eq!(AssignmentStatus::parse("in-review"), AssignmentStatus::InReview);
        assert_eq!(AssignmentStatus::parse("canceled"), AssignmentStatus::Cancelled);
        assert_eq!(AssignmentStatus::parse("whatever"), AssignmentStatus::Other);
    }

    #[test]
    fn test_unknown_status_deserializes_to_other() {
        let status: AssignmentStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, AssignmentStatus::Other);
    }

    #[test]
    fn test_round_kind_from_name() {
        assert_eq!(RoundKind::from_round_name("Pitching"), RoundKind::Pitching);
        assert_eq!(RoundKind::from_round_name("screening"), RoundKind::Screening);
        assert!(!RoundKind::Screening.tracks_progression());
    }

    #[test]
    fn test_participant_tagged_serde() {
        let juror = Participant::Juror(Reviewer {
            id: "r1".to_string(),
            name: "Ada".to_string(),
            target_verticals: vec![],
            preferred_stages: vec![],
            preferred_regions: vec![],
            evaluation_limit: None,
            thesis_keywords: vec![],
        });

        let json = serde_json::to_value(&juror).unwrap();
        assert_eq!(json["kind"], "juror");
        assert_eq!(juror.kind(), ParticipantKind::Juror);
        assert_eq!(juror.id(), "r1");

        let startup: Participant =
            serde_json::from_str(r#"{"kind":"startup","id":"s1","name":"Acme"}"#).unwrap();
        assert_eq!(startup.kind(), ParticipantKind::Startup);
        assert_eq!(startup.name(), "Acme");
    }

    #[test]
    fn test_match_config_defaults_fill_missing_fields() {
        let config: MatchConfig = serde_json::from_str(r#"{"vertical_weight": 50}"#).unwrap();
        assert_eq!(config.vertical_weight, 50.0);
        assert_eq!(config.top_k_per_reviewer, 3);
        assert_eq!(MatchConfig::default().weight_sum(), 100.0);
    }
}
