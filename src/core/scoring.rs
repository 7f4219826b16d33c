use crate::core::load::effective_capacity;
use crate::core::taxonomy::{Category, Taxonomy, WILDCARD_REGIONS};
use crate::models::{Item, MatchConfig, MatchScore, Reviewer, ScoreComponents};
use std::collections::HashSet;

pub const NO_STRONG_MATCH: &str = "No strong match";

/// Juror attributes normalized once per generation pass
#[derive(Debug, Clone)]
pub struct ReviewerProfile {
    verticals: HashSet<String>,
    stages: HashSet<String>,
    regions: HashSet<String>,
    wildcard_region: bool,
    keywords: Vec<String>,
}

impl ReviewerProfile {
    pub fn new(reviewer: &Reviewer, taxonomy: &Taxonomy) -> Self {
        let regions = lowered(taxonomy.normalize_all(Category::Region, &reviewer.preferred_regions));
        let wildcard_region = WILDCARD_REGIONS
            .iter()
            .any(|label| regions.contains(&label.to_lowercase()));

        let mut seen = HashSet::new();
        let keywords = reviewer
            .thesis_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();

        Self {
            verticals: lowered(taxonomy.normalize_all(Category::Vertical, &reviewer.target_verticals)),
            stages: lowered(taxonomy.normalize_all(Category::Stage, &reviewer.preferred_stages)),
            regions,
            wildcard_region,
            keywords,
        }
    }
}

/// Startup attributes normalized once per generation pass
#[derive(Debug, Clone)]
pub struct ItemProfile {
    verticals: Vec<String>,
    stage: Option<String>,
    regions: Vec<String>,
    haystack: String,
}

impl ItemProfile {
    pub fn new(item: &Item, taxonomy: &Taxonomy) -> Self {
        let verticals = taxonomy.normalize_all(Category::Vertical, &item.verticals);
        let stage = item
            .stage
            .as_deref()
            .map(|raw| taxonomy.normalize(Category::Stage, raw))
            .filter(|s| !s.is_empty());
        let regions = taxonomy.normalize_all(Category::Region, &item.regions);

        // Raw and canonical forms both count for keyword containment
        let mut parts: Vec<&str> = vec![item.name.as_str()];
        parts.extend(item.verticals.iter().map(String::as_str));
        parts.extend(verticals.iter().map(String::as_str));
        parts.extend(item.stage.as_deref());
        parts.extend(stage.as_deref());
        parts.extend(item.description.as_deref());
        let haystack = parts.join(" ").to_lowercase();

        Self {
            verticals,
            stage,
            regions,
            haystack,
        }
    }
}

fn lowered(labels: Vec<String>) -> HashSet<String> {
    labels.into_iter().map(|l| l.to_lowercase()).collect()
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of the 0-10 scale a weight is worth
#[inline]
fn share(weight: f64) -> f64 {
    weight.max(0.0) / 10.0
}

/// Score a pair using the standard taxonomy
///
/// Total over any pair: absent optional attributes contribute zero.
pub fn calculate_match_score(
    reviewer: &Reviewer,
    item: &Item,
    current_load: u32,
    config: &MatchConfig,
) -> MatchScore {
    let taxonomy = Taxonomy::standard();
    score_profiles(
        reviewer,
        &ReviewerProfile::new(reviewer, taxonomy),
        item,
        &ItemProfile::new(item, taxonomy),
        current_load,
        config,
    )
}

/// Score a pair from pre-normalized profiles
///
/// Scoring formula (each term on a 0..weight/10 scale):
/// score = (
///     vertical * matched / max(1, item verticals) +
///     stage    * (item stage in preferred stages) +
///     region   * matched / max(1, item regions) +
///     thesis   * matched keywords / keywords +
///     load     * (1 - load / capacity), clamped at zero
/// )
pub fn score_profiles(
    reviewer: &Reviewer,
    reviewer_profile: &ReviewerProfile,
    item: &Item,
    item_profile: &ItemProfile,
    current_load: u32,
    config: &MatchConfig,
) -> MatchScore {
    // Vertical overlap
    let matched_verticals: Vec<&String> = item_profile
        .verticals
        .iter()
        .filter(|v| reviewer_profile.verticals.contains(&v.to_lowercase()))
        .collect();
    let vertical = share(config.vertical_weight) * matched_verticals.len() as f64
        / item_profile.verticals.len().max(1) as f64;

    // Stage is binary
    let matched_stage = item_profile
        .stage
        .as_ref()
        .filter(|s| reviewer_profile.stages.contains(&s.to_lowercase()));
    let stage = if matched_stage.is_some() {
        share(config.stage_weight)
    } else {
        0.0
    };

    // Region overlap, Global/Other matching everything
    let matched_regions: Vec<&String> = item_profile
        .regions
        .iter()
        .filter(|r| {
            reviewer_profile.wildcard_region
                || reviewer_profile.regions.contains(&r.to_lowercase())
        })
        .collect();
    let region = share(config.region_weight) * matched_regions.len() as f64
        / item_profile.regions.len().max(1) as f64;

    // Thesis keywords by substring containment
    let thesis = if reviewer_profile.keywords.is_empty() {
        0.0
    } else {
        let hits = reviewer_profile
            .keywords
            .iter()
            .filter(|k| item_profile.haystack.contains(k.as_str()))
            .count();
        share(config.thesis_weight) * hits as f64 / reviewer_profile.keywords.len() as f64
    };

    // Load penalty rewards under-loaded jurors
    let capacity = effective_capacity(reviewer, config.default_capacity) as f64;
    let max_load_share = share(config.load_penalty_weight);
    let load = (max_load_share * (1.0 - current_load as f64 / capacity))
        .max(0.0)
        .min(max_load_share);

    let components = ScoreComponents {
        vertical: round2(vertical),
        stage: round2(stage),
        region: round2(region),
        thesis: round2(thesis),
        load: round2(load),
    };

    MatchScore {
        reviewer_id: reviewer.id.clone(),
        item_id: item.id.clone(),
        total_score: round2(components.sum()),
        components,
        reason: build_reason(&matched_verticals, matched_stage, &matched_regions),
    }
}

/// Human-readable summary of matched criteria, in priority order
fn build_reason(verticals: &[&String], stage: Option<&String>, regions: &[&String]) -> String {
    let mut parts = Vec::new();

    if !verticals.is_empty() {
        parts.push(format!("Vertical: {}", join(verticals)));
    }
    if let Some(stage) = stage {
        parts.push(format!("Stage: {}", stage));
    }
    if !regions.is_empty() {
        parts.push(format!("Region: {}", join(regions)));
    }

    if parts.is_empty() {
        NO_STRONG_MATCH.to_string()
    } else {
        parts.join(" · ")
    }
}

fn join(labels: &[&String]) -> String {
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_reviewer() -> Reviewer {
        Reviewer {
            id: "r1".to_string(),
            name: "Reviewer One".to_string(),
            target_verticals: vec!["Fintech".to_string()],
            preferred_stages: vec!["Seed".to_string()],
            preferred_regions: vec!["Europe".to_string()],
            evaluation_limit: Some(4),
            thesis_keywords: vec![],
        }
    }

    fn create_test_item() -> Item {
        Item {
            id: "s1".to_string(),
            name: "Ledgerly".to_string(),
            verticals: vec!["Fintech".to_string()],
            stage: Some("Seed".to_string()),
            regions: vec!["Europe".to_string()],
            description: None,
        }
    }

    #[test]
    fn test_full_match_components() {
        let score = calculate_match_score(
            &create_test_reviewer(),
            &create_test_item(),
            0,
            &MatchConfig::default(),
        );

        assert_eq!(score.components.vertical, 4.0);
        assert_eq!(score.components.stage, 2.0);
        assert_eq!(score.components.region, 2.0);
        assert_eq!(score.components.thesis, 0.0);
        assert_eq!(score.components.load, 1.0);
        assert_eq!(score.total_score, 9.0);
        assert!(score.reason.contains("Fintech"));
        assert!(score.reason.contains("Seed"));
        assert!(score.reason.contains("Europe"));
    }

    #[test]
    fn test_aliases_match_after_normalization() {
        let mut reviewer = create_test_reviewer();
        reviewer.target_verticals = vec!["payments".to_string()];
        reviewer.preferred_regions = vec!["EMEA".to_string()];
        let mut item = create_test_item();
        item.verticals = vec!["FIN TECH".to_string(), "AI".to_string()];

        let score = calculate_match_score(&reviewer, &item, 0, &MatchConfig::default());

        assert_eq!(score.components.vertical, 2.0);
        assert_eq!(score.components.region, 2.0);
    }

    #[test]
    fn test_stage_is_binary() {
        let mut item = create_test_item();
        item.stage = Some("Series A".to_string());

        let score = calculate_match_score(&create_test_reviewer(), &item, 0, &MatchConfig::default());
        assert_eq!(score.components.stage, 0.0);
    }

    #[test]
    fn test_global_region_matches_everything() {
        let mut reviewer = create_test_reviewer();
        reviewer.preferred_regions = vec!["worldwide".to_string()];
        let mut item = create_test_item();
        item.regions = vec!["Asia".to_string(), "Africa".to_string()];

        let score = calculate_match_score(&reviewer, &item, 0, &MatchConfig::default());
        assert_eq!(score.components.region, 2.0);
        assert_eq!(score.reason, "Vertical: Fintech · Stage: Seed · Region: Asia, Africa");
    }

    #[test]
    fn test_thesis_keyword_fraction() {
        let mut reviewer = create_test_reviewer();
        reviewer.thesis_keywords = vec![
            "ledger".to_string(),
            "open banking".to_string(),
            "  ".to_string(),
        ];
        let mut item = create_test_item();
        item.description = Some("Cash management for SMEs".to_string());

        let score = calculate_match_score(&reviewer, &item, 0, &MatchConfig::default());
        // "ledger" is in the name, "open banking" appears nowhere
        assert_eq!(score.components.thesis, 0.5);
    }

    #[test]
    fn test_load_penalty_clamped_at_zero() {
        let config = MatchConfig::default();
        let reviewer = create_test_reviewer();
        let item = create_test_item();

        let half = calculate_match_score(&reviewer, &item, 2, &config);
        assert_eq!(half.components.load, 0.5);

        let over = calculate_match_score(&reviewer, &item, 9, &config);
        assert_eq!(over.components.load, 0.0);
        assert_eq!(over.total_score, 8.0);
    }

    #[test]
    fn test_missing_attributes_degrade_to_zero() {
        let reviewer = Reviewer {
            id: "r2".to_string(),
            name: "Blank".to_string(),
            target_verticals: vec![],
            preferred_stages: vec![],
            preferred_regions: vec![],
            evaluation_limit: None,
            thesis_keywords: vec![],
        };
        let item = Item {
            id: "s2".to_string(),
            name: "Nameless".to_string(),
            verticals: vec![],
            stage: None,
            regions: vec![],
            description: None,
        };

        let score = calculate_match_score(&reviewer, &item, 0, &MatchConfig::default());
        assert_eq!(score.total_score, 1.0);
        assert_eq!(score.reason, NO_STRONG_MATCH);
    }

    #[test]
    fn test_negative_weights_never_produce_negative_components() {
        let config = MatchConfig {
            vertical_weight: -40.0,
            ..MatchConfig::default()
        };

        let score = calculate_match_score(&create_test_reviewer(), &create_test_item(), 0, &config);
        assert_eq!(score.components.vertical, 0.0);
        assert!(score.total_score >= 0.0);
    }
}
