use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{reconcile, GenerationOutcome, SuggestionEngine};
use crate::models::{
    AssignmentKey, ConfirmAssignmentsRequest, ConfirmResponse, ErrorResponse,
    GenerateSuggestionsRequest, HealthResponse, MatchConfig, Participant, ParticipantsResponse,
    PreviewSuggestionsRequest, ReconcileErrorResponse, RoundKind, RoundSnapshot,
    SuggestionsResponse,
};
use crate::services::{PostgresClient, PostgresError, RoundConfigCache};
use std::sync::Arc;

/// Engine state shared by every handler
#[derive(Clone)]
pub struct EngineState {
    pub engine: SuggestionEngine,
    pub defaults: MatchConfig,
}

/// Storage-backed state for round endpoints
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub configs: RoundConfigCache,
}

pub const WARN_CONFLICTS_UNAVAILABLE: &str =
    "Conflicts could not be loaded; suggestions may not reflect existing conflicts";
pub const WARN_ASSIGNMENTS_UNAVAILABLE: &str =
    "Existing assignments could not be loaded; suggestions may include already assigned pairs";

/// Routes that only need the engine
pub fn configure_engine(cfg: &mut web::ServiceConfig) {
    cfg.route("/suggestions/preview", web::post().to(preview_suggestions));
}

/// Routes backed by PostgreSQL
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/rounds/{round}/suggestions", web::post().to(generate_suggestions))
        .route("/rounds/{round}/confirm", web::post().to(confirm_assignments))
        .route("/rounds/{round}/participants", web::get().to(list_participants));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

/// Run a generation pass off the async reactor
async fn run_engine(engine: SuggestionEngine, snapshot: RoundSnapshot) -> Result<GenerationOutcome, HttpResponse> {
    web::block(move || engine.generate(&snapshot))
        .await
        .map_err(|e| {
            tracing::error!("Suggestion generation aborted: {}", e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Suggestion generation failed",
                e.to_string(),
            )
        })
}

fn suggestions_response(outcome: GenerationOutcome, warnings: Vec<String>) -> SuggestionsResponse {
    SuggestionsResponse {
        round: outcome.round,
        suggestions: outcome.suggestions,
        exclusions: outcome.exclusions,
        coverage_gaps: outcome.coverage_gaps,
        seed: outcome.seed,
        warnings,
        generated_at: chrono::Utc::now(),
    }
}

fn weight_warning(config: &MatchConfig) -> Option<String> {
    let sum = config.weight_sum();
    if (sum - 100.0).abs() > 1e-6 {
        tracing::warn!("Matching weights sum to {} instead of 100", sum);
        Some(format!("Matching weights sum to {} instead of 100; scores are not on a 0-10 scale", sum))
    } else {
        None
    }
}

/// Score a round supplied in the request body
///
/// POST /api/v1/suggestions/preview
async fn preview_suggestions(
    state: web::Data<EngineState>,
    req: web::Json<PreviewSuggestionsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let req = req.into_inner();
    let mut warnings = Vec::new();
    let config = req.config.unwrap_or_else(|| state.defaults.clone());
    warnings.extend(weight_warning(&config));

    let snapshot = RoundSnapshot {
        round: req.round,
        items: req.items,
        reviewers: req.reviewers,
        conflicts: req.conflicts,
        assignments: req.assignments,
        config,
    };

    match run_engine(state.engine.clone(), snapshot).await {
        Ok(outcome) => HttpResponse::Ok().json(suggestions_response(outcome, warnings)),
        Err(response) => response,
    }
}

/// Load the round config: cache, then database, then defaults
async fn load_config(
    state: &AppState,
    defaults: &MatchConfig,
    round: &str,
    warnings: &mut Vec<String>,
) -> MatchConfig {
    if let Some(config) = state.configs.get(round).await {
        return config;
    }

    match state.postgres.fetch_match_config(round).await {
        Ok(Some(config)) => {
            state.configs.insert(round, config.clone()).await;
            config
        }
        Ok(None) => {
            tracing::info!("No matching config stored for round {}, using defaults", round);
            warnings.push(format!("No matching config for round {}; using defaults", round));
            defaults.clone()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch matching config for {}: {}", round, e);
            warnings.push(format!("Matching config for round {} could not be loaded; using defaults", round));
            defaults.clone()
        }
    }
}

/// Fetch everything the engine needs for one round
///
/// Startups and jurors are required. Conflicts and assignments degrade to
/// empty lists with an operator-visible warning.
async fn load_snapshot(
    state: &AppState,
    defaults: &MatchConfig,
    round: &str,
) -> Result<(RoundSnapshot, Vec<String>), PostgresError> {
    let mut warnings = Vec::new();
    let config = load_config(state, defaults, round, &mut warnings).await;
    warnings.extend(weight_warning(&config));

    let items = state.postgres.fetch_items(round).await?;
    let reviewers = state.postgres.fetch_reviewers().await?;

    let conflicts = match state.postgres.fetch_conflicts().await {
        Ok(conflicts) => conflicts,
        Err(e) => {
            tracing::warn!("Failed to fetch conflicts, proceeding without them: {}", e);
            warnings.push(WARN_CONFLICTS_UNAVAILABLE.to_string());
            vec![]
        }
    };

    let assignments = match state.postgres.fetch_assignments(round).await {
        Ok(assignments) => assignments,
        Err(e) => {
            tracing::warn!("Failed to fetch assignments for {}, proceeding without them: {}", round, e);
            warnings.push(WARN_ASSIGNMENTS_UNAVAILABLE.to_string());
            vec![]
        }
    };

    let snapshot = RoundSnapshot {
        round: round.to_string(),
        items,
        reviewers,
        conflicts,
        assignments,
        config,
    };

    Ok((snapshot, warnings))
}

/// Generate suggestions for a stored round
///
/// POST /api/v1/rounds/{round}/suggestions
///
/// Request body (all fields optional):
/// ```json
/// {
///   "top_k": 5,
///   "reviewer_ids": ["string"]
/// }
/// ```
async fn generate_suggestions(
    state: web::Data<AppState>,
    engine: web::Data<EngineState>,
    round: web::Path<String>,
    req: Option<web::Json<GenerateSuggestionsRequest>>,
) -> impl Responder {
    let round = round.into_inner();
    let req = req.map(|r| r.into_inner()).unwrap_or_default();

    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let (mut snapshot, warnings) = match load_snapshot(&state, &engine.defaults, &round).await {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load round {}: {}", round, e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load round data",
                e.to_string(),
            );
        }
    };

    if let Some(top_k) = req.top_k {
        snapshot.config.top_k_per_reviewer = top_k as usize;
    }
    if !req.reviewer_ids.is_empty() {
        snapshot.reviewers.retain(|r| req.reviewer_ids.contains(&r.id));
    }

    tracing::info!(
        "Generating suggestions for round {}: {} jurors x {} startups",
        round,
        snapshot.reviewers.len(),
        snapshot.items.len()
    );

    match run_engine(engine.engine.clone(), snapshot).await {
        Ok(outcome) => HttpResponse::Ok().json(suggestions_response(outcome, warnings)),
        Err(response) => response,
    }
}

/// Commit an operator-approved assignment set
///
/// POST /api/v1/rounds/{round}/confirm
///
/// Request body:
/// ```json
/// {
///   "assignments": [{ "item_id": "string", "reviewer_id": "string" }]
/// }
/// ```
async fn confirm_assignments(
    state: web::Data<AppState>,
    round: web::Path<String>,
    req: web::Json<ConfirmAssignmentsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let round = round.into_inner();

    // The diff needs the persisted set; no empty fallback here
    let existing = match state.postgres.fetch_assignments(&round).await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::error!("Failed to fetch assignments for {}: {}", round, e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch existing assignments",
                e.to_string(),
            );
        }
    };

    let desired: Vec<AssignmentKey> = req
        .assignments
        .iter()
        .map(|pair| AssignmentKey::new(&pair.item_id, &pair.reviewer_id))
        .collect();

    let plan = reconcile(&desired, &existing, RoundKind::from_round_name(&round));

    match state.postgres.apply_plan(&round, &plan).await {
        Ok(applied) => HttpResponse::Ok().json(ConfirmResponse {
            round,
            applied,
            duplicates_removed: plan.duplicates_removed,
        }),
        Err(PostgresError::Reconcile(err)) => {
            HttpResponse::InternalServerError().json(ReconcileErrorResponse {
                error: "Reconciliation failed".to_string(),
                message: err.to_string(),
                status_code: 500,
                group: err.group.to_string(),
                applied: err.applied,
                failed: err.failed,
                attempted_before_failure: err.attempted_before_failure,
            })
        }
        Err(e) => {
            tracing::error!("Failed to apply assignments for {}: {}", round, e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to apply assignments",
                e.to_string(),
            )
        }
    }
}

/// Jurors and startups of a round
///
/// GET /api/v1/rounds/{round}/participants
async fn list_participants(
    state: web::Data<AppState>,
    round: web::Path<String>,
) -> impl Responder {
    let round = round.into_inner();

    let loaded = async {
        let reviewers = state.postgres.fetch_reviewers().await?;
        let items = state.postgres.fetch_items(&round).await?;
        Ok::<_, PostgresError>((reviewers, items))
    }
    .await;

    match loaded {
        Ok((reviewers, items)) => {
            let participants: Vec<Participant> = reviewers
                .into_iter()
                .map(Participant::Juror)
                .chain(items.into_iter().map(Participant::Startup))
                .collect();

            HttpResponse::Ok().json(ParticipantsResponse { round, participants })
        }
        Err(e) => {
            tracing::error!("Failed to fetch participants for {}: {}", round, e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch participants",
                e.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use crate::models::{Item, Reviewer};

    fn engine_state() -> web::Data<EngineState> {
        web::Data::new(EngineState {
            engine: SuggestionEngine::default(),
            defaults: MatchConfig::default(),
        })
    }

    fn preview_body() -> PreviewSuggestionsRequest {
        PreviewSuggestionsRequest {
            round: "screening".to_string(),
            items: vec![Item {
                id: "s1".to_string(),
                name: "Ledgerly".to_string(),
                verticals: vec!["Fintech".to_string()],
                stage: Some("Seed".to_string()),
                regions: vec!["Europe".to_string()],
                description: None,
            }],
            reviewers: vec![Reviewer {
                id: "r1".to_string(),
                name: "Ada".to_string(),
                target_verticals: vec!["fintech".to_string()],
                preferred_stages: vec!["seed".to_string()],
                preferred_regions: vec!["eu".to_string()],
                evaluation_limit: Some(4),
                thesis_keywords: vec![],
            }],
            conflicts: vec![],
            assignments: vec![],
            config: None,
        }
    }

    #[actix_web::test]
    async fn test_preview_returns_ranked_suggestions() {
        let app = test::init_service(
            App::new()
                .app_data(engine_state())
                .service(web::scope("/api/v1").configure(configure_engine)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/suggestions/preview")
            .set_json(preview_body())
            .to_request();
        let body: SuggestionsResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.round, "screening");
        assert_eq!(body.suggestions.len(), 1);
        assert_eq!(body.suggestions[0].suggestions[0].score.total_score, 9.0);
        assert!(body.warnings.is_empty());
    }

    #[actix_web::test]
    async fn test_preview_rejects_blank_round() {
        let app = test::init_service(
            App::new()
                .app_data(engine_state())
                .service(web::scope("/api/v1").configure(configure_engine)),
        )
        .await;

        let mut body = preview_body();
        body.round = String::new();
        let req = test::TestRequest::post()
            .uri("/api/v1/suggestions/preview")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[::core::prelude::v1::test]
    fn test_weight_warning_only_when_sum_differs() {
        assert!(weight_warning(&MatchConfig::default()).is_none());

        let skewed = MatchConfig {
            vertical_weight: 60.0,
            ..MatchConfig::default()
        };
        assert!(weight_warning(&skewed).is_some());
    }
}
