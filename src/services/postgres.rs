use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use thiserror::Error;
use crate::core::reconciler::{ApplyCounts, ApplyProgress, OperationGroup, ReconcileError, ReconciliationPlan};
use crate::models::{AssignmentKey, AssignmentStatus, Conflict, ExistingAssignment, Item, MatchConfig, Reviewer};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// PostgreSQL data access for jurors, startups, conflicts and assignments
///
/// Reads are round-scoped snapshots handed to the engine as plain values.
/// The only write path is [`PostgresClient::apply_plan`], which commits a
/// whole reconciliation plan in one transaction.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Startups taking part in a round
    ///
    /// A startup with no round list takes part in every round.
    pub async fn fetch_items(&self, round: &str) -> Result<Vec<Item>, PostgresError> {
        let query = r#"
            SELECT id, name, verticals, stage, regions, description
            FROM startups
            WHERE is_active
              AND (rounds IS NULL OR cardinality(rounds) = 0 OR $1 = ANY(rounds))
            ORDER BY id
        "#;

        let rows = sqlx::query(query).bind(round).fetch_all(&self.pool).await?;
        let items = rows.iter().map(item_from_row).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Round {} has {} startups", round, items.len());

        Ok(items)
    }

    /// Active jurors
    pub async fn fetch_reviewers(&self) -> Result<Vec<Reviewer>, PostgresError> {
        let query = r#"
            SELECT id, name, target_verticals, preferred_stages, preferred_regions,
                   evaluation_limit, thesis_keywords
            FROM jurors
            WHERE is_active
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let reviewers = rows.iter().map(reviewer_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(reviewers)
    }

    pub async fn fetch_conflicts(&self) -> Result<Vec<Conflict>, PostgresError> {
        let query = r#"
            SELECT juror_id, startup_id, conflict_type
            FROM conflicts
            ORDER BY juror_id, startup_id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<Conflict, PostgresError> {
                Ok(Conflict {
                    reviewer_id: row.try_get("juror_id")?,
                    item_id: row.try_get("startup_id")?,
                    conflict_type: row
                        .try_get::<Option<String>, _>("conflict_type")?
                        .unwrap_or_else(|| "declared".to_string()),
                })
            })
            .collect()
    }

    /// All assignment records for a round, cancelled ones included
    pub async fn fetch_assignments(&self, round: &str) -> Result<Vec<ExistingAssignment>, PostgresError> {
        let query = r#"
            SELECT id, juror_id, startup_id, round, status, meeting_scheduled_at, created_at
            FROM assignments
            WHERE round = $1
            ORDER BY created_at NULLS FIRST, id
        "#;

        let rows = sqlx::query(query).bind(round).fetch_all(&self.pool).await?;

        rows.iter().map(assignment_from_row).collect()
    }

    /// Stored matching config for a round, if any
    pub async fn fetch_match_config(&self, round: &str) -> Result<Option<MatchConfig>, PostgresError> {
        let query = r#"
            SELECT vertical_weight, stage_weight, region_weight, thesis_weight,
                   load_penalty_weight, target_reviewers_per_item, top_k_per_reviewer,
                   default_capacity, deterministic_seed
            FROM match_configs
            WHERE round = $1
        "#;

        let row = sqlx::query(query).bind(round).fetch_optional(&self.pool).await?;

        row.map(|row| -> Result<MatchConfig, PostgresError> {
            let defaults = MatchConfig::default();
            Ok(MatchConfig {
                vertical_weight: row.try_get("vertical_weight")?,
                stage_weight: row.try_get("stage_weight")?,
                region_weight: row.try_get("region_weight")?,
                thesis_weight: row.try_get("thesis_weight")?,
                load_penalty_weight: row.try_get("load_penalty_weight")?,
                target_reviewers_per_item: row
                    .try_get::<Option<i32>, _>("target_reviewers_per_item")?
                    .map(|v| v.max(0) as usize)
                    .unwrap_or(defaults.target_reviewers_per_item),
                top_k_per_reviewer: row
                    .try_get::<Option<i32>, _>("top_k_per_reviewer")?
                    .map(|v| v.max(0) as usize)
                    .unwrap_or(defaults.top_k_per_reviewer),
                default_capacity: row
                    .try_get::<Option<i32>, _>("default_capacity")?
                    .map(|v| v.max(1) as u32)
                    .unwrap_or(defaults.default_capacity),
                deterministic_seed: row
                    .try_get::<Option<i64>, _>("deterministic_seed")?
                    .map(|v| v as u64),
            })
        })
        .transpose()
    }

    /// Apply a reconciliation plan for a round in a single transaction
    ///
    /// Groups run insert, reactivate, cancel, delete, then removal of superseded
    /// duplicate rows. The first failing statement rolls the whole
    /// transaction back; the error names its group and reports nothing as
    /// applied.
    pub async fn apply_plan(
        &self,
        round: &str,
        plan: &ReconciliationPlan,
    ) -> Result<ApplyCounts, PostgresError> {
        let mut progress = ApplyProgress::new(plan);
        let mut tx = self.pool.begin().await?;

        for key in &plan.insert {
            if let Err(e) = insert_assignment(&mut tx, round, key).await {
                return Err(rollback(tx, progress.fail(OperationGroup::Insert, e)).await);
            }
            progress.record(OperationGroup::Insert);
        }

        for record in &plan.reactivate {
            if let Err(e) = set_status(&mut tx, round, record, AssignmentStatus::Pending).await {
                return Err(rollback(tx, progress.fail(OperationGroup::Reactivate, e)).await);
            }
            progress.record(OperationGroup::Reactivate);
        }

        for record in &plan.cancel {
            if let Err(e) = set_status(&mut tx, round, record, AssignmentStatus::Cancelled).await {
                return Err(rollback(tx, progress.fail(OperationGroup::Cancel, e)).await);
            }
            progress.record(OperationGroup::Cancel);
        }

        for record in &plan.delete {
            if let Err(e) = delete_assignment(&mut tx, round, record).await {
                return Err(rollback(tx, progress.fail(OperationGroup::Delete, e)).await);
            }
            progress.record(OperationGroup::Delete);
        }

        for record in &plan.superseded {
            if let Err(e) = delete_superseded(&mut tx, record).await {
                return Err(rollback(tx, progress.fail(OperationGroup::Superseded, e)).await);
            }
            progress.record(OperationGroup::Superseded);
        }

        tx.commit().await?;

        let applied = progress.applied();
        tracing::info!(
            "Applied reconciliation for round {}: kept={}, inserted={}, reactivated={}, cancelled={}, deleted={}, superseded={}",
            round,
            applied.kept,
            applied.inserted,
            applied.reactivated,
            applied.cancelled,
            applied.deleted,
            applied.superseded
        );

        Ok(applied)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

async fn rollback(tx: Transaction<'_, Postgres>, err: ReconcileError) -> PostgresError {
    tracing::error!("{}", err);
    if let Err(e) = tx.rollback().await {
        tracing::error!("Rollback after failed reconciliation also failed: {}", e);
    }
    PostgresError::Reconcile(err)
}

async fn insert_assignment(
    tx: &mut Transaction<'_, Postgres>,
    round: &str,
    key: &AssignmentKey,
) -> Result<(), sqlx::Error> {
    let query = r#"
        INSERT INTO assignments (id, round, startup_id, juror_id, status, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
    "#;

    sqlx::query(query)
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(round)
        .bind(&key.item_id)
        .bind(&key.reviewer_id)
        .bind(AssignmentStatus::Pending.as_str())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    round: &str,
    record: &ExistingAssignment,
    status: AssignmentStatus,
) -> Result<(), sqlx::Error> {
    let query = match record.id {
        Some(_) => "UPDATE assignments SET status = $1, updated_at = NOW() WHERE id = $2",
        None => r#"
            UPDATE assignments SET status = $1, updated_at = NOW()
            WHERE round = $2 AND startup_id = $3 AND juror_id = $4
        "#,
    };

    let statement = sqlx::query(query).bind(status.as_str());
    let statement = match &record.id {
        Some(id) => statement.bind(id),
        None => statement
            .bind(round)
            .bind(&record.item_id)
            .bind(&record.reviewer_id),
    };

    statement.execute(&mut **tx).await?;
    Ok(())
}

async fn delete_assignment(
    tx: &mut Transaction<'_, Postgres>,
    round: &str,
    record: &ExistingAssignment,
) -> Result<(), sqlx::Error> {
    let statement = match &record.id {
        Some(id) => sqlx::query("DELETE FROM assignments WHERE id = $1").bind(id),
        None => sqlx::query(
            "DELETE FROM assignments WHERE round = $1 AND startup_id = $2 AND juror_id = $3",
        )
        .bind(round)
        .bind(&record.item_id)
        .bind(&record.reviewer_id),
    };

    statement.execute(&mut **tx).await?;
    Ok(())
}

/// Remove one duplicate row; only rows with an id reach this path
async fn delete_superseded(
    tx: &mut Transaction<'_, Postgres>,
    record: &ExistingAssignment,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(record.id.as_deref())
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn item_from_row(row: &PgRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        verticals: row.try_get::<Option<Vec<String>>, _>("verticals")?.unwrap_or_default(),
        stage: row.try_get("stage")?,
        regions: row.try_get::<Option<Vec<String>>, _>("regions")?.unwrap_or_default(),
        description: row.try_get("description")?,
    })
}

fn reviewer_from_row(row: &PgRow) -> Result<Reviewer, sqlx::Error> {
    Ok(Reviewer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        target_verticals: row.try_get::<Option<Vec<String>>, _>("target_verticals")?.unwrap_or_default(),
        preferred_stages: row.try_get::<Option<Vec<String>>, _>("preferred_stages")?.unwrap_or_default(),
        preferred_regions: row.try_get::<Option<Vec<String>>, _>("preferred_regions")?.unwrap_or_default(),
        evaluation_limit: row
            .try_get::<Option<i32>, _>("evaluation_limit")?
            .filter(|limit| *limit > 0)
            .map(|limit| limit as u32),
        thesis_keywords: row.try_get::<Option<Vec<String>>, _>("thesis_keywords")?.unwrap_or_default(),
    })
}

fn assignment_from_row(row: &PgRow) -> Result<ExistingAssignment, PostgresError> {
    Ok(ExistingAssignment {
        id: row.try_get("id")?,
        reviewer_id: row.try_get("juror_id")?,
        item_id: row.try_get("startup_id")?,
        round: row.try_get("round")?,
        status: row
            .try_get::<Option<String>, _>("status")?
            .map(|raw| AssignmentStatus::parse(&raw)),
        meeting_scheduled_at: row.try_get("meeting_scheduled_at")?,
        created_at: row.try_get("created_at")?,
    })
}
