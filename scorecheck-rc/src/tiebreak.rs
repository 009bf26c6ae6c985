//! Tie-break data provider
//!
//! Computes a team's seven tie-break aggregates for one stage from the
//! match ranking history. The store is an interface so any backend can
//! serve it; `SqliteTieBreakStore` is the production binding.
//!
//! Store failures and timeouts are absorbed here: the affected team gets
//! all-zero stats and a warning is logged. Only invalid arguments propagate.

use async_trait::async_trait;
use futures::future::join_all;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CheckError, CheckResult};
use crate::model::TieBreakStats;

/// Read-only access to per-team stage aggregates
#[async_trait]
pub trait TieBreakStore: Send + Sync {
    /// Raw lookup; errors are reported, not absorbed
    async fn query_stats(&self, team_name: &str, stage: i64) -> scorecheck_common::Result<TieBreakStats>;
}

/// `match_ranking`-backed store
#[derive(Clone)]
pub struct SqliteTieBreakStore {
    pool: SqlitePool,
}

impl SqliteTieBreakStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TieBreakStore for SqliteTieBreakStore {
    async fn query_stats(&self, team_name: &str, stage: i64) -> scorecheck_common::Result<TieBreakStats> {
        let (wwcd_count, stage_total_kill, stage_max_single_match_pts, stage_max_single_match_kill): (
            i64,
            i64,
            Option<i64>,
            Option<i64>,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(CASE WHEN ingame_rank = 1 THEN 1 END),
                COALESCE(SUM(kill_pts), 0),
                MAX(total_pts),
                MAX(kill_pts)
            FROM match_ranking
            WHERE team_name = ? AND stage = ?
            "#,
        )
        .bind(team_name)
        .bind(stage)
        .fetch_one(&self.pool)
        .await?;

        let last_match: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT total_pts, kill_pts, place_pts
            FROM match_ranking
            WHERE team_name = ? AND stage = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(team_name)
        .bind(stage)
        .fetch_optional(&self.pool)
        .await?;

        let (last_match_total_pts, last_match_total_kill, last_match_place_pts) =
            last_match.unwrap_or_default();

        Ok(TieBreakStats {
            wwcd_count,
            stage_total_kill,
            stage_max_single_match_pts: stage_max_single_match_pts.unwrap_or(0),
            stage_max_single_match_kill: stage_max_single_match_kill.unwrap_or(0),
            last_match_total_pts,
            last_match_total_kill,
            last_match_place_pts,
        })
    }
}

/// Tie-break lookups with validation, a deadline, and degrade-to-zero
#[derive(Clone)]
pub struct TieBreakProvider {
    store: Arc<dyn TieBreakStore>,
    timeout: Duration,
}

impl TieBreakProvider {
    pub fn new(store: Arc<dyn TieBreakStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Stats for `(team_name, stage)`
    ///
    /// # Errors
    /// `InvalidArgument` for a blank team name; every stage value is a valid
    /// scope. Store errors and timeouts yield `TieBreakStats::default()`.
    pub async fn get_tiebreak_stats(&self, team_name: &str, stage: i64) -> CheckResult<TieBreakStats> {
        if team_name.trim().is_empty() {
            return Err(CheckError::InvalidArgument(
                "tie-break lookup requires a team name".to_string(),
            ));
        }

        match tokio::time::timeout(self.timeout, self.store.query_stats(team_name, stage)).await {
            Ok(Ok(stats)) => {
                debug!(team = %team_name, stage, ?stats, "Tie-break stats loaded");
                Ok(stats)
            }
            Ok(Err(e)) => {
                warn!(team = %team_name, stage, error = %e, "Tie-break lookup failed, using zeroed stats");
                Ok(TieBreakStats::default())
            }
            Err(_) => {
                warn!(
                    team = %team_name,
                    stage,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Tie-break lookup timed out, using zeroed stats"
                );
                Ok(TieBreakStats::default())
            }
        }
    }

    /// Concurrent lookups for several teams, results in input order
    ///
    /// Each team degrades independently; the first invalid argument fails
    /// the whole batch.
    pub async fn get_many(&self, team_names: &[&str], stage: i64) -> CheckResult<Vec<TieBreakStats>> {
        join_all(
            team_names
                .iter()
                .map(|name| self.get_tiebreak_stats(name, stage)),
        )
        .await
        .into_iter()
        .collect()
    }
}
