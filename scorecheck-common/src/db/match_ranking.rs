//! Writes to the match ranking store
//!
//! Reads are owned by the tie-break provider in the results checker; this
//! module only seeds history.

use chrono::Utc;
use sqlx::SqlitePool;

use super::models::MatchRankingRecord;
use crate::{Error, Result};

const UPSERT_MATCH_RANKING: &str = r#"
    INSERT INTO match_ranking
        (war_id, team_name, stage, rank, ingame_rank, kill_pts, place_pts, total_pts,
         created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (war_id, team_name) DO UPDATE SET
        stage = excluded.stage,
        rank = excluded.rank,
        ingame_rank = excluded.ingame_rank,
        kill_pts = excluded.kill_pts,
        place_pts = excluded.place_pts,
        total_pts = excluded.total_pts,
        updated_at = excluded.updated_at
"#;

fn validate(record: &MatchRankingRecord) -> Result<()> {
    if record.war_id.trim().is_empty() || record.team_name.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "match ranking record requires war_id and team_name (got war_id={:?}, team_name={:?})",
            record.war_id, record.team_name
        )));
    }
    Ok(())
}

/// Insert or update one record, keyed by `(war_id, team_name)`
pub async fn insert_match_ranking(pool: &SqlitePool, record: &MatchRankingRecord) -> Result<()> {
    import_match_rankings(pool, std::slice::from_ref(record)).await?;
    Ok(())
}

/// Upsert a batch of records in one transaction, returning the count written
///
/// Nothing is written if any record fails validation.
pub async fn import_match_rankings(
    pool: &SqlitePool,
    records: &[MatchRankingRecord],
) -> Result<usize> {
    for record in records {
        validate(record)?;
    }

    let mut tx = pool.begin().await?;
    for record in records {
        sqlx::query(UPSERT_MATCH_RANKING)
            .bind(&record.war_id)
            .bind(&record.team_name)
            .bind(record.stage)
            .bind(record.rank)
            .bind(record.ingame_rank)
            .bind(record.kill_pts)
            .bind(record.place_pts)
            .bind(record.total_pts)
            .bind(record.created_at)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::debug!(count = records.len(), "Upserted match ranking records");
    Ok(records.len())
}
