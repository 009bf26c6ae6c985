//! Database initialization
//!
//! Opens (or creates) the scorecheck SQLite database and makes sure the
//! tie-break store schema exists. All table creation is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets concurrent tie-break readers proceed alongside history imports
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_match_ranking_table(&pool).await?;

    Ok(pool)
}

/// Create the per-match ranking table backing tie-break lookups
pub async fn create_match_ranking_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_ranking (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            war_id TEXT NOT NULL,
            team_name TEXT NOT NULL DEFAULT '',
            stage INTEGER NOT NULL DEFAULT 0,
            rank INTEGER NOT NULL DEFAULT 0,
            ingame_rank INTEGER NOT NULL DEFAULT 0,
            kill_pts INTEGER NOT NULL DEFAULT 0,
            place_pts INTEGER NOT NULL DEFAULT 0,
            total_pts INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (war_id, team_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_match_ranking_team_stage
         ON match_ranking (team_name, stage)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
