//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One team's result in one match, as recorded by the scoring system
///
/// Rows of `match_ranking` are the history the tie-break cascade
/// aggregates over, scoped by `(team_name, stage)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRankingRecord {
    /// Match (battlefield) identifier
    pub war_id: String,
    pub team_name: String,
    pub stage: i64,
    /// Final rank within the match after scoring
    #[serde(default)]
    pub rank: i64,
    /// Survival placement reported by the game client
    pub ingame_rank: i64,
    #[serde(default)]
    pub kill_pts: i64,
    #[serde(default)]
    pub place_pts: i64,
    #[serde(default)]
    pub total_pts: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
