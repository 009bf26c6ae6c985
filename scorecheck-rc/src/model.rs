//! Result documents and discrepancy records
//!
//! `GameResult` is produced once per check by the extractor and mutated in
//! place only by the reconciler (`final_ranking`, `tiebreak_stats`).
//! `ErrorList` is the reconciler's output.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::extractor::ExtractError;

// ============================================================================
// Extracted results
// ============================================================================

/// One player's line on the results screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub player_name: String,
    pub elims: i64,
}

/// Aggregates over a team's match history within one stage
///
/// All zero means either "no history" or "lookup failed"; the two are not
/// distinguished. `stage_total_kill` is carried but does not take part in
/// ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieBreakStats {
    #[serde(default)]
    pub wwcd_count: i64,
    #[serde(default)]
    pub stage_total_kill: i64,
    #[serde(default)]
    pub stage_max_single_match_pts: i64,
    #[serde(default)]
    pub stage_max_single_match_kill: i64,
    #[serde(default)]
    pub last_match_total_pts: i64,
    #[serde(default)]
    pub last_match_total_kill: i64,
    #[serde(default)]
    pub last_match_place_pts: i64,
}

impl TieBreakStats {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// One team's block on the results screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResult {
    pub team_name: String,
    /// In-game placement, 1 = winner
    pub ranking: i64,
    /// Expected to equal the sum of player elims; not enforced
    pub total_elims: i64,
    #[serde(default)]
    pub players: Vec<PlayerResult>,
    /// Assigned by the reconciler; 0 until then
    #[serde(default)]
    pub final_ranking: u32,
    /// Populated by the reconciler
    #[serde(default)]
    pub tiebreak_stats: TieBreakStats,
}

impl TeamResult {
    pub fn new(team_name: impl Into<String>, ranking: i64, total_elims: i64) -> Self {
        Self {
            team_name: team_name.into(),
            ranking,
            total_elims,
            players: Vec::new(),
            final_ranking: 0,
            tiebreak_stats: TieBreakStats::default(),
        }
    }

    pub fn player_elims_sum(&self) -> i64 {
        self.players.iter().map(|p| p.elims).sum()
    }
}

/// Root document for one game
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub teams: Vec<TeamResult>,
}

impl GameResult {
    /// Structural checks on an extracted document
    ///
    /// Rejects empty documents, blank or duplicate team names, placements
    /// below 1 and negative elimination counts. A `total_elims` that differs
    /// from the player sum is only logged.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.teams.is_empty() {
            return Err(ExtractError::Invalid("no teams in extracted result".to_string()));
        }

        let mut seen = HashSet::new();
        for team in &self.teams {
            if team.team_name.trim().is_empty() {
                return Err(ExtractError::Invalid("team with empty name".to_string()));
            }
            if !seen.insert(team.team_name.as_str()) {
                return Err(ExtractError::Invalid(format!(
                    "duplicate team name '{}'",
                    team.team_name
                )));
            }
            if team.ranking < 1 {
                return Err(ExtractError::Invalid(format!(
                    "team '{}' has in-game ranking {}",
                    team.team_name, team.ranking
                )));
            }
            if team.total_elims < 0 || team.players.iter().any(|p| p.elims < 0) {
                return Err(ExtractError::Invalid(format!(
                    "team '{}' has negative eliminations",
                    team.team_name
                )));
            }

            let player_sum = team.player_elims_sum();
            if !team.players.is_empty() && player_sum != team.total_elims {
                tracing::debug!(
                    team = %team.team_name,
                    total_elims = team.total_elims,
                    player_sum,
                    "Team elims differ from player sum"
                );
            }
        }

        Ok(())
    }
}

// ============================================================================
// Authority
// ============================================================================

/// One team's entry in the authoritative ranking list
///
/// The list is ordered; position i carries the authority's claimed rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    pub team_name: String,
    pub rank: i64,
    pub ingame_rank: i64,
    pub kill_pts: i64,
}

// ============================================================================
// Discrepancies
// ============================================================================

/// Kind of discrepancy; serialized as 1, 2 or 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ErrorType {
    /// Team sits at a different final position than the authority claims
    FinalRanking,
    /// In-game placement differs
    IngameRanking,
    /// Team elimination total differs
    TotalElims,
}

impl From<ErrorType> for u8 {
    fn from(value: ErrorType) -> Self {
        match value {
            ErrorType::FinalRanking => 1,
            ErrorType::IngameRanking => 2,
            ErrorType::TotalElims => 3,
        }
    }
}

impl TryFrom<u8> for ErrorType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::FinalRanking),
            2 => Ok(Self::IngameRanking),
            3 => Ok(Self::TotalElims),
            other => Err(format!("unknown error_type {}", other)),
        }
    }
}

/// Integer or free-text value carried in a discrepancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Int(i64),
    Text(String),
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for DataValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A detected discrepancy between the authority and the screenshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataError {
    pub error_type: ErrorType,
    pub team: String,
    /// Value claimed by the authority
    pub original_data: DataValue,
    /// Value derived from the results screen
    pub correct_data: DataValue,
}

impl DataError {
    pub fn new(
        error_type: ErrorType,
        team: impl Into<String>,
        original_data: impl Into<DataValue>,
        correct_data: impl Into<DataValue>,
    ) -> Self {
        Self {
            error_type,
            team: team.into(),
            original_data: original_data.into(),
            correct_data: correct_data.into(),
        }
    }
}

/// Ordered discrepancy list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    pub errors: Vec<DataError>,
}

impl ErrorList {
    pub fn push(&mut self, error: DataError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn count_of(&self, error_type: ErrorType) -> usize {
        self.errors.iter().filter(|e| e.error_type == error_type).count()
    }
}
