//! Ranking resolution and discrepancy detection
//!
//! `Reconciler::reconcile` ranks an extracted game (tie-break lookup, stable
//! descending sort, position assignment) and then walks the ranked teams and
//! the authority list in lock-step by position:
//!
//! - names differ at position i: a final-ranking error for the authority's
//!   team, then the out-of-place team's placement and elims are compared
//!   against its own authority record
//! - names agree: placement and elims are compared directly
//!
//! Both lists must hold the same set of teams. That is checked up front and
//! reported as `CheckError::RosterMismatch`.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{CheckError, CheckResult};
use crate::model::{AuthorityRecord, DataError, ErrorList, ErrorType, GameResult, TeamResult};
use crate::scoring::{assign_positions, sort_by_ranking};
use crate::tiebreak::TieBreakProvider;

pub struct Reconciler {
    tiebreak: TieBreakProvider,
}

impl Reconciler {
    pub fn new(tiebreak: TieBreakProvider) -> Self {
        Self { tiebreak }
    }

    /// Populate `tiebreak_stats` and `final_ranking` for every team
    ///
    /// On return `game.teams` is in final order and `final_ranking` is the
    /// 1-based position.
    pub async fn resolve_rankings(&self, game: &mut GameResult, stage: i64) -> CheckResult<()> {
        let names: Vec<&str> = game.teams.iter().map(|t| t.team_name.as_str()).collect();
        let stats = self.tiebreak.get_many(&names, stage).await?;

        // Provisional positions in extracted order; overwritten below
        assign_positions(&mut game.teams);
        for (team, stats) in game.teams.iter_mut().zip(stats) {
            team.tiebreak_stats = stats;
        }

        sort_by_ranking(&mut game.teams);
        assign_positions(&mut game.teams);

        debug!(
            stage,
            order = ?game.teams.iter().map(|t| t.team_name.as_str()).collect::<Vec<_>>(),
            "Rankings resolved"
        );
        Ok(())
    }

    /// Rank `game` and diff it against `authority`
    pub async fn reconcile(
        &self,
        game: &mut GameResult,
        stage: i64,
        authority: &[AuthorityRecord],
    ) -> CheckResult<ErrorList> {
        self.resolve_rankings(game, stage).await?;
        check_roster(&game.teams, authority)?;
        let errors = diff_against_authority(&game.teams, authority)?;

        info!(
            stage,
            teams = game.teams.len(),
            errors = errors.len(),
            "Reconciliation complete"
        );
        Ok(errors)
    }
}

/// Both lists must contain exactly the same team names
pub fn check_roster(teams: &[TeamResult], authority: &[AuthorityRecord]) -> CheckResult<()> {
    let computed: HashSet<&str> = teams.iter().map(|t| t.team_name.as_str()).collect();
    let claimed: HashSet<&str> = authority.iter().map(|a| a.team_name.as_str()).collect();

    if teams.len() == authority.len() && computed == claimed && claimed.len() == authority.len() {
        return Ok(());
    }

    let mut missing: Vec<&str> = computed.difference(&claimed).copied().collect();
    let mut extra: Vec<&str> = claimed.difference(&computed).copied().collect();
    missing.sort_unstable();
    extra.sort_unstable();

    let detail = if missing.is_empty() && extra.is_empty() {
        "duplicate team names".to_string()
    } else {
        format!("absent from authority: {:?}; unknown to screenshots: {:?}", missing, extra)
    };

    Err(CheckError::RosterMismatch {
        computed: teams.len(),
        authority: authority.len(),
        detail,
    })
}

/// Position-by-position comparison of ranked teams against the authority
///
/// `teams` must already be in final order.
pub fn diff_against_authority(
    teams: &[TeamResult],
    authority: &[AuthorityRecord],
) -> CheckResult<ErrorList> {
    let mut errors = ErrorList::default();

    for (index, computed) in teams.iter().enumerate() {
        let claimed = authority.get(index).ok_or_else(|| CheckError::RosterMismatch {
            computed: teams.len(),
            authority: authority.len(),
            detail: format!("no authority record at position {}", index + 1),
        })?;

        if computed.team_name != claimed.team_name {
            let correct = find_team(teams, &claimed.team_name)?;
            errors.push(DataError::new(
                ErrorType::FinalRanking,
                &claimed.team_name,
                claimed.rank,
                correct.final_ranking,
            ));

            let own_record = find_record(authority, &computed.team_name)?;
            compare_fields(computed, own_record, &claimed.team_name, &mut errors);
        } else {
            compare_fields(computed, claimed, &claimed.team_name, &mut errors);
        }
    }

    Ok(errors)
}

/// Placement and elimination checks, labelled with `team_label`
fn compare_fields(
    computed: &TeamResult,
    record: &AuthorityRecord,
    team_label: &str,
    errors: &mut ErrorList,
) {
    if computed.ranking != record.ingame_rank {
        errors.push(DataError::new(
            ErrorType::IngameRanking,
            team_label,
            record.ingame_rank,
            computed.ranking,
        ));
    }
    if computed.total_elims != record.kill_pts {
        errors.push(DataError::new(
            ErrorType::TotalElims,
            team_label,
            record.kill_pts,
            computed.total_elims,
        ));
    }
}

fn find_team<'a>(teams: &'a [TeamResult], team_name: &str) -> CheckResult<&'a TeamResult> {
    teams
        .iter()
        .find(|t| t.team_name == team_name)
        .ok_or_else(|| CheckError::NotFound(format!("team '{}' not in extracted results", team_name)))
}

fn find_record<'a>(authority: &'a [AuthorityRecord], team_name: &str) -> CheckResult<&'a AuthorityRecord> {
    authority
        .iter()
        .find(|a| a.team_name == team_name)
        .ok_or_else(|| CheckError::NotFound(format!("team '{}' not in authority ranking", team_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(name: &str, ranking: i64, elims: i64, position: u32) -> TeamResult {
        let mut team = TeamResult::new(name, ranking, elims);
        team.final_ranking = position;
        team
    }

    fn record(name: &str, rank: i64, ingame_rank: i64, kill_pts: i64) -> AuthorityRecord {
        AuthorityRecord {
            team_name: name.to_string(),
            rank,
            ingame_rank,
            kill_pts,
        }
    }

    #[test]
    fn test_matching_lists_produce_no_errors() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("A", 1, 1, 5), record("B", 2, 2, 3)];

        let errors = diff_against_authority(&teams, &authority).unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_swapped_order_reports_both_positions() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("B", 1, 2, 3), record("A", 2, 1, 5)];

        let errors = diff_against_authority(&teams, &authority).unwrap();
        assert_eq!(
            errors.errors,
            vec![
                DataError::new(ErrorType::FinalRanking, "B", 1i64, 2u32),
                DataError::new(ErrorType::FinalRanking, "A", 2i64, 1u32),
            ]
        );
    }

    #[test]
    fn test_aligned_team_field_mismatches() {
        let teams = vec![ranked("A", 1, 6, 1)];
        let authority = vec![record("A", 1, 2, 4)];

        let errors = diff_against_authority(&teams, &authority).unwrap();
        assert_eq!(
            errors.errors,
            vec![
                DataError::new(ErrorType::IngameRanking, "A", 2i64, 1i64),
                DataError::new(ErrorType::TotalElims, "A", 4i64, 6i64),
            ]
        );
    }

    #[test]
    fn test_out_of_place_team_checked_against_own_record() {
        // A sits at position 0 but the authority puts B there and also
        // recorded the wrong kills for A
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("B", 1, 2, 3), record("A", 2, 1, 2)];

        let errors = diff_against_authority(&teams, &authority).unwrap();
        assert_eq!(
            errors.errors,
            vec![
                DataError::new(ErrorType::FinalRanking, "B", 1i64, 2u32),
                DataError::new(ErrorType::TotalElims, "B", 2i64, 5i64),
                DataError::new(ErrorType::FinalRanking, "A", 2i64, 1u32),
            ]
        );
        assert_eq!(errors.count_of(ErrorType::TotalElims), 1);
    }

    #[test]
    fn test_out_of_place_team_placement_labelled_with_authority_team() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("B", 1, 2, 3), record("A", 2, 3, 5)];

        let errors = diff_against_authority(&teams, &authority).unwrap();
        assert_eq!(
            errors.errors,
            vec![
                DataError::new(ErrorType::FinalRanking, "B", 1i64, 2u32),
                DataError::new(ErrorType::IngameRanking, "B", 3i64, 1i64),
                DataError::new(ErrorType::FinalRanking, "A", 2i64, 1u32),
            ]
        );
    }

    #[test]
    fn test_out_of_place_team_can_raise_placement_and_elims() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("B", 1, 2, 3), record("A", 2, 4, 1)];

        let errors = diff_against_authority(&teams, &authority).unwrap();
        assert_eq!(
            errors.errors,
            vec![
                DataError::new(ErrorType::FinalRanking, "B", 1i64, 2u32),
                DataError::new(ErrorType::IngameRanking, "B", 4i64, 1i64),
                DataError::new(ErrorType::TotalElims, "B", 1i64, 5i64),
                DataError::new(ErrorType::FinalRanking, "A", 2i64, 1u32),
            ]
        );
    }

    #[test]
    fn test_unknown_authority_team_is_not_found() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("Z", 1, 1, 5), record("B", 2, 2, 3)];

        let result = diff_against_authority(&teams, &authority);
        assert!(matches!(result, Err(CheckError::NotFound(_))));
    }

    #[test]
    fn test_short_authority_list_is_structural_error() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("A", 1, 1, 5)];

        assert!(matches!(
            diff_against_authority(&teams, &authority),
            Err(CheckError::RosterMismatch { computed: 2, authority: 1, .. })
        ));
        assert!(matches!(
            check_roster(&teams, &authority),
            Err(CheckError::RosterMismatch { .. })
        ));
    }

    #[test]
    fn test_roster_check_names_missing_and_extra_teams() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("A", 1, 1, 5), record("C", 2, 2, 3)];

        match check_roster(&teams, &authority) {
            Err(CheckError::RosterMismatch { detail, .. }) => {
                assert!(detail.contains("\"B\""));
                assert!(detail.contains("\"C\""));
            }
            other => panic!("expected roster mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_roster_check_rejects_duplicate_authority_names() {
        let teams = vec![ranked("A", 1, 5, 1), ranked("B", 2, 3, 2)];
        let authority = vec![record("A", 1, 1, 5), record("A", 2, 2, 3)];

        assert!(matches!(
            check_roster(&teams, &authority),
            Err(CheckError::RosterMismatch { .. })
        ));
    }
}
