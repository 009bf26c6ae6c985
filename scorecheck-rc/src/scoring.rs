//! Placement scoring and the tie-break ordering
//!
//! Teams are ordered descending by an eight-component key compared
//! element-wise:
//!
//! 1. placement points + eliminations
//! 2. chicken dinners in the stage
//! 3. eliminations in this game
//! 4. best single-match points in the stage
//! 5. best single-match kills in the stage
//! 6. last match total points
//! 7. last match kills
//! 8. last match placement points
//!
//! Fully tied teams keep their extracted relative order.

use crate::model::TeamResult;

/// Placement points for in-game rankings 1 through 10
pub const PLACEMENT_POINTS: [i64; 10] = [16, 12, 10, 8, 6, 5, 4, 3, 2, 1];

/// Points awarded for an in-game ranking; 0 outside 1–10
pub fn placement_points(ranking: i64) -> i64 {
    if (1..=PLACEMENT_POINTS.len() as i64).contains(&ranking) {
        PLACEMENT_POINTS[(ranking - 1) as usize]
    } else {
        0
    }
}

/// Composite ordering key; derived `Ord` compares fields top to bottom
///
/// `points_plus_elims` saturates at `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankingKey {
    pub points_plus_elims: i64,
    pub wwcd_count: i64,
    pub total_elims: i64,
    pub stage_max_single_match_pts: i64,
    pub stage_max_single_match_kill: i64,
    pub last_match_total_pts: i64,
    pub last_match_total_kill: i64,
    pub last_match_place_pts: i64,
}

impl RankingKey {
    pub fn for_team(team: &TeamResult) -> Self {
        let stats = &team.tiebreak_stats;
        Self {
            points_plus_elims: placement_points(team.ranking).saturating_add(team.total_elims),
            wwcd_count: stats.wwcd_count,
            total_elims: team.total_elims,
            stage_max_single_match_pts: stats.stage_max_single_match_pts,
            stage_max_single_match_kill: stats.stage_max_single_match_kill,
            last_match_total_pts: stats.last_match_total_pts,
            last_match_total_kill: stats.last_match_total_kill,
            last_match_place_pts: stats.last_match_place_pts,
        }
    }
}

/// Stable descending sort by `RankingKey`
pub fn sort_by_ranking(teams: &mut [TeamResult]) {
    teams.sort_by_key(|team| std::cmp::Reverse(RankingKey::for_team(team)));
}

/// Write 1-based list positions into `final_ranking`
pub fn assign_positions(teams: &mut [TeamResult]) {
    for (index, team) in teams.iter_mut().enumerate() {
        team.final_ranking = index as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TieBreakStats;

    fn team(name: &str, ranking: i64, elims: i64) -> TeamResult {
        TeamResult::new(name, ranking, elims)
    }

    fn names(teams: &[TeamResult]) -> Vec<&str> {
        teams.iter().map(|t| t.team_name.as_str()).collect()
    }

    #[test]
    fn test_placement_points_table() {
        let expected = [(1, 16), (2, 12), (3, 10), (4, 8), (5, 6), (6, 5), (7, 4), (8, 3), (9, 2), (10, 1)];
        for (ranking, points) in expected {
            assert_eq!(placement_points(ranking), points, "ranking {}", ranking);
        }
    }

    #[test]
    fn test_placement_points_out_of_table() {
        assert_eq!(placement_points(0), 0);
        assert_eq!(placement_points(11), 0);
        assert_eq!(placement_points(-3), 0);
        assert_eq!(placement_points(i64::MAX), 0);
    }

    #[test]
    fn test_points_plus_elims_orders_teams() {
        let mut teams = vec![team("B", 2, 3), team("A", 1, 5)];
        sort_by_ranking(&mut teams);
        assign_positions(&mut teams);

        assert_eq!(names(&teams), vec!["A", "B"]);
        assert_eq!(teams[0].final_ranking, 1);
        assert_eq!(teams[1].final_ranking, 2);
    }

    #[test]
    fn test_elims_can_outweigh_placement() {
        // 5th place (6 pts) + 11 elims beats 1st place (16 pts) + 0 elims
        let mut teams = vec![team("Winner", 1, 0), team("Fragger", 5, 11)];
        sort_by_ranking(&mut teams);
        assert_eq!(names(&teams), vec!["Fragger", "Winner"]);
    }

    #[test]
    fn test_extreme_elims_saturate_instead_of_overflowing() {
        let mut teams = vec![team("B", 2, 3), team("A", 1, i64::MAX)];
        sort_by_ranking(&mut teams);

        assert_eq!(names(&teams), vec!["A", "B"]);
        assert_eq!(RankingKey::for_team(&teams[0]).points_plus_elims, i64::MAX);
    }

    #[test]
    fn test_wwcd_breaks_points_tie() {
        let mut c = team("C", 3, 4);
        c.tiebreak_stats.wwcd_count = 1;
        let d = team("D", 3, 4);

        let mut teams = vec![d, c];
        sort_by_ranking(&mut teams);
        assert_eq!(names(&teams), vec!["C", "D"]);
    }

    #[test]
    fn test_game_elims_break_tie_before_stage_history() {
        // Both 16 points: 1st + 0 elims vs 2nd + 4 elims
        let mut winner = team("Winner", 1, 0);
        winner.tiebreak_stats.stage_max_single_match_pts = 50;
        let fragger = team("Fragger", 2, 4);

        let mut teams = vec![winner, fragger];
        sort_by_ranking(&mut teams);
        assert_eq!(names(&teams), vec!["Fragger", "Winner"]);
    }

    #[test]
    fn test_stage_total_kill_is_ignored() {
        let mut a = team("A", 4, 2);
        a.tiebreak_stats.stage_total_kill = 99;
        let mut b = team("B", 4, 2);
        b.tiebreak_stats.last_match_place_pts = 1;

        let mut teams = vec![a, b];
        sort_by_ranking(&mut teams);
        assert_eq!(names(&teams), vec!["B", "A"]);
    }

    #[test]
    fn test_cascade_reaches_last_component() {
        let base = TieBreakStats {
            wwcd_count: 1,
            stage_total_kill: 10,
            stage_max_single_match_pts: 20,
            stage_max_single_match_kill: 8,
            last_match_total_pts: 12,
            last_match_total_kill: 4,
            last_match_place_pts: 8,
        };
        let mut x = team("X", 6, 1);
        x.tiebreak_stats = base;
        let mut y = team("Y", 6, 1);
        y.tiebreak_stats = TieBreakStats {
            last_match_place_pts: 10,
            ..base
        };

        let mut teams = vec![x, y];
        sort_by_ranking(&mut teams);
        assert_eq!(names(&teams), vec!["Y", "X"]);
    }

    #[test]
    fn test_full_ties_keep_extracted_order() {
        let mut teams = vec![
            team("First", 12, 0),
            team("Leader", 1, 3),
            team("Second", 15, 0),
            team("Third", 11, 0),
        ];
        sort_by_ranking(&mut teams);
        assert_eq!(names(&teams), vec!["Leader", "First", "Second", "Third"]);
    }

    #[test]
    fn test_positions_are_a_permutation() {
        let mut teams: Vec<TeamResult> = (1..=16)
            .map(|r| team(&format!("T{}", r), r, (r * 7) % 5))
            .collect();
        sort_by_ranking(&mut teams);
        assign_positions(&mut teams);

        let mut positions: Vec<u32> = teams.iter().map(|t| t.final_ranking).collect();
        positions.sort_unstable();
        assert_eq!(positions, (1..=16).collect::<Vec<u32>>());
    }

    #[test]
    fn test_sorting_twice_is_idempotent() {
        let mut teams: Vec<TeamResult> = (1..=12)
            .map(|r| team(&format!("T{}", r), 13 - r, r % 3))
            .collect();
        sort_by_ranking(&mut teams);
        assign_positions(&mut teams);
        let first = teams.clone();

        sort_by_ranking(&mut teams);
        assign_positions(&mut teams);
        assert_eq!(teams, first);
    }
}
