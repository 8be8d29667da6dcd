//! Match Result
//!
//! Decides the winner of a completed (or completing) limited-overs match from
//! the two innings totals.

use serde::{Deserialize, Serialize};

use super::innings::InningsScore;

/// Result of [`calculate_match_winner`].
///
/// `winner_id: None` with `is_tie: false` means the match is still in
/// progress, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Winning team, if decided.
    pub winner_id: Option<String>,
    /// Margin text: `"30 runs"`, `"4 wickets"`, or empty.
    pub win_margin: String,
    /// Whether the scores finished level.
    pub is_tie: bool,
}

impl MatchResult {
    fn unresolved() -> Self {
        Self {
            winner_id: None,
            win_margin: String::new(),
            is_tie: false,
        }
    }

    fn tie() -> Self {
        Self {
            winner_id: None,
            win_margin: String::new(),
            is_tie: true,
        }
    }

    fn won(team: &str, margin: String) -> Self {
        Self {
            winner_id: Some(team.to_string()),
            win_margin: margin,
            is_tie: false,
        }
    }

    /// Whether a winner or a tie has been determined.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.is_tie || self.winner_id.is_some()
    }
}

/// Determine the winner from both innings.
///
/// `elected_to_bat_first_team_id` batted in `innings1`. If it names neither
/// team, `team1_id` is taken to have batted first.
#[must_use]
pub fn calculate_match_winner(
    innings1: &InningsScore,
    innings2: &InningsScore,
    team1_id: &str,
    team2_id: &str,
    elected_to_bat_first_team_id: &str,
) -> MatchResult {
    let (batting_first, chasing) = if elected_to_bat_first_team_id == team2_id {
        (team2_id, team1_id)
    } else {
        (team1_id, team2_id)
    };

    if innings1.runs == innings2.runs && innings2.is_all_out() {
        return MatchResult::tie();
    }

    if innings1.runs > innings2.runs && (innings2.is_all_out() || innings2.overs >= innings1.overs)
    {
        let margin = innings1.runs - innings2.runs;
        return MatchResult::won(batting_first, plural(margin, "run"));
    }

    if innings2.runs > innings1.runs {
        return MatchResult::won(chasing, plural(innings2.wickets_in_hand(), "wicket"));
    }

    MatchResult::unresolved()
}

/// `count` followed by `unit`, pluralized unless the count is one.
#[must_use]
pub fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
