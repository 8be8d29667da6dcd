//! Player of the Match
//!
//! Heuristic suggestion of a standout player from aggregated batting and
//! bowling figures. Batting scores `runs`, plus a 10% bonus when the strike
//! rate is above 100. Bowling scores 30 per wicket, plus 20 when the economy
//! is under 6. The single best candidate wins; on a tie the first one seen
//! is kept, with batting entries considered before bowling entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cricket::{Overs, economy_rate, plural, strike_rate};

const STRIKE_RATE_BONUS_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;
const STRIKE_RATE_BONUS: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
const WICKET_POINTS: u32 = 30;
const ECONOMY_BONUS_THRESHOLD: u32 = 6;
const ECONOMY_BONUS: u32 = 20;

/// One player's batting aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingFigures {
    /// Player identifier.
    pub player_id: String,
    /// Runs scored.
    pub runs: u32,
    /// Balls faced.
    pub balls: u32,
}

/// One player's bowling aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlingFigures {
    /// Player identifier.
    pub player_id: String,
    /// Overs bowled.
    pub overs: Overs,
    /// Runs conceded.
    pub runs_conceded: u32,
    /// Wickets taken.
    pub wickets: u32,
}

/// Suggested player and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerOfMatch {
    /// Player identifier.
    pub player_id: String,
    /// Why this player was chosen.
    pub reason: String,
}

/// Batting contribution score.
#[must_use]
pub fn batting_score(figures: &BattingFigures) -> Decimal {
    let runs = Decimal::from(figures.runs);
    if strike_rate(figures.runs, figures.balls) > STRIKE_RATE_BONUS_THRESHOLD {
        runs + runs * STRIKE_RATE_BONUS
    } else {
        runs
    }
}

/// Bowling contribution score.
#[must_use]
pub fn bowling_score(figures: &BowlingFigures) -> Decimal {
    let mut score = Decimal::from(figures.wickets) * Decimal::from(WICKET_POINTS);
    if economy_rate(figures.runs_conceded, figures.overs) < Decimal::from(ECONOMY_BONUS_THRESHOLD)
    {
        score += Decimal::from(ECONOMY_BONUS);
    }
    score
}

/// Pick the highest-scoring player across both pools.
///
/// Returns `None` only when both lists are empty.
#[must_use]
pub fn suggest_man_of_match(
    batting: &[BattingFigures],
    bowling: &[BowlingFigures],
) -> Option<PlayerOfMatch> {
    let mut best: Option<(Decimal, PlayerOfMatch)> = None;

    for b in batting {
        let score = batting_score(b);
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((
                score,
                PlayerOfMatch {
                    player_id: b.player_id.clone(),
                    reason: format!(
                        "{} off {}",
                        plural(b.runs, "run"),
                        plural(b.balls, "ball")
                    ),
                },
            ));
        }
    }

    for b in bowling {
        let score = bowling_score(b);
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((
                score,
                PlayerOfMatch {
                    player_id: b.player_id.clone(),
                    reason: format!(
                        "{} for {} in {} overs",
                        plural(b.wickets, "wicket"),
                        plural(b.runs_conceded, "run"),
                        b.overs
                    ),
                },
            ));
        }
    }

    best.map(|(_, player)| player)
}
