//! Match Configuration
//!
//! Format settings and toss outcome, fixed once the toss is recorded.

use serde::{Deserialize, Serialize};

use super::overs::{BALLS_PER_OVER, Overs};

/// What the toss winner chose to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    /// Bat first.
    Bat,
    /// Field first.
    Bowl,
}

/// Invalid match configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchConfigError {
    /// Overs per innings must be positive.
    #[error("total overs must be greater than zero")]
    ZeroTotalOvers,

    /// Bowler quota must be positive.
    #[error("max overs per bowler must be greater than zero")]
    ZeroBowlerQuota,

    /// A bowler cannot be allowed more overs than the innings has.
    #[error("max overs per bowler ({quota}) exceeds total overs ({total})")]
    QuotaExceedsInnings {
        /// Per-bowler quota.
        quota: u32,
        /// Overs per innings.
        total: u32,
    },
}

/// Limited-overs match configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CricketMatchConfig {
    /// Overs per innings.
    pub total_overs: u32,
    /// Overs any one bowler may deliver.
    pub max_overs_per_bowler: u32,
    /// Team that won the toss.
    pub toss_winner_team_id: String,
    /// Toss winner's choice.
    pub toss_decision: TossDecision,
    /// Team batting first, when recorded explicitly.
    #[serde(default)]
    pub elected_to_bat_first_team_id: Option<String>,
}

impl CricketMatchConfig {
    /// Check the format settings.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub const fn validate(&self) -> Result<(), MatchConfigError> {
        if self.total_overs == 0 {
            return Err(MatchConfigError::ZeroTotalOvers);
        }
        if self.max_overs_per_bowler == 0 {
            return Err(MatchConfigError::ZeroBowlerQuota);
        }
        if self.max_overs_per_bowler > self.total_overs {
            return Err(MatchConfigError::QuotaExceedsInnings {
                quota: self.max_overs_per_bowler,
                total: self.total_overs,
            });
        }
        Ok(())
    }

    /// Team that bats in the first innings.
    ///
    /// Uses the recorded election when present, otherwise derives it from the
    /// toss: the winner bats if they chose to, else the other side does.
    #[must_use]
    pub fn batting_first_team<'a>(&'a self, team1_id: &'a str, team2_id: &'a str) -> &'a str {
        if let Some(elected) = self.elected_to_bat_first_team_id.as_deref() {
            return elected;
        }
        match self.toss_decision {
            TossDecision::Bat => self.toss_winner_team_id.as_str(),
            TossDecision::Bowl if self.toss_winner_team_id == team1_id => team2_id,
            TossDecision::Bowl => team1_id,
        }
    }

    /// Overs a bowler may still deliver after bowling `bowled`.
    #[must_use]
    pub const fn bowler_overs_remaining(&self, bowled: Overs) -> Overs {
        let quota = self.max_overs_per_bowler.saturating_mul(BALLS_PER_OVER);
        Overs::from_balls(quota.saturating_sub(bowled.to_balls()))
    }

    /// Whether a bowler with `bowled` overs may deliver another ball.
    #[must_use]
    pub const fn can_bowl(&self, bowled: Overs) -> bool {
        bowled.to_balls() < self.max_overs_per_bowler.saturating_mul(BALLS_PER_OVER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t20(toss_winner: &str, decision: TossDecision) -> CricketMatchConfig {
        CricketMatchConfig {
            total_overs: 20,
            max_overs_per_bowler: 4,
            toss_winner_team_id: toss_winner.to_string(),
            toss_decision: decision,
            elected_to_bat_first_team_id: None,
        }
    }

    #[test]
    fn toss_winner_bats() {
        assert_eq!(t20("a", TossDecision::Bat).batting_first_team("a", "b"), "a");
        assert_eq!(t20("b", TossDecision::Bat).batting_first_team("a", "b"), "b");
    }

    #[test]
    fn toss_winner_bowls() {
        assert_eq!(t20("a", TossDecision::Bowl).batting_first_team("a", "b"), "b");
        assert_eq!(t20("b", TossDecision::Bowl).batting_first_team("a", "b"), "a");
    }

    #[test]
    fn recorded_election_takes_precedence() {
        let mut config = t20("a", TossDecision::Bat);
        config.elected_to_bat_first_team_id = Some("b".to_string());
        assert_eq!(config.batting_first_team("a", "b"), "b");
    }

    #[test]
    fn validate_rejects_bad_formats() {
        let mut config = t20("a", TossDecision::Bat);
        assert!(config.validate().is_ok());

        config.total_overs = 0;
        assert_eq!(config.validate(), Err(MatchConfigError::ZeroTotalOvers));

        config.total_overs = 20;
        config.max_overs_per_bowler = 0;
        assert_eq!(config.validate(), Err(MatchConfigError::ZeroBowlerQuota));

        config.max_overs_per_bowler = 21;
        assert!(matches!(
            config.validate(),
            Err(MatchConfigError::QuotaExceedsInnings { quota: 21, total: 20 })
        ));
    }

    #[test]
    fn bowler_quota() {
        let config = t20("a", TossDecision::Bat);
        let bowled: Overs = "2.4".parse().unwrap();
        assert_eq!(config.bowler_overs_remaining(bowled).to_string(), "1.2");
        assert!(config.can_bowl(bowled));

        let spent = Overs::whole(4);
        assert!(!config.can_bowl(spent));
        assert_eq!(config.bowler_overs_remaining(spent), Overs::ZERO);
    }

    #[test]
    fn deserializes_camel_case() {
        let config: CricketMatchConfig = serde_json::from_str(
            r#"{"totalOvers": 50, "maxOversPerBowler": 10, "tossWinnerTeamId": "x", "tossDecision": "bowl"}"#,
        )
        .unwrap();
        assert_eq!(config.total_overs, 50);
        assert_eq!(config.toss_decision, TossDecision::Bowl);
        assert!(config.elected_to_bat_first_team_id.is_none());
    }

    #[test]
    fn bowler_quota_saturates_for_huge_limits() {
        let config = CricketMatchConfig {
            total_overs: u32::MAX,
            max_overs_per_bowler: u32::MAX,
            ..t20("team1", TossDecision::Bat)
        };
        assert!(config.can_bowl(Overs::whole(1_000)));
        assert_eq!(
            config.bowler_overs_remaining(Overs::ZERO),
            Overs::from_balls(u32::MAX)
        );
    }
}
