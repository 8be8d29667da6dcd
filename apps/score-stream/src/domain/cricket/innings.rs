//! Innings State and Completion
//!
//! An innings ends when the batting side is all out, the overs allocation is
//! used up, or (second innings only) the target is passed or can no longer be
//! reached. The checks run in that order: a finished innings is never
//! reported as merely "target impossible".

use serde::{Deserialize, Serialize};

use super::overs::Overs;
use super::rates::balls_remaining;

/// Wickets that end an innings.
pub const ALL_OUT_WICKETS: u32 = 10;

/// Maximum runs a single legal delivery can yield for the impossibility check.
const MAX_RUNS_PER_BALL: u32 = 6;

/// Runs not credited to a batter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Extras {
    /// Wides.
    pub wides: u32,
    /// No-balls.
    pub no_balls: u32,
    /// Byes.
    pub byes: u32,
    /// Leg byes.
    pub leg_byes: u32,
}

impl Extras {
    /// Sum of all extras.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.wides
            .saturating_add(self.no_balls)
            .saturating_add(self.byes)
            .saturating_add(self.leg_byes)
    }
}

/// Running totals for one innings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsScore {
    /// Total runs, extras included.
    pub runs: u32,
    /// Wickets fallen (0-10).
    pub wickets: u32,
    /// Overs bowled.
    pub overs: Overs,
    /// Extras breakdown.
    #[serde(default)]
    pub extras: Extras,
}

impl InningsScore {
    /// Create a score without an extras breakdown.
    #[must_use]
    pub fn new(runs: u32, wickets: u32, overs: Overs) -> Self {
        Self {
            runs,
            wickets,
            overs,
            extras: Extras::default(),
        }
    }

    /// Whether ten wickets have fallen.
    #[must_use]
    pub const fn is_all_out(&self) -> bool {
        self.wickets >= ALL_OUT_WICKETS
    }

    /// Wickets still standing.
    #[must_use]
    pub const fn wickets_in_hand(&self) -> u32 {
        ALL_OUT_WICKETS.saturating_sub(self.wickets)
    }
}

/// Why an innings ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Ten wickets down.
    AllOut,
    /// Overs allocation bowled.
    OversComplete,
    /// Chasing side passed the target.
    TargetChased,
    /// Chasing side cannot reach the target even scoring six off every ball.
    TargetImpossible,
}

impl CompletionReason {
    /// Wire name of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllOut => "all_out",
            Self::OversComplete => "overs_complete",
            Self::TargetChased => "target_chased",
            Self::TargetImpossible => "target_impossible",
        }
    }
}

/// Outcome of [`check_innings_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsCompletion {
    /// Whether the innings is over.
    pub is_complete: bool,
    /// Why, when it is.
    pub reason: Option<CompletionReason>,
}

impl InningsCompletion {
    const IN_PROGRESS: Self = Self {
        is_complete: false,
        reason: None,
    };

    const fn complete(reason: CompletionReason) -> Self {
        Self {
            is_complete: true,
            reason: Some(reason),
        }
    }
}

/// Decide whether an innings has ended.
///
/// `target_runs` is the first-innings total the chasing side must pass; it is
/// only consulted for the second innings.
#[must_use]
pub fn check_innings_complete(
    innings: &InningsScore,
    total_overs: u32,
    is_second_innings: bool,
    target_runs: Option<u32>,
) -> InningsCompletion {
    if innings.is_all_out() {
        return InningsCompletion::complete(CompletionReason::AllOut);
    }

    if innings.overs >= Overs::whole(total_overs) {
        return InningsCompletion::complete(CompletionReason::OversComplete);
    }

    let Some(target) = target_runs.filter(|_| is_second_innings) else {
        return InningsCompletion::IN_PROGRESS;
    };

    if innings.runs > target {
        return InningsCompletion::complete(CompletionReason::TargetChased);
    }

    let needed = (target - innings.runs).saturating_add(1);
    let max_possible =
        balls_remaining(innings.overs, total_overs).saturating_mul(MAX_RUNS_PER_BALL);
    if max_possible < needed {
        return InningsCompletion::complete(CompletionReason::TargetImpossible);
    }

    InningsCompletion::IN_PROGRESS
}
