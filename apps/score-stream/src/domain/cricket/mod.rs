//! Cricket Scoring Rules
//!
//! Pure, stateless arithmetic for limited-overs cricket: overs notation,
//! rates, innings completion and match result. No I/O and no error paths
//! beyond parsing the overs notation at the boundary.

pub mod config;
pub mod innings;
pub mod overs;
pub mod rates;
pub mod result;

pub use config::{CricketMatchConfig, MatchConfigError, TossDecision};
pub use innings::{
    ALL_OUT_WICKETS, CompletionReason, Extras, InningsCompletion, InningsScore,
    check_innings_complete,
};
pub use overs::{BALLS_PER_OVER, Overs, OversError, balls_to_overs, overs_to_balls};
pub use rates::{
    balls_remaining, economy_rate, projected_score, required_run_rate, run_rate, strike_rate,
};
pub use result::{MatchResult, calculate_match_winner, plural};
