//! Scoring Rates
//!
//! Strike rate, economy, run rate and required run rate. Every function is
//! total: a zero denominator yields zero rather than an error.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::overs::{BALLS_PER_OVER, Overs};

/// Runs scored per 100 balls faced. Zero when no balls were faced.
#[must_use]
pub fn strike_rate(runs: u32, balls: u32) -> Decimal {
    if balls == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(runs) / Decimal::from(balls) * Decimal::ONE_HUNDRED
}

/// Runs conceded per true over. Zero when nothing has been bowled.
#[must_use]
pub fn economy_rate(runs: u32, overs: Overs) -> Decimal {
    per_over(runs, overs.to_balls())
}

/// Runs scored per true over. Same formula as [`economy_rate`].
#[must_use]
pub fn run_rate(runs: u32, overs: Overs) -> Decimal {
    per_over(runs, overs.to_balls())
}

/// Runs per over needed to pass `target` in the overs that remain.
///
/// `target` is the score to beat, so one more run than `target` is needed.
/// Zero when no balls remain or the target is already passed.
#[must_use]
pub fn required_run_rate(
    target: u32,
    current_runs: u32,
    current_overs: Overs,
    total_overs: u32,
) -> Decimal {
    let remaining = balls_remaining(current_overs, total_overs);
    let needed = (i64::from(target) + 1 - i64::from(current_runs)).max(0);
    if remaining == 0 || needed == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(needed) * Decimal::from(BALLS_PER_OVER) / Decimal::from(remaining)
}

/// Legal deliveries left in an innings of `total_overs`.
#[must_use]
pub const fn balls_remaining(current_overs: Overs, total_overs: u32) -> u32 {
    total_overs
        .saturating_mul(BALLS_PER_OVER)
        .saturating_sub(current_overs.to_balls())
}

/// Final total if the current run rate holds for the full allocation.
#[must_use]
pub fn projected_score(runs: u32, overs: Overs, total_overs: u32) -> u32 {
    let balls = overs.to_balls();
    if balls == 0 {
        return runs;
    }
    let total_balls = total_overs.saturating_mul(BALLS_PER_OVER);
    if balls >= total_balls {
        return runs;
    }
    (Decimal::from(runs) * Decimal::from(total_balls) / Decimal::from(balls))
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX)
}

fn per_over(runs: u32, balls: u32) -> Decimal {
    if balls == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(runs) * Decimal::from(BALLS_PER_OVER) / Decimal::from(balls)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use test_case::test_case;

    use super::*;

    fn overs(s: &str) -> Overs {
        s.parse().unwrap()
    }

    #[test]
    fn strike_rate_zero_balls_is_zero() {
        assert_eq!(strike_rate(0, 0), Decimal::ZERO);
        assert_eq!(strike_rate(12, 0), Decimal::ZERO);
    }

    #[test_case(50, 40, "125" ; "quick fifty")]
    #[test_case(30, 60, "50" ; "anchor")]
    #[test_case(0, 7, "0" ; "duck")]
    fn strike_rate_values(runs: u32, balls: u32, expected: &str) {
        assert_eq!(strike_rate(runs, balls), expected.parse::<Decimal>().unwrap());
    }

    #[test]
    fn economy_rate_zero_overs_is_zero() {
        assert_eq!(economy_rate(0, Overs::ZERO), Decimal::ZERO);
        assert_eq!(economy_rate(14, Overs::ZERO), Decimal::ZERO);
    }

    #[test_case(30, "4.0", "7.5" ; "full spell")]
    #[test_case(25, "3.3", "7.14" ; "part over uses true overs")]
    #[test_case(6, "0.3", "12" ; "half an over")]
    fn economy_rate_values(runs: u32, spell: &str, expected: &str) {
        assert_eq!(
            economy_rate(runs, overs(spell)).round_dp(2),
            expected.parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn run_rate_matches_economy() {
        let o = overs("15.4");
        assert_eq!(run_rate(143, o), economy_rate(143, o));
    }

    #[test]
    fn required_rate_uses_remaining_true_overs() {
        // Chasing 180: need 181 from 100 with 4.3 overs (27 balls) left.
        let rrr = required_run_rate(180, 100, overs("15.3"), 20);
        assert_eq!(rrr.round_dp(2), "18.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn required_rate_zero_when_no_overs_remain() {
        assert_eq!(required_run_rate(180, 150, overs("20.0"), 20), Decimal::ZERO);
    }

    #[test]
    fn required_rate_zero_once_target_passed() {
        assert_eq!(required_run_rate(150, 151, overs("17.2"), 20), Decimal::ZERO);
    }

    #[test]
    fn balls_remaining_saturates() {
        assert_eq!(balls_remaining(overs("18.3"), 20), 9);
        assert_eq!(balls_remaining(overs("21.0"), 20), 0);
    }

    #[test]
    fn huge_allocations_saturate_instead_of_overflowing() {
        assert_eq!(balls_remaining(Overs::ZERO, u32::MAX), u32::MAX);
        assert_eq!(balls_remaining(Overs::whole(u32::MAX), u32::MAX), 0);
        assert_eq!(projected_score(10, overs("1.0"), u32::MAX), u32::MAX);
        assert!(required_run_rate(u32::MAX, 0, Overs::ZERO, u32::MAX) > Decimal::ZERO);
        assert!(economy_rate(u32::MAX, Overs::whole(u32::MAX)) > Decimal::ZERO);
    }

    #[test]
    fn projected_score_extrapolates() {
        assert_eq!(projected_score(80, overs("10.0"), 20), 160);
        assert_eq!(projected_score(0, Overs::ZERO, 20), 0);
        assert_eq!(projected_score(190, overs("20.0"), 20), 190);
    }
}
