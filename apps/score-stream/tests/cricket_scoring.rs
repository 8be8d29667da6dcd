//! Cricket Scoring Integration Tests
//!
//! Whole-match scenarios through the public scoring API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;
use score_stream::domain::cricket::{
    CompletionReason, CricketMatchConfig, InningsScore, Overs, TossDecision,
    calculate_match_winner, check_innings_complete, economy_rate, required_run_rate, strike_rate,
};
use score_stream::domain::ranking::{BattingFigures, BowlingFigures, suggest_man_of_match};

fn innings(runs: u32, wickets: u32, overs: &str) -> InningsScore {
    InningsScore::new(runs, wickets, overs.parse().unwrap())
}

#[test]
fn all_out_ends_first_innings() {
    let completion = check_innings_complete(&innings(150, 10, "18.3"), 20, false, None);
    assert!(completion.is_complete);
    assert_eq!(completion.reason, Some(CompletionReason::AllOut));
}

#[test]
fn chase_completes_when_target_passed() {
    let completion = check_innings_complete(&innings(200, 3, "15.0"), 20, true, Some(180));
    assert!(completion.is_complete);
    assert_eq!(completion.reason, Some(CompletionReason::TargetChased));
}

#[test]
fn defending_side_wins_by_runs() {
    let result = calculate_match_winner(
        &innings(180, 10, "20.0"),
        &innings(150, 10, "19.2"),
        "team1",
        "team2",
        "team1",
    );
    assert_eq!(result.winner_id.as_deref(), Some("team1"));
    assert_eq!(result.win_margin, "30 runs");
    assert!(!result.is_tie);
}

#[test]
fn chasing_side_wins_by_wickets() {
    let result = calculate_match_winner(
        &innings(150, 8, "20.0"),
        &innings(155, 6, "18.0"),
        "team1",
        "team2",
        "team1",
    );
    assert_eq!(result.winner_id.as_deref(), Some("team2"));
    assert_eq!(result.win_margin, "4 wickets");
    assert!(!result.is_tie);
}

#[test]
fn zero_denominators_yield_zero() {
    assert_eq!(strike_rate(0, 0), Decimal::ZERO);
    assert_eq!(economy_rate(0, Overs::ZERO), Decimal::ZERO);
}

#[test]
fn t20_chase_from_toss_to_result() {
    let config = CricketMatchConfig {
        total_overs: 20,
        max_overs_per_bowler: 4,
        toss_winner_team_id: "lions".to_string(),
        toss_decision: TossDecision::Bowl,
        elected_to_bat_first_team_id: None,
    };
    config.validate().unwrap();

    let batting_first = config.batting_first_team("lions", "tigers");
    assert_eq!(batting_first, "tigers");

    let first = innings(164, 7, "20.0");
    let first_done = check_innings_complete(&first, config.total_overs, false, None);
    assert_eq!(first_done.reason, Some(CompletionReason::OversComplete));

    // Midway through the chase: 82 needed off 60 balls.
    let midway = innings(83, 2, "10.0");
    assert!(!check_innings_complete(&midway, 20, true, Some(first.runs)).is_complete);
    assert_eq!(
        required_run_rate(first.runs, midway.runs, midway.overs, 20),
        Decimal::new(82, 1)
    );

    let last = innings(165, 5, "19.4");
    let done = check_innings_complete(&last, 20, true, Some(first.runs));
    assert_eq!(done.reason, Some(CompletionReason::TargetChased));

    let result = calculate_match_winner(&first, &last, "lions", "tigers", batting_first);
    assert_eq!(result.winner_id.as_deref(), Some("lions"));
    assert_eq!(result.win_margin, "5 wickets");
}

#[test]
fn player_of_the_match_across_both_sides() {
    let batting = [
        BattingFigures {
            player_id: "opener".to_string(),
            runs: 71,
            balls: 48,
        },
        BattingFigures {
            player_id: "finisher".to_string(),
            runs: 24,
            balls: 9,
        },
    ];
    let bowling = [BowlingFigures {
        player_id: "quick".to_string(),
        overs: Overs::whole(4),
        runs_conceded: 31,
        wickets: 2,
    }];

    // opener 71 + 7.1 beats quick 60 (economy 7.75, no bonus).
    let pick = suggest_man_of_match(&batting, &bowling).unwrap();
    assert_eq!(pick.player_id, "opener");
    assert_eq!(pick.reason, "71 runs off 48 balls");
}
