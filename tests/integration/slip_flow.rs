//! End-to-end bet slip flows through the public API.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use betslip::ledger::stake_keys::{StakeBoard, StakeKey};
use betslip::ledger::{StakeLimits, WagerLedger};
use betslip::odds::{compute_payout, AmericanOdds};
use betslip::types::{Selection, Stake};

use crate::stub_settlement::StubSettlement;

fn selection(id: &str, event: &str, side: &str, odds: i32, stake: Decimal) -> Selection {
    Selection {
        id: id.to_string(),
        event_id: event.to_string(),
        market_id: "moneyline".to_string(),
        market_name: "Moneyline".to_string(),
        selection_id: side.to_string(),
        selection_name: side.to_uppercase(),
        odds: AmericanOdds::new(odds).unwrap(),
        stake: Stake::new(stake).unwrap(),
        event_name: format!("{event} game"),
        is_live: false,
    }
}

fn ledger(stub: &StubSettlement) -> WagerLedger {
    WagerLedger::new(Arc::new(stub.clone()), StakeLimits::default(), Duration::from_secs(5))
}

#[test]
fn test_two_leg_scenario() {
    let stub = StubSettlement::new();
    let mut l = ledger(&stub);
    let a = selection("A", "nba-1", "home", 120, dec!(50));
    let b = selection("B", "nba-2", "away", -150, dec!(75));

    l.add_selection(a.clone());
    l.add_selection(b);
    assert_eq!(l.total_stake(), dec!(125.00));
    assert_eq!(l.total_potential_payout(), dec!(235.00));

    l.remove_selection(&a.id);
    assert_eq!(l.total_stake(), dec!(75.00));
    assert_eq!(l.total_potential_payout(), dec!(125.00));
}

#[test]
fn test_reclicking_same_odds_button_replaces() {
    let stub = StubSettlement::new();
    let mut l = ledger(&stub);
    l.add_selection(selection("A", "nfl-7", "home", -110, dec!(11)));
    l.add_selection(selection("A", "nfl-7", "home", -110, dec!(110)));

    assert_eq!(l.len(), 1);
    assert_eq!(l.total_stake(), dec!(110));
    assert_eq!(l.total_potential_payout(), compute_payout(-110, dec!(110)));
}

#[tokio::test]
async fn test_failed_placement_preserves_slip() {
    let stub = StubSettlement::failing("network unreachable");
    let mut l = ledger(&stub);
    l.add_selection(selection("A", "nba-1", "home", 120, dec!(50)));
    l.add_selection(selection("B", "nba-2", "away", -150, dec!(75)));
    let before = l.selections().to_vec();

    let result = l.place_bet().await;

    assert!(!result.success);
    assert!(!result.error.as_deref().unwrap_or_default().is_empty());
    assert_eq!(l.selections(), before.as_slice());
    assert_eq!(l.total_stake(), dec!(125));
    assert_eq!(l.total_potential_payout(), dec!(235));
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_retry_after_failure_needs_no_reentry() {
    let stub = StubSettlement::failing("503");
    let mut l = ledger(&stub);
    l.add_selection(selection("A", "mlb-3", "over", 105, dec!(20)));

    assert!(!l.place_bet().await.success);
    stub.clear_error();
    let result = l.place_bet().await;

    assert!(result.success);
    assert_eq!(result.reference.as_deref(), Some("stub-2"));
    assert!(l.is_empty());

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].selections, requests[1].selections);
    assert_ne!(requests[0].request_id, requests[1].request_id);
}

#[tokio::test]
async fn test_submitted_request_matches_slip() {
    let stub = StubSettlement::new();
    let mut l = ledger(&stub);
    l.add_selection(selection("A", "nhl-9", "home", 150, dec!(100)));
    l.add_selection(selection("B", "nhl-9", "away", -200, dec!(50)));

    assert!(l.place_bet().await.success);

    let req = &stub.requests()[0];
    assert_eq!(req.selections.len(), 2);
    assert_eq!(req.total_stake, dec!(150));
    assert_eq!(req.total_potential_payout, dec!(325));
}

#[tokio::test]
async fn test_empty_slip_never_reaches_service() {
    let stub = StubSettlement::new();
    let mut l = ledger(&stub);

    let result = l.place_bet().await;

    assert_eq!(result.error.as_deref(), Some("no selections"));
    assert!(stub.requests().is_empty());
}

#[test]
fn test_stake_board_to_selection() {
    let mut board = StakeBoard::new();
    let key = StakeKey::new("nba-1", "moneyline", "home").unwrap();
    board.set(key.clone(), Stake::new(dec!(30)).unwrap());

    let sel = selection("A", "nba-1", "home", 120, board.stake_for(&key).amount());
    assert_eq!(sel.stake_key().unwrap(), key);
    assert_eq!(sel.potential_payout(), dec!(66));
}

#[tokio::test]
async fn test_leg_restaked_while_pending_stays_on_slip() {
    let stub = StubSettlement::new();
    let mut l = ledger(&stub);
    l.add_selection(selection("A", "nba-1", "home", 120, dec!(50)));
    l.add_selection(selection("B", "nba-2", "away", -150, dec!(75)));

    let pending = l.begin_placement().unwrap();
    l.update_stake("B", Stake::new(dec!(30)).unwrap());
    let outcome = pending.submit().await;
    let result = l.finish_placement(outcome);

    assert!(result.success);
    assert_eq!(stub.requests()[0].selections[1].stake.amount(), dec!(75));
    assert_eq!(l.len(), 1);
    assert_eq!(l.selections()[0].id, "B");
    assert_eq!(l.total_stake(), dec!(30));
    assert_eq!(l.total_potential_payout(), dec!(50));
    assert!(!l.is_placement_in_flight());
}
