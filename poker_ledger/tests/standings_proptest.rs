/// Property-based tests for standings aggregation using proptest
///
/// These tests check that the derived metrics stay consistent with the
/// roster and snapshot rows they are computed from, whatever the mix of
/// statuses, amounts and close times.
use chrono::{Duration, TimeZone, Utc};
use poker_ledger::game::{GameStatus, PlayerStatus, RosterEntry, SessionSnapshot};
use poker_ledger::standings::{StandingsInput, compute_metrics, y_domain};
use proptest::prelude::*;
use uuid::Uuid;

// Strategy for a roster player status
fn status_strategy() -> impl Strategy<Value = PlayerStatus> {
    prop_oneof![
        Just(PlayerStatus::Pending),
        Just(PlayerStatus::Approved),
        Just(PlayerStatus::Denied),
    ]
}

// Strategy for a game status
fn game_status_strategy() -> impl Strategy<Value = GameStatus> {
    prop_oneof![
        Just(GameStatus::Active),
        Just(GameStatus::Closed),
        Just(GameStatus::Ended),
    ]
}

// (status, cash_in, cash_out) per roster player
fn roster_strategy() -> impl Strategy<Value = Vec<(PlayerStatus, i64, i64)>> {
    prop::collection::vec((status_strategy(), 0i64..100_000, 0i64..100_000), 1..8)
}

// (player index, minutes after start, session net) per snapshot
fn snapshot_strategy() -> impl Strategy<Value = Vec<(usize, i64, i64)>> {
    prop::collection::vec((0usize..16, 0i64..10_000, -50_000i64..50_000), 0..24)
}

struct Scenario {
    roster: Vec<RosterEntry>,
    snapshots: Vec<SessionSnapshot>,
}

// Build rows; snapshot indices past the roster belong to users only known from history
fn build(roster: &[(PlayerStatus, i64, i64)], snapshots: &[(usize, i64, i64)]) -> Scenario {
    let game_id = Uuid::new_v4();
    let ids: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 19, 0, 0).unwrap();

    let roster = roster
        .iter()
        .enumerate()
        .map(|(i, &(status, cash_in, cash_out))| RosterEntry {
            status,
            cash_in: Some(cash_in),
            cash_out: Some(cash_out),
            ..RosterEntry::pending(game_id, ids[i], cash_in)
        })
        .collect();

    let snapshots = snapshots
        .iter()
        .enumerate()
        .map(|(i, &(user, minutes, net))| SessionSnapshot {
            id: i as i64 + 1,
            game_id,
            user_id: ids[user],
            cash_in: 0,
            cash_out: net,
            session_net: net,
            created_at: start + Duration::minutes(minutes),
        })
        .collect();

    Scenario { roster, snapshots }
}

proptest! {
    #[test]
    fn test_standings_sorted_and_ranked(
        roster in roster_strategy(),
        snapshots in snapshot_strategy(),
        status in game_status_strategy(),
    ) {
        let s = build(&roster, &snapshots);
        let metrics = compute_metrics(StandingsInput {
            status,
            roster: &s.roster,
            snapshots: &s.snapshots,
            profiles: &[],
            viewer: s.roster[0].user_id,
        });

        for pair in metrics.standings.windows(2) {
            prop_assert!(pair[0].game_net >= pair[1].game_net);
        }
        for (i, row) in metrics.standings.iter().enumerate() {
            prop_assert_eq!(row.rank, i + 1);
        }
    }

    #[test]
    fn test_standings_cover_roster_and_history(
        roster in roster_strategy(),
        snapshots in snapshot_strategy(),
    ) {
        let s = build(&roster, &snapshots);
        let metrics = compute_metrics(StandingsInput {
            status: GameStatus::Active,
            roster: &s.roster,
            snapshots: &s.snapshots,
            profiles: &[],
            viewer: s.roster[0].user_id,
        });

        for entry in &s.roster {
            prop_assert!(metrics.standings.iter().any(|p| p.user_id == entry.user_id));
        }
        for snapshot in &s.snapshots {
            prop_assert!(metrics.standings.iter().any(|p| p.user_id == snapshot.user_id));
        }
        prop_assert_eq!(metrics.standings.iter().filter(|p| p.is_me).count(), 1);
    }

    #[test]
    fn test_game_net_equals_history_plus_live(
        roster in roster_strategy(),
        snapshots in snapshot_strategy(),
        status in game_status_strategy(),
    ) {
        let s = build(&roster, &snapshots);
        let metrics = compute_metrics(StandingsInput {
            status,
            roster: &s.roster,
            snapshots: &s.snapshots,
            profiles: &[],
            viewer: s.roster[0].user_id,
        });

        for row in &metrics.standings {
            let history: i64 = s
                .snapshots
                .iter()
                .filter(|snap| snap.user_id == row.user_id)
                .map(|snap| snap.session_net)
                .sum();
            let live = s
                .roster
                .iter()
                .find(|e| e.user_id == row.user_id)
                .filter(|e| status != GameStatus::Ended && e.status == PlayerStatus::Approved)
                .map(|e| e.session_net())
                .unwrap_or(0);
            prop_assert_eq!(row.game_net, history + live);
        }
    }

    #[test]
    fn test_cumulative_chart_is_running_sum(
        roster in roster_strategy(),
        snapshots in snapshot_strategy(),
    ) {
        let s = build(&roster, &snapshots);
        let viewer = s.roster[0].user_id;
        let metrics = compute_metrics(StandingsInput {
            status: GameStatus::Closed,
            roster: &s.roster,
            snapshots: &s.snapshots,
            profiles: &[],
            viewer,
        });

        let own: i64 = s
            .snapshots
            .iter()
            .filter(|snap| snap.user_id == viewer)
            .map(|snap| snap.session_net)
            .sum();

        prop_assert_eq!(metrics.session_chart.len(), metrics.cumulative_chart.len());
        let last = metrics.cumulative_chart.last().map(|p| p.net).unwrap_or(0);
        prop_assert_eq!(last, own);

        let mut running = 0;
        for (point, total) in metrics.session_chart.iter().zip(&metrics.cumulative_chart) {
            running += point.net;
            prop_assert_eq!(total.net, running);
            prop_assert_eq!(&total.label, &point.label);
        }
    }

    #[test]
    fn test_only_approved_players_in_session(
        roster in roster_strategy(),
        snapshots in snapshot_strategy(),
    ) {
        let s = build(&roster, &snapshots);
        let metrics = compute_metrics(StandingsInput {
            status: GameStatus::Active,
            roster: &s.roster,
            snapshots: &s.snapshots,
            profiles: &[],
            viewer: s.roster[0].user_id,
        });

        let approved = s.roster.iter().filter(|e| e.status == PlayerStatus::Approved).count();
        prop_assert_eq!(metrics.session_players.len(), approved);
        for player in &metrics.session_players {
            prop_assert_eq!(player.session_net, player.cash_out - player.cash_in);
            prop_assert!(!player.was_kicked);
        }
    }

    #[test]
    fn test_y_domain_contains_zero_and_values(values in prop::collection::vec(-1_000_000i64..1_000_000, 1..20)) {
        let (lo, hi) = y_domain(&values);
        prop_assert!(lo < 0 && hi > 0);
        for v in values {
            let dollars = v as f64 / 100.0;
            prop_assert!(lo as f64 <= dollars && dollars <= hi as f64);
        }
    }
}
