//! Standings aggregation over roster and snapshot rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::chart::display_name;
use crate::game::{
    Cents, GameStatus, PlayerStatus, Profile, RosterEntry, SessionSnapshot, UserId,
};

/// Everything the aggregator reads; nothing here is mutated
#[derive(Debug, Clone, Copy)]
pub struct StandingsInput<'a> {
    pub status: GameStatus,
    pub roster: &'a [RosterEntry],
    pub snapshots: &'a [SessionSnapshot],
    pub profiles: &'a [Profile],
    pub viewer: UserId,
}

/// One point of a per-session or cumulative series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub date: String,
    pub net: Cents,
}

/// An approved player's numbers for the session in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlayer {
    pub user_id: UserId,
    pub name: String,
    pub display_name: Option<String>,
    pub venmo_handle: Option<String>,
    pub cash_in: Cents,
    pub cash_out: Cents,
    pub session_net: Cents,
    pub game_net: Cents,
    pub is_me: bool,
    pub was_kicked: bool,
}

/// A row of the all-time table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsPlayer {
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    pub display_name: Option<String>,
    pub venmo_handle: Option<String>,
    pub game_net: Cents,
    pub is_me: bool,
    pub was_kicked: bool,
}

/// Metrics shown to one viewer of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetrics {
    pub session_players: Vec<SessionPlayer>,
    pub standings: Vec<StandingsPlayer>,
    pub session_chart: Vec<ChartPoint>,
    pub cumulative_chart: Vec<ChartPoint>,
}

impl GameMetrics {
    /// The viewer's own current-session row, if they are approved
    pub fn me(&self) -> Option<&SessionPlayer> {
        self.session_players.iter().find(|p| p.is_me)
    }
}

struct Totals<'a> {
    live_session: bool,
    entries: HashMap<UserId, &'a RosterEntry>,
    historical: HashMap<UserId, Cents>,
}

impl Totals<'_> {
    fn game_net(&self, user_id: UserId) -> Cents {
        let history = self.historical.get(&user_id).copied().unwrap_or(0);
        let live = match self.entries.get(&user_id) {
            Some(entry) if self.live_session && entry.status == PlayerStatus::Approved => {
                entry.session_net()
            }
            _ => 0,
        };
        history.saturating_add(live)
    }

    fn was_kicked(&self, user_id: UserId) -> bool {
        self.entries
            .get(&user_id)
            .is_some_and(|e| e.status == PlayerStatus::Denied)
            && self.historical.contains_key(&user_id)
    }
}

/// Derive every metric a viewer sees from roster and snapshot rows
///
/// - `game_net` sums a player's snapshots and, until the game has ended,
///   adds the live session net of players still approved.
/// - Standings cover everyone with a roster entry or a snapshot, sorted by
///   `game_net` descending; ties keep roster order.
/// - Chart series follow the viewer's snapshots in close order. Points are
///   labelled by the game's close event, so a player who missed the first
///   close starts at "Session 2".
pub fn compute_metrics(input: StandingsInput<'_>) -> GameMetrics {
    let mut snapshots: Vec<&SessionSnapshot> = input.snapshots.iter().collect();
    snapshots.sort_by_key(|s| (s.created_at, s.id));

    let profiles: HashMap<UserId, &Profile> =
        input.profiles.iter().map(|p| (p.user_id, p)).collect();

    let mut historical: HashMap<UserId, Cents> = HashMap::new();
    for snapshot in &snapshots {
        let total = historical.entry(snapshot.user_id).or_default();
        *total = total.saturating_add(snapshot.session_net);
    }

    let totals = Totals {
        live_session: input.status != GameStatus::Ended,
        entries: input.roster.iter().map(|e| (e.user_id, e)).collect(),
        historical,
    };

    let labels = |user_id: UserId| {
        let profile = profiles.get(&user_id).copied();
        (
            display_name(user_id, profile),
            profile.and_then(|p| p.display_name.clone()),
            profile.and_then(|p| p.venmo_handle.clone()),
        )
    };

    let session_players = input
        .roster
        .iter()
        .filter(|e| e.status == PlayerStatus::Approved)
        .map(|e| {
            let (name, display_name, venmo_handle) = labels(e.user_id);
            SessionPlayer {
                user_id: e.user_id,
                name,
                display_name,
                venmo_handle,
                cash_in: e.cash_in(),
                cash_out: e.cash_out(),
                session_net: e.session_net(),
                game_net: totals.game_net(e.user_id),
                is_me: e.user_id == input.viewer,
                was_kicked: false,
            }
        })
        .collect();

    // Roster order first, then anyone only known from snapshots
    let mut everyone: Vec<UserId> = input.roster.iter().map(|e| e.user_id).collect();
    for snapshot in &snapshots {
        if !everyone.contains(&snapshot.user_id) {
            everyone.push(snapshot.user_id);
        }
    }

    let mut standings: Vec<StandingsPlayer> = everyone
        .into_iter()
        .map(|user_id| {
            let (name, display_name, venmo_handle) = labels(user_id);
            StandingsPlayer {
                rank: 0,
                user_id,
                name,
                display_name,
                venmo_handle,
                game_net: totals.game_net(user_id),
                is_me: user_id == input.viewer,
                was_kicked: totals.was_kicked(user_id),
            }
        })
        .collect();
    standings.sort_by(|a, b| b.game_net.cmp(&a.game_net));
    for (i, player) in standings.iter_mut().enumerate() {
        player.rank = i + 1;
    }

    // Every snapshot written by one close shares its timestamp
    let mut close_events: Vec<DateTime<Utc>> = snapshots.iter().map(|s| s.created_at).collect();
    close_events.dedup();

    let session_chart: Vec<ChartPoint> = snapshots
        .iter()
        .filter(|s| s.user_id == input.viewer)
        .map(|s| {
            let session = close_events.partition_point(|t| *t < s.created_at) + 1;
            ChartPoint {
                label: format!("Session {session}"),
                date: s.created_at.format("%b %-d").to_string(),
                net: s.session_net,
            }
        })
        .collect();

    let mut running: Cents = 0;
    let cumulative_chart = session_chart
        .iter()
        .map(|point| {
            running = running.saturating_add(point.net);
            ChartPoint {
                net: running,
                ..point.clone()
            }
        })
        .collect();

    GameMetrics {
        session_players,
        standings,
        session_chart,
        cumulative_chart,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    struct Fixture {
        game_id: Uuid,
        roster: Vec<RosterEntry>,
        snapshots: Vec<SessionSnapshot>,
        profiles: Vec<Profile>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                game_id: Uuid::new_v4(),
                roster: Vec::new(),
                snapshots: Vec::new(),
                profiles: Vec::new(),
            }
        }

        fn player(&mut self, status: PlayerStatus, cash_in: Cents, cash_out: Cents) -> UserId {
            let user_id = Uuid::new_v4();
            self.roster.push(RosterEntry {
                status,
                cash_in: Some(cash_in),
                cash_out: Some(cash_out),
                ..RosterEntry::pending(self.game_id, user_id, cash_in)
            });
            user_id
        }

        fn snapshot(&mut self, user_id: UserId, session: i64, session_net: Cents) {
            let id = self.snapshots.len() as i64 + 1;
            self.snapshots.push(SessionSnapshot {
                id,
                game_id: self.game_id,
                user_id,
                cash_in: 0,
                cash_out: session_net,
                session_net,
                created_at: Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap()
                    + Duration::days(session),
            });
        }

        fn metrics(&self, status: GameStatus, viewer: UserId) -> GameMetrics {
            compute_metrics(StandingsInput {
                status,
                roster: &self.roster,
                snapshots: &self.snapshots,
                profiles: &self.profiles,
                viewer,
            })
        }
    }

    #[test]
    fn test_game_net_adds_live_session_until_ended() {
        let mut f = Fixture::new();
        let a = f.player(PlayerStatus::Approved, 100, 110);
        f.snapshot(a, 0, 50);
        f.snapshot(a, 1, -20);

        let active = f.metrics(GameStatus::Active, a);
        assert_eq!(active.standings[0].game_net, 40);
        assert_eq!(active.me().unwrap().session_net, 10);

        let ended = f.metrics(GameStatus::Ended, a);
        assert_eq!(ended.standings[0].game_net, 30);
    }

    #[test]
    fn test_no_snapshots_gives_empty_series() {
        let mut f = Fixture::new();
        let a = f.player(PlayerStatus::Approved, 100, 100);

        let metrics = f.metrics(GameStatus::Active, a);
        assert!(metrics.session_chart.is_empty());
        assert!(metrics.cumulative_chart.is_empty());
        assert_eq!(metrics.standings.len(), 1);
    }

    #[test]
    fn test_standings_sorted_descending_with_stable_ties() {
        let mut f = Fixture::new();
        let first = f.player(PlayerStatus::Approved, 100, 100);
        let winner = f.player(PlayerStatus::Approved, 100, 300);
        let second = f.player(PlayerStatus::Pending, 0, 0);
        let loser = f.player(PlayerStatus::Approved, 200, 0);

        let metrics = f.metrics(GameStatus::Active, first);
        let order: Vec<UserId> = metrics.standings.iter().map(|p| p.user_id).collect();
        assert_eq!(order, vec![winner, first, second, loser]);
        let ranks: Vec<usize> = metrics.standings.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_kicked_player_keeps_history_without_live_net() {
        let mut f = Fixture::new();
        let host = f.player(PlayerStatus::Approved, 0, 0);
        let kicked = f.player(PlayerStatus::Denied, 100, 500);
        f.snapshot(kicked, 0, 75);
        let denied_never_played = f.player(PlayerStatus::Denied, 0, 0);

        let metrics = f.metrics(GameStatus::Active, host);
        let row = metrics
            .standings
            .iter()
            .find(|p| p.user_id == kicked)
            .unwrap();
        assert!(row.was_kicked);
        assert_eq!(row.game_net, 75);

        let never = metrics
            .standings
            .iter()
            .find(|p| p.user_id == denied_never_played)
            .unwrap();
        assert!(!never.was_kicked);

        // Not part of the current session
        assert!(metrics.session_players.iter().all(|p| p.user_id != kicked));
    }

    #[test]
    fn test_snapshot_only_user_uses_profile_name() {
        let mut f = Fixture::new();
        let viewer = f.player(PlayerStatus::Approved, 0, 0);
        let ghost = Uuid::new_v4();
        f.snapshot(ghost, 0, -30);
        f.profiles.push(Profile {
            user_id: ghost,
            display_name: None,
            venmo_handle: Some("@ghost".to_string()),
            email: None,
        });

        let metrics = f.metrics(GameStatus::Closed, viewer);
        let row = metrics.standings.iter().find(|p| p.user_id == ghost).unwrap();
        assert_eq!(row.name, "@ghost");
        assert_eq!(row.game_net, -30);
        assert!(!row.was_kicked);
    }

    #[test]
    fn test_chart_series_follow_viewer_snapshots() {
        let mut f = Fixture::new();
        let me = f.player(PlayerStatus::Approved, 0, 0);
        let other = f.player(PlayerStatus::Approved, 0, 0);
        f.snapshot(me, 0, 40);
        f.snapshot(other, 0, -40);
        f.snapshot(me, 1, -15);
        f.snapshot(other, 1, 15);
        f.snapshot(me, 2, 30);

        let metrics = f.metrics(GameStatus::Closed, me);
        let nets: Vec<Cents> = metrics.session_chart.iter().map(|p| p.net).collect();
        assert_eq!(nets, vec![40, -15, 30]);
        let cumulative: Vec<Cents> = metrics.cumulative_chart.iter().map(|p| p.net).collect();
        assert_eq!(cumulative, vec![40, 25, 55]);

        assert_eq!(metrics.session_chart[0].label, "Session 1");
        assert_eq!(metrics.session_chart[0].date, "Mar 1");
        assert_eq!(metrics.cumulative_chart[2].date, "Mar 3");
    }

    #[test]
    fn test_session_labels_follow_game_close_events() {
        let mut f = Fixture::new();
        let host = f.player(PlayerStatus::Approved, 0, 0);
        let late = f.player(PlayerStatus::Approved, 0, 0);
        f.snapshot(host, 0, 10);
        f.snapshot(host, 1, -5);
        f.snapshot(late, 1, 5);
        f.snapshot(host, 2, 0);
        f.snapshot(late, 2, 20);

        let host_labels: Vec<String> = f
            .metrics(GameStatus::Closed, host)
            .session_chart
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(host_labels, vec!["Session 1", "Session 2", "Session 3"]);

        let late_metrics = f.metrics(GameStatus::Closed, late);
        let late_labels: Vec<&str> = late_metrics
            .session_chart
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(late_labels, vec!["Session 2", "Session 3"]);
        assert_eq!(late_metrics.cumulative_chart[0].label, "Session 2");
        assert_eq!(late_metrics.cumulative_chart[1].net, 25);
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let mut f = Fixture::new();
        let me = f.player(PlayerStatus::Approved, 0, 500);
        f.snapshot(me, 0, i64::MAX);
        f.snapshot(me, 1, 1);

        let metrics = f.metrics(GameStatus::Active, me);
        assert_eq!(metrics.standings[0].game_net, i64::MAX);
        assert_eq!(metrics.me().unwrap().game_net, i64::MAX);
        let cumulative: Vec<Cents> = metrics.cumulative_chart.iter().map(|p| p.net).collect();
        assert_eq!(cumulative, vec![i64::MAX, i64::MAX]);
    }

    #[test]
    fn test_snapshots_are_ordered_by_close_time() {
        let mut f = Fixture::new();
        let me = f.player(PlayerStatus::Approved, 0, 0);
        f.snapshot(me, 5, 1);
        f.snapshot(me, 2, 2);

        let metrics = f.metrics(GameStatus::Closed, me);
        let nets: Vec<Cents> = metrics.session_chart.iter().map(|p| p.net).collect();
        assert_eq!(nets, vec![2, 1]);
    }

    #[test]
    fn test_is_me_flags() {
        let mut f = Fixture::new();
        let me = f.player(PlayerStatus::Approved, 10, 20);
        let _other = f.player(PlayerStatus::Approved, 10, 0);

        let metrics = f.metrics(GameStatus::Active, me);
        assert_eq!(metrics.session_players.iter().filter(|p| p.is_me).count(), 1);
        assert_eq!(metrics.standings.iter().filter(|p| p.is_me).count(), 1);
        assert_eq!(metrics.me().unwrap().user_id, me);
    }
}
