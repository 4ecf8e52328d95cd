//! PostgreSQL implementation of [`LedgerStore`].
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::sync::Arc;

use super::store::LedgerStore;
use crate::game::{
    Cents, Game, GameId, GameResult, PlayerStatus, Profile, RosterEntry, SessionSnapshot, UserId,
};

/// Default PostgreSQL implementation of `LedgerStore`
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: Arc<PgPool>,
}

impl PgLedgerStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

fn game_from_row(row: &PgRow) -> GameResult<Game> {
    Ok(Game {
        id: row.get("id"),
        short_code: row.get("short_code"),
        host_id: row.get("host_id"),
        status: row.get::<String, _>("status").parse()?,
        description: row.get("description"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn player_from_row(row: &PgRow) -> GameResult<RosterEntry> {
    Ok(RosterEntry {
        game_id: row.get("game_id"),
        user_id: row.get("user_id"),
        status: row.get::<String, _>("status").parse()?,
        requested_cash_in: row.get("requested_cash_in"),
        requested_cash_out: row.get("requested_cash_out"),
        cash_in: row.get("cash_in"),
        cash_out: row.get("cash_out"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        user_id: row.get("id"),
        display_name: row.get("display_name"),
        venmo_handle: row.get("venmo_handle"),
        email: row.get("email"),
    }
}

const GAME_COLUMNS: &str = "id, short_code, host_id, status, description, created_at";

const PLAYER_COLUMNS: &str = "game_id, user_id, status, requested_cash_in, requested_cash_out, \
                              cash_in, cash_out, created_at";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn health_check(&self) -> GameResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn insert_game(&self, game: &Game) -> GameResult<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO games (id, short_code, host_id, status, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(game.id)
        .bind(&game.short_code)
        .bind(game.host_id)
        .bind(game.status.as_str())
        .bind(&game.description)
        .bind(game.created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        // The creator plays in their own game
        sqlx::query(
            r#"
            INSERT INTO game_players (game_id, user_id, status, requested_cash_in, requested_cash_out)
            VALUES ($1, $2, 'approved', 0, 0)
            "#,
        )
        .bind(game.id)
        .bind(game.host_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn find_game(&self, game_id: GameId) -> GameResult<Option<Game>> {
        let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
            .bind(game_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn find_game_by_code(&self, short_code: &str) -> GameResult<Option<Game>> {
        let row = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE LOWER(short_code) = LOWER($1)"
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn update_host(&self, game_id: GameId, host_id: UserId) -> GameResult<()> {
        sqlx::query("UPDATE games SET host_id = $1 WHERE id = $2")
            .bind(host_id)
            .bind(game_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn end_game(&self, game_id: GameId) -> GameResult<bool> {
        let result =
            sqlx::query("UPDATE games SET status = 'ended' WHERE id = $1 AND status <> 'ended'")
                .bind(game_id)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reopen_game(&self, game_id: GameId) -> GameResult<bool> {
        let result =
            sqlx::query("UPDATE games SET status = 'active' WHERE id = $1 AND status = 'closed'")
                .bind(game_id)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn close_session(&self, game_id: GameId) -> GameResult<Option<usize>> {
        let mut tx = self.pool.begin().await?;

        // Only the request that wins the flip writes snapshots
        let flipped =
            sqlx::query("UPDATE games SET status = 'closed' WHERE id = $1 AND status = 'active'")
                .bind(game_id)
                .execute(&mut *tx)
                .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO session_snapshots (game_id, user_id, cash_in, cash_out, session_net)
            SELECT game_id,
                   user_id,
                   COALESCE(cash_in, 0),
                   COALESCE(cash_out, 0),
                   COALESCE(cash_out, 0) - COALESCE(cash_in, 0)
            FROM game_players
            WHERE game_id = $1 AND status = 'approved'
            ORDER BY created_at, user_id
            "#,
        )
        .bind(game_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(inserted.rows_affected() as usize))
    }

    async fn find_player(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> GameResult<Option<RosterEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM game_players WHERE game_id = $1 AND user_id = $2"
        ))
        .bind(game_id)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn list_players(&self, game_id: GameId) -> GameResult<Vec<RosterEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM game_players WHERE game_id = $1 ORDER BY created_at, user_id"
        ))
        .bind(game_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(player_from_row).collect()
    }

    async fn insert_player(&self, entry: &RosterEntry) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO game_players
                (game_id, user_id, status, requested_cash_in, requested_cash_out, cash_in, cash_out, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.game_id)
        .bind(entry.user_id)
        .bind(entry.status.as_str())
        .bind(entry.requested_cash_in)
        .bind(entry.requested_cash_out)
        .bind(entry.cash_in)
        .bind(entry.cash_out)
        .bind(entry.created_at)
        .execute(self.pool.as_ref())
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_player_status(
        &self,
        game_id: GameId,
        user_id: UserId,
        status: PlayerStatus,
    ) -> GameResult<bool> {
        let result =
            sqlx::query("UPDATE game_players SET status = $1 WHERE game_id = $2 AND user_id = $3")
                .bind(status.as_str())
                .bind(game_id)
                .bind(user_id)
                .execute(self.pool.as_ref())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn transition_player_status(
        &self,
        game_id: GameId,
        user_id: UserId,
        from: PlayerStatus,
        to: PlayerStatus,
    ) -> GameResult<bool> {
        let result = sqlx::query(
            "UPDATE game_players SET status = $1 WHERE game_id = $2 AND user_id = $3 AND status = $4",
        )
        .bind(to.as_str())
        .bind(game_id)
        .bind(user_id)
        .bind(from.as_str())
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn approve_player(&self, game_id: GameId, user_id: UserId) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game_players
            SET status = 'approved', cash_in = requested_cash_in
            WHERE game_id = $1 AND user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(game_id)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_requested_amounts(
        &self,
        game_id: GameId,
        user_id: UserId,
        requested_cash_in: Cents,
        requested_cash_out: Cents,
    ) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game_players
            SET requested_cash_in = $1, requested_cash_out = $2
            WHERE game_id = $3 AND user_id = $4
            "#,
        )
        .bind(requested_cash_in)
        .bind(requested_cash_out)
        .bind(game_id)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_cash(
        &self,
        game_id: GameId,
        user_id: UserId,
        cash_in: Cents,
        cash_out: Cents,
    ) -> GameResult<bool> {
        let result = sqlx::query(
            "UPDATE game_players SET cash_in = $1, cash_out = $2 WHERE game_id = $3 AND user_id = $4",
        )
        .bind(cash_in)
        .bind(cash_out)
        .bind(game_id)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_snapshots(&self, game_id: GameId) -> GameResult<Vec<SessionSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, game_id, user_id, cash_in, cash_out, session_net, created_at
            FROM session_snapshots
            WHERE game_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(game_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SessionSnapshot {
                id: row.get("id"),
                game_id: row.get("game_id"),
                user_id: row.get("user_id"),
                cash_in: row.get("cash_in"),
                cash_out: row.get("cash_out"),
                session_net: row.get("session_net"),
                created_at: row.get::<DateTime<Utc>, _>("created_at"),
            })
            .collect())
    }

    async fn find_profile(&self, user_id: UserId) -> GameResult<Option<Profile>> {
        let row =
            sqlx::query("SELECT id, display_name, venmo_handle, email FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    async fn find_profiles(&self, user_ids: &[UserId]) -> GameResult<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, display_name, venmo_handle, email FROM profiles WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.iter().map(profile_from_row).collect())
    }

    async fn insert_profile(&self, profile: &Profile) -> GameResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, display_name, venmo_handle, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.display_name)
        .bind(&profile.venmo_handle)
        .bind(&profile.email)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }
}
