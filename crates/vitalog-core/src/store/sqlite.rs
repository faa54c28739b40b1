//! SQLite-backed local store.
//!
//! Development and test backend mirroring the hosted store's shape: a
//! `users` registry, an append-only `check_ins` log, and one `streaks` row
//! per user. Timestamps are stored as RFC 3339 text, dates as `YYYY-MM-DD`.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{FetchError, PersistError};
use crate::store::{CheckInSource, StreakStore};
use crate::streak::StreakState;

/// Local SQLite store implementing both engine-facing traits.
///
/// The connection sits behind a mutex because the store traits are async;
/// no lock is ever held across an await point.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and migrate) the database at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests and throwaway runs).
    pub fn open_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        let conn = self.lock_infallible();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS check_ins (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_check_ins_user_id ON check_ins(user_id);

            CREATE TABLE IF NOT EXISTS streaks (
                user_id             TEXT PRIMARY KEY,
                streak_count        INTEGER NOT NULL,
                last_confirmed_date TEXT
            );",
        )?;
        Ok(())
    }

    /// Record a check-in, registering the user on first sight.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_check_in(
        &self,
        user_id: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), rusqlite::Error> {
        let conn = self.lock_infallible();
        conn.execute("INSERT OR IGNORE INTO users (id) VALUES (?1)", params![user_id])?;
        conn.execute(
            "INSERT INTO check_ins (user_id, occurred_at) VALUES (?1, ?2)",
            params![user_id, occurred_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Register a user without any check-in history.
    pub fn add_user(&self, user_id: &str) -> Result<(), rusqlite::Error> {
        let conn = self.lock_infallible();
        conn.execute("INSERT OR IGNORE INTO users (id) VALUES (?1)", params![user_id])?;
        Ok(())
    }

    fn lock_infallible(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means another thread panicked mid-query; the
        // connection itself is still usable for independent statements.
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CheckInSource for SqliteStore {
    async fn fetch_check_ins(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>, FetchError> {
        let conn = self.lock_infallible();
        let mut stmt = conn.prepare("SELECT occurred_at FROM check_ins WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

        let mut timestamps = Vec::new();
        for row in rows {
            let raw = row?;
            let parsed = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| FetchError::Malformed(format!("bad timestamp {raw:?}: {e}")))?;
            timestamps.push(parsed.with_timezone(&Utc));
        }
        Ok(timestamps)
    }
}

#[async_trait]
impl StreakStore for SqliteStore {
    async fn list_users(&self) -> Result<Vec<String>, FetchError> {
        let conn = self.lock_infallible();
        let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    async fn load_streak(&self, user_id: &str) -> Result<Option<StreakState>, FetchError> {
        let conn = self.lock_infallible();
        let row = conn
            .query_row(
                "SELECT streak_count, last_confirmed_date FROM streaks WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, Option<String>>(1)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((streak_count, raw_date)) => {
                let last_confirmed_date = raw_date
                    .map(|raw| {
                        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                            FetchError::Malformed(format!("bad date {raw:?}: {e}"))
                        })
                    })
                    .transpose()?;
                Ok(Some(StreakState {
                    streak_count,
                    last_confirmed_date,
                }))
            }
        }
    }

    async fn upsert_streak(&self, user_id: &str, state: &StreakState) -> Result<(), PersistError> {
        let conn = self.lock_infallible();
        conn.execute(
            "INSERT INTO streaks (user_id, streak_count, last_confirmed_date)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 streak_count = excluded.streak_count,
                 last_confirmed_date = excluded.last_confirmed_date",
            params![
                user_id,
                state.streak_count,
                state.last_confirmed_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_record_and_fetch_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        store.record_check_in("alice", ts(8)).unwrap();
        store.record_check_in("alice", ts(20)).unwrap();

        let timestamps = store.fetch_check_ins("alice").await.unwrap();
        assert_eq!(timestamps.len(), 2);
        assert!(timestamps.contains(&ts(8)));
    }

    #[tokio::test]
    async fn test_fetch_unknown_user_is_empty() {
        let store = SqliteStore::open_memory().unwrap();
        let timestamps = store.fetch_check_ins("nobody").await.unwrap();
        assert!(timestamps.is_empty());
    }

    #[tokio::test]
    async fn test_list_users_snapshot() {
        let store = SqliteStore::open_memory().unwrap();
        store.record_check_in("bob", ts(9)).unwrap();
        store.add_user("carol").unwrap();
        // Duplicate registration is ignored.
        store.record_check_in("bob", ts(10)).unwrap();

        let users = store.list_users().await.unwrap();
        assert_eq!(users, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = SqliteStore::open_memory().unwrap();
        let first = StreakState {
            streak_count: 3,
            last_confirmed_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        };
        store.upsert_streak("alice", &first).await.unwrap();

        let second = StreakState {
            streak_count: 0,
            last_confirmed_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        };
        store.upsert_streak("alice", &second).await.unwrap();

        let loaded = store.load_streak("alice").await.unwrap();
        assert_eq!(loaded, Some(second));
    }

    #[tokio::test]
    async fn test_load_streak_missing_user() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.load_streak("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_date_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let state = StreakState::empty();
        store.upsert_streak("dave", &state).await.unwrap();
        assert_eq!(store.load_streak("dave").await.unwrap(), Some(state));
    }
}
