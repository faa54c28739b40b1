//! Store backends for check-in events and streak state.
//!
//! The engine talks to its stores through two traits: [`CheckInSource`] for
//! the read-only event side and [`StreakStore`] for the user snapshot and
//! the streak upsert. Two backends implement both: the PostgREST-compatible
//! [`RestStore`] used in production and the local [`SqliteStore`] used for
//! development and tests.

pub mod rest;
pub mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{FetchError, PersistError};
use crate::streak::StreakState;

/// Read side of the event store.
#[async_trait]
pub trait CheckInSource: Send + Sync {
    /// All check-in timestamps for one user, unordered and unbounded.
    /// A user with no history yields an empty vec, not an error.
    async fn fetch_check_ins(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>, FetchError>;
}

/// The user-state store: user registry plus streak records.
#[async_trait]
pub trait StreakStore: Send + Sync {
    /// Snapshot of all known user identifiers at call time. Users created
    /// afterwards are picked up by the next run.
    async fn list_users(&self) -> Result<Vec<String>, FetchError>;

    /// The stored streak for a user, if one has been written.
    async fn load_streak(&self, user_id: &str) -> Result<Option<StreakState>, FetchError>;

    /// Unconditionally overwrite a user's streak record. Writing the same
    /// state twice leaves the store unchanged.
    async fn upsert_streak(&self, user_id: &str, state: &StreakState) -> Result<(), PersistError>;
}
