//! The daily batch run.
//!
//! One invocation per calendar day, triggered externally. Each user is
//! processed independently: fetch check-ins, normalize to day keys, compute
//! the streak, overwrite the stored record. A failing user is recorded and
//! skipped; only a failed user enumeration (nothing to process) or missing
//! configuration aborts the run.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::day::DayBoundary;
use crate::error::{CoreError, FetchError, PersistError};
use crate::store::{CheckInSource, StreakStore};
use crate::streak::{compute_streak, StreakState};

/// Phases of a batch run, reported in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    FetchingUsers,
    ProcessingUsers,
    Completed,
    CompletedWithErrors,
}

/// Which step of the per-user pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Persist,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Fetch => write!(f, "fetch"),
            FailureStage::Persist => write!(f, "persist"),
        }
    }
}

/// A single user's failure, kept in the run summary for alerting.
#[derive(Debug, Clone, Serialize)]
pub struct UserFailure {
    pub user_id: String,
    pub stage: FailureStage,
    pub message: String,
}

impl UserFailure {
    fn fetch(user_id: &str, err: FetchError) -> Self {
        Self {
            user_id: user_id.to_string(),
            stage: FailureStage::Fetch,
            message: err.to_string(),
        }
    }

    fn persist(user_id: &str, err: PersistError) -> Self {
        Self {
            user_id: user_id.to_string(),
            stage: FailureStage::Persist,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for UserFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for user {}: {}", self.stage, self.user_id, self.message)
    }
}

impl std::error::Error for UserFailure {}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// The reference day the run computed streaks for.
    pub run_date: NaiveDate,
    /// Users in the snapshot taken at run start.
    pub total_users: usize,
    /// Users whose streak was recomputed and persisted.
    pub succeeded: usize,
    /// Per-user failures; empty on full success.
    pub failures: Vec<UserFailure>,
    /// Terminal phase reached.
    pub phase: RunPhase,
}

impl RunSummary {
    fn new(run_date: NaiveDate) -> Self {
        Self {
            run_date,
            total_users: 0,
            succeeded: 0,
            failures: Vec::new(),
            phase: RunPhase::Idle,
        }
    }

    /// Whether every user in the snapshot was processed and persisted.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Coordinates a full streak recomputation over every known user.
pub struct StreakEngine<S> {
    store: S,
    boundary: DayBoundary,
}

impl<S> StreakEngine<S>
where
    S: CheckInSource + StreakStore,
{
    pub fn new(store: S, boundary: DayBoundary) -> Self {
        Self { store, boundary }
    }

    pub fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the batch for the given reference day.
    ///
    /// `today` is supplied by the caller (wall clock or an explicit
    /// backfill date), never read here, so reruns are deterministic.
    ///
    /// # Errors
    /// Returns an error only when the user snapshot itself cannot be
    /// fetched; per-user failures land in the summary instead.
    pub async fn run(&self, today: NaiveDate) -> Result<RunSummary, CoreError> {
        let mut summary = RunSummary::new(today);
        info!(date = %today, "streak run started");

        summary.phase = RunPhase::FetchingUsers;
        let users = self.store.list_users().await?;
        info!(user_count = users.len(), "user snapshot taken");

        summary.total_users = users.len();
        summary.phase = RunPhase::ProcessingUsers;

        for user_id in &users {
            match self.process_user(user_id, today).await {
                Ok(state) => {
                    debug!(
                        user_id = %user_id,
                        streak = state.streak_count,
                        "streak persisted"
                    );
                    summary.succeeded += 1;
                }
                Err(failure) => {
                    warn!(
                        user_id = %failure.user_id,
                        stage = %failure.stage,
                        error = %failure.message,
                        "user skipped"
                    );
                    summary.failures.push(failure);
                }
            }
        }

        summary.phase = if summary.is_success() {
            RunPhase::Completed
        } else {
            RunPhase::CompletedWithErrors
        };
        info!(
            succeeded = summary.succeeded,
            failed = summary.failures.len(),
            "streak run finished"
        );
        Ok(summary)
    }

    /// Recompute and persist one user's streak. Also the entry point for
    /// single-user backfills from the CLI.
    pub async fn process_user(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<StreakState, UserFailure> {
        let timestamps = self
            .store
            .fetch_check_ins(user_id)
            .await
            .map_err(|e| UserFailure::fetch(user_id, e))?;

        let days = self.boundary.day_keys(timestamps);
        let state = compute_streak(&days, today);

        self.store
            .upsert_streak(user_id, &state)
            .await
            .map_err(|e| UserFailure::persist(user_id, e))?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// In-memory store with per-user failure injection.
    #[derive(Default)]
    struct MemoryStore {
        users: Vec<String>,
        check_ins: HashMap<String, Vec<DateTime<Utc>>>,
        streaks: Mutex<HashMap<String, StreakState>>,
        fail_fetch_for: Option<String>,
        fail_persist_for: Option<String>,
    }

    impl MemoryStore {
        fn with_users(users: &[&str]) -> Self {
            Self {
                users: users.iter().map(|u| u.to_string()).collect(),
                ..Default::default()
            }
        }

        fn check_in(&mut self, user_id: &str, at: DateTime<Utc>) {
            self.check_ins.entry(user_id.to_string()).or_default().push(at);
        }

        fn stored(&self, user_id: &str) -> Option<StreakState> {
            self.streaks.lock().unwrap().get(user_id).copied()
        }
    }

    #[async_trait]
    impl CheckInSource for MemoryStore {
        async fn fetch_check_ins(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>, FetchError> {
            if self.fail_fetch_for.as_deref() == Some(user_id) {
                return Err(FetchError::Malformed("injected fetch failure".to_string()));
            }
            Ok(self.check_ins.get(user_id).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl StreakStore for MemoryStore {
        async fn list_users(&self) -> Result<Vec<String>, FetchError> {
            Ok(self.users.clone())
        }

        async fn load_streak(&self, user_id: &str) -> Result<Option<StreakState>, FetchError> {
            Ok(self.stored(user_id))
        }

        async fn upsert_streak(
            &self,
            user_id: &str,
            state: &StreakState,
        ) -> Result<(), PersistError> {
            if self.fail_persist_for.as_deref() == Some(user_id) {
                return Err(PersistError::Rejected {
                    status: 500,
                    message: "injected persist failure".to_string(),
                });
            }
            self.streaks
                .lock()
                .unwrap()
                .insert(user_id.to_string(), *state);
            Ok(())
        }
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        date.and_hms_opt(hour, 0, 0).unwrap().and_utc()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[tokio::test]
    async fn test_all_users_processed() {
        let mut store = MemoryStore::with_users(&["alice", "bob"]);
        store.check_in("alice", at(today(), 8));
        store.check_in("alice", at(today() - Duration::days(1), 9));
        // bob has no history.

        let engine = StreakEngine::new(store, DayBoundary::utc());
        let summary = engine.run(today()).await.unwrap();

        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.is_success());
        assert_eq!(summary.phase, RunPhase::Completed);

        assert_eq!(
            engine.store.stored("alice"),
            Some(StreakState {
                streak_count: 2,
                last_confirmed_date: Some(today()),
            })
        );
        assert_eq!(engine.store.stored("bob"), Some(StreakState::empty()));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let mut store = MemoryStore::with_users(&["alice", "bob", "carol"]);
        store.check_in("alice", at(today(), 8));
        store.check_in("carol", at(today(), 10));
        store.fail_fetch_for = Some("bob".to_string());

        let engine = StreakEngine::new(store, DayBoundary::utc());
        let summary = engine.run(today()).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].user_id, "bob");
        assert_eq!(summary.failures[0].stage, FailureStage::Fetch);
        assert_eq!(summary.phase, RunPhase::CompletedWithErrors);

        // Neighbours were still written.
        assert!(engine.store.stored("alice").is_some());
        assert!(engine.store.stored("carol").is_some());
        assert!(engine.store.stored("bob").is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_is_isolated() {
        let mut store = MemoryStore::with_users(&["alice", "bob"]);
        store.check_in("alice", at(today(), 8));
        store.check_in("bob", at(today(), 8));
        store.fail_persist_for = Some("alice".to_string());

        let engine = StreakEngine::new(store, DayBoundary::utc());
        let summary = engine.run(today()).await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failures[0].stage, FailureStage::Persist);
        assert!(engine.store.stored("bob").is_some());
    }

    #[tokio::test]
    async fn test_rerun_same_day_is_idempotent() {
        let mut store = MemoryStore::with_users(&["alice"]);
        store.check_in("alice", at(today(), 8));
        store.check_in("alice", at(today() - Duration::days(1), 9));

        let engine = StreakEngine::new(store, DayBoundary::utc());
        engine.run(today()).await.unwrap();
        let first = engine.store.stored("alice");
        engine.run(today()).await.unwrap();
        assert_eq!(engine.store.stored("alice"), first);
    }

    #[tokio::test]
    async fn test_empty_snapshot_completes() {
        let store = MemoryStore::with_users(&[]);
        let engine = StreakEngine::new(store, DayBoundary::utc());
        let summary = engine.run(today()).await.unwrap();
        assert_eq!(summary.total_users, 0);
        assert_eq!(summary.phase, RunPhase::Completed);
    }
}
