//! # Vitalog Core Library
//!
//! Core business logic for the Vitalog health-journal backend: the daily
//! streak engine. Users log check-ins throughout the day (voice, text, or
//! upload -- handled elsewhere); once a day a scheduled batch run rebuilds
//! every user's continuous-engagement streak from the raw timestamps and
//! overwrites the stored value.
//!
//! ## Architecture
//!
//! - **Day normalization**: timestamps truncate to calendar days in one
//!   fixed reference frame shared by all users
//! - **Streak calculator**: pure, deterministic run-length computation
//!   anchored at an injected reference day
//! - **Stores**: a PostgREST-compatible hosted backend and a local SQLite
//!   backend behind the same traits
//! - **Engine**: sequential per-user pipeline with failure isolation and a
//!   machine-readable run summary
//!
//! ## Key Components
//!
//! - [`StreakEngine`]: batch run coordinator
//! - [`compute_streak`]: the streak algorithm
//! - [`DayBoundary`]: calendar-day truncation
//! - [`EngineConfig`]: backend selection and day-boundary configuration

pub mod day;
pub mod streak;
pub mod engine;
pub mod store;
pub mod config;
pub mod error;

pub use day::DayBoundary;
pub use streak::{compute_streak, StreakState};
pub use engine::{FailureStage, RunPhase, RunSummary, StreakEngine, UserFailure};
pub use store::{CheckInSource, RestStore, SqliteStore, StreakStore};
pub use config::{data_dir, EngineConfig, StoreBackend, StoreConfig};
pub use error::{ConfigError, CoreError, FetchError, PersistError};
