//! PostgREST-compatible hosted store (Supabase flavored).
//!
//! Reads the `check_ins` table for events and the `profiles` table for the
//! user registry; writes streak fields back onto `profiles`. Authentication
//! is a service key sent both as `apikey` and as a bearer token, the
//! convention the hosted API expects.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FetchError, PersistError};
use crate::store::{CheckInSource, StreakStore};
use crate::streak::StreakState;

/// Rows fetched per page. PostgREST caps unspecified requests at its own
/// default, so pagination is explicit.
const PAGE_SIZE: usize = 1000;

/// Client for the hosted event/state store.
pub struct RestStore {
    base_url: String,
    service_key: String,
    http_client: Client,
}

#[derive(Deserialize)]
struct CheckInRow {
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ProfileIdRow {
    id: String,
}

/// Wire shape of the streak fields on `profiles`.
#[derive(Serialize, Deserialize)]
struct StreakRow {
    streak_count: u32,
    last_check_in_date: Option<NaiveDate>,
}

impl From<&StreakState> for StreakRow {
    fn from(state: &StreakState) -> Self {
        Self {
            streak_count: state.streak_count,
            last_check_in_date: state.last_confirmed_date,
        }
    }
}

impl From<StreakRow> for StreakState {
    fn from(row: StreakRow) -> Self {
        Self {
            streak_count: row.streak_count,
            last_confirmed_date: row.last_check_in_date,
        }
    }
}

impl RestStore {
    /// Create a client for the store at `base_url` using a service key.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            http_client: Client::new(),
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    /// Fetch every page of `table` matching `filters`, decoding rows as `T`.
    async fn fetch_all<T>(
        &self,
        table: &str,
        select: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(table);
        let mut rows: Vec<T> = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("select", select.to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
            ];
            query.extend(filters.iter().cloned());

            let resp = self
                .http_client
                .get(&url)
                .query(&query)
                .header("apikey", &self.service_key)
                .bearer_auth(&self.service_key)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(FetchError::Rejected {
                    status: status.as_u16(),
                    message,
                });
            }

            let page: Vec<T> = resp
                .json()
                .await
                .map_err(|e| FetchError::Malformed(e.to_string()))?;
            let fetched = page.len();
            rows.extend(page);

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        debug!(table, rows = rows.len(), "fetched from hosted store");
        Ok(rows)
    }
}

#[async_trait]
impl CheckInSource for RestStore {
    async fn fetch_check_ins(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>, FetchError> {
        let rows: Vec<CheckInRow> = self
            .fetch_all(
                "check_ins",
                "created_at",
                &[("user_id", format!("eq.{user_id}"))],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.created_at).collect())
    }
}

#[async_trait]
impl StreakStore for RestStore {
    async fn list_users(&self) -> Result<Vec<String>, FetchError> {
        let rows: Vec<ProfileIdRow> = self.fetch_all("profiles", "id", &[]).await?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    async fn load_streak(&self, user_id: &str) -> Result<Option<StreakState>, FetchError> {
        let rows: Vec<StreakRow> = self
            .fetch_all(
                "profiles",
                "streak_count,last_check_in_date",
                &[("id", format!("eq.{user_id}"))],
            )
            .await?;
        Ok(rows.into_iter().next().map(StreakState::from))
    }

    async fn upsert_streak(&self, user_id: &str, state: &StreakState) -> Result<(), PersistError> {
        let url = self.endpoint("profiles");
        let resp = self
            .http_client
            .patch(&url)
            .query(&[("id", format!("eq.{user_id}"))])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(&StreakRow::from(state))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PersistError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
