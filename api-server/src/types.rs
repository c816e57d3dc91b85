use chrono::{DateTime, SecondsFormat, Utc};
use labpanic_core::leaderboard::RankedEntry;
use labpanic_core::Scope;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub(crate) fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StartSessionRequest {
    #[serde(default)]
    pub(crate) platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartSessionResponse {
    pub(crate) session_id: Uuid,
    pub(crate) start_token: String,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
}

/// Every field is optional here so an absent one surfaces as
/// `MISSING_FIELDS` instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SubmitScoreRequest {
    #[serde(default)]
    pub(crate) session_id: Option<String>,
    #[serde(default)]
    pub(crate) start_token: Option<String>,
    #[serde(default)]
    pub(crate) player_name: Option<String>,
    /// Kept raw so non-integer values map to `INVALID_SCORE`.
    #[serde(default)]
    pub(crate) score: Option<serde_json::Value>,
    #[serde(default)]
    pub(crate) platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitScoreResponse {
    pub(crate) score_id: Uuid,
    pub(crate) player_name: String,
    pub(crate) score: u32,
    pub(crate) weekly_rank: usize,
    pub(crate) alltime_rank: usize,
    pub(crate) weekly_key: String,
    pub(crate) created_at: String,
    pub(crate) share_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LeaderboardQuery {
    #[serde(default)]
    pub(crate) scope: Option<String>,
    #[serde(default)]
    pub(crate) limit: Option<String>,
    #[serde(default)]
    pub(crate) week: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardEntry {
    pub(crate) rank: usize,
    pub(crate) player_name: String,
    pub(crate) score: u32,
    pub(crate) created_at: String,
}

impl LeaderboardEntry {
    pub(crate) fn from_ranked(entry: RankedEntry) -> Self {
        let created_at = DateTime::from_timestamp_millis(entry.created_at_ms)
            .map(iso_timestamp)
            .unwrap_or_default();
        Self {
            rank: entry.rank,
            player_name: entry.player_name,
            score: entry.score,
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardResponse {
    pub(crate) scope: Scope,
    /// `null` for the all-time board.
    pub(crate) weekly_key: Option<String>,
    pub(crate) updated_at: String,
    pub(crate) entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WeeksResponse {
    pub(crate) weeks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) timestamp: String,
    pub(crate) sessions: usize,
    pub(crate) scores: usize,
    pub(crate) environment: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VersionResponse {
    pub(crate) version: &'static str,
}
