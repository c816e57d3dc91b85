mod db;
mod memory;

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use labpanic_core::leaderboard::ScoreEntry;
use labpanic_core::{Platform, ScoreError};
use uuid::Uuid;

pub(crate) use db::SqliteStore;
pub(crate) use memory::MemoryStore;

/// How many fresh share ids to try before giving up on an insert.
const SHARE_ID_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) session_id: Uuid,
    pub(crate) start_token: String,
    pub(crate) platform: Platform,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
    pub(crate) consumed: bool,
}

impl Session {
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A validated submission waiting to be stored against its session.
#[derive(Debug, Clone)]
pub(crate) struct NewScore {
    pub(crate) session_id: Uuid,
    pub(crate) start_token: String,
    pub(crate) player_name: String,
    pub(crate) score: u32,
    pub(crate) platform: Platform,
    pub(crate) week_key: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreRecord {
    pub(crate) score_id: Uuid,
    pub(crate) session_id: Uuid,
    pub(crate) player_name: String,
    pub(crate) score: u32,
    pub(crate) platform: Platform,
    pub(crate) week_key: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) share_id: String,
    /// Store insertion order, used to break exact timestamp ties.
    pub(crate) seq: u64,
}

impl ScoreRecord {
    pub(crate) fn to_entry(&self) -> ScoreEntry {
        ScoreEntry {
            player_name: self.player_name.clone(),
            score: self.score,
            created_at_ms: self.created_at.timestamp_millis(),
            seq: self.seq,
        }
    }
}

/// Result of the atomic consume-and-insert step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsumeOutcome {
    Inserted(ScoreRecord),
    /// No session with this id and token.
    NotFound,
    /// The session already authorized a submission.
    AlreadyConsumed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StoreCounts {
    pub(crate) sessions: usize,
    pub(crate) scores: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreError(pub(crate) String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for ScoreError {
    fn from(err: StoreError) -> Self {
        ScoreError::StorageFailure(err.0)
    }
}

/// Persistence for sessions and score records. Implementations must make
/// `consume_session_and_insert_score` atomic: of any number of racing
/// calls for one session, exactly one sees `Inserted`.
pub(crate) trait Store: Send + Sync {
    fn create_session(&self, session: &Session) -> Result<(), StoreError>;

    fn get_session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError>;

    fn consume_session_and_insert_score(
        &self,
        score: &NewScore,
    ) -> Result<ConsumeOutcome, StoreError>;

    /// Score history as ranking entries, restricted to one week when given.
    fn query_scores(&self, week_key: Option<&str>) -> Result<Vec<ScoreEntry>, StoreError>;

    /// `(weekly, alltime)` histories read from one snapshot, so both ranks
    /// of a submission see the same set of scores.
    fn query_rank_histories(
        &self,
        week_key: &str,
    ) -> Result<(Vec<ScoreEntry>, Vec<ScoreEntry>), StoreError>;

    /// Distinct week keys, most recent first.
    fn list_distinct_weeks(&self, limit: usize) -> Result<Vec<String>, StoreError>;

    fn get_score_by_share_id(&self, share_id: &str) -> Result<Option<ScoreRecord>, StoreError>;

    /// Removes sessions whose expiry is before `now`. Returns how many went.
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    fn counts(&self) -> Result<StoreCounts, StoreError>;
}

/// 12 URL-safe characters drawn from a fresh v4 uuid.
pub(crate) fn new_share_id() -> String {
    URL_SAFE_NO_PAD.encode(&Uuid::new_v4().as_bytes()[..9])
}

pub(crate) fn new_start_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Constant-time comparison so token checks do not leak prefix matches.
pub(crate) fn tokens_match(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

pub(crate) fn timestamp_from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError(format!("timestamp out of range in store: {ms}")))
}
