//! Session and score operations, independent of HTTP. Every function takes
//! the store and the current time explicitly.

use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use labpanic_core::leaderboard::{best_scores, rank_of, ranked_entries, RankedEntry};
use labpanic_core::rules::{clamp_leaderboard_limit, parse_leading_int, MAX_LISTED_WEEKS};
use labpanic_core::{validate_player_name, validate_score, Platform, Scope, ScoreError};
use serde_json::Value;
use uuid::Uuid;

use crate::store::{
    new_start_token, tokens_match, ConsumeOutcome, NewScore, ScoreRecord, Session, Store,
};
use crate::types::SubmitScoreRequest;
use crate::week::week_key;

#[derive(Debug, Clone)]
pub(crate) struct SubmittedScore {
    pub(crate) record: ScoreRecord,
    pub(crate) weekly_rank: usize,
    pub(crate) alltime_rank: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Leaderboard {
    pub(crate) scope: Scope,
    pub(crate) week_key: Option<String>,
    pub(crate) entries: Vec<RankedEntry>,
}

pub(crate) fn start_session(
    store: &dyn Store,
    platform: Option<&str>,
    ttl: TimeDelta,
    now: DateTime<Utc>,
) -> Result<Session, ScoreError> {
    let platform = Platform::from_str(platform.ok_or(ScoreError::InvalidPlatform)?)?;
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| ScoreError::StorageFailure("session expiry out of range".to_string()))?;

    let session = Session {
        session_id: Uuid::new_v4(),
        start_token: new_start_token(),
        platform,
        started_at: now,
        expires_at,
        consumed: false,
    };
    store.create_session(&session)?;
    tracing::info!(session_id = %session.session_id, platform = %platform, "session started");
    Ok(session)
}

/// Checks run in a fixed order: missing fields, session, expiry, name,
/// score. Only then is the session consumed. The submitted `platform` only
/// has to be present; the record keeps the platform the session was issued
/// for.
pub(crate) fn submit_score(
    store: &dyn Store,
    request: &SubmitScoreRequest,
    now: DateTime<Utc>,
) -> Result<SubmittedScore, ScoreError> {
    let (Some(session_id), Some(start_token), Some(player_name), Some(score), Some(_platform)) = (
        request.session_id.as_deref(),
        request.start_token.as_deref(),
        request.player_name.as_deref(),
        request.score.as_ref().filter(|score| !score.is_null()),
        request.platform.as_deref(),
    ) else {
        return Err(ScoreError::MissingFields);
    };

    let session_id = Uuid::parse_str(session_id).map_err(|_| ScoreError::InvalidSession)?;
    let session = store
        .get_session(session_id)?
        .ok_or(ScoreError::InvalidSession)?;
    if session.consumed || !tokens_match(&session.start_token, start_token) {
        return Err(ScoreError::InvalidSession);
    }
    if session.is_expired(now) {
        return Err(ScoreError::SessionExpired);
    }

    validate_player_name(player_name)?;
    let score = parse_score(score)?;

    let weekly_key = week_key(now);
    let new_score = NewScore {
        session_id,
        start_token: start_token.to_string(),
        player_name: player_name.to_string(),
        score,
        platform: session.platform,
        week_key: weekly_key.clone(),
        created_at: now,
    };
    let record = match store.consume_session_and_insert_score(&new_score)? {
        ConsumeOutcome::Inserted(record) => record,
        // Lost a race with another submit for the same session.
        ConsumeOutcome::NotFound | ConsumeOutcome::AlreadyConsumed => {
            tracing::warn!(session_id = %session_id, "session consumed concurrently");
            return Err(ScoreError::InvalidSession);
        }
    };

    let submitted = record.to_entry();
    let (weekly, alltime) = store.query_rank_histories(&weekly_key)?;
    let weekly_best = best_scores(&weekly);
    let alltime_best = best_scores(&alltime);
    let weekly_rank = rank_of(&weekly_best, &submitted);
    let alltime_rank = rank_of(&alltime_best, &submitted);

    tracing::info!(
        score_id = %record.score_id,
        session_id = %session_id,
        score = record.score,
        weekly_rank,
        alltime_rank,
        "score recorded"
    );

    Ok(SubmittedScore {
        record,
        weekly_rank,
        alltime_rank,
    })
}

/// `limit` is taken raw from the query string and read up to its first
/// non-digit (`5.5` is 5). Unparsable or zero means the default, anything
/// else is clamped.
pub(crate) fn get_leaderboard(
    store: &dyn Store,
    scope: Option<&str>,
    limit: Option<&str>,
    week: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Leaderboard, ScoreError> {
    let scope = Scope::from_str(scope.ok_or(ScoreError::InvalidScope)?)?;
    let limit = clamp_leaderboard_limit(limit.and_then(parse_leading_int));

    let requested_week = match scope {
        Scope::Weekly => Some(
            week.filter(|week| !week.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| week_key(now)),
        ),
        Scope::Alltime => None,
    };

    let history = store.query_scores(requested_week.as_deref())?;
    let entries = ranked_entries(&best_scores(&history), limit);

    Ok(Leaderboard {
        scope,
        week_key: requested_week,
        entries,
    })
}

pub(crate) fn get_available_weeks(store: &dyn Store) -> Result<Vec<String>, ScoreError> {
    Ok(store.list_distinct_weeks(MAX_LISTED_WEEKS)?)
}

pub(crate) fn get_shared_score(
    store: &dyn Store,
    share_id: &str,
) -> Result<Option<ScoreRecord>, ScoreError> {
    Ok(store.get_score_by_share_id(share_id)?)
}

/// Integers, and floats with no fractional part, are accepted; range is
/// checked by `validate_score`.
fn parse_score(value: &Value) -> Result<u32, ScoreError> {
    if let Some(score) = value.as_i64() {
        return validate_score(score);
    }
    match value.as_f64() {
        Some(score) if score.fract() == 0.0 && score.abs() < 1e15 => validate_score(score as i64),
        _ => Err(ScoreError::InvalidScore),
    }
}
