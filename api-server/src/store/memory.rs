use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use labpanic_core::leaderboard::ScoreEntry;
use uuid::Uuid;

use super::*;

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, Session>,
    scores: Vec<ScoreRecord>,
    share_index: HashMap<String, usize>,
}

impl Inner {
    fn entries(&self, week_key: Option<&str>) -> Vec<ScoreEntry> {
        self.scores
            .iter()
            .filter(|record| week_key.map_or(true, |week| record.week_key == week))
            .map(ScoreRecord::to_entry)
            .collect()
    }
}

/// Process-local store. Everything lives behind one mutex, so the
/// consume-and-insert step is trivially atomic.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError("memory store lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.sessions.contains_key(&session.session_id) {
            return Err(StoreError(format!(
                "session already exists: {}",
                session.session_id
            )));
        }
        inner.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    fn get_session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.lock()?.sessions.get(&session_id).cloned())
    }

    fn consume_session_and_insert_score(
        &self,
        score: &NewScore,
    ) -> Result<ConsumeOutcome, StoreError> {
        let mut inner = self.lock()?;
        let Some(session) = inner.sessions.get_mut(&score.session_id) else {
            return Ok(ConsumeOutcome::NotFound);
        };
        if !tokens_match(&session.start_token, &score.start_token) {
            return Ok(ConsumeOutcome::NotFound);
        }
        if session.consumed {
            return Ok(ConsumeOutcome::AlreadyConsumed);
        }
        session.consumed = true;

        let mut share_id = new_share_id();
        let mut attempts = 1;
        while inner.share_index.contains_key(&share_id) {
            if attempts >= SHARE_ID_ATTEMPTS {
                // Nothing was recorded, so hand the session back.
                if let Some(session) = inner.sessions.get_mut(&score.session_id) {
                    session.consumed = false;
                }
                return Err(StoreError("could not allocate a unique share id".to_string()));
            }
            share_id = new_share_id();
            attempts += 1;
        }

        let record = ScoreRecord {
            score_id: Uuid::new_v4(),
            session_id: score.session_id,
            player_name: score.player_name.clone(),
            score: score.score,
            platform: score.platform,
            week_key: score.week_key.clone(),
            created_at: score.created_at,
            share_id: share_id.clone(),
            seq: inner.scores.len() as u64 + 1,
        };
        let index = inner.scores.len();
        inner.scores.push(record.clone());
        inner.share_index.insert(share_id, index);
        Ok(ConsumeOutcome::Inserted(record))
    }

    fn query_scores(&self, week_key: Option<&str>) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self.lock()?.entries(week_key))
    }

    fn query_rank_histories(
        &self,
        week_key: &str,
    ) -> Result<(Vec<ScoreEntry>, Vec<ScoreEntry>), StoreError> {
        let inner = self.lock()?;
        Ok((inner.entries(Some(week_key)), inner.entries(None)))
    }

    fn list_distinct_weeks(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let inner = self.lock()?;
        let weeks: BTreeSet<&str> = inner
            .scores
            .iter()
            .map(|record| record.week_key.as_str())
            .collect();
        Ok(weeks
            .into_iter()
            .rev()
            .take(limit)
            .map(str::to_string)
            .collect())
    }

    fn get_score_by_share_id(&self, share_id: &str) -> Result<Option<ScoreRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .share_index
            .get(share_id)
            .and_then(|index| inner.scores.get(*index))
            .cloned())
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before - inner.sessions.len())
    }

    fn counts(&self) -> Result<StoreCounts, StoreError> {
        let inner = self.lock()?;
        Ok(StoreCounts {
            sessions: inner.sessions.len(),
            scores: inner.scores.len(),
        })
    }
}
