use std::{
    fs,
    path::Path,
    str::FromStr,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use labpanic_core::leaderboard::ScoreEntry;
use labpanic_core::Platform;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::*;

const DB_FILE_NAME: &str = "labpanic.db";

/// SQLite-backed store. One connection behind a mutex; every compound
/// operation runs inside a single transaction.
pub(crate) struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) `labpanic.db` under `data_dir` and apply the schema.
    pub(crate) fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir).map_err(|e| {
            StoreError(format!(
                "failed to create data dir {}: {e}",
                data_dir.display()
            ))
        })?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path).map_err(|e| {
            StoreError(format!("failed to open SQLite at {}: {e}", db_path.display()))
        })?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError(format!("failed to open in-memory SQLite: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;
             PRAGMA synchronous=NORMAL;",
        )
        .map_err(|e| StoreError(format!("failed to set pragmas: {e}")))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id   TEXT PRIMARY KEY,
                start_token  TEXT NOT NULL,
                platform     TEXT NOT NULL,
                started_at   INTEGER NOT NULL,
                expires_at   INTEGER NOT NULL,
                consumed     INTEGER NOT NULL DEFAULT 0
             );
             CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

             CREATE TABLE IF NOT EXISTS scores (
                seq          INTEGER PRIMARY KEY AUTOINCREMENT,
                score_id     TEXT NOT NULL UNIQUE,
                session_id   TEXT NOT NULL,
                player_name  TEXT NOT NULL,
                score        INTEGER NOT NULL,
                platform     TEXT NOT NULL,
                week_key     TEXT NOT NULL,
                created_at   INTEGER NOT NULL,
                share_id     TEXT NOT NULL UNIQUE
             );
             CREATE INDEX IF NOT EXISTS idx_scores_week_key ON scores(week_key);",
        )
        .map_err(|e| StoreError(format!("failed to create schema: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError("sqlite connection lock poisoned".to_string()))
    }

    fn insert_score_row(
        conn: &Connection,
        score: &NewScore,
        score_id: Uuid,
        share_id: &str,
    ) -> rusqlite::Result<u64> {
        conn.execute(
            "INSERT INTO scores (
                score_id, session_id, player_name, score, platform,
                week_key, created_at, share_id
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                score_id.to_string(),
                score.session_id.to_string(),
                score.player_name,
                i64::from(score.score),
                score.platform.as_str(),
                score.week_key,
                score.created_at.timestamp_millis(),
                share_id,
            ],
        )?;
        Ok(conn.last_insert_rowid() as u64)
    }
}

impl Store for SqliteStore {
    fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (
                session_id, start_token, platform, started_at, expires_at, consumed
            ) VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                session.session_id.to_string(),
                session.start_token,
                session.platform.as_str(),
                session.started_at.timestamp_millis(),
                session.expires_at.timestamp_millis(),
                session.consumed,
            ],
        )
        .map_err(|e| StoreError(format!("insert session failed: {e}")))?;
        Ok(())
    }

    fn get_session(&self, session_id: Uuid) -> Result<Option<Session>, StoreError> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT session_id, start_token, platform, started_at, expires_at, consumed
                 FROM sessions WHERE session_id = ?1",
                params![session_id.to_string()],
                |row| {
                    Ok(RawSessionRow {
                        session_id: row.get(0)?,
                        start_token: row.get(1)?,
                        platform: row.get(2)?,
                        started_at: row.get(3)?,
                        expires_at: row.get(4)?,
                        consumed: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError(format!("get session failed: {e}")))?
        };

        row.map(RawSessionRow::into_session).transpose()
    }

    fn consume_session_and_insert_score(
        &self,
        score: &NewScore,
    ) -> Result<ConsumeOutcome, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StoreError(format!("begin submit transaction failed: {e}")))?;

        let token: Option<String> = tx
            .query_row(
                "SELECT start_token FROM sessions WHERE session_id = ?1",
                params![score.session_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError(format!("submit session lookup failed: {e}")))?;
        match token {
            Some(token) if tokens_match(&token, &score.start_token) => {}
            _ => return Ok(ConsumeOutcome::NotFound),
        }

        let updated = tx
            .execute(
                "UPDATE sessions SET consumed = 1 WHERE session_id = ?1 AND consumed = 0",
                params![score.session_id.to_string()],
            )
            .map_err(|e| StoreError(format!("consume session failed: {e}")))?;
        if updated == 0 {
            return Ok(ConsumeOutcome::AlreadyConsumed);
        }

        let score_id = Uuid::new_v4();
        let mut inserted = None;
        for attempt in 1..=SHARE_ID_ATTEMPTS {
            let share_id = new_share_id();
            match Self::insert_score_row(&tx, score, score_id, &share_id) {
                Ok(seq) => {
                    inserted = Some((share_id, seq));
                    break;
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    tracing::warn!(attempt, share_id = %share_id, "share id collision, retrying");
                }
                Err(e) => return Err(StoreError(format!("insert score failed: {e}"))),
            }
        }
        // Dropping the transaction without commit rolls the consume back.
        let Some((share_id, seq)) = inserted else {
            return Err(StoreError("could not allocate a unique share id".to_string()));
        };

        tx.commit()
            .map_err(|e| StoreError(format!("commit submit transaction failed: {e}")))?;

        Ok(ConsumeOutcome::Inserted(ScoreRecord {
            score_id,
            session_id: score.session_id,
            player_name: score.player_name.clone(),
            score: score.score,
            platform: score.platform,
            week_key: score.week_key.clone(),
            created_at: score.created_at,
            share_id,
            seq,
        }))
    }

    fn query_scores(&self, week_key: Option<&str>) -> Result<Vec<ScoreEntry>, StoreError> {
        let conn = self.lock()?;
        select_entries(&conn, week_key)
    }

    fn query_rank_histories(
        &self,
        week_key: &str,
    ) -> Result<(Vec<ScoreEntry>, Vec<ScoreEntry>), StoreError> {
        let mut conn = self.lock()?;
        // Both reads share one read transaction.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(|e| StoreError(format!("begin rank read failed: {e}")))?;
        let weekly = select_entries(&tx, Some(week_key))?;
        let alltime = select_entries(&tx, None)?;
        tx.commit()
            .map_err(|e| StoreError(format!("finish rank read failed: {e}")))?;
        Ok((weekly, alltime))
    }

    fn list_distinct_weeks(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT week_key FROM scores ORDER BY week_key DESC LIMIT ?1")
            .map_err(|e| StoreError(format!("list weeks prepare failed: {e}")))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError(format!("list weeks failed: {e}")))?;

        let weeks = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError(format!("failed to read week row: {e}")))?;
        Ok(weeks)
    }

    fn get_score_by_share_id(&self, share_id: &str) -> Result<Option<ScoreRecord>, StoreError> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT seq, score_id, session_id, player_name, score, platform,
                        week_key, created_at, share_id
                 FROM scores WHERE share_id = ?1",
                params![share_id],
                |row| {
                    Ok(RawScoreRow {
                        seq: row.get(0)?,
                        score_id: row.get(1)?,
                        session_id: row.get(2)?,
                        player_name: row.get(3)?,
                        score: row.get(4)?,
                        platform: row.get(5)?,
                        week_key: row.get(6)?,
                        created_at: row.get(7)?,
                        share_id: row.get(8)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError(format!("get score by share id failed: {e}")))?
        };

        row.map(RawScoreRow::into_record).transpose()
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![now.timestamp_millis()],
        )
        .map_err(|e| StoreError(format!("delete expired sessions failed: {e}")))
    }

    fn counts(&self) -> Result<StoreCounts, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT (SELECT COUNT(*) FROM sessions), (SELECT COUNT(*) FROM scores)",
            [],
            |row| {
                Ok(StoreCounts {
                    sessions: row.get::<_, i64>(0)? as usize,
                    scores: row.get::<_, i64>(1)? as usize,
                })
            },
        )
        .map_err(|e| StoreError(format!("counts failed: {e}")))
    }
}

struct RawSessionRow {
    session_id: String,
    start_token: String,
    platform: String,
    started_at: i64,
    expires_at: i64,
    consumed: bool,
}

impl RawSessionRow {
    fn into_session(self) -> Result<Session, StoreError> {
        Ok(Session {
            session_id: parse_uuid(&self.session_id)?,
            start_token: self.start_token,
            platform: parse_platform(&self.platform)?,
            started_at: timestamp_from_millis(self.started_at)?,
            expires_at: timestamp_from_millis(self.expires_at)?,
            consumed: self.consumed,
        })
    }
}

struct RawScoreRow {
    seq: i64,
    score_id: String,
    session_id: String,
    player_name: String,
    score: u32,
    platform: String,
    week_key: String,
    created_at: i64,
    share_id: String,
}

impl RawScoreRow {
    fn into_record(self) -> Result<ScoreRecord, StoreError> {
        Ok(ScoreRecord {
            score_id: parse_uuid(&self.score_id)?,
            session_id: parse_uuid(&self.session_id)?,
            player_name: self.player_name,
            score: self.score,
            platform: parse_platform(&self.platform)?,
            week_key: self.week_key,
            created_at: timestamp_from_millis(self.created_at)?,
            share_id: self.share_id,
            seq: self.seq as u64,
        })
    }
}

fn select_entries(
    conn: &Connection,
    week_key: Option<&str>,
) -> Result<Vec<ScoreEntry>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT player_name, score, created_at, seq FROM scores
             WHERE ?1 IS NULL OR week_key = ?1",
        )
        .map_err(|e| StoreError(format!("query scores prepare failed: {e}")))?;
    let rows = stmt
        .query_map(params![week_key], |row| {
            Ok(ScoreEntry {
                player_name: row.get(0)?,
                score: row.get(1)?,
                created_at_ms: row.get(2)?,
                seq: row.get::<_, i64>(3)? as u64,
            })
        })
        .map_err(|e| StoreError(format!("query scores failed: {e}")))?;

    let scores = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError(format!("failed to read score row: {e}")))?;
    Ok(scores)
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError(format!("bad uuid in db: {e}")))
}

fn parse_platform(value: &str) -> Result<Platform, StoreError> {
    Platform::from_str(value).map_err(|_| StoreError(format!("unknown platform in db: {value}")))
}
