use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::store::{Store, StoreError};

/// One sweep. Expired sessions are already rejected at submit time, so this
/// only bounds storage growth.
pub(crate) fn reap_expired_sessions(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    store.delete_expired_sessions(now)
}

pub(crate) fn spawn_session_reaper(store: Arc<dyn Store>, sweep_secs: u64) {
    tokio::spawn(async move {
        let sweep = Duration::from_secs(sweep_secs);
        loop {
            tokio::time::sleep(sweep).await;
            match reap_expired_sessions(store.as_ref(), Utc::now()) {
                Ok(0) => {}
                Ok(n) => tracing::info!(reaped = n, "expired sessions swept"),
                Err(e) => tracing::error!("session sweep failed: {e}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::protocol::start_session;
    use crate::store::MemoryStore;

    #[test]
    fn sweep_removes_only_expired_sessions() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let old = start_session(&store, Some("mobile"), TimeDelta::hours(2), t0).unwrap();
        let fresh = start_session(
            &store,
            Some("desktop"),
            TimeDelta::hours(2),
            t0 + TimeDelta::hours(1),
        )
        .unwrap();

        let sweep_at = t0 + TimeDelta::minutes(150);
        assert_eq!(reap_expired_sessions(&store, sweep_at).unwrap(), 1);
        assert!(store.get_session(old.session_id).unwrap().is_none());
        assert!(store.get_session(fresh.session_id).unwrap().is_some());
        assert_eq!(reap_expired_sessions(&store, sweep_at).unwrap(), 0);
    }

    #[actix_web::test]
    async fn spawned_reaper_sweeps_in_background() {
        let store = Arc::new(MemoryStore::new());
        let long_ago = Utc::now() - TimeDelta::hours(5);
        start_session(store.as_ref(), Some("mobile"), TimeDelta::hours(2), long_ago).unwrap();
        assert_eq!(store.counts().unwrap().sessions, 1);

        spawn_session_reaper(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(store.counts().unwrap().sessions, 0);
    }
}
