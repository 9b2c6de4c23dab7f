use super::{ProfileStore, StoreError};
use crate::types::{Theme, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Append a finished session's score in the background.
///
/// Transient failures are retried with exponential backoff up to `attempts`
/// times; a missing profile is not retried. Nothing is reported back to the
/// caller, the returned handle only exists so tests can wait for completion.
pub fn spawn_score_report(
    store: Arc<dyn ProfileStore>,
    uid: UserId,
    theme: Theme,
    points: u32,
    date: DateTime<Utc>,
    attempts: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let attempts = attempts.max(1);
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 1..=attempts {
            match store.append_score(&uid, theme, points, date).await {
                Ok(()) => {
                    tracing::info!(
                        "Recorded {} points on {:?} for {} (attempt {})",
                        points,
                        theme,
                        uid,
                        attempt
                    );
                    return;
                }
                Err(StoreError::NotFound(what)) => {
                    tracing::warn!("Dropping score report, {} not found", what);
                    return;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Score report for {} failed (attempt {}/{}): {}",
                        uid,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    tracing::error!(
                        "Giving up on score report for {} after {} attempts: {}",
                        uid,
                        attempts,
                        e
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreResult;
    use crate::types::{Role, UserProfile};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` appends, then records them
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
        recorded: Mutex<Vec<u32>>,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                recorded: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProfileStore for FlakyStore {
        async fn register(
            &self,
            _email: String,
            _display_name: Option<String>,
            _role: Role,
        ) -> StoreResult<UserProfile> {
            Err(StoreError::Unavailable("not supported".to_string()))
        }

        async fn get(&self, uid: &UserId) -> StoreResult<UserProfile> {
            Err(StoreError::NotFound(uid.clone()))
        }

        async fn list(&self) -> StoreResult<Vec<UserProfile>> {
            Ok(Vec::new())
        }

        async fn append_score(
            &self,
            uid: &UserId,
            _theme: Theme,
            points: u32,
            _date: DateTime<Utc>,
        ) -> StoreResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if uid == "ghost" {
                return Err(StoreError::NotFound(uid.clone()));
            }
            if call < self.failures {
                return Err(StoreError::Unavailable("flaky".to_string()));
            }
            self.recorded.lock().unwrap().push(points);
            Ok(())
        }

        async fn set_role(&self, uid: &UserId, _role: Role) -> StoreResult<UserProfile> {
            Err(StoreError::NotFound(uid.clone()))
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let store = Arc::new(FlakyStore::new(2));
        spawn_score_report(store.clone(), "u1".to_string(), Theme::World, 30, Utc::now(), 3)
            .await
            .unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*store.recorded.lock().unwrap(), vec![30]);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let store = Arc::new(FlakyStore::new(10));
        spawn_score_report(store.clone(), "u1".to_string(), Theme::World, 30, Utc::now(), 3)
            .await
            .unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert!(store.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_retried() {
        let store = Arc::new(FlakyStore::new(0));
        spawn_score_report(store.clone(), "ghost".to_string(), Theme::World, 30, Utc::now(), 5)
            .await
            .unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
