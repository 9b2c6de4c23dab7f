use crate::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Where and how often the data file is written
#[derive(Debug, Clone)]
pub struct PersistConfig {
    /// Snapshot file (None = keep everything in memory only)
    pub data_file: Option<PathBuf>,
    pub autosave_interval: Duration,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            autosave_interval: Duration::from_secs(60),
        }
    }
}

impl PersistConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            data_file: std::env::var("DATA_FILE")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            autosave_interval: std::env::var("AUTOSAVE_SECONDS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|&secs: &u64| secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.autosave_interval),
        }
    }
}

/// Spawn a background task that writes a snapshot to `path` every `interval`
pub fn spawn_autosave(state: Arc<AppState>, path: PathBuf, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately, nothing has changed yet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.save_snapshot(&path).await {
                Ok(()) => tracing::debug!("Saved snapshot to {}", path.display()),
                Err(e) => tracing::error!("Autosave to {} failed: {}", path.display(), e),
            }
        }
    })
}
