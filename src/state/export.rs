//! Snapshot export/import of the question bank and player profiles.
//!
//! The same snapshot format backs the admin export endpoint and the on-disk
//! data file written by the autosave task.

use super::AppState;
use crate::store::ProfileStore;
use crate::types::{Question, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Schema version for snapshot format compatibility
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid snapshot: {0}")]
    Invalid(String),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A serializable snapshot of everything worth keeping across restarts.
///
/// Sessions in progress are not included; they live only as long as their
/// connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub schema_version: u32,
    /// Export timestamp (RFC 3339)
    pub exported_at: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
}

impl QuizSnapshot {
    pub fn new(questions: Vec<Question>, profiles: Vec<UserProfile>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            questions,
            profiles,
        }
    }

    /// Validate the snapshot before import
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !question_ids.insert(question.id.as_str()) {
                return Err(SnapshotError::Invalid(format!(
                    "question id '{}' appears more than once",
                    question.id
                )));
            }
            question.validate().map_err(|e| {
                SnapshotError::Invalid(format!("question '{}': {}", question.id, e))
            })?;
        }

        let mut uids = HashSet::new();
        let mut emails = HashSet::new();
        for profile in &self.profiles {
            if !uids.insert(profile.uid.as_str()) {
                return Err(SnapshotError::Invalid(format!(
                    "profile uid '{}' appears more than once",
                    profile.uid
                )));
            }
            if !emails.insert(profile.email.as_str()) {
                return Err(SnapshotError::Invalid(format!(
                    "email '{}' is registered twice",
                    profile.email
                )));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_snapshot(&self) -> QuizSnapshot {
        let _guard = self.snapshot_lock.read().await;
        let profiles = match self.profiles.list().await {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::error!("Could not list profiles for export: {}", e);
                Vec::new()
            }
        };
        QuizSnapshot::new(self.questions.all().await, profiles)
    }

    /// Replace all stored questions and profiles with the snapshot's
    pub async fn import_snapshot(&self, snapshot: QuizSnapshot) -> Result<(), SnapshotError> {
        snapshot.validate()?;

        tracing::info!(
            "Importing snapshot from {} ({} questions, {} profiles)",
            snapshot.exported_at,
            snapshot.questions.len(),
            snapshot.profiles.len()
        );
        let _guard = self.snapshot_lock.write().await;
        self.questions.replace_all(snapshot.questions).await;
        self.profiles.replace_all(snapshot.profiles).await;
        Ok(())
    }

    /// Write a snapshot to `path`, going through a temporary file so a crash
    /// mid-write never leaves a truncated data file behind
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(&self.export_snapshot().await)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Load the snapshot at `path`. Returns `false` when there is no file yet.
    pub async fn load_snapshot(&self, path: &Path) -> Result<bool, SnapshotError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let snapshot: QuizSnapshot = serde_json::from_slice(&bytes)?;
        self.import_snapshot(snapshot).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SuggestionDraft;
    use crate::types::{Role, Theme};
    use chrono::Utc;

    async fn populated_state() -> AppState {
        let state = AppState::default();
        let fan = state
            .register_user("fan@example.com".to_string(), Some("Fan".to_string()))
            .await
            .unwrap();
        state
            .profiles
            .append_score(&fan.uid, Theme::Cups, 40, Utc::now())
            .await
            .unwrap();
        state
            .submit_suggestion(
                SuggestionDraft {
                    text: "Who won the 1966 World Cup?".to_string(),
                    correct_answer: "England".to_string(),
                    wrong_answers: vec![
                        "West Germany".to_string(),
                        "Portugal".to_string(),
                        "Soviet Union".to_string(),
                    ],
                    theme: Theme::Cups,
                },
                Some(fan.email.clone()),
                false,
            )
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_export_then_import_into_fresh_state() {
        let source = populated_state().await;
        let snapshot = source.export_snapshot().await;
        assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION);

        let target = AppState::default();
        target.import_snapshot(snapshot).await.unwrap();

        let profiles = target.profiles.list().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].total(), 40);
        assert_eq!(profiles[0].role, Role::User);
        assert_eq!(target.pending_questions().await.unwrap().len(), 1);
    }

    #[test]
    fn test_validation_future_schema() {
        let mut snapshot = QuizSnapshot::new(Vec::new(), Vec::new());
        snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;

        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[tokio::test]
    async fn test_validation_rejects_duplicates_and_broken_questions() {
        let mut snapshot = populated_state().await.export_snapshot().await;
        snapshot.questions.push(snapshot.questions[0].clone());
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Invalid(_))));

        let mut snapshot = populated_state().await.export_snapshot().await;
        snapshot.questions[0].options.pop();
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Invalid(_))));

        let mut snapshot = populated_state().await.export_snapshot().await;
        let mut twin = snapshot.profiles[0].clone();
        twin.uid = "other".to_string();
        snapshot.profiles.push(twin);
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_rejected_import_keeps_current_data() {
        let state = populated_state().await;
        let mut snapshot = QuizSnapshot::new(Vec::new(), Vec::new());
        snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;

        assert!(state.import_snapshot(snapshot).await.is_err());
        assert_eq!(state.profiles.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pelada.json");

        let fresh = AppState::default();
        assert!(!fresh.load_snapshot(&path).await.unwrap());

        populated_state().await.save_snapshot(&path).await.unwrap();
        assert!(fresh.load_snapshot(&path).await.unwrap());
        assert_eq!(fresh.profiles.list().await.unwrap().len(), 1);
        assert_eq!(fresh.questions.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_garbage_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pelada.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let err = AppState::default().load_snapshot(&path).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }

    #[tokio::test]
    async fn test_import_waits_for_running_export() {
        let snapshot = populated_state().await.export_snapshot().await;
        let state = AppState::default();

        let reading = state.snapshot_lock.clone().read_owned().await;
        let importer = {
            let state = state.clone();
            tokio::spawn(async move { state.import_snapshot(snapshot).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(state.questions.all().await.is_empty());
        assert!(state.profiles.list().await.unwrap().is_empty());

        drop(reading);
        importer.await.unwrap().unwrap();
        assert_eq!(state.questions.all().await.len(), 1);
        assert_eq!(state.profiles.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_export_never_sees_half_an_import() {
        let snapshot = populated_state().await.export_snapshot().await;
        let state = AppState::default();

        let exporter = {
            let state = state.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    let snap = state.export_snapshot().await;
                    seen.push((snap.questions.len(), snap.profiles.len()));
                    tokio::task::yield_now().await;
                }
                seen
            })
        };
        state.import_snapshot(snapshot).await.unwrap();

        let seen = exporter.await.unwrap();
        assert!(seen.iter().all(|&counts| counts == (0, 0) || counts == (1, 1)));
    }
}
