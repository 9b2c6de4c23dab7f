use super::{StoreError, StoreResult};
use crate::ranking::{rank_profiles, RankingEntry};
use crate::types::{Role, ScoreRecord, Theme, UserId, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Display name used when neither the player nor petname provides one
const FALLBACK_DISPLAY_NAME: &str = "Craque";

/// Per-user profiles with append-only score history
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create a profile; an email already in use is a conflict
    async fn register(
        &self,
        email: String,
        display_name: Option<String>,
        role: Role,
    ) -> StoreResult<UserProfile>;

    async fn get(&self, uid: &UserId) -> StoreResult<UserProfile>;

    async fn list(&self) -> StoreResult<Vec<UserProfile>>;

    /// Append one record to the user's history, preserving insertion order
    async fn append_score(
        &self,
        uid: &UserId,
        theme: Theme,
        points: u32,
        date: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn set_role(&self, uid: &UserId, role: Role) -> StoreResult<UserProfile>;

    /// Sum of all points the user has banked
    async fn total(&self, uid: &UserId) -> StoreResult<u64> {
        Ok(self.get(uid).await?.total())
    }

    /// Leaderboard, see [`rank_profiles`]
    async fn ranking(&self, limit: usize) -> StoreResult<Vec<RankingEntry>> {
        Ok(rank_profiles(&self.list().await?, limit))
    }
}

/// In-memory profile store
#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole store (snapshot import)
    pub async fn replace_all(&self, profiles: Vec<UserProfile>) {
        *self.profiles.write().await = profiles
            .into_iter()
            .map(|p| (p.uid.clone(), p))
            .collect();
    }
}

fn default_display_name() -> String {
    petname::petname(2, " ").unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string())
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn register(
        &self,
        email: String,
        display_name: Option<String>,
        role: Role,
    ) -> StoreResult<UserProfile> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(StoreError::Invalid(format!(
                "'{}' is not an email address",
                email
            )));
        }

        let mut profiles = self.profiles.write().await;
        if profiles.values().any(|p| p.email == email) {
            return Err(StoreError::Conflict(format!("profile for {}", email)));
        }

        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(default_display_name);

        let profile = UserProfile {
            uid: ulid::Ulid::new().to_string(),
            email,
            display_name,
            role,
            created_at: Utc::now(),
            scores: Vec::new(),
        };
        profiles.insert(profile.uid.clone(), profile.clone());

        tracing::info!(
            "Registered profile {} ({}, role={:?})",
            profile.uid,
            profile.display_name,
            profile.role
        );
        Ok(profile)
    }

    async fn get(&self, uid: &UserId) -> StoreResult<UserProfile> {
        self.profiles
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", uid)))
    }

    async fn list(&self) -> StoreResult<Vec<UserProfile>> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }

    async fn append_score(
        &self,
        uid: &UserId,
        theme: Theme,
        points: u32,
        date: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", uid)))?;
        profile.scores.push(ScoreRecord {
            theme,
            points,
            date,
        });
        Ok(())
    }

    async fn set_role(&self, uid: &UserId, role: Role) -> StoreResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", uid)))?;
        profile.role = role;
        Ok(profile.clone())
    }
}
