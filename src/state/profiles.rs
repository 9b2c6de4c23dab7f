use super::AppState;
use crate::ranking::RankingEntry;
use crate::store::{ProfileStore, StoreResult};
use crate::types::{Role, ScoreRecord, UserId, UserProfile};
use serde::Serialize;

/// Number of past games shown on a profile page
const RECENT_SCORES: usize = 5;

/// Profile page payload
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub profile: UserProfile,
    pub total: u64,
    /// Newest first
    pub recent_scores: Vec<ScoreRecord>,
}

impl AppState {
    /// Register a player; the configured admin email registers as admin
    pub async fn register_user(
        &self,
        email: String,
        display_name: Option<String>,
    ) -> StoreResult<UserProfile> {
        let role = if self.auth.is_admin_email(&email) {
            Role::Admin
        } else {
            Role::User
        };
        self.profiles.register(email, display_name, role).await
    }

    pub async fn profile_summary(&self, uid: &UserId) -> StoreResult<ProfileSummary> {
        let profile = self.profiles.get(uid).await?;
        Ok(ProfileSummary {
            total: profile.total(),
            recent_scores: profile.recent_scores(RECENT_SCORES),
            profile,
        })
    }

    pub async fn ranking(&self, limit: usize) -> StoreResult<Vec<RankingEntry>> {
        self.profiles.ranking(limit).await
    }

    /// Flip a user between the user and admin roles
    pub async fn toggle_admin(&self, uid: &UserId) -> StoreResult<UserProfile> {
        let profile = self.profiles.get(uid).await?;
        let role = match profile.role {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        };
        let updated = self.profiles.set_role(uid, role).await?;
        tracing::info!("User {} is now {:?}", uid, updated.role);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::session::QuizConfig;
    use crate::source::NoShuffle;
    use crate::types::Theme;
    use chrono::Utc;
    use std::sync::Arc;

    fn state_with_admin(email: &str) -> AppState {
        AppState::new(
            &QuizConfig::default(),
            None,
            Arc::new(NoShuffle),
            Arc::new(AuthConfig {
                admin_email: Some(email.to_string()),
                ..AuthConfig::default()
            }),
        )
    }

    #[tokio::test]
    async fn test_admin_email_registers_as_admin() {
        let state = state_with_admin("boss@example.com");

        let boss = state
            .register_user("BOSS@example.com".to_string(), None)
            .await
            .unwrap();
        let fan = state
            .register_user("fan@example.com".to_string(), None)
            .await
            .unwrap();

        assert_eq!(boss.role, Role::Admin);
        assert_eq!(fan.role, Role::User);
        assert_eq!(state.profiles.get(&boss.uid).await.unwrap().role, Role::Admin);
        assert!(state
            .register_user("boss@example.com".to_string(), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_toggle_admin_flips_role() {
        let state = AppState::default();
        let fan = state
            .register_user("fan@example.com".to_string(), None)
            .await
            .unwrap();

        assert_eq!(state.toggle_admin(&fan.uid).await.unwrap().role, Role::Admin);
        assert_eq!(state.toggle_admin(&fan.uid).await.unwrap().role, Role::User);
        assert!(state.toggle_admin(&"ghost".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_summary_shows_last_five_newest_first() {
        let state = AppState::default();
        let fan = state
            .register_user("fan@example.com".to_string(), Some("Fan".to_string()))
            .await
            .unwrap();

        for points in [10, 20, 30, 40, 50, 60, 70] {
            state
                .profiles
                .append_score(&fan.uid, Theme::World, points, Utc::now())
                .await
                .unwrap();
        }

        let summary = state.profile_summary(&fan.uid).await.unwrap();
        assert_eq!(summary.total, 280);
        let recent: Vec<u32> = summary.recent_scores.iter().map(|s| s.points).collect();
        assert_eq!(recent, vec![70, 60, 50, 40, 30]);
        assert_eq!(summary.profile.scores.len(), 7);
    }
}
