mod export;
mod moderation;
mod profiles;

pub use export::{QuizSnapshot, SnapshotError, SNAPSHOT_SCHEMA_VERSION};
pub use profiles::ProfileSummary;

use crate::auth::AuthConfig;
use crate::session::{QuizConfig, QuizController};
use crate::source::{
    BuiltinQuestions, FallbackBank, QuestionGenerator, QuestionSourcer, RandomShuffle, Shuffler,
};
use crate::store::{MemoryProfileStore, MemoryQuestionStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub questions: MemoryQuestionStore,
    pub profiles: MemoryProfileStore,
    pub quiz: Arc<QuizController>,
    pub shuffler: Arc<dyn Shuffler>,
    pub auth: Arc<AuthConfig>,
    /// Held for writing while an import swaps both stores, for reading while
    /// an export copies them
    snapshot_lock: Arc<RwLock<()>>,
}

impl AppState {
    /// State backed by the built-in fallback bank
    pub fn new(
        config: &QuizConfig,
        generator: Option<Arc<dyn QuestionGenerator>>,
        shuffler: Arc<dyn Shuffler>,
        auth: Arc<AuthConfig>,
    ) -> Self {
        Self::with_fallback(config, generator, Arc::new(BuiltinQuestions), shuffler, auth)
    }

    pub fn with_fallback(
        config: &QuizConfig,
        generator: Option<Arc<dyn QuestionGenerator>>,
        fallback: Arc<dyn FallbackBank>,
        shuffler: Arc<dyn Shuffler>,
        auth: Arc<AuthConfig>,
    ) -> Self {
        let questions = MemoryQuestionStore::new();
        let profiles = MemoryProfileStore::new();

        let sourcer = QuestionSourcer::new(
            generator,
            Arc::new(questions.clone()),
            fallback,
            shuffler.clone(),
            config.question_target,
        );
        let quiz = QuizController::new(
            sourcer,
            Arc::new(profiles.clone()),
            config.score_report_attempts,
        );

        Self {
            questions,
            profiles,
            quiz: Arc::new(quiz),
            shuffler,
            auth,
            snapshot_lock: Arc::new(RwLock::new(())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            &QuizConfig::default(),
            None,
            Arc::new(RandomShuffle),
            Arc::new(AuthConfig::default()),
        )
    }
}
