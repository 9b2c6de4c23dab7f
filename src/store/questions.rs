use super::{StoreError, StoreResult};
use crate::source::Shuffler;
use crate::types::{Difficulty, Question, QuestionError, QuestionId, Theme};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stored questions and their moderation workflow
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Approved questions for a theme, in insertion order
    async fn fetch_approved(&self, theme: Theme) -> StoreResult<Vec<Question>>;

    /// Store a question, assigning an id and creation time when missing
    async fn save(&self, question: Question) -> StoreResult<Question>;

    /// Questions awaiting moderation
    async fn list_pending(&self) -> StoreResult<Vec<Question>>;

    /// Mark a question approved. Returns whether anything changed; unknown
    /// and already-approved ids are not errors.
    async fn approve(&self, id: &QuestionId) -> StoreResult<bool>;

    /// Delete a question. Returns whether anything changed; unknown ids are
    /// not errors.
    async fn reject(&self, id: &QuestionId) -> StoreResult<bool>;
}

/// In-memory question store
#[derive(Clone, Default)]
pub struct MemoryQuestionStore {
    questions: Arc<RwLock<Vec<Question>>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored question, approved or not
    pub async fn all(&self) -> Vec<Question> {
        self.questions.read().await.clone()
    }

    /// Replace the whole store (snapshot import)
    pub async fn replace_all(&self, questions: Vec<Question>) {
        *self.questions.write().await = questions;
    }
}

#[async_trait]
impl QuestionRepository for MemoryQuestionStore {
    async fn fetch_approved(&self, theme: Theme) -> StoreResult<Vec<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| q.approved && q.theme == theme)
            .cloned()
            .collect())
    }

    async fn save(&self, mut question: Question) -> StoreResult<Question> {
        question
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        if question.id.trim().is_empty() {
            question.id = ulid::Ulid::new().to_string();
        }
        if question.created_at.is_none() {
            question.created_at = Some(chrono::Utc::now());
        }

        let mut questions = self.questions.write().await;
        if questions.iter().any(|q| q.id == question.id) {
            return Err(StoreError::Invalid(format!(
                "question id '{}' already exists",
                question.id
            )));
        }
        questions.push(question.clone());

        tracing::info!(
            "Stored question {} (theme={:?}, approved={})",
            question.id,
            question.theme,
            question.approved
        );
        Ok(question)
    }

    async fn list_pending(&self) -> StoreResult<Vec<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| !q.approved)
            .cloned()
            .collect())
    }

    async fn approve(&self, id: &QuestionId) -> StoreResult<bool> {
        let mut questions = self.questions.write().await;
        match questions.iter_mut().find(|q| &q.id == id) {
            Some(q) if !q.approved => {
                q.approved = true;
                tracing::info!("Approved question: {}", id);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => {
                tracing::debug!("Approve ignored, question {} not found", id);
                Ok(false)
            }
        }
    }

    async fn reject(&self, id: &QuestionId) -> StoreResult<bool> {
        let mut questions = self.questions.write().await;
        let before = questions.len();
        questions.retain(|q| &q.id != id);
        let removed = questions.len() != before;
        if removed {
            tracing::info!("Rejected question: {}", id);
        }
        Ok(removed)
    }
}

/// Question as typed into the suggestion form: one right answer, three wrong ones
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionDraft {
    pub text: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
    pub theme: Theme,
}

impl SuggestionDraft {
    /// Build the stored question. Options are shuffled so the correct answer
    /// does not always come first; community suggestions start unapproved,
    /// admin-injected ones go live immediately.
    pub fn into_question(
        self,
        suggested_by: Option<String>,
        approved: bool,
        shuffler: &dyn Shuffler,
    ) -> Result<Question, QuestionError> {
        let correct_answer = self.correct_answer.trim().to_string();
        let mut options = Vec::with_capacity(1 + self.wrong_answers.len());
        options.push(correct_answer.clone());
        options.extend(self.wrong_answers.iter().map(|w| w.trim().to_string()));
        shuffler.shuffle_options(&mut options);

        let question = Question {
            id: String::new(),
            text: self.text.trim().to_string(),
            options,
            correct_answer,
            theme: self.theme,
            subtheme: "Community".to_string(),
            difficulty: Difficulty::Medium,
            approved,
            suggested_by,
            created_at: None,
        };
        question.validate()?;
        Ok(question)
    }
}
