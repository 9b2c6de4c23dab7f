use super::AppState;
use crate::store::{QuestionRepository, StoreError, StoreResult, SuggestionDraft};
use crate::types::{Question, QuestionId};

impl AppState {
    /// Store a question typed into the suggestion form.
    ///
    /// Suggestions from admins go live immediately, everyone else's wait for
    /// moderation.
    pub async fn submit_suggestion(
        &self,
        draft: SuggestionDraft,
        suggested_by: Option<String>,
        approved: bool,
    ) -> StoreResult<Question> {
        let question = draft
            .into_question(suggested_by, approved, self.shuffler.as_ref())
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        self.questions.save(question).await
    }

    pub async fn pending_questions(&self) -> StoreResult<Vec<Question>> {
        self.questions.list_pending().await
    }

    /// Returns whether the question changed state
    pub async fn approve_question(&self, id: &QuestionId) -> StoreResult<bool> {
        self.questions.approve(id).await
    }

    /// Returns whether the question existed
    pub async fn reject_question(&self, id: &QuestionId) -> StoreResult<bool> {
        self.questions.reject(id).await
    }
}
