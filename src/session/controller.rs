use super::{AnswerOutcome, Session, SourcingFailed};
use crate::source::{QuestionSourcer, DEFAULT_QUESTION_TARGET};
use crate::store::{spawn_score_report, ProfileStore};
use crate::types::{Theme, UserId};
use std::sync::Arc;

/// Gameplay configuration
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Questions per session
    pub question_target: usize,
    /// How often a score report is attempted before it is dropped
    pub score_report_attempts: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_target: DEFAULT_QUESTION_TARGET,
            score_report_attempts: 3,
        }
    }
}

impl QuizConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            question_target: std::env::var("QUIZ_QUESTION_TARGET")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.question_target),
            score_report_attempts: std::env::var("QUIZ_SCORE_REPORT_ATTEMPTS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.score_report_attempts),
        }
    }
}

/// Entry points the presentation layer uses to run sessions
pub struct QuizController {
    sourcer: QuestionSourcer,
    profiles: Arc<dyn ProfileStore>,
    score_report_attempts: u32,
}

impl QuizController {
    pub fn new(
        sourcer: QuestionSourcer,
        profiles: Arc<dyn ProfileStore>,
        score_report_attempts: u32,
    ) -> Self {
        Self {
            sourcer,
            profiles,
            score_report_attempts,
        }
    }

    /// Assemble a question set for `theme` and start playing it
    pub async fn start_session(
        &self,
        theme: Theme,
        user_id: Option<UserId>,
    ) -> Result<Session, SourcingFailed> {
        let assembly = self.sourcer.assemble_for(theme).await;

        match Session::new(theme, user_id, assembly.questions) {
            Ok(session) => {
                tracing::info!(
                    "Started session {} on {:?} with {} questions",
                    session.id,
                    theme,
                    session.total_questions()
                );
                Ok(session)
            }
            Err(failed) => {
                tracing::warn!("No questions for {:?}, session not started", theme);
                Err(SourcingFailed {
                    report: assembly.report,
                    ..failed
                })
            }
        }
    }

    /// Apply an answer and, if it ended the session, report the final score
    /// without waiting for the store.
    pub fn submit_answer(
        &self,
        session: &mut Session,
        question_index: usize,
        option: &str,
    ) -> AnswerOutcome {
        let outcome = session.submit_answer(question_index, option);
        self.report_if_finished(session);
        outcome
    }

    fn report_if_finished(&self, session: &mut Session) {
        if let Some(report) = session.take_report() {
            spawn_score_report(
                self.profiles.clone(),
                report.uid,
                report.theme,
                report.points,
                report.date,
                self.score_report_attempts,
            );
        }
    }
}
