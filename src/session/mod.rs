//! One playthrough of the quiz: a fixed question set answered in order,
//! ending on the first wrong answer or after the last question.

mod controller;

pub use controller::{QuizConfig, QuizController};

use crate::source::AttemptReport;
use crate::types::{Question, SessionId, Theme, UserId, POINTS_PER_QUESTION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Submission did not apply: the session is over, or the index is not
    /// the question currently awaiting an answer
    Ignored,
}

/// Result of one submission
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub verdict: Verdict,
    pub state: SessionState,
    pub score: u32,
    /// Next question to answer, present only while the session is in progress
    pub next_question: Option<Question>,
}

/// No source produced a single playable question
#[derive(Debug, Clone, thiserror::Error)]
#[error("no questions available for theme {theme:?}")]
pub struct SourcingFailed {
    pub theme: Theme,
    pub report: Vec<AttemptReport>,
}

/// Score owed to the profile store once a session has ended
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub uid: UserId,
    pub theme: Theme,
    pub points: u32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub theme: Theme,
    pub user_id: Option<UserId>,
    pub started_at: DateTime<Utc>,
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    state: SessionState,
    finished_at: Option<DateTime<Utc>>,
    reported: bool,
}

impl Session {
    /// Start a session over an assembled question set
    pub fn new(
        theme: Theme,
        user_id: Option<UserId>,
        questions: Vec<Question>,
    ) -> Result<Self, SourcingFailed> {
        if questions.is_empty() {
            return Err(SourcingFailed {
                theme,
                report: Vec::new(),
            });
        }

        Ok(Self {
            id: ulid::Ulid::new().to_string(),
            theme,
            user_id,
            started_at: Utc::now(),
            questions,
            current_index: 0,
            score: 0,
            state: SessionState::InProgress,
            finished_at: None,
            reported: false,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Points banked so far: `current_index * 10` while playing, the final
    /// score once terminal
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The question awaiting an answer, if the session is still in progress
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// Apply an answer to the question at `question_index`.
    ///
    /// Each question accepts exactly one answer: once answered, the index is
    /// behind `current_index` (or the session is terminal) and any repeat
    /// submission is ignored without touching the state.
    pub fn submit_answer(&mut self, question_index: usize, option: &str) -> AnswerOutcome {
        if self.state != SessionState::InProgress || question_index != self.current_index {
            tracing::debug!(
                "Ignoring answer for question {} in session {} (state={:?}, current={})",
                question_index,
                self.id,
                self.state,
                self.current_index
            );
            return self.outcome(Verdict::Ignored);
        }

        let Some(question) = self.questions.get(self.current_index) else {
            return self.outcome(Verdict::Ignored);
        };

        if question.is_correct(option) {
            let answered = self.current_index as u32 + 1;
            self.score = answered * POINTS_PER_QUESTION;
            if self.current_index + 1 == self.questions.len() {
                self.finish(SessionState::Completed);
            } else {
                self.current_index += 1;
            }
            self.outcome(Verdict::Correct)
        } else {
            self.score = self.current_index as u32 * POINTS_PER_QUESTION;
            self.finish(SessionState::Failed);
            self.outcome(Verdict::Incorrect)
        }
    }

    /// Hand out the final score exactly once, and only for a terminal
    /// session bound to a user
    pub fn take_report(&mut self) -> Option<ScoreReport> {
        if self.reported || !self.state.is_terminal() {
            return None;
        }
        let uid = self.user_id.clone()?;
        self.reported = true;

        Some(ScoreReport {
            uid,
            theme: self.theme,
            points: self.score,
            date: self.finished_at.unwrap_or_else(Utc::now),
        })
    }

    fn finish(&mut self, state: SessionState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
        tracing::info!(
            "Session {} {:?} on {:?} with {} points after {}/{} questions",
            self.id,
            state,
            self.theme,
            self.score,
            self.score / POINTS_PER_QUESTION,
            self.questions.len()
        );
    }

    fn outcome(&self, verdict: Verdict) -> AnswerOutcome {
        AnswerOutcome {
            verdict,
            state: self.state,
            score: self.score,
            next_question: self.current_question().cloned(),
        }
    }
}
