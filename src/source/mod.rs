//! Question sourcing: gathering, filtering and ordering the set a session plays.
//!
//! Three sources are consulted for every session, in priority order:
//! the generator (LLM), the stored approved questions, and the built-in bank.
//! All three are queried concurrently and awaited together; the results are
//! then folded left to right so a higher-priority source always fills the set
//! first and lower-priority ones only pad what is missing.

mod builtin;
mod generated;
mod shuffle;

pub use builtin::BuiltinQuestions;
pub use generated::{parse_generated_questions, LlmQuestionGenerator};
pub use shuffle::{NoShuffle, RandomShuffle, SeededShuffle, Shuffler};

use crate::llm::LlmError;
use crate::store::{QuestionRepository, StoreError};
use crate::types::{Question, Theme};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Default number of questions in a session
pub const DEFAULT_QUESTION_TARGET: usize = 15;

/// Why a source produced nothing
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Last-resort questions that are always at hand
pub trait FallbackBank: Send + Sync {
    fn for_theme(&self, theme: Theme) -> Vec<Question>;
}

impl FallbackBank for BuiltinQuestions {
    fn for_theme(&self, theme: Theme) -> Vec<Question> {
        BuiltinQuestions::for_theme(self, theme)
    }
}

/// A fixed list, filtered by theme
impl FallbackBank for Vec<Question> {
    fn for_theme(&self, theme: Theme) -> Vec<Question> {
        self.iter().filter(|q| q.theme == theme).cloned().collect()
    }
}

/// Authors new questions on demand
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Best effort: may return fewer than `count` questions
    async fn generate(&self, theme: Theme, count: usize) -> Result<Vec<Question>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Generated,
    Stored,
    BuiltIn,
}

/// Outcome of asking one source, before filtering
#[derive(Debug)]
pub struct SourceAttempt {
    pub kind: SourceKind,
    pub result: Result<Vec<Question>, SourceError>,
}

/// What one source contributed to an assembled set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttemptReport {
    pub kind: SourceKind,
    /// Questions taken into the set
    pub accepted: usize,
    /// Questions that failed validation or were not approved
    pub rejected: usize,
    /// Set when the source itself failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub questions: Vec<Question>,
    pub report: Vec<AttemptReport>,
}

fn normalized_text(question: &Question) -> String {
    question
        .text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fold source attempts, in the order given, into one ordered question set.
///
/// Failed attempts contribute nothing. Unapproved or unanswerable questions
/// are dropped, as are repeats (same id or same text) of questions already
/// taken. Taking stops at `target`. The result is stable-sorted by difficulty
/// so a session always escalates from easy to hard.
pub fn assemble(attempts: Vec<SourceAttempt>, target: usize, shuffler: &dyn Shuffler) -> Assembly {
    let mut questions: Vec<Question> = Vec::with_capacity(target);
    let mut seen_ids = HashSet::new();
    let mut seen_texts = HashSet::new();
    let mut report = Vec::with_capacity(attempts.len());

    for attempt in attempts {
        let mut entry = AttemptReport {
            kind: attempt.kind,
            accepted: 0,
            rejected: 0,
            error: None,
        };

        match attempt.result {
            Ok(mut candidates) => {
                shuffler.shuffle_questions(&mut candidates);

                for candidate in candidates {
                    if !candidate.approved {
                        entry.rejected += 1;
                        continue;
                    }
                    if let Err(e) = candidate.validate() {
                        tracing::warn!(
                            "Dropping {:?} question {}: {}",
                            attempt.kind,
                            candidate.id,
                            e
                        );
                        entry.rejected += 1;
                        continue;
                    }
                    if questions.len() >= target {
                        continue;
                    }
                    if !seen_ids.insert(candidate.id.clone())
                        || !seen_texts.insert(normalized_text(&candidate))
                    {
                        continue;
                    }
                    questions.push(candidate);
                    entry.accepted += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Question source {:?} failed: {}", attempt.kind, e);
                entry.error = Some(e.to_string());
            }
        }

        report.push(entry);
    }

    // sort_by_key is stable: equal difficulties keep their assembly order
    questions.sort_by_key(|q| q.difficulty);

    Assembly { questions, report }
}

/// Queries every configured source for a theme and assembles the result
pub struct QuestionSourcer {
    generator: Option<Arc<dyn QuestionGenerator>>,
    repository: Arc<dyn QuestionRepository>,
    fallback: Arc<dyn FallbackBank>,
    shuffler: Arc<dyn Shuffler>,
    target: usize,
}

impl QuestionSourcer {
    pub fn new(
        generator: Option<Arc<dyn QuestionGenerator>>,
        repository: Arc<dyn QuestionRepository>,
        fallback: Arc<dyn FallbackBank>,
        shuffler: Arc<dyn Shuffler>,
        target: usize,
    ) -> Self {
        Self {
            generator,
            repository,
            fallback,
            shuffler,
            target: target.max(1),
        }
    }

    /// Ask all sources concurrently, wait for every one to settle, then fold
    /// them in priority order.
    pub async fn assemble_for(&self, theme: Theme) -> Assembly {
        let generated = async {
            match &self.generator {
                Some(generator) => generator.generate(theme, self.target).await,
                None => Err(SourceError::Unavailable(
                    "no question generator configured".to_string(),
                )),
            }
        };
        let stored = async {
            self.repository
                .fetch_approved(theme)
                .await
                .map_err(SourceError::from)
        };

        let (generated, stored) = futures::future::join(generated, stored).await;
        let attempts = vec![
            SourceAttempt {
                kind: SourceKind::Generated,
                result: generated,
            },
            SourceAttempt {
                kind: SourceKind::Stored,
                result: stored,
            },
            SourceAttempt {
                kind: SourceKind::BuiltIn,
                result: Ok(self.fallback.for_theme(theme)),
            },
        ];

        let assembly = assemble(attempts, self.target, self.shuffler.as_ref());
        tracing::info!(
            "Assembled {} questions for {:?}: {:?}",
            assembly.questions.len(),
            theme,
            assembly.report
        );
        assembly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryQuestionStore;
    use crate::types::Difficulty;

    fn question(id: &str, difficulty: Difficulty) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}?", id),
            options: vec![
                "Angola".to_string(),
                "Brazil".to_string(),
                "France".to_string(),
                "Germany".to_string(),
            ],
            correct_answer: "Brazil".to_string(),
            theme: Theme::World,
            subtheme: String::new(),
            difficulty,
            approved: true,
            suggested_by: None,
            created_at: None,
        }
    }

    fn ok(kind: SourceKind, questions: Vec<Question>) -> SourceAttempt {
        SourceAttempt {
            kind,
            result: Ok(questions),
        }
    }

    fn failed(kind: SourceKind) -> SourceAttempt {
        SourceAttempt {
            kind,
            result: Err(SourceError::Unavailable("boom".to_string())),
        }
    }

    fn ids(assembly: &Assembly) -> Vec<&str> {
        assembly.questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_difficulty_stably() {
        use Difficulty::*;
        let pool = vec![
            question("h1", Hard),
            question("e1", Easy),
            question("m1", Medium),
            question("e2", Easy),
            question("h2", Hard),
            question("m2", Medium),
        ];

        let assembly = assemble(vec![ok(SourceKind::Stored, pool)], 15, &NoShuffle);
        assert_eq!(ids(&assembly), vec!["e1", "e2", "m1", "m2", "h1", "h2"]);
        assert!(assembly
            .questions
            .windows(2)
            .all(|w| w[0].difficulty <= w[1].difficulty));
    }

    #[test]
    fn test_priority_order_and_padding() {
        let generated = vec![question("g1", Difficulty::Easy), question("g2", Difficulty::Easy)];
        let stored = vec![question("s1", Difficulty::Easy), question("s2", Difficulty::Easy)];
        let builtin = vec![question("b1", Difficulty::Easy), question("b2", Difficulty::Easy)];

        let assembly = assemble(
            vec![
                ok(SourceKind::Generated, generated),
                ok(SourceKind::Stored, stored),
                ok(SourceKind::BuiltIn, builtin),
            ],
            5,
            &NoShuffle,
        );

        assert_eq!(ids(&assembly), vec!["g1", "g2", "s1", "s2", "b1"]);
        let accepted: Vec<usize> = assembly.report.iter().map(|r| r.accepted).collect();
        assert_eq!(accepted, vec![2, 2, 1]);
    }

    #[test]
    fn test_failed_sources_degrade_silently() {
        let assembly = assemble(
            vec![
                failed(SourceKind::Generated),
                failed(SourceKind::Stored),
                ok(SourceKind::BuiltIn, vec![question("b1", Difficulty::Medium)]),
            ],
            15,
            &NoShuffle,
        );

        assert_eq!(ids(&assembly), vec!["b1"]);
        assert!(assembly.report[0].error.is_some());
        assert!(assembly.report[1].error.is_some());
        assert!(assembly.report[2].error.is_none());
    }

    #[test]
    fn test_all_sources_empty_yields_empty_set() {
        let assembly = assemble(
            vec![
                failed(SourceKind::Generated),
                ok(SourceKind::Stored, vec![]),
                ok(SourceKind::BuiltIn, vec![]),
            ],
            15,
            &NoShuffle,
        );
        assert!(assembly.questions.is_empty());
    }

    #[test]
    fn test_unanswerable_question_is_dropped() {
        let mut broken = question("broken", Difficulty::Easy);
        broken.correct_answer = "Brazil".to_string();
        broken.options = vec![
            "France".to_string(),
            "Germany".to_string(),
            "Argentina".to_string(),
        ];

        let assembly = assemble(
            vec![ok(
                SourceKind::Generated,
                vec![broken, question("fine", Difficulty::Easy)],
            )],
            15,
            &NoShuffle,
        );

        assert_eq!(ids(&assembly), vec!["fine"]);
        assert_eq!(assembly.report[0].rejected, 1);
    }

    #[test]
    fn test_unapproved_and_duplicates_are_skipped() {
        let mut pending = question("pending", Difficulty::Easy);
        pending.approved = false;
        let mut same_text = question("other-id", Difficulty::Easy);
        same_text.text = "  question   S1? ".to_string();

        let assembly = assemble(
            vec![
                ok(SourceKind::Stored, vec![question("s1", Difficulty::Easy), pending]),
                ok(
                    SourceKind::BuiltIn,
                    vec![question("s1", Difficulty::Easy), same_text],
                ),
            ],
            15,
            &NoShuffle,
        );

        assert_eq!(ids(&assembly), vec!["s1"]);
    }

    struct FixedGenerator(Vec<Question>);

    #[async_trait]
    impl QuestionGenerator for FixedGenerator {
        async fn generate(&self, _theme: Theme, count: usize) -> Result<Vec<Question>, SourceError> {
            Ok(self.0.iter().take(count).cloned().collect())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl QuestionGenerator for FailingGenerator {
        async fn generate(&self, _theme: Theme, _count: usize) -> Result<Vec<Question>, SourceError> {
            Err(SourceError::Llm(LlmError::ApiError("quota exceeded".to_string())))
        }
    }

    #[tokio::test]
    async fn test_sourcer_prefers_generated_questions() {
        let generated: Vec<Question> = (0..20)
            .map(|i| question(&format!("ai-{}", i), Difficulty::Hard))
            .collect();
        let sourcer = QuestionSourcer::new(
            Some(Arc::new(FixedGenerator(generated))),
            Arc::new(MemoryQuestionStore::new()),
            Arc::new(BuiltinQuestions),
            Arc::new(NoShuffle),
            DEFAULT_QUESTION_TARGET,
        );

        let assembly = sourcer.assemble_for(Theme::World).await;
        assert_eq!(assembly.questions.len(), DEFAULT_QUESTION_TARGET);
        assert!(assembly.questions.iter().all(|q| q.id.starts_with("ai-")));
    }

    #[tokio::test]
    async fn test_sourcer_falls_back_to_builtin_bank() {
        let sourcer = QuestionSourcer::new(
            Some(Arc::new(FailingGenerator)),
            Arc::new(MemoryQuestionStore::new()),
            Arc::new(BuiltinQuestions),
            Arc::new(SeededShuffle::new(7)),
            DEFAULT_QUESTION_TARGET,
        );

        let assembly = sourcer.assemble_for(Theme::Angolan).await;
        assert!(!assembly.questions.is_empty());
        assert!(assembly.questions.iter().all(|q| q.id.starts_with("builtin-")));
        assert!(assembly
            .questions
            .windows(2)
            .all(|w| w[0].difficulty <= w[1].difficulty));
        assert_eq!(assembly.report[0].kind, SourceKind::Generated);
        assert!(assembly.report[0].error.is_some());
    }

    #[tokio::test]
    async fn test_sourcer_pads_stored_with_builtin() {
        let store = MemoryQuestionStore::new();
        let mut stored = question("", Difficulty::Hard);
        stored.text = "Which club won the 2023 Girabola?".to_string();
        stored.theme = Theme::Angolan;
        store.save(stored).await.unwrap();

        let sourcer = QuestionSourcer::new(
            None,
            Arc::new(store),
            Arc::new(BuiltinQuestions),
            Arc::new(NoShuffle),
            4,
        );
        let assembly = sourcer.assemble_for(Theme::Angolan).await;

        assert_eq!(assembly.questions.len(), 4);
        let stored_count = assembly
            .questions
            .iter()
            .filter(|q| !q.id.starts_with("builtin-"))
            .count();
        assert_eq!(stored_count, 1);
        assert_eq!(assembly.report[1].accepted, 1);
        assert_eq!(assembly.report[2].accepted, 3);
    }

    #[tokio::test]
    async fn test_sourcer_with_nothing_anywhere_reports_every_source() {
        let sourcer = QuestionSourcer::new(
            Some(Arc::new(FailingGenerator)),
            Arc::new(MemoryQuestionStore::new()),
            Arc::new(Vec::<Question>::new()),
            Arc::new(NoShuffle),
            DEFAULT_QUESTION_TARGET,
        );

        let assembly = sourcer.assemble_for(Theme::Players).await;
        assert!(assembly.questions.is_empty());
        let kinds: Vec<SourceKind> = assembly.report.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![SourceKind::Generated, SourceKind::Stored, SourceKind::BuiltIn]
        );
        assert!(assembly.report.iter().all(|r| r.accepted == 0));
    }

    #[test]
    fn test_fixed_fallback_filters_by_theme() {
        let mut angolan = question("a-1", Difficulty::Easy);
        angolan.theme = Theme::Angolan;
        let bank = vec![question("w-1", Difficulty::Easy), angolan];

        let picked = FallbackBank::for_theme(&bank, Theme::Angolan);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "a-1");
    }
}
