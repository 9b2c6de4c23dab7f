use super::{QuestionGenerator, SourceError};
use crate::llm::{
    GenerateRequest, LlmError, LlmManager, LlmResult, QUESTION_AUTHOR_SYSTEM_PROMPT,
};
use crate::types::{Difficulty, Question, Theme};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Question generator backed by the configured LLM providers
pub struct LlmQuestionGenerator {
    llm: Arc<LlmManager>,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmQuestionGenerator {
    pub fn new(llm: Arc<LlmManager>, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            llm,
            max_tokens,
            timeout,
        }
    }

    fn request(&self, theme: Theme, count: usize) -> GenerateRequest {
        let prompt = format!(
            "Write {count} multiple-choice football trivia questions about {focus}.\n\
             Mix the difficulty: roughly a third easy, a third medium and a third hard.\n\
             Reply with a JSON object of the form \
             {{\"questions\": [{{\"text\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \
             \"correct_answer\": \"...\", \"subtheme\": \"...\", \"difficulty\": \"easy|medium|hard\"}}]}}.\n\
             The correct_answer must be copied exactly from options.",
            count = count,
            focus = theme.focus(),
        );

        GenerateRequest {
            system: QUESTION_AUTHOR_SYSTEM_PROMPT.to_string(),
            prompt,
            max_tokens: Some(self.max_tokens),
            timeout: self.timeout,
            json: true,
        }
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(&self, theme: Theme, count: usize) -> Result<Vec<Question>, SourceError> {
        let request = self.request(theme, count);
        let mut last_error = None;

        for provider in self.llm.providers() {
            let response = match provider.generate(request.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Provider {} failed to generate questions: {}", provider.name(), e);
                    last_error = Some(e);
                    continue;
                }
            };

            match parse_generated_questions(&response.text, theme) {
                Ok(questions) if !questions.is_empty() => {
                    tracing::info!(
                        "{} generated {} questions for {:?} in {}ms",
                        response.metadata.provider,
                        questions.len(),
                        theme,
                        response.metadata.latency_ms
                    );
                    return Ok(questions.into_iter().take(count).collect());
                }
                Ok(_) => {
                    last_error = Some(LlmError::ParseError(format!(
                        "{} returned no questions",
                        provider.name()
                    )));
                }
                Err(e) => {
                    tracing::warn!("Could not parse output of {}: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => SourceError::Llm(e),
            None => SourceError::Unavailable("no LLM providers configured".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    text: String,
    options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    correct_answer: String,
    #[serde(default)]
    subtheme: String,
    #[serde(default)]
    difficulty: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedBatch {
    Wrapped { questions: Vec<GeneratedQuestion> },
    Bare(Vec<GeneratedQuestion>),
}

/// Cut the JSON payload out of a reply that may carry code fences or prose
fn json_payload(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let end = text.rfind(['}', ']'])?;
    (end >= start).then(|| &text[start..=end])
}

/// Parse generator output into unvalidated questions for `theme`.
///
/// Accepts `{"questions": [...]}` or a bare array. Unknown difficulty labels
/// default to medium. Generated questions are live immediately.
pub fn parse_generated_questions(text: &str, theme: Theme) -> LlmResult<Vec<Question>> {
    let payload = json_payload(text)
        .ok_or_else(|| LlmError::ParseError("no JSON found in response".to_string()))?;

    let batch: GeneratedBatch =
        serde_json::from_str(payload).map_err(|e| LlmError::ParseError(e.to_string()))?;
    let generated = match batch {
        GeneratedBatch::Wrapped { questions } => questions,
        GeneratedBatch::Bare(questions) => questions,
    };

    let now = chrono::Utc::now();
    Ok(generated
        .into_iter()
        .map(|g| Question {
            id: format!("ai-{}", ulid::Ulid::new().to_string().to_lowercase()),
            text: g.text.trim().to_string(),
            options: g.options.iter().map(|o| o.trim().to_string()).collect(),
            correct_answer: g.correct_answer.trim().to_string(),
            theme,
            subtheme: g.subtheme.trim().to_string(),
            difficulty: Difficulty::from_label(&g.difficulty).unwrap_or(Difficulty::Medium),
            approved: true,
            suggested_by: None,
            created_at: Some(now),
        })
        .collect())
}
