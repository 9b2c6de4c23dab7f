use crate::session::{AnswerOutcome, SessionState, Verdict};
use crate::source::AttemptReport;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    StartSession {
        #[serde(default)]
        theme: Theme,
    },
    SubmitAnswer {
        /// Index of the question being answered, as sent in the question view
        question_index: usize,
        option: String,
    },
    Abandon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        /// Display name of the connected profile, if any
        display_name: Option<String>,
        themes: Vec<ThemeInfo>,
    },
    /// Questions are being gathered for a new session
    SessionLoading {
        theme: Theme,
    },
    SessionStarted {
        session_id: SessionId,
        theme: Theme,
        total_questions: usize,
        question: QuestionView,
    },
    /// No source produced a playable question; the client may retry
    SourcingFailed {
        theme: Theme,
        sources: Vec<AttemptReport>,
    },
    AnswerResult {
        verdict: Verdict,
        state: SessionState,
        score: u32,
        /// Present while the session is in progress
        next_question: Option<QuestionView>,
    },
    SessionAbandoned {
        session_id: SessionId,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }

    pub fn answer_result(outcome: AnswerOutcome, index: usize, total: usize) -> Self {
        ServerMessage::AnswerResult {
            verdict: outcome.verdict,
            state: outcome.state,
            score: outcome.score,
            next_question: outcome
                .next_question
                .map(|q| QuestionView::new(&q, index, total)),
        }
    }
}

/// What a player sees of a question: never the correct answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    /// Zero-based position in the session, echoed back with the answer
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub subtheme: String,
}

impl QuestionView {
    pub fn new(question: &Question, index: usize, total: usize) -> Self {
        Self {
            id: question.id.clone(),
            index,
            total,
            text: question.text.clone(),
            options: question.options.clone(),
            difficulty: question.difficulty,
            subtheme: question.subtheme.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeInfo {
    pub id: Theme,
    pub label: String,
}

impl ThemeInfo {
    pub fn all() -> Vec<ThemeInfo> {
        Theme::ALL
            .iter()
            .map(|&theme| ThemeInfo {
                id: theme,
                label: theme.label().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages_parse() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"start_session","theme":"angolan"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartSession { theme: Theme::Angolan }));

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"start_session"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartSession { theme: Theme::World }));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"submit_answer","question_index":2,"option":"Brazil"}"#)
                .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::SubmitAnswer { question_index: 2, ref option } if option == "Brazil"
        ));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"t":"cheat"}"#).is_err());
    }

    #[test]
    fn test_question_view_hides_answer() {
        let question = Question {
            id: "q1".to_string(),
            text: "Who won the 2010 World Cup?".to_string(),
            options: vec![
                "Spain".to_string(),
                "Netherlands".to_string(),
                "Germany".to_string(),
                "Uruguay".to_string(),
            ],
            correct_answer: "Spain".to_string(),
            theme: Theme::Cups,
            subtheme: String::new(),
            difficulty: Difficulty::Easy,
            approved: true,
            suggested_by: None,
            created_at: None,
        };

        let json = serde_json::to_value(QuestionView::new(&question, 0, 15)).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert_eq!(json["index"], 0);
        assert_eq!(json["total"], 15);
        assert_eq!(json["difficulty"], "easy");
    }

    #[test]
    fn test_server_message_tagging() {
        let json = serde_json::to_value(ServerMessage::error("no_session", "nothing to answer"))
            .unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "no_session");

        let json = serde_json::to_value(ServerMessage::SessionLoading {
            theme: Theme::European,
        })
        .unwrap();
        assert_eq!(json["t"], "session_loading");
        assert_eq!(json["theme"], "european");
    }

    #[test]
    fn test_theme_list_is_complete() {
        let themes = ThemeInfo::all();
        assert_eq!(themes.len(), Theme::ALL.len());
        assert_eq!(themes[0].label, "World Football");
    }
}
