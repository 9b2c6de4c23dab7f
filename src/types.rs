use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque ID types for type safety
pub type QuestionId = String;
pub type UserId = String;
pub type SessionId = String;

/// Number of answer options every playable question carries
pub const OPTION_COUNT: usize = 4;

/// Points banked for each correctly answered question
pub const POINTS_PER_QUESTION: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    World,
    African,
    Angolan,
    European,
    Cups,
    Players,
    Clubs,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::World,
        Theme::African,
        Theme::Angolan,
        Theme::European,
        Theme::Cups,
        Theme::Players,
        Theme::Clubs,
    ];

    /// Human readable name shown to players
    pub fn label(&self) -> &'static str {
        match self {
            Theme::World => "World Football",
            Theme::African => "African Football",
            Theme::Angolan => "Angolan Football",
            Theme::European => "European Leagues",
            Theme::Cups => "World Cups",
            Theme::Players => "Historic Players",
            Theme::Clubs => "Historic Clubs",
        }
    }

    /// Topic focus handed to the question generator
    pub fn focus(&self) -> &'static str {
        match self {
            Theme::World => "World Cups and legendary players",
            Theme::African => "the Africa Cup of Nations (CAN) and CAF competitions",
            Theme::Angolan => "the Girabola league and the Palancas Negras national team",
            Theme::European => "the big European leagues and the Champions League",
            Theme::Cups => "FIFA World Cup tournaments, finals and records",
            Theme::Players => "historic players, their records and transfers",
            Theme::Clubs => "historic clubs, their titles and rivalries",
        }
    }
}

/// Difficulty tiers, declared in playing order so the derived `Ord` is easy < medium < hard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient parsing for generator output, which is not always in English
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "easy" | "fácil" | "facil" => Some(Difficulty::Easy),
            "medium" | "médio" | "medio" => Some(Difficulty::Medium),
            "hard" | "difícil" | "dificil" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Reasons a question cannot be put in front of a player
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("expected 4 options, got {0}")]
    OptionCount(usize),

    #[error("option {0} is empty")]
    EmptyOption(usize),

    #[error("option '{0}' appears more than once")]
    DuplicateOption(String),

    #[error("correct answer '{0}' is not among the options")]
    MissingCorrectAnswer(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub theme: Theme,
    #[serde(default)]
    pub subtheme: String,
    pub difficulty: Difficulty,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Question {
    /// Check that the question is answerable: four distinct non-empty options,
    /// exactly one of which is the correct answer.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() != OPTION_COUNT {
            return Err(QuestionError::OptionCount(self.options.len()));
        }

        let mut seen = HashSet::with_capacity(OPTION_COUNT);
        for (i, option) in self.options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(QuestionError::EmptyOption(i));
            }
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }

        if !seen.contains(self.correct_answer.as_str()) {
            return Err(QuestionError::MissingCorrectAnswer(
                self.correct_answer.clone(),
            ));
        }
        Ok(())
    }

    /// Whether `answer` is exactly (byte-for-byte) the correct answer
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// One finished playthrough as recorded in a profile's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub theme: Theme,
    pub points: u32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Append-only, in insertion order
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
}

impl UserProfile {
    /// Sum of points over the whole score history
    pub fn total(&self) -> u64 {
        self.scores.iter().map(|s| u64::from(s.points)).sum()
    }

    /// Most recent `n` score records, newest first
    pub fn recent_scores(&self, n: usize) -> Vec<ScoreRecord> {
        self.scores.iter().rev().take(n).cloned().collect()
    }
}
