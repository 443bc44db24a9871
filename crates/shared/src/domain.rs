use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Key under which the leaderboard is persisted in the key-value substrate.
pub const LEADERBOARD_KEY: &str = "quiz_high_scores";
pub const LEADERBOARD_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub key: String,
    pub text: String,
}

/// A question as received from the quiz server. Never mutated after decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Option<i64>,
    pub text: String,
    /// `Some` for closed-choice questions, in document order.
    pub alternatives: Option<Vec<Alternative>>,
    pub submit_url: String,
    /// Per-question override of the configured time limit.
    pub time_limit: Option<Duration>,
    pub message: Option<String>,
}

impl Question {
    pub fn is_closed_choice(&self) -> bool {
        self.alternatives.is_some()
    }

    pub fn has_choice(&self, key: &str) -> bool {
        self.alternatives
            .as_deref()
            .is_some_and(|alternatives| alternatives.iter().any(|alt| alt.key == key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub answer: String,
}

impl AnswerSubmission {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResponse {
    Continue {
        next_url: String,
        message: Option<String>,
    },
    Finished {
        message: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub nickname: String,
    #[serde(rename = "time", alias = "elapsed_ms")]
    pub elapsed_ms: u64,
}

impl ScoreEntry {
    pub fn new(nickname: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            nickname: nickname.into(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    /// The question could not be fetched.
    Network,
    /// The answer was rejected, or the server failed while judging it.
    Rejected,
    Timeout,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Network => "Network error or server down.",
            Self::Rejected => "Wrong answer! Game over.",
            Self::Timeout => "Time is up! Game over.",
        };
        f.write_str(message)
    }
}
