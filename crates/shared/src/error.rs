use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("server returned status: {0}")]
    Status(u16),
    #[error("network failure: {0}")]
    Network(String),
    #[error("malformed response document: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("{0}")]
    Validation(String),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("time limit of {limit_ms} ms exceeded")]
    Timeout { limit_ms: u64 },
    #[error("leaderboard persistence failed: {0}")]
    Persistence(String),
}

impl QuizError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
