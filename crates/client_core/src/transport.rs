//! Question/answer exchange with the quiz server.

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{AnswerSubmission, Question, TransportResponse},
    error::TransportError,
    protocol::{AnswerResponseDocument, QuestionDocument},
};
use tracing::debug;
use url::Url;

#[async_trait]
pub trait QuizTransport: Send + Sync {
    async fn fetch_question(&self, url: &str) -> Result<Question, TransportError>;
    async fn submit_answer(
        &self,
        url: &str,
        submission: &AnswerSubmission,
    ) -> Result<TransportResponse, TransportError>;
}

/// JSON-over-HTTP transport. Any non-success status is a failure; the server
/// does not distinguish a wrong answer from other errors.
#[derive(Clone, Default)]
pub struct HttpQuizTransport {
    http: Client,
}

impl HttpQuizTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizTransport for HttpQuizTransport {
    async fn fetch_question(&self, url: &str) -> Result<Question, TransportError> {
        debug!(url, "transport: fetching question");
        let doc: QuestionDocument = self
            .http
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?
            .json()
            .await
            .map_err(map_reqwest_error)?;
        let mut question = Question::from(doc);
        question.submit_url = resolve_url(url, &question.submit_url)?;
        Ok(question)
    }

    async fn submit_answer(
        &self,
        url: &str,
        submission: &AnswerSubmission,
    ) -> Result<TransportResponse, TransportError> {
        debug!(url, "transport: submitting answer");
        let doc: AnswerResponseDocument = self
            .http
            .post(url)
            .json(submission)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?
            .json()
            .await
            .map_err(map_reqwest_error)?;
        match TransportResponse::from(doc) {
            TransportResponse::Continue { next_url, message } => Ok(TransportResponse::Continue {
                next_url: resolve_url(url, &next_url)?,
                message,
            }),
            finished @ TransportResponse::Finished { .. } => Ok(finished),
        }
    }
}

/// Servers may hand out links relative to the document they came from.
fn resolve_url(base: &str, link: &str) -> Result<String, TransportError> {
    let base = Url::parse(base).map_err(|err| TransportError::InvalidUrl(format!("{base}: {err}")))?;
    base.join(link)
        .map(String::from)
        .map_err(|err| TransportError::InvalidUrl(format!("{link}: {err}")))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if let Some(status) = err.status() {
        TransportError::Status(status.as_u16())
    } else if err.is_builder() {
        TransportError::InvalidUrl(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
