//! JSON documents exchanged with the quiz server.

use std::{fmt, time::Duration};

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

use crate::domain::{Alternative, Question, TransportResponse};

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDocument {
    #[serde(default)]
    pub id: Option<i64>,
    pub question: String,
    #[serde(default)]
    pub alternatives: Option<AlternativesDocument>,
    #[serde(rename = "nextURL")]
    pub next_url: String,
    /// Seconds allowed for this question.
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<QuestionDocument> for Question {
    fn from(doc: QuestionDocument) -> Self {
        Self {
            id: doc.id,
            text: doc.question,
            alternatives: doc.alternatives.map(|alts| alts.0),
            submit_url: doc.next_url,
            time_limit: doc.limit.filter(|s| *s > 0).map(Duration::from_secs),
            message: doc.message,
        }
    }
}

/// Choice-key → display-text mapping that keeps the document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativesDocument(pub Vec<Alternative>);

impl<'de> Deserialize<'de> for AlternativesDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedAlternatives;

        impl<'de> Visitor<'de> for OrderedAlternatives {
            type Value = AlternativesDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of choice keys to display text")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut alternatives = Vec::with_capacity(map.size_hint().unwrap_or(4));
                while let Some((key, text)) = map.next_entry::<String, String>()? {
                    alternatives.push(Alternative { key, text });
                }
                Ok(AlternativesDocument(alternatives))
            }
        }

        deserializer.deserialize_map(OrderedAlternatives)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResponseDocument {
    #[serde(rename = "nextURL", default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<AnswerResponseDocument> for TransportResponse {
    fn from(doc: AnswerResponseDocument) -> Self {
        let message = doc.message;
        match doc.next_url.filter(|url| !url.trim().is_empty()) {
            Some(next_url) => Self::Continue { next_url, message },
            None => Self::Finished { message },
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
