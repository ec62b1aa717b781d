//! Collaborator contracts for the pipeline under evaluation.
//!
//! The harness never retrieves or generates anything itself; it scores what
//! these two collaborators return. Both are trait objects so tests can swap
//! in deterministic fakes.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// A single passage returned by the retrieval stage, in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RetrievedPassage {
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }
}

/// The generation stage's output: the answer plus the passages it was
/// grounded on. The passages are reused for retrieval metrics in combined
/// reports, so their order matters.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub passages: Vec<RetrievedPassage>,
}

/// Returns ranked passages for a query, most relevant first.
///
/// Rank order is load-bearing: MRR and nDCG are computed straight off the
/// returned sequence. An unavailable backend must surface as an error, not
/// as an empty result.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch_passages(&self, query: &str) -> Result<Vec<RetrievedPassage>>;
}

/// Answers a question with the pipeline under evaluation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate_answer(&self, question: &str) -> Result<GeneratedAnswer>;
}
