//! Recorded pipeline runs as evaluation collaborators.
//!
//! A recorded run is a JSON file mapping each question to the answer the
//! pipeline produced and the ranked passages it retrieved, captured in an
//! earlier live run. Replaying the recording lets the harness score a
//! pipeline without the vector store or chat model present.
//!
//! Example format:
//!
//! ```json
//! {
//!   "Who is Averi Lancaster?": {
//!     "answer": "Averi Lancaster is the CEO of Insurellm.",
//!     "passages": [
//!       { "content": "Averi Lancaster is the CEO", "metadata": { "source": "employees.md" } }
//!     ]
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::providers::{AnswerGenerator, GeneratedAnswer, RetrievedPassage, Retriever};

/// One recorded question: the generated answer and the passages used for it,
/// in rank order.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedCase {
    pub answer: String,
    #[serde(default)]
    pub passages: Vec<RetrievedPassage>,
}

/// A full recorded run, keyed by question.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RecordedRun {
    cases: HashMap<String, RecordedCase>,
}

impl RecordedRun {
    pub fn from_path(path: &Path) -> Result<Self> {
        std::fs::read_to_string(path)
            .with_context(|| format!("Could not read recorded run at `{}`", path.display()))?
            .parse()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    fn lookup(&self, question: &str) -> Result<&RecordedCase> {
        self.cases.get(question).with_context(|| {
            format!("Recorded run has no entry for question `{question}`")
        })
    }
}

impl FromStr for RecordedRun {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse recorded run")
    }
}

#[async_trait]
impl Retriever for RecordedRun {
    async fn fetch_passages(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        Ok(self.lookup(query)?.passages.clone())
    }
}

#[async_trait]
impl AnswerGenerator for RecordedRun {
    async fn generate_answer(&self, question: &str) -> Result<GeneratedAnswer> {
        let case = self.lookup(question)?;
        Ok(GeneratedAnswer {
            answer: case.answer.clone(),
            passages: case.passages.clone(),
        })
    }
}
