//! The test corpus: questions with expected keywords and reference answers.
//!
//! Loaded once at startup from a JSON array and treated as read-only for the
//! rest of the run.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// One test case. Keywords are expected somewhere in the retrieved passages;
/// the reference answer is what the judge compares the generated answer
/// against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub question: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub reference_answer: String,
    pub category: String,
}

/// Loads the corpus from a JSON file.
///
/// An empty corpus is rejected here so the runner never has to deal with a
/// zero-length suite.
pub async fn load_corpus(path: &Path) -> Result<Vec<TestCase>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read test corpus at `{}`", path.display()))?;

    let cases: Vec<TestCase> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse test corpus at `{}`", path.display()))?;

    if cases.is_empty() {
        anyhow::bail!("Test corpus at `{}` contains no test cases", path.display());
    }

    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn corpus_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create tempfile");
        file.write_all(json.as_bytes()).expect("Failed to write corpus");
        file
    }

    #[tokio::test]
    async fn test_load_corpus() {
        let file = corpus_file(
            r#"[
                {
                    "question": "Who is Averi Lancaster?",
                    "keywords": ["Lancaster", "CEO"],
                    "reference_answer": "Averi Lancaster is the CEO of Insurellm.",
                    "category": "people"
                }
            ]"#,
        );

        let cases = load_corpus(file.path()).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].question, "Who is Averi Lancaster?");
        assert_eq!(cases[0].keywords, vec!["Lancaster", "CEO"]);
        assert_eq!(cases[0].category, "people");
    }

    #[tokio::test]
    async fn test_keywords_default_to_empty() {
        let file = corpus_file(
            r#"[
                {
                    "question": "What does Insurellm sell?",
                    "reference_answer": "Insurance software.",
                    "category": "products"
                }
            ]"#,
        );

        let cases = load_corpus(file.path()).await.unwrap();
        assert!(cases[0].keywords.is_empty());
    }

    #[tokio::test]
    async fn test_empty_corpus_is_rejected() {
        let file = corpus_file("[]");

        let error = load_corpus(file.path()).await.unwrap_err();
        assert!(error.to_string().contains("no test cases"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let error = load_corpus(Path::new("/nonexistent/tests.json"))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Could not read test corpus"));
    }
}
