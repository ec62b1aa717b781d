use std::path::PathBuf;

use crate::retrieval::DEFAULT_TOP_K;

use super::ApiKey;

/// The default project name based on the current directory
///
/// # Panics
///
/// Panics if the current directory is not available
#[must_use]
pub fn default_project_name() -> String {
    // Infer from the current directory
    std::env::current_dir()
        .expect("Failed to get current directory")
        .file_name()
        .expect("Failed to get current directory name")
        .to_string_lossy()
        .to_string()
}

pub(super) fn default_log_dir() -> PathBuf {
    let mut path = dirs::cache_dir().expect("Failed to get cache directory");
    path.push("ragmark");
    path.push("logs");

    path
}

pub(super) fn default_corpus_file() -> PathBuf {
    "tests.json".into()
}

pub(super) fn default_recorded_run() -> PathBuf {
    "recorded_run.json".into()
}

pub(super) fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

pub(super) fn default_judge_model() -> String {
    "gpt-4.1-nano".to_string()
}

pub(super) fn default_judge_api_key() -> ApiKey {
    std::env::var("OPENAI_API_KEY").unwrap_or_default().into()
}
