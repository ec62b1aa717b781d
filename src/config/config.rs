use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use super::defaults::*;
use super::ApiKey;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// JSON file holding the test corpus
    #[serde(default = "default_corpus_file")]
    pub corpus_file: PathBuf,

    /// JSON file holding the recorded pipeline run to evaluate
    #[serde(default = "default_recorded_run")]
    pub recorded_run: PathBuf,

    /// How many leading passages count toward nDCG
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_log_dir")]
    log_dir: PathBuf,

    #[serde(default)]
    pub judge: JudgeConfiguration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JudgeConfiguration {
    #[serde(default = "default_judge_api_key")]
    pub api_key: ApiKey,

    #[serde(default = "default_judge_model")]
    pub model: String,

    /// Any OpenAI-compatible endpoint works as a judge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

impl Default for JudgeConfiguration {
    fn default() -> Self {
        Self {
            api_key: default_judge_api_key(),
            model: default_judge_model(),
            base_url: None,
        }
    }
}

impl Config {
    /// Loads the configuration file from the given path
    pub async fn load(path: &Path) -> Result<Config> {
        let file = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not find `{}`", path.display()))?;

        toml::from_str(std::str::from_utf8(&file)?).context("Failed to parse configuration")
    }

    pub fn log_dir(&self) -> &Path {
        self.log_dir.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_toml() {
        let toml = r#"
            project_name = "insurellm"

            [judge]
            api_key = "text:test-key"
            "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.project_name, "insurellm");
        assert_eq!(config.corpus_file, PathBuf::from("tests.json"));
        assert_eq!(config.recorded_run, PathBuf::from("recorded_run.json"));
        assert_eq!(config.top_k, 10);
        assert_eq!(config.judge.api_key.expose_secret(), "test-key");
        assert_eq!(config.judge.model, "gpt-4.1-nano");
        assert!(config.judge.base_url.is_none());
    }

    #[test]
    fn test_deserialize_full_toml() {
        let toml = r#"
            project_name = "insurellm"
            corpus_file = "fixtures/tests.json"
            recorded_run = "fixtures/run.json"
            top_k = 5
            log_dir = "/tmp/ragmark-logs"

            [judge]
            api_key = "text:test-key"
            model = "gpt-4o-mini"
            base_url = "http://localhost:11434/v1"
            "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.log_dir(), Path::new("/tmp/ragmark-logs"));
        assert_eq!(config.judge.model, "gpt-4o-mini");
        assert_eq!(
            config.judge.base_url.unwrap().as_str(),
            "http://localhost:11434/v1"
        );
    }

    #[test]
    fn test_api_key_never_serializes() {
        let toml = r#"
            [judge]
            api_key = "text:very-secret"
            "#;

        let config: Config = toml::from_str(toml).unwrap();
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(!serialized.contains("very-secret"));
        assert!(serialized.contains("****"));
    }
}
