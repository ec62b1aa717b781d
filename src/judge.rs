//! LLM-as-a-judge protocol for answer quality.
//!
//! Builds the judging prompt, makes a single structured-output call to the
//! judge model, and validates the verdict against the schema. Out-of-range
//! scores are rejected, never clamped; retry policy is the caller's problem.

use anyhow::{Context as _, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use indoc::formatdoc;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::JudgeConfiguration;
use crate::corpus::TestCase;

const JUDGE_SYSTEM_PROMPT: &str = "You are an expert evaluator assessing the quality of answers. Evaluate the generated answer by comparing it to the reference answer. Only give 5/5 scores for perfect answers.";

/// The judge's verdict on one generated answer. All scores are on a 1-5
/// scale; an answer with any factual error scores 1 on accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvalResult {
    pub feedback: String,
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
}

/// Transport seam for the judge model: one prompt in, one raw structured
/// response out.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JudgeModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// The judging protocol over any [`JudgeModel`] transport.
#[derive(Clone)]
pub struct Judge {
    model: Arc<dyn JudgeModel>,
}

impl Judge {
    pub fn new(model: Arc<dyn JudgeModel>) -> Self {
        Self { model }
    }

    /// Judges a generated answer against the case's reference answer.
    ///
    /// A response that does not satisfy the verdict schema is an error for
    /// this case, not a default score.
    pub async fn judge_answer(
        &self,
        case: &TestCase,
        generated_answer: &str,
    ) -> Result<AnswerEvalResult> {
        let prompt = judge_prompt(case, generated_answer);
        let raw = self
            .model
            .complete(JUDGE_SYSTEM_PROMPT, &prompt)
            .await
            .context("Judge model call failed")?;

        parse_verdict(&raw)
    }
}

/// Builds the user half of the judging prompt, embedding the grading policy
/// for each dimension.
fn judge_prompt(case: &TestCase, generated_answer: &str) -> String {
    formatdoc! {"
        Question:
        {question}

        Generated Answer:
        {generated_answer}

        Reference Answer:
        {reference_answer}

        Please evaluate the generated answer on three dimensions:
        1. Accuracy: How factually correct is it compared to the reference answer? Only give 5/5 scores for perfect answers.
        2. Completeness: How thoroughly does it address all aspects of the question, covering all the information from the reference answer?
        3. Relevance: How well does it directly answer the specific question asked, giving no additional information?

        Provide detailed feedback and scores from 1 (very poor) to 5 (ideal) for each dimension. If the answer is wrong, then the accuracy score must be 1.
        ",
        question = case.question,
        reference_answer = case.reference_answer,
    }
}

/// Parses and validates a raw judge response into a verdict.
pub fn parse_verdict(raw: &str) -> Result<AnswerEvalResult> {
    let verdict: AnswerEvalResult = serde_json::from_str(raw)
        .context("Judge response does not match the verdict schema")?;

    for (dimension, score) in [
        ("accuracy", verdict.accuracy),
        ("completeness", verdict.completeness),
        ("relevance", verdict.relevance),
    ] {
        if !(1.0..=5.0).contains(&score) {
            anyhow::bail!("Judge scored {dimension} as {score}, outside the 1-5 scale");
        }
    }

    Ok(verdict)
}

/// JSON schema the judge model is constrained to. Ranges live in the field
/// descriptions; numeric bounds are enforced by [`parse_verdict`].
fn verdict_response_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            name: "answer_eval".to_string(),
            description: Some(
                "Quality scores for a generated answer compared to a reference answer".to_string(),
            ),
            schema: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "feedback": {
                        "type": "string",
                        "description": "Concise feedback on the answer quality, comparing it to the reference answer"
                    },
                    "accuracy": {
                        "type": "number",
                        "description": "Factual correctness compared to the reference answer, 1 (wrong - any wrong answer must score 1) to 5 (perfectly accurate)"
                    },
                    "completeness": {
                        "type": "number",
                        "description": "Coverage of the reference answer, 1 (missing key information) to 5 (all information from the reference answer is provided)"
                    },
                    "relevance": {
                        "type": "number",
                        "description": "Relevance to the question asked, 1 (off-topic) to 5 (directly addresses the question with no additional information)"
                    }
                },
                "required": ["feedback", "accuracy", "completeness", "relevance"],
                "additionalProperties": false
            })),
            strict: Some(true),
        },
    }
}

/// Judge transport backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiJudge {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiJudge {
    pub fn from_config(config: &JudgeConfiguration) -> Self {
        let mut openai_config =
            OpenAIConfig::new().with_api_key(config.api_key.expose_secret());
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.as_str().trim_end_matches('/'));
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl JudgeModel for OpenAiJudge {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?
                    .into(),
            ])
            .response_format(verdict_response_format())
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .context("Judge returned an empty completion")
    }
}
