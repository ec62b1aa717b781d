//! Drives an evaluation run over the test corpus.
//!
//! Suites are produced through a capacity-1 channel: the producer task works
//! one case ahead of the consumer at most, and stops as soon as the receiver
//! is dropped. A case that cannot be scored is carried as an `Err` outcome
//! in its progress item; it never aborts the rest of the batch.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::corpus::TestCase;
use crate::judge::{AnswerEvalResult, Judge};
use crate::providers::{AnswerGenerator, GeneratedAnswer, Retriever};
use crate::retrieval::{score_retrieval, RetrievalEvalResult, DEFAULT_TOP_K};

/// One yielded step of a suite run.
#[derive(Debug)]
pub struct EvalProgress<T> {
    pub case: TestCase,
    /// The case's result, or the collaborator error that failed it.
    pub outcome: Result<T>,
    /// `(i + 1) / total` for the i-th processed case, in (0, 1].
    pub fraction_complete: f64,
}

/// Everything needed to inspect a single case: both verdicts plus what the
/// pipeline actually produced.
#[derive(Debug)]
pub struct CaseReport {
    pub case: TestCase,
    pub retrieval: RetrievalEvalResult,
    pub answer: AnswerEvalResult,
    pub generated: GeneratedAnswer,
}

/// Owns the corpus snapshot and the three collaborators for one run.
#[derive(Clone)]
pub struct Runner {
    corpus: Arc<Vec<TestCase>>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    judge: Judge,
    top_k: usize,
}

impl Runner {
    pub fn new(
        corpus: Vec<TestCase>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        judge: Judge,
    ) -> Self {
        Self {
            corpus: Arc::new(corpus),
            retriever,
            generator,
            judge,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Overrides how many leading passages count toward nDCG.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn total_cases(&self) -> usize {
        self.corpus.len()
    }

    /// Scores retrieval for every case in corpus order.
    ///
    /// Single-pass and lazy; dropping the receiver abandons the remainder.
    pub fn run_retrieval_suite(&self) -> mpsc::Receiver<EvalProgress<RetrievalEvalResult>> {
        let (tx, rx) = mpsc::channel(1);
        let corpus = Arc::clone(&self.corpus);
        let retriever = Arc::clone(&self.retriever);
        let top_k = self.top_k;

        tokio::spawn(async move {
            let total = corpus.len();
            for (index, case) in corpus.iter().enumerate() {
                let outcome = retriever
                    .fetch_passages(&case.question)
                    .await
                    .map(|passages| score_retrieval(&case.keywords, &passages, top_k));

                if let Err(error) = &outcome {
                    tracing::error!(index, question = %case.question, %error, "Retrieval evaluation failed");
                }

                let progress = EvalProgress {
                    case: case.clone(),
                    outcome,
                    fraction_complete: (index + 1) as f64 / total as f64,
                };
                if tx.send(progress).await.is_err() {
                    // Consumer hung up; abandon the rest of the suite.
                    break;
                }
            }
        });

        rx
    }

    /// Generates and judges an answer for every case in corpus order.
    pub fn run_answer_suite(&self) -> mpsc::Receiver<EvalProgress<AnswerEvalResult>> {
        let (tx, rx) = mpsc::channel(1);
        let corpus = Arc::clone(&self.corpus);
        let generator = Arc::clone(&self.generator);
        let judge = self.judge.clone();

        tokio::spawn(async move {
            let total = corpus.len();
            for (index, case) in corpus.iter().enumerate() {
                let outcome = judge_one(&*generator, &judge, case).await;

                if let Err(error) = &outcome {
                    tracing::error!(index, question = %case.question, %error, "Answer evaluation failed");
                }

                let progress = EvalProgress {
                    case: case.clone(),
                    outcome,
                    fraction_complete: (index + 1) as f64 / total as f64,
                };
                if tx.send(progress).await.is_err() {
                    break;
                }
            }
        });

        rx
    }

    /// Runs both scorers for one case and returns the combined report.
    ///
    /// The index is validated before any collaborator is invoked.
    pub async fn run_single(&self, index: usize) -> Result<CaseReport> {
        let total = self.corpus.len();
        let Some(case) = self.corpus.get(index) else {
            anyhow::bail!(
                "Test index {index} is out of bounds, valid indices are 0 to {}",
                total.saturating_sub(1)
            );
        };

        let passages = self.retriever.fetch_passages(&case.question).await?;
        let retrieval = score_retrieval(&case.keywords, &passages, self.top_k);

        let generated = self.generator.generate_answer(&case.question).await?;
        let answer = self.judge.judge_answer(case, &generated.answer).await?;

        Ok(CaseReport {
            case: case.clone(),
            retrieval,
            answer,
            generated,
        })
    }
}

async fn judge_one(
    generator: &dyn AnswerGenerator,
    judge: &Judge,
    case: &TestCase,
) -> Result<AnswerEvalResult> {
    let generated = generator.generate_answer(&case.question).await?;
    judge.judge_answer(case, &generated.answer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::MockJudgeModel;
    use crate::providers::{
        MockAnswerGenerator, MockRetriever, RetrievedPassage,
    };

    fn test_corpus() -> Vec<TestCase> {
        vec![
            TestCase {
                question: "Who is Averi Lancaster?".to_string(),
                keywords: vec!["Lancaster".to_string()],
                reference_answer: "The CEO of Insurellm.".to_string(),
                category: "people".to_string(),
            },
            TestCase {
                question: "What does Carllm do?".to_string(),
                keywords: vec!["auto insurance".to_string()],
                reference_answer: "Carllm is an auto insurance product.".to_string(),
                category: "products".to_string(),
            },
        ]
    }

    fn noop_judge() -> Judge {
        Judge::new(Arc::new(MockJudgeModel::new()))
    }

    fn passing_judge() -> Judge {
        let mut model = MockJudgeModel::new();
        model.expect_complete().returning(|_, _| {
            Ok(r#"{"feedback": "Good.", "accuracy": 4, "completeness": 4, "relevance": 4}"#
                .to_string())
        });
        Judge::new(Arc::new(model))
    }

    #[test_log::test(tokio::test)]
    async fn test_retrieval_suite_reports_monotonic_progress() {
        let mut retriever = MockRetriever::new();
        retriever.expect_fetch_passages().times(2).returning(|_| {
            Ok(vec![RetrievedPassage::from_content(
                "Averi Lancaster sells auto insurance",
            )])
        });

        let runner = Runner::new(
            test_corpus(),
            Arc::new(retriever),
            Arc::new(MockAnswerGenerator::new()),
            noop_judge(),
        );

        let mut suite = runner.run_retrieval_suite();
        let mut fractions = Vec::new();
        while let Some(progress) = suite.recv().await {
            assert!(progress.outcome.is_ok());
            fractions.push(progress.fraction_complete);
        }

        assert_eq!(fractions, vec![0.5, 1.0]);
    }

    #[test_log::test(tokio::test)]
    async fn test_one_failed_case_does_not_abort_the_batch() {
        let mut retriever = MockRetriever::new();
        let mut call = 0;
        retriever.expect_fetch_passages().times(2).returning(move |_| {
            call += 1;
            if call == 1 {
                anyhow::bail!("vector store unavailable")
            }
            Ok(vec![RetrievedPassage::from_content("auto insurance")])
        });

        let runner = Runner::new(
            test_corpus(),
            Arc::new(retriever),
            Arc::new(MockAnswerGenerator::new()),
            noop_judge(),
        );

        let mut suite = runner.run_retrieval_suite();

        let first = suite.recv().await.unwrap();
        assert!(first.outcome.is_err());
        assert_eq!(first.case.question, "Who is Averi Lancaster?");

        let second = suite.recv().await.unwrap();
        assert!(second.outcome.is_ok());

        assert!(suite.recv().await.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_dropping_the_receiver_abandons_the_suite() {
        let mut retriever = MockRetriever::new();
        // At most the in-flight case runs after the receiver is gone.
        retriever
            .expect_fetch_passages()
            .times(1..=2)
            .returning(|_| Ok(vec![]));

        let runner = Runner::new(
            test_corpus(),
            Arc::new(retriever),
            Arc::new(MockAnswerGenerator::new()),
            noop_judge(),
        );

        let mut suite = runner.run_retrieval_suite();
        let first = suite.recv().await.unwrap();
        assert!(first.outcome.is_ok());
        drop(suite);

        // Give the producer task a chance to observe the closed channel.
        tokio::task::yield_now().await;
    }

    #[test_log::test(tokio::test)]
    async fn test_answer_suite_scores_each_case() {
        let mut generator = MockAnswerGenerator::new();
        generator.expect_generate_answer().times(2).returning(|question| {
            Ok(GeneratedAnswer {
                answer: format!("An answer to: {question}"),
                passages: vec![],
            })
        });

        let runner = Runner::new(
            test_corpus(),
            Arc::new(MockRetriever::new()),
            Arc::new(generator),
            passing_judge(),
        );

        let mut suite = runner.run_answer_suite();
        let mut seen = 0;
        while let Some(progress) = suite.recv().await {
            let verdict = progress.outcome.unwrap();
            assert_eq!(verdict.feedback, "Good.");
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_judge_response_fails_only_that_case() {
        let mut generator = MockAnswerGenerator::new();
        generator.expect_generate_answer().times(2).returning(|_| {
            Ok(GeneratedAnswer {
                answer: "An answer.".to_string(),
                passages: vec![],
            })
        });

        let mut model = MockJudgeModel::new();
        let mut call = 0;
        model.expect_complete().times(2).returning(move |_, _| {
            call += 1;
            if call == 1 {
                // Missing the feedback field.
                Ok(r#"{"accuracy": 4, "completeness": 4, "relevance": 4}"#.to_string())
            } else {
                Ok(r#"{"feedback": "Fine.", "accuracy": 3, "completeness": 3, "relevance": 3}"#
                    .to_string())
            }
        });

        let runner = Runner::new(
            test_corpus(),
            Arc::new(MockRetriever::new()),
            Arc::new(generator),
            Judge::new(Arc::new(model)),
        );

        let mut suite = runner.run_answer_suite();
        assert!(suite.recv().await.unwrap().outcome.is_err());
        assert!(suite.recv().await.unwrap().outcome.is_ok());
        assert!(suite.recv().await.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_run_single_out_of_bounds_invokes_no_collaborator() {
        // Mocks with no expectations panic when called, so reaching the
        // assertions proves neither collaborator was invoked.
        let runner = Runner::new(
            test_corpus(),
            Arc::new(MockRetriever::new()),
            Arc::new(MockAnswerGenerator::new()),
            noop_judge(),
        );

        let error = runner.run_single(2).await.unwrap_err();
        assert!(error.to_string().contains("valid indices are 0 to 1"));

        let error = runner.run_single(usize::MAX).await.unwrap_err();
        assert!(error.to_string().contains("out of bounds"));
    }

    #[test_log::test(tokio::test)]
    async fn test_run_single_combines_both_scorers() {
        let mut retriever = MockRetriever::new();
        retriever.expect_fetch_passages().once().returning(|_| {
            Ok(vec![
                RetrievedPassage::from_content("filler"),
                RetrievedPassage::from_content("Averi Lancaster is the CEO"),
            ])
        });

        let mut generator = MockAnswerGenerator::new();
        generator.expect_generate_answer().once().returning(|_| {
            Ok(GeneratedAnswer {
                answer: "Averi Lancaster is the CEO of Insurellm.".to_string(),
                passages: vec![RetrievedPassage::from_content("Averi Lancaster is the CEO")],
            })
        });

        let runner = Runner::new(
            test_corpus(),
            Arc::new(retriever),
            Arc::new(generator),
            passing_judge(),
        );

        let report = runner.run_single(0).await.unwrap();
        assert_eq!(report.case.question, "Who is Averi Lancaster?");
        assert!((report.retrieval.mean_reciprocal_rank - 0.5).abs() < 1e-9);
        assert_eq!(report.answer.feedback, "Good.");
        assert_eq!(report.generated.passages.len(), 1);
    }
}
