use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;

use ragmark::cli::{self, ModeArgs};
use ragmark::config::Config;
use ragmark::judge::{Judge, OpenAiJudge};
use ragmark::providers::{AnswerGenerator, Retriever};
use ragmark::recording::RecordedRun;
use ragmark::report::format_report;
use ragmark::runner::Runner;
use ragmark::{corpus, ragmark_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let config = Config::load(&args.config_path).await?;

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    ragmark_tracing::init(&config)?;
    tracing::info!("Loaded configuration: {:?}", config);

    let cases = corpus::load_corpus(&config.corpus_file).await?;
    tracing::info!(
        "Loaded {} test cases from `{}`",
        cases.len(),
        config.corpus_file.display()
    );

    let recorded = Arc::new(
        RecordedRun::from_path(&config.recorded_run)
            .context("A recorded pipeline run is required; capture one first")?,
    );
    tracing::info!(
        "Replaying recorded run `{}` with {} entries",
        config.recorded_run.display(),
        recorded.len()
    );

    let judge = Judge::new(Arc::new(OpenAiJudge::from_config(&config.judge)));

    let runner = Runner::new(
        cases,
        Arc::clone(&recorded) as Arc<dyn Retriever>,
        recorded as Arc<dyn AnswerGenerator>,
        judge,
    )
    .with_top_k(config.top_k);

    match args.mode {
        ModeArgs::Single => {
            let index = args
                .test_index
                .context("--test-index is required when running a single test")?;
            let report = runner.run_single(index).await?;
            println!("Test #{index}");
            println!("{}", format_report(&report));
        }
        ModeArgs::Retrieval => run_retrieval_suite(&runner).await,
        ModeArgs::Answers => run_answer_suite(&runner).await,
    }

    Ok(())
}

async fn run_retrieval_suite(runner: &Runner) {
    let total = runner.total_cases();
    println!("Evaluating retrieval for {total} test cases");

    let mut scored = 0_usize;
    let mut failed = 0_usize;
    let mut suite = runner.run_retrieval_suite();
    while let Some(progress) = suite.recv().await {
        let percent = progress.fraction_complete * 100.0;
        match progress.outcome {
            Ok(result) => {
                scored += 1;
                println!(
                    "[{percent:>5.1}%] MRR {:.4}  nDCG {:.4}  coverage {:.1}%  {}",
                    result.mean_reciprocal_rank,
                    result.mean_ndcg,
                    result.keyword_coverage_percent,
                    progress.case.question,
                );
            }
            Err(error) => {
                failed += 1;
                println!(
                    "[{percent:>5.1}%] FAILED  {}: {error:#}",
                    progress.case.question
                );
            }
        }
    }

    println!("Done: {scored} scored, {failed} failed");
}

async fn run_answer_suite(runner: &Runner) {
    let total = runner.total_cases();
    println!("Evaluating answers for {total} test cases");

    let mut scored = 0_usize;
    let mut failed = 0_usize;
    let mut suite = runner.run_answer_suite();
    while let Some(progress) = suite.recv().await {
        let percent = progress.fraction_complete * 100.0;
        match progress.outcome {
            Ok(result) => {
                scored += 1;
                println!(
                    "[{percent:>5.1}%] accuracy {:.2}  completeness {:.2}  relevance {:.2}  {}",
                    result.accuracy, result.completeness, result.relevance, progress.case.question,
                );
            }
            Err(error) => {
                failed += 1;
                println!(
                    "[{percent:>5.1}%] FAILED  {}: {error:#}",
                    progress.case.question
                );
            }
        }
    }

    println!("Done: {scored} scored, {failed} failed");
}
