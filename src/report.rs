//! Renders a single case's full evaluation for human inspection.
//!
//! Formatting only; rounding here is presentation and never feeds back into
//! the stored metrics.

use std::fmt::Write as _;

use crate::runner::CaseReport;

const BAR: &str = "================================================================================";

/// Renders every field of both result objects plus the test case itself.
#[must_use]
pub fn format_report(report: &CaseReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{BAR}");
    let _ = writeln!(out, "Question: {}", report.case.question);
    let _ = writeln!(out, "Keywords: {}", report.case.keywords.join(", "));
    let _ = writeln!(out, "Category: {}", report.case.category);
    let _ = writeln!(out, "Reference Answer: {}", report.case.reference_answer);

    let _ = writeln!(out, "\n{BAR}");
    let _ = writeln!(out, "Retrieval Evaluation");
    let _ = writeln!(out, "{BAR}");
    let _ = writeln!(out, "MRR: {:.4}", report.retrieval.mean_reciprocal_rank);
    let _ = writeln!(out, "nDCG: {:.4}", report.retrieval.mean_ndcg);
    let _ = writeln!(
        out,
        "Keywords Found: {}/{}",
        report.retrieval.keywords_found, report.retrieval.total_keywords
    );
    let _ = writeln!(
        out,
        "Keyword Coverage: {:.1}%",
        report.retrieval.keyword_coverage_percent
    );

    let _ = writeln!(out, "\n{BAR}");
    let _ = writeln!(out, "Answer Evaluation");
    let _ = writeln!(out, "{BAR}");
    let _ = writeln!(out, "\nGenerated Answer:\n{}", report.generated.answer);
    let _ = writeln!(out, "\nFeedback:\n{}", report.answer.feedback);
    let _ = writeln!(out, "\nScores:");
    let _ = writeln!(out, "  Accuracy: {:.2}/5", report.answer.accuracy);
    let _ = writeln!(out, "  Completeness: {:.2}/5", report.answer.completeness);
    let _ = writeln!(out, "  Relevance: {:.2}/5", report.answer.relevance);
    let _ = writeln!(out, "\n{BAR}");

    out
}
