//! Rank-based retrieval metrics.
//!
//! A keyword is "found" when it appears, case-insensitively, as a substring
//! of a passage's content. MRR scans the full retrieved list; nDCG only the
//! top-k, with binary relevance and `log2(rank + 1)` discounts.

use serde::Serialize;

use crate::providers::RetrievedPassage;

/// How many leading passages count toward nDCG unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 10;

/// Aggregated retrieval metrics for one test case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalEvalResult {
    /// Mean reciprocal rank across all keywords, in [0, 1].
    pub mean_reciprocal_rank: f64,
    /// Mean nDCG across all keywords, in [0, 1].
    pub mean_ndcg: f64,
    /// Keywords found in at least one retrieved passage.
    pub keywords_found: usize,
    pub total_keywords: usize,
    /// `100 * keywords_found / total_keywords`, 0.0 for an empty keyword set.
    pub keyword_coverage_percent: f64,
}

/// Scores one case's retrieved passages against its expected keywords.
///
/// Pure over its inputs; all division-by-zero edges (no keywords, empty
/// ideal ordering) are defined as 0.0 rather than errors.
#[must_use]
pub fn score_retrieval(
    keywords: &[String],
    passages: &[RetrievedPassage],
    k: usize,
) -> RetrievalEvalResult {
    let reciprocal_ranks: Vec<f64> = keywords
        .iter()
        .map(|keyword| reciprocal_rank(keyword, passages))
        .collect();
    let ndcg_scores: Vec<f64> = keywords
        .iter()
        .map(|keyword| ndcg(keyword, passages, k))
        .collect();

    let total_keywords = keywords.len();
    let keywords_found = reciprocal_ranks.iter().filter(|score| **score > 0.0).count();
    let keyword_coverage_percent = if total_keywords == 0 {
        0.0
    } else {
        keywords_found as f64 / total_keywords as f64 * 100.0
    };

    RetrievalEvalResult {
        mean_reciprocal_rank: mean(&reciprocal_ranks),
        mean_ndcg: mean(&ndcg_scores),
        keywords_found,
        total_keywords,
        keyword_coverage_percent,
    }
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// `1 / rank` of the first passage containing the keyword, 0.0 when absent.
/// Scans the full list, not just the top-k.
fn reciprocal_rank(keyword: &str, passages: &[RetrievedPassage]) -> f64 {
    let needle = keyword.to_lowercase();
    passages
        .iter()
        .position(|passage| passage.content.to_lowercase().contains(&needle))
        .map_or(0.0, |index| 1.0 / (index + 1) as f64)
}

/// Discounted cumulative gain with the discount `log2(i + 2)` for 0-indexed
/// position `i`, so the first position is undiscounted.
fn dcg(relevances: &[u8]) -> f64 {
    relevances
        .iter()
        .enumerate()
        .map(|(index, relevance)| f64::from(*relevance) / ((index + 2) as f64).log2())
        .sum()
}

/// Binary-relevance nDCG over the first `k` passages, 0.0 when no passage in
/// the window is relevant.
fn ndcg(keyword: &str, passages: &[RetrievedPassage], k: usize) -> f64 {
    let needle = keyword.to_lowercase();
    let mut relevances: Vec<u8> = passages
        .iter()
        .take(k)
        .map(|passage| u8::from(passage.content.to_lowercase().contains(&needle)))
        .collect();

    let actual = dcg(&relevances);

    // Ideal ordering: every relevant passage ahead of every irrelevant one.
    relevances.sort_unstable_by(|a, b| b.cmp(a));
    let ideal = dcg(&relevances);

    if ideal > 0.0 {
        actual / ideal
    } else {
        0.0
    }
}
