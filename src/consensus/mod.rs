use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceScore;
use crate::evidence::HasEvidence;

pub const DEFAULT_MIN_PAGE_COUNT: usize = 3;

/// How widely one token recurs across the crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossPageResult<T> {
    pub token: T,
    pub page_urls: BTreeSet<String>,
    pub occurrence_count: usize,
    pub confidence: f64,
    pub is_standard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ConfidenceScore>,
}

impl<T> CrossPageResult<T> {
    pub fn page_count(&self) -> usize {
        self.page_urls.len()
    }
}

/// Measure page coverage for every token.
///
/// `confidence` is the plain fraction of crawled pages the token appears on and
/// `is_standard` marks tokens seen on at least `min_page_count` distinct pages.
/// Results are ordered by confidence, highest first; ties keep input order.
pub fn validate<T>(
    tokens: Vec<T>,
    min_page_count: usize,
    total_pages: usize,
) -> Vec<CrossPageResult<T>>
where
    T: HasEvidence,
{
    let mut results: Vec<CrossPageResult<T>> = tokens
        .into_iter()
        .map(|token| {
            let page_urls = token.page_urls();
            let occurrence_count = token.evidence().len();
            let confidence = if total_pages > 0 {
                page_urls.len() as f64 / total_pages as f64
            } else {
                0.0
            };
            let is_standard = page_urls.len() >= min_page_count;
            CrossPageResult {
                token,
                page_urls,
                occurrence_count,
                confidence,
                is_standard,
                score: None,
            }
        })
        .collect();

    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results
}

/// Copy out the results promoted to standards; the full list is left intact.
pub fn partition_standards<T: Clone>(results: &[CrossPageResult<T>]) -> Vec<CrossPageResult<T>> {
    results
        .iter()
        .filter(|result| result.is_standard)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{evidence_on, Evidence};
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        name: &'static str,
        evidence: Vec<Evidence>,
    }

    impl HasEvidence for Sample {
        fn evidence(&self) -> &[Evidence] {
            &self.evidence
        }
    }

    fn sample(name: &'static str, pages: &[&str]) -> Sample {
        Sample {
            name,
            evidence: pages.iter().map(|page| evidence_on(page)).collect(),
        }
    }

    #[test]
    fn counts_unique_pages_and_raw_occurrences() {
        let results = validate(
            vec![sample("a", &["p1", "p1", "p2"])],
            DEFAULT_MIN_PAGE_COUNT,
            3,
        );

        let result = &results[0];
        assert_eq!(result.page_count(), 2);
        assert_eq!(result.occurrence_count, 3);
        assert!((result.confidence - 2.0 / 3.0).abs() < 1e-12);
        assert!(!result.is_standard);
        assert!(result.score.is_none());
    }

    #[test]
    fn one_of_three_pages_is_exactly_a_third() {
        let results = validate(vec![sample("a", &["p1"])], 3, 3);
        assert_eq!(results[0].confidence, 1.0 / 3.0);
    }

    #[test]
    fn zero_total_pages_means_zero_confidence() {
        let results = validate(vec![sample("a", &["p1", "p2", "p3"])], 3, 0);
        assert_eq!(results[0].confidence, 0.0);
        assert!(results[0].is_standard);
    }

    #[test]
    fn sorted_by_confidence_with_stable_ties() {
        let results = validate(
            vec![
                sample("low", &["p1"]),
                sample("high", &["p1", "p2", "p3"]),
                sample("tie-first", &["p1", "p2"]),
                sample("tie-second", &["p3", "p4"]),
            ],
            3,
            4,
        );

        let names: Vec<&str> = results.iter().map(|result| result.token.name).collect();
        assert_eq!(names, vec!["high", "tie-first", "tie-second", "low"]);
    }

    #[test]
    fn partition_keeps_only_standards() {
        let results = validate(
            vec![sample("wide", &["p1", "p2", "p3"]), sample("narrow", &["p1"])],
            3,
            3,
        );
        let standards = partition_standards(&results);
        assert_eq!(standards.len(), 1);
        assert_eq!(standards[0].token.name, "wide");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let results = validate(Vec::<Sample>::new(), 3, 10);
        assert!(results.is_empty());
    }

    proptest! {
        #[test]
        fn standard_iff_enough_pages(
            pages in proptest::collection::vec(0u8..8, 0..20),
            min_page_count in 0usize..6,
        ) {
            let urls: Vec<String> = pages.iter().map(|page| format!("p{page}")).collect();
            let token = Sample {
                name: "t",
                evidence: urls.iter().map(|url| evidence_on(url)).collect(),
            };
            let results = validate(vec![token], min_page_count, 8);
            let result = &results[0];
            prop_assert!(result.page_count() <= result.occurrence_count);
            prop_assert_eq!(result.is_standard, result.page_count() >= min_page_count);
        }

        #[test]
        fn confidence_grows_with_page_coverage(extra in 0usize..5, total in 5usize..20) {
            let base: Vec<String> = (0..extra).map(|i| format!("p{i}")).collect();
            let wider: Vec<String> = (0..=extra).map(|i| format!("p{i}")).collect();
            let narrow = Sample {
                name: "narrow",
                evidence: base.iter().map(|url| evidence_on(url)).collect(),
            };
            let wide = Sample {
                name: "wide",
                evidence: wider.iter().map(|url| evidence_on(url)).collect(),
            };
            let narrow = validate(vec![narrow], 3, total);
            let wide = validate(vec![wide], 3, total);
            prop_assert!(wide[0].confidence >= narrow[0].confidence);
        }
    }
}
