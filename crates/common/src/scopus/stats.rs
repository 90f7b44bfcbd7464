//! Aggregate citation and publication statistics over a result set.

use super::normalize::{PaperRecord, NOT_AVAILABLE};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// How many publications `top_journals` lists
pub const TOP_JOURNALS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct PaperStats {
    pub total_papers: usize,
    pub total_citations: u64,
    pub avg_citations: f64,
    /// Upper median: the element at index `n / 2` of the sorted counts
    pub median_citations: f64,
    pub max_citations: u64,
    pub min_citations: u64,
    /// "{earliest} - {latest}" over papers with a known year
    pub year_range: String,
    pub papers_per_year: BTreeMap<String, usize>,
    /// Most frequent publications, highest count first
    #[serde(serialize_with = "ordered_map")]
    pub top_journals: Vec<(String, usize)>,
}

impl PaperStats {
    /// Summarize a result set. Returns `None` for an empty set.
    pub fn from_papers(papers: &[PaperRecord]) -> Option<Self> {
        if papers.is_empty() {
            return None;
        }

        let mut citations: Vec<u64> = papers.iter().map(|p| p.cited_by).collect();
        citations.sort_unstable();
        let total_citations: u64 = citations.iter().sum();

        let mut papers_per_year = BTreeMap::new();
        for paper in papers {
            *papers_per_year.entry(paper.year.clone()).or_insert(0) += 1;
        }

        let known_years: Vec<&str> = papers
            .iter()
            .map(|p| p.year.as_str())
            .filter(|year| *year != NOT_AVAILABLE)
            .collect();
        let year_range = format!(
            "{} - {}",
            known_years.iter().min().copied().unwrap_or(NOT_AVAILABLE),
            known_years.iter().max().copied().unwrap_or(NOT_AVAILABLE),
        );

        let mut journal_counts: HashMap<&str, usize> = HashMap::new();
        for paper in papers {
            *journal_counts.entry(paper.publication.as_str()).or_insert(0) += 1;
        }
        let mut top_journals: Vec<(String, usize)> = journal_counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        top_journals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_journals.truncate(TOP_JOURNALS);

        Some(Self {
            total_papers: papers.len(),
            total_citations,
            avg_citations: total_citations as f64 / papers.len() as f64,
            median_citations: citations[citations.len() / 2] as f64,
            max_citations: citations[citations.len() - 1],
            min_citations: citations[0],
            year_range,
            papers_per_year,
            top_journals,
        })
    }
}

fn ordered_map<S: Serializer>(entries: &[(String, usize)], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paper(year: &str, publication: &str, cited_by: u64) -> PaperRecord {
        serde_json::from_value(json!({
            "year": year,
            "publication": publication,
            "cited_by": cited_by,
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_is_none() {
        assert!(PaperStats::from_papers(&[]).is_none());
    }

    #[test]
    fn test_citation_metrics() {
        let papers = vec![
            paper("2020", "Nature", 10),
            paper("2021", "Science", 40),
            paper("2021", "Nature", 0),
            paper("2023", "Cell", 30),
        ];
        let stats = PaperStats::from_papers(&papers).unwrap();

        assert_eq!(stats.total_papers, 4);
        assert_eq!(stats.total_citations, 80);
        assert_eq!(stats.avg_citations, 20.0);
        // sorted [0, 10, 30, 40], index 2
        assert_eq!(stats.median_citations, 30.0);
        assert_eq!(stats.max_citations, 40);
        assert_eq!(stats.min_citations, 0);
        assert_eq!(stats.year_range, "2020 - 2023");
        assert_eq!(stats.papers_per_year.get("2021"), Some(&2));
    }

    #[test]
    fn test_top_journals_order_and_serialization() {
        let papers = vec![
            paper("2020", "Science", 1),
            paper("2020", "Nature", 1),
            paper("2020", "Nature", 1),
            paper("2020", "Cell", 1),
        ];
        let stats = PaperStats::from_papers(&papers).unwrap();

        assert_eq!(stats.top_journals[0], ("Nature".to_string(), 2));
        assert_eq!(stats.top_journals[1], ("Cell".to_string(), 1));

        let body = serde_json::to_string(&stats).unwrap();
        assert!(body.contains("\"top_journals\":{\"Nature\":2,\"Cell\":1,\"Science\":1}"));
    }

    #[test]
    fn test_unknown_years_excluded_from_range() {
        let papers = vec![paper("N/A", "X", 1), paper("2019", "X", 2)];
        let stats = PaperStats::from_papers(&papers).unwrap();
        assert_eq!(stats.year_range, "2019 - 2019");
        assert_eq!(stats.papers_per_year.get("N/A"), Some(&1));

        let stats = PaperStats::from_papers(&[paper("N/A", "X", 1)]).unwrap();
        assert_eq!(stats.year_range, "N/A - N/A");
    }
}
