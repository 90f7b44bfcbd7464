//! Scopus boolean query composition and the closed filter vocabularies.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Document type filter.
///
/// Wire values are the Scopus codes; the long names are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "ar", alias = "article")]
    Article,
    #[serde(rename = "cp", alias = "conference")]
    Conference,
    #[serde(rename = "re", alias = "review")]
    Review,
    #[serde(rename = "bk", alias = "book")]
    Book,
    #[serde(rename = "ch", alias = "chapter")]
    Chapter,
    #[serde(rename = "no", alias = "note")]
    Note,
    #[serde(rename = "ed", alias = "editorial")]
    Editorial,
    #[serde(rename = "le", alias = "letter")]
    Letter,
}

impl DocumentType {
    /// Scopus DOCTYPE code
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::Article => "ar",
            DocumentType::Conference => "cp",
            DocumentType::Review => "re",
            DocumentType::Book => "bk",
            DocumentType::Chapter => "ch",
            DocumentType::Note => "no",
            DocumentType::Editorial => "ed",
            DocumentType::Letter => "le",
        }
    }
}

/// Subject area filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectArea {
    #[serde(rename = "COMP", alias = "computer_science")]
    ComputerScience,
    #[serde(rename = "ENGI", alias = "engineering")]
    Engineering,
    #[serde(rename = "MEDI", alias = "medicine")]
    Medicine,
    #[serde(rename = "MATH", alias = "mathematics")]
    Mathematics,
    #[serde(rename = "PHYS", alias = "physics")]
    Physics,
    #[serde(rename = "CHEM", alias = "chemistry")]
    Chemistry,
    #[serde(rename = "BUSI", alias = "business")]
    Business,
    #[serde(rename = "ECON", alias = "economics")]
    Economics,
    #[serde(rename = "SOCI", alias = "social_sciences")]
    SocialSciences,
    #[serde(rename = "PSYC", alias = "psychology")]
    Psychology,
}

impl SubjectArea {
    /// Scopus SUBJAREA code
    pub fn code(&self) -> &'static str {
        match self {
            SubjectArea::ComputerScience => "COMP",
            SubjectArea::Engineering => "ENGI",
            SubjectArea::Medicine => "MEDI",
            SubjectArea::Mathematics => "MATH",
            SubjectArea::Physics => "PHYS",
            SubjectArea::Chemistry => "CHEM",
            SubjectArea::Business => "BUSI",
            SubjectArea::Economics => "ECON",
            SubjectArea::SocialSciences => "SOCI",
            SubjectArea::Psychology => "PSYC",
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "relevance")]
    Relevance,
    #[default]
    #[serde(rename = "-citedby-count", alias = "citations")]
    Citations,
    #[serde(rename = "-date", alias = "date_newest")]
    DateNewest,
    #[serde(rename = "date", alias = "date_oldest")]
    DateOldest,
}

impl SortBy {
    /// Scopus sort token
    pub fn token(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Citations => "-citedby-count",
            SortBy::DateNewest => "-date",
            SortBy::DateOldest => "date",
        }
    }
}

/// Append filter clauses to a base query.
///
/// Clauses are added in a fixed order: publication years, document type,
/// then subject areas. Absent filters contribute nothing and the base query
/// is used verbatim. A repeated subject area is emitted once.
pub fn build_query(
    base: &str,
    year_from: Option<i32>,
    year_to: Option<i32>,
    document_type: Option<DocumentType>,
    subject_areas: &[SubjectArea],
) -> String {
    let mut query = base.to_string();

    match (year_from, year_to) {
        (Some(from), Some(to)) => {
            query.push_str(&format!(" AND PUBYEAR > {} AND PUBYEAR < {}", from - 1, to + 1));
        }
        (Some(from), None) => query.push_str(&format!(" AND PUBYEAR > {}", from - 1)),
        (None, Some(to)) => query.push_str(&format!(" AND PUBYEAR < {}", to + 1)),
        (None, None) => {}
    }

    if let Some(doc_type) = document_type {
        query.push_str(&format!(" AND DOCTYPE({})", doc_type.code()));
    }

    if !subject_areas.is_empty() {
        let mut seen = HashSet::new();
        let clauses: Vec<String> = subject_areas
            .iter()
            .filter(|area| seen.insert(**area))
            .map(|area| format!("SUBJAREA({})", area.code()))
            .collect();
        query.push_str(&format!(" AND ({})", clauses.join(" OR ")));
    }

    query
}

pub fn author_query(name: &str) -> String {
    format!("AUTHOR-NAME({})", name)
}

pub fn affiliation_query(institution: &str) -> String {
    format!("AFFIL({})", institution)
}

pub fn eid_query(eid: &str) -> String {
    format!("EID({})", eid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_is_identity() {
        assert_eq!(build_query("machine learning", None, None, None, &[]), "machine learning");
    }

    #[test]
    fn test_year_range_is_inclusive() {
        assert_eq!(
            build_query("ml", Some(2020), Some(2022), None, &[]),
            "ml AND PUBYEAR > 2019 AND PUBYEAR < 2023"
        );
    }

    #[test]
    fn test_machine_learning_year_range() {
        assert_eq!(
            build_query("machine learning", Some(2020), Some(2024), None, &[]),
            "machine learning AND PUBYEAR > 2019 AND PUBYEAR < 2025"
        );
    }

    #[test]
    fn test_repeated_subject_area_emitted_once() {
        assert_eq!(
            build_query(
                "x",
                None,
                None,
                None,
                &[SubjectArea::Medicine, SubjectArea::ComputerScience, SubjectArea::Medicine]
            ),
            "x AND (SUBJAREA(MEDI) OR SUBJAREA(COMP))"
        );
    }

    #[test]
    fn test_single_year_bounds() {
        assert_eq!(build_query("ml", Some(2020), None, None, &[]), "ml AND PUBYEAR > 2019");
        assert_eq!(build_query("ml", None, Some(2020), None, &[]), "ml AND PUBYEAR < 2021");
    }

    #[test]
    fn test_full_composition_order() {
        let query = build_query(
            "x",
            Some(2020),
            Some(2022),
            Some(DocumentType::Article),
            &[SubjectArea::ComputerScience, SubjectArea::Engineering],
        );
        assert_eq!(
            query,
            "x AND PUBYEAR > 2019 AND PUBYEAR < 2023 AND DOCTYPE(ar) AND (SUBJAREA(COMP) OR SUBJAREA(ENGI))"
        );
    }

    #[test]
    fn test_single_subject_area_still_parenthesized() {
        assert_eq!(
            build_query("x", None, None, None, &[SubjectArea::Medicine]),
            "x AND (SUBJAREA(MEDI))"
        );
    }

    #[test]
    fn test_sort_tokens() {
        assert_eq!(SortBy::default(), SortBy::Citations);
        assert_eq!(SortBy::Citations.token(), "-citedby-count");
        assert_eq!(SortBy::Relevance.token(), "relevance");
        assert_eq!(SortBy::DateNewest.token(), "-date");
        assert_eq!(SortBy::DateOldest.token(), "date");
    }

    #[test]
    fn test_enum_wire_values() {
        let doc: DocumentType = serde_json::from_str("\"cp\"").unwrap();
        assert_eq!(doc, DocumentType::Conference);
        let doc: DocumentType = serde_json::from_str("\"conference\"").unwrap();
        assert_eq!(doc.code(), "cp");

        let area: SubjectArea = serde_json::from_str("\"SOCI\"").unwrap();
        assert_eq!(area, SubjectArea::SocialSciences);

        let sort: SortBy = serde_json::from_str("\"-date\"").unwrap();
        assert_eq!(sort, SortBy::DateNewest);
        assert_eq!(serde_json::to_string(&SortBy::Citations).unwrap(), "\"-citedby-count\"");
    }

    #[test]
    fn test_clause_builders() {
        assert_eq!(author_query("Smith J"), "AUTHOR-NAME(Smith J)");
        assert_eq!(affiliation_query("MIT"), "AFFIL(MIT)");
        assert_eq!(eid_query("2-s2.0-123"), "EID(2-s2.0-123)");
    }
}
