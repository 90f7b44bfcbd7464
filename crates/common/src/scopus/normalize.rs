//! Maps raw Scopus entries onto a stable paper record.
//!
//! Normalization is total: every field has a placeholder and no input shape
//! causes an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for absent text fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Normalized paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(default = "not_available")]
    pub title: String,
    #[serde(default = "not_available")]
    pub authors: String,
    #[serde(default = "not_available")]
    pub year: String,
    #[serde(default = "not_available")]
    pub publication: String,
    #[serde(default)]
    pub cited_by: u64,
    #[serde(default = "not_available")]
    pub doi: String,
    #[serde(default = "not_available")]
    pub document_type: String,
    #[serde(default = "not_available")]
    pub source_type: String,
    #[serde(default = "not_available")]
    pub affiliation: String,
    #[serde(default = "not_available")]
    pub eid: String,
    #[serde(default = "not_available")]
    pub scopus_url: String,
    #[serde(default)]
    pub open_access: bool,
    #[serde(default = "not_available")]
    pub pdf_url: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

impl PaperRecord {
    /// The DOI, if upstream supplied one
    pub fn doi(&self) -> Option<&str> {
        present(&self.doi)
    }

    pub fn scopus_url(&self) -> Option<&str> {
        present(&self.scopus_url)
    }

    pub fn pdf_url(&self) -> Option<&str> {
        present(&self.pdf_url)
    }
}

fn present(value: &str) -> Option<&str> {
    if value.is_empty() || value == NOT_AVAILABLE {
        None
    } else {
        Some(value)
    }
}

/// Upstream marks failed entries with an `error` key
pub fn is_error_entry(entry: &Value) -> bool {
    entry.get("error").is_some()
}

/// Normalize one raw entry
pub fn normalize(entry: &Value) -> PaperRecord {
    let links = entry
        .get("link")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let scopus_url = links
        .iter()
        .find(|link| link.get("@ref").and_then(Value::as_str) == Some("scopus"))
        .map(|link| text(link, "@href"))
        .unwrap_or_else(not_available);

    let pdf_url = links
        .iter()
        .find(|link| {
            let is_full_text = link.get("@ref").and_then(Value::as_str) == Some("full-text");
            let href_is_pdf = link
                .get("@href")
                .and_then(Value::as_str)
                .map(|href| href.to_lowercase().contains("pdf"))
                .unwrap_or(false);
            is_full_text || href_is_pdf
        })
        .map(|link| text(link, "@href"))
        .unwrap_or_else(not_available);

    let affiliation = match entry.get("affiliation") {
        Some(Value::Array(affs)) => affs
            .first()
            .map(|aff| text(aff, "affilname"))
            .unwrap_or_else(not_available),
        Some(aff @ Value::Object(_)) => text(aff, "affilname"),
        _ => not_available(),
    };

    let year = entry
        .get("prism:coverDate")
        .and_then(Value::as_str)
        .filter(|date| !date.is_empty())
        .map(|date| date.chars().take(4).collect())
        .unwrap_or_else(not_available);

    PaperRecord {
        title: text(entry, "dc:title"),
        authors: text(entry, "dc:creator"),
        year,
        publication: text(entry, "prism:publicationName"),
        cited_by: citation_count(entry.get("citedby-count")),
        doi: text(entry, "prism:doi"),
        document_type: text(entry, "subtypeDescription"),
        source_type: text(entry, "prism:aggregationType"),
        affiliation,
        eid: text(entry, "eid"),
        scopus_url,
        open_access: flag(entry.get("openaccessFlag")),
        pdf_url,
    }
}

fn text(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(not_available)
}

fn citation_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_entry() -> Value {
        json!({
            "dc:title": "Attention Is All You Need",
            "dc:creator": "Vaswani A.",
            "prism:coverDate": "2017-12-04",
            "prism:publicationName": "NeurIPS",
            "citedby-count": "50000",
            "prism:doi": "10.5555/3295222",
            "subtypeDescription": "Conference Paper",
            "prism:aggregationType": "Conference Proceeding",
            "eid": "2-s2.0-85044",
            "openaccessFlag": true,
            "affiliation": [
                {"affilname": "Google Brain"},
                {"affilname": "University of Toronto"}
            ],
            "link": [
                {"@ref": "self", "@href": "https://api.elsevier.com/self"},
                {"@ref": "scopus", "@href": "https://www.scopus.com/record/1"},
                {"@ref": "full-text", "@href": "https://example.org/full"}
            ]
        })
    }

    #[test]
    fn test_full_entry() {
        let paper = normalize(&full_entry());
        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.authors, "Vaswani A.");
        assert_eq!(paper.year, "2017");
        assert_eq!(paper.publication, "NeurIPS");
        assert_eq!(paper.cited_by, 50000);
        assert_eq!(paper.doi(), Some("10.5555/3295222"));
        assert_eq!(paper.document_type, "Conference Paper");
        assert_eq!(paper.source_type, "Conference Proceeding");
        assert_eq!(paper.affiliation, "Google Brain");
        assert_eq!(paper.eid, "2-s2.0-85044");
        assert_eq!(paper.scopus_url, "https://www.scopus.com/record/1");
        assert!(paper.open_access);
        assert_eq!(paper.pdf_url, "https://example.org/full");
    }

    #[test]
    fn test_empty_entry_uses_placeholders() {
        let paper = normalize(&json!({}));
        assert_eq!(paper.title, NOT_AVAILABLE);
        assert_eq!(paper.year, NOT_AVAILABLE);
        assert_eq!(paper.affiliation, NOT_AVAILABLE);
        assert_eq!(paper.scopus_url, NOT_AVAILABLE);
        assert_eq!(paper.pdf_url, NOT_AVAILABLE);
        assert_eq!(paper.cited_by, 0);
        assert!(!paper.open_access);
        assert_eq!(paper.doi(), None);
    }

    #[test]
    fn test_affiliation_as_single_object() {
        let paper = normalize(&json!({"affiliation": {"affilname": "MIT"}}));
        assert_eq!(paper.affiliation, "MIT");

        let paper = normalize(&json!({"affiliation": []}));
        assert_eq!(paper.affiliation, NOT_AVAILABLE);
    }

    #[test]
    fn test_pdf_detected_by_href() {
        let paper = normalize(&json!({
            "link": [{"@ref": "other", "@href": "https://host/Paper.PDF"}]
        }));
        assert_eq!(paper.pdf_url, "https://host/Paper.PDF");
        assert_eq!(paper.scopus_url, NOT_AVAILABLE);
    }

    #[test]
    fn test_citation_count_coercion() {
        assert_eq!(normalize(&json!({"citedby-count": 12})).cited_by, 12);
        assert_eq!(normalize(&json!({"citedby-count": " 7 "})).cited_by, 7);
        assert_eq!(normalize(&json!({"citedby-count": "many"})).cited_by, 0);
        assert_eq!(normalize(&json!({"citedby-count": null})).cited_by, 0);
    }

    #[test]
    fn test_short_cover_date_and_string_flag() {
        let paper = normalize(&json!({"prism:coverDate": "99", "openaccessFlag": "true"}));
        assert_eq!(paper.year, "99");
        assert!(paper.open_access);
    }

    #[test]
    fn test_error_entries_detected() {
        assert!(is_error_entry(&json!({"error": "Result set was empty"})));
        assert!(!is_error_entry(&full_entry()));
    }

    #[test]
    fn test_record_deserializes_with_missing_fields() {
        let paper: PaperRecord = serde_json::from_value(json!({"title": "T", "cited_by": 3})).unwrap();
        assert_eq!(paper.title, "T");
        assert_eq!(paper.cited_by, 3);
        assert_eq!(paper.eid, NOT_AVAILABLE);
    }
}
