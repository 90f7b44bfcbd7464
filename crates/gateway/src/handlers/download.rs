//! DOI resolution and download options

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::middleware::CurrentUser;
use crate::AppState;
use paperscope_common::{
    errors::{AppError, Result},
    scopus::normalize::NOT_AVAILABLE,
};

const DOI_RESOLVER: &str = "https://doi.org";
const SCHOLAR_SEARCH: &str = "https://scholar.google.com/scholar";

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfLinkResponse {
    pub doi: String,
    pub doi_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadMethod {
    pub method: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadInfoResponse {
    pub eid: String,
    pub title: String,
    pub doi: String,
    pub scopus_url: String,
    pub open_access: bool,
    pub download_methods: Vec<DownloadMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn resolver_prefix() -> Option<&'static regex_lite::Regex> {
    static PREFIX: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    PREFIX
        .get_or_init(|| {
            regex_lite::Regex::new(r"(?i)^\s*(?:https?://)?(?:dx\.)?(?:doi\.org/)?(?:doi:\s*)?").ok()
        })
        .as_ref()
}

/// Strip scheme, resolver host and `doi:` prefix from a DOI
pub fn clean_doi(doi: &str) -> String {
    match resolver_prefix() {
        Some(prefix) => prefix.replace(doi, "").trim().to_string(),
        None => doi.trim().to_string(),
    }
}

fn is_missing(value: &str) -> bool {
    value.trim().is_empty() || value == NOT_AVAILABLE
}

/// Resolver link for a DOI
pub async fn pdf_link(Path(doi): Path<String>) -> Result<Json<PdfLinkResponse>> {
    let cleaned = clean_doi(&doi);
    if is_missing(&doi) || cleaned.is_empty() {
        return Err(AppError::not_found("DOI", doi));
    }

    Ok(Json(PdfLinkResponse {
        doi_url: format!("{}/{}", DOI_RESOLVER, cleaned),
        doi: cleaned,
    }))
}

/// Look a paper up by EID and list the ways to get hold of it
pub async fn download_info(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(eid): Path<String>,
) -> Result<Json<DownloadInfoResponse>> {
    if is_missing(&eid) {
        return Err(AppError::not_found("Paper", eid));
    }

    let paper = state
        .search_service_for(user.id)
        .await?
        .get_paper_by_eid(&eid)
        .await?
        .ok_or_else(|| AppError::not_found("Paper", &eid))?;

    let mut download_methods = Vec::new();

    if let Some(pdf_url) = paper.pdf_url() {
        download_methods.push(DownloadMethod {
            method: "Open Access PDF".to_string(),
            url: pdf_url.to_string(),
            kind: "open_access".to_string(),
            note: "Direct link supplied by Scopus".to_string(),
        });
    }

    if let Some(doi) = paper.doi() {
        download_methods.push(DownloadMethod {
            method: "Official Publisher".to_string(),
            url: format!("{}/{}", DOI_RESOLVER, clean_doi(doi)),
            kind: "official".to_string(),
            note: "May require subscription or payment".to_string(),
        });
    }

    if !is_missing(&paper.title) {
        if let Ok(url) = reqwest::Url::parse_with_params(SCHOLAR_SEARCH, &[("q", paper.title.as_str())]) {
            download_methods.push(DownloadMethod {
                method: "Google Scholar".to_string(),
                url: url.to_string(),
                kind: "search".to_string(),
                note: "May find free PDF versions".to_string(),
            });
        }
    }

    let note = paper
        .open_access
        .then(|| "This paper is Open Access - free download should be available".to_string());

    Ok(Json(DownloadInfoResponse {
        scopus_url: format!(
            "https://www.scopus.com/record/display.uri?eid={}&origin=resultslist",
            eid
        ),
        eid,
        title: paper.title,
        doi: paper.doi,
        open_access: paper.open_access,
        download_methods,
        note,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_doi() {
        assert_eq!(clean_doi("10.1038/nature14539"), "10.1038/nature14539");
        assert_eq!(clean_doi("https://doi.org/10.1038/nature14539"), "10.1038/nature14539");
        assert_eq!(clean_doi("http://dx.doi.org/10.1/abc"), "10.1/abc");
        assert_eq!(clean_doi("doi.org/10.1/abc"), "10.1/abc");
        assert_eq!(clean_doi("DOI: 10.1/abc"), "10.1/abc");
    }

    #[tokio::test]
    async fn test_pdf_link() {
        let Json(link) = pdf_link(Path("https://doi.org/10.1/abc".to_string()))
            .await
            .unwrap();
        assert_eq!(link.doi, "10.1/abc");
        assert_eq!(link.doi_url, "https://doi.org/10.1/abc");
    }

    #[tokio::test]
    async fn test_pdf_link_missing_doi() {
        let err = pdf_link(Path("N/A".to_string())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
