//! CrossRef DOI lookup.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::models::RecordId;
use crate::sources::{status_error, FetchedMetadata, MetadataSource, SourceError};
use crate::utils::{polite_user_agent, validate_doi, HttpClient, DEFAULT_TIMEOUT};

pub const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// CrossRef metadata source
///
/// Uses the CrossRef REST API `works/{doi}` endpoint.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl CrossRefSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::with_user_agent(
                &polite_user_agent(None),
                DEFAULT_TIMEOUT,
            )?),
            CROSSREF_API_BASE,
        ))
    }

    /// Create with a custom HTTP client and API base (for testing or mirrors)
    pub fn with_client(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn work_url(&self, doi: &str) -> String {
        // DOI suffixes keep their '/' so CrossRef sees the usual path form
        format!("{}/works/{}", self.base_url, urlencoding::encode(doi).replace("%2F", "/"))
    }

    /// Project a CrossRef work onto the fields Zotero needs
    fn parse_work(work: CRWork, doi: &str) -> FetchedMetadata {
        let title = work.title.into_iter().next().unwrap_or_default();

        let authors = work
            .author
            .iter()
            .filter_map(|a| match (&a.family, &a.given) {
                (Some(family), Some(given)) => Some(format!("{}, {}", family, given)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ");

        let date = [
            &work.published,
            &work.published_print,
            &work.published_online,
            &work.issued,
        ]
        .into_iter()
        .flatten()
        .find_map(CRDate::year);

        let publication_title = work
            .container_title
            .into_iter()
            .next()
            .filter(|t| !t.is_empty());

        // JATS-tagged abstracts are dropped rather than stored with markup
        let abstract_note = work
            .r#abstract
            .filter(|a| !a.trim().is_empty() && !(a.contains('<') && a.contains('>')));

        FetchedMetadata {
            title,
            authors,
            date,
            publication_title,
            abstract_note,
            identifier: RecordId::Doi(doi.to_string()),
        }
    }
}

#[async_trait]
impl MetadataSource for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    async fn fetch(&self, identifier: &str) -> Result<FetchedMetadata, SourceError> {
        let doi = validate_doi(identifier)?;
        let url = self.work_url(&doi);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch DOI: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(self.name(), &doi, response.status()));
        }

        let data: CRResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        tracing::debug!("CrossRef returned work for {}", doi);
        Ok(Self::parse_work(data.message, &doi))
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRWork,
}

#[derive(Debug, Default, Deserialize)]
struct CRWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CRAuthor>,
    published: Option<CRDate>,
    #[serde(rename = "published-print")]
    published_print: Option<CRDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CRDate>,
    issued: Option<CRDate>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    r#abstract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Value>>,
}

impl CRDate {
    /// First component of the first date-part, which CrossRef always makes the year
    fn year(&self) -> Option<String> {
        match self.date_parts.first()?.first()? {
            Value::Number(n) => n.as_i64().map(|y| y.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FetchedMetadata {
        let resp: CRResponse = serde_json::from_str(json).unwrap();
        CrossRefSource::parse_work(resp.message, "10.1093/biostatistics/kxj037")
    }

    #[test]
    fn test_parse_work_fields() {
        let meta = parse(
            r#"{"status": "ok", "message": {
                "title": ["Adjusting batch effects in microarray expression data using empirical Bayes methods"],
                "author": [
                    {"given": "W. Evan", "family": "Johnson", "sequence": "first"},
                    {"given": "Cheng", "family": "Li", "sequence": "additional"},
                    {"name": "Some Consortium", "sequence": "additional"},
                    {"given": "Ariel", "family": "Rabinovic", "sequence": "additional"}
                ],
                "published": {"date-parts": [[2006, 4, 21]]},
                "container-title": ["Biostatistics"],
                "abstract": "Non-biological experimental variation..."
            }}"#,
        );

        assert_eq!(
            meta.title,
            "Adjusting batch effects in microarray expression data using empirical Bayes methods"
        );
        assert_eq!(meta.authors, "Johnson, W. Evan; Li, Cheng; Rabinovic, Ariel");
        assert_eq!(meta.date.as_deref(), Some("2006"));
        assert_eq!(meta.publication_title.as_deref(), Some("Biostatistics"));
        assert_eq!(
            meta.abstract_note.as_deref(),
            Some("Non-biological experimental variation...")
        );
        assert_eq!(
            meta.identifier,
            RecordId::Doi("10.1093/biostatistics/kxj037".to_string())
        );
    }

    #[test]
    fn test_parse_work_drops_markup_abstract() {
        let meta = parse(
            r#"{"message": {"title": ["T"], "abstract": "<jats:p>Tagged</jats:p>"}}"#,
        );
        assert!(meta.abstract_note.is_none());
    }

    #[test]
    fn test_parse_work_date_fallbacks() {
        let meta = parse(
            r#"{"message": {"title": ["T"], "published": {"date-parts": [[null]]}, "issued": {"date-parts": [[2019]]}}}"#,
        );
        assert_eq!(meta.date.as_deref(), Some("2019"));

        let meta = parse(r#"{"message": {"title": ["T"]}}"#);
        assert!(meta.date.is_none());
        assert!(meta.publication_title.is_none());
        assert_eq!(meta.authors, "");
    }

    #[test]
    fn test_work_url_keeps_slash() {
        let source = CrossRefSource::with_client(
            Arc::new(HttpClient::new().unwrap()),
            "https://api.crossref.org/",
        );
        assert_eq!(
            source.work_url("10.1038/s41587-019-0113-3"),
            "https://api.crossref.org/works/10.1038/s41587-019-0113-3"
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_doi() {
        let source = CrossRefSource::with_client(
            Arc::new(HttpClient::new().unwrap()),
            "http://127.0.0.1:9",
        );
        let err = source.fetch("not-a-doi").await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }
}
