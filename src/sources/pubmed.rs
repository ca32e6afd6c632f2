//! PubMed PMID lookup using the E-utilities esummary API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::models::RecordId;
use crate::sources::{status_error, FetchedMetadata, MetadataSource, SourceError};
use crate::utils::{validate_pmid, HttpClient};

/// PubMed E-utilities API base URL
pub const PUBMED_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// PubMed metadata source
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl PubMedSource {
    /// Create a new PubMed source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::new()?),
            PUBMED_EUTILS_BASE,
        ))
    }

    /// Create with a custom HTTP client and API base (for testing)
    pub fn with_client(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_summary_url(&self, pmid: &str) -> String {
        format!(
            "{}/esummary.fcgi?db=pubmed&id={}&retmode=json",
            self.base_url, pmid
        )
    }

    /// Pull the document summary for `pmid` out of an esummary response
    fn parse_summary(body: &Value, pmid: &str) -> Result<FetchedMetadata, SourceError> {
        let result: &Map<String, Value> = body
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| SourceError::Parse("esummary response has no result".to_string()))?;

        let entry = result
            .get(pmid)
            .ok_or_else(|| SourceError::NotFound(format!("PubMed has no record for {}", pmid)))?;

        if let Some(err) = entry.get("error").and_then(Value::as_str) {
            return Err(SourceError::NotFound(format!("PMID {}: {}", pmid, err)));
        }

        let summary: DocSummary = serde_json::from_value(entry.clone())?;

        let authors = summary
            .authors
            .iter()
            .map(|a| medline_to_last_first(&a.name))
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join("; ");

        // pubdate looks like "2007 Jan" or "2014 Mar 12"
        let date = summary
            .pubdate
            .split_whitespace()
            .next()
            .map(str::to_string);

        Ok(FetchedMetadata {
            title: summary.title,
            authors,
            date,
            publication_title: Some(summary.source).filter(|s| !s.is_empty()),
            abstract_note: None,
            identifier: RecordId::Pmid(pmid.to_string()),
        })
    }
}

/// Convert a MEDLINE display name ("Johnson WE") into "Johnson, WE".
///
/// Names without a trailing initials token (collective authors, unusual
/// formats) are returned unchanged.
fn medline_to_last_first(name: &str) -> String {
    let name = name.trim();
    match name.rsplit_once(' ') {
        Some((last, initials))
            if !initials.is_empty()
                && initials.len() <= 4
                && initials.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            format!("{}, {}", last.trim(), initials)
        }
        _ => name.to_string(),
    }
}

#[async_trait]
impl MetadataSource for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn fetch(&self, identifier: &str) -> Result<FetchedMetadata, SourceError> {
        let pmid = validate_pmid(identifier)?;
        let url = self.build_summary_url(&pmid);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch PMID: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(self.name(), &pmid, response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Self::parse_summary(&body, &pmid)
    }
}

#[derive(Debug, Deserialize)]
struct DocSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<SummaryAuthor>,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct SummaryAuthor {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "header": {"type": "esummary", "version": "0.3"},
            "result": {
                "uids": ["17398783"],
                "17398783": {
                    "uid": "17398783",
                    "pubdate": "2007 Jan",
                    "source": "Biostatistics",
                    "authors": [
                        {"name": "Johnson WE", "authtype": "Author"},
                        {"name": "Li C", "authtype": "Author"},
                        {"name": "Rabinovic A", "authtype": "Author"}
                    ],
                    "title": "Adjusting batch effects in microarray expression data using empirical Bayes methods."
                }
            }
        })
    }

    #[test]
    fn test_parse_summary() {
        let meta = PubMedSource::parse_summary(&sample(), "17398783").unwrap();
        assert!(meta.title.starts_with("Adjusting batch effects"));
        assert_eq!(meta.authors, "Johnson, WE; Li, C; Rabinovic, A");
        assert_eq!(meta.date.as_deref(), Some("2007"));
        assert_eq!(meta.publication_title.as_deref(), Some("Biostatistics"));
        assert_eq!(meta.identifier, RecordId::Pmid("17398783".to_string()));
    }

    #[test]
    fn test_parse_summary_missing_pmid() {
        let err = PubMedSource::parse_summary(&sample(), "1").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_parse_summary_error_entry() {
        let body = json!({"result": {"uids": [], "99999999": {"uid": "99999999", "error": "cannot get document summary"}}});
        let err = PubMedSource::parse_summary(&body, "99999999").unwrap_err();
        assert!(err.to_string().contains("cannot get document summary"));
    }

    #[test]
    fn test_medline_to_last_first() {
        assert_eq!(medline_to_last_first("Johnson WE"), "Johnson, WE");
        assert_eq!(medline_to_last_first("van der Laan MJ"), "van der Laan, MJ");
        assert_eq!(
            medline_to_last_first("GTEx Consortium"),
            "GTEx Consortium"
        );
        assert_eq!(medline_to_last_first("Smith"), "Smith");
    }

    #[test]
    fn test_build_summary_url() {
        let source = PubMedSource::with_client(
            Arc::new(HttpClient::new().unwrap()),
            PUBMED_EUTILS_BASE,
        );
        assert_eq!(
            source.build_summary_url("17398783"),
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi?db=pubmed&id=17398783&retmode=json"
        );
    }
}
