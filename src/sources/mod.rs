//! Bibliographic metadata sources.
//!
//! This module defines the [`MetadataSource`] trait implemented by the
//! identifier-lookup services. Each source resolves one identifier into a
//! [`FetchedMetadata`], which [`crate::intake`] merges with manual input.
//!
//! - [`CrossRefSource`]: DOI lookup via the CrossRef works endpoint
//! - [`PubMedSource`]: PMID lookup via the NCBI E-utilities esummary endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! use lit_review::sources::{CrossRefSource, MetadataSource};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let crossref = CrossRefSource::new()?;
//! let meta = crossref.fetch("10.1093/biostatistics/kxj037").await?;
//! println!("{} ({})", meta.title, meta.date.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod crossref;
pub mod mock;
mod pubmed;

pub use crossref::{CrossRefSource, CROSSREF_API_BASE};
pub use mock::MockSource;
pub use pubmed::{PubMedSource, PUBMED_EUTILS_BASE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::RecordId;

/// Metadata returned by a lookup, before it is merged with manual input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedMetadata {
    pub title: String,
    /// Authors in `"Last, First; Last, First"` form
    pub authors: String,
    pub date: Option<String>,
    pub publication_title: Option<String>,
    pub abstract_note: Option<String>,
    pub identifier: RecordId,
}

/// A service that resolves an identifier into bibliographic metadata
#[async_trait]
pub trait MetadataSource: Send + Sync + std::fmt::Debug {
    /// Short identifier for logs ("crossref", "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Look up a single identifier
    async fn fetch(&self, identifier: &str) -> Result<FetchedMetadata, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status from the source
    #[error("API error: {0}")]
    Api(String),

    /// Identifier not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<crate::utils::ValidationError> for SourceError {
    fn from(err: crate::utils::ValidationError) -> Self {
        SourceError::InvalidRequest(err.to_string())
    }
}

/// Map a non-success response to a [`SourceError`]
pub(crate) fn status_error(source: &str, identifier: &str, status: reqwest::StatusCode) -> SourceError {
    if status == reqwest::StatusCode::NOT_FOUND {
        SourceError::NotFound(format!("{} has no record for {}", source, identifier))
    } else {
        SourceError::Api(format!("{} returned status: {}", source, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error("CrossRef", "10.1/x", reqwest::StatusCode::NOT_FOUND),
            SourceError::NotFound(_)
        ));
        let err = status_error("CrossRef", "10.1/x", reqwest::StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("502"));
    }
}
