//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::RecordId;
use crate::sources::{FetchedMetadata, MetadataSource, SourceError};

/// A mock source for testing that returns a predefined response.
#[derive(Debug, Default)]
pub struct MockSource {
    response: Mutex<Option<FetchedMetadata>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata to return.
    pub fn set_response(&self, metadata: FetchedMetadata) {
        let mut guard = self.response.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(metadata);
    }

    /// Identifiers requested so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MetadataSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn fetch(&self, identifier: &str) -> Result<FetchedMetadata, SourceError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(identifier.to_string());

        let guard = self.response.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .clone()
            .ok_or_else(|| SourceError::NotFound(identifier.to_string()))
    }
}

/// Helper function to create mock metadata for testing.
pub fn make_metadata(title: &str, authors: &str, doi: &str) -> FetchedMetadata {
    FetchedMetadata {
        title: title.to_string(),
        authors: authors.to_string(),
        date: Some("2020".to_string()),
        publication_title: Some("Test Journal".to_string()),
        abstract_note: None,
        identifier: RecordId::Doi(doi.to_string()),
    }
}
