//! Zotero Web API client.
//!
//! A thin authenticated wrapper over the v3 REST API of a user library:
//! list collections, resolve a collection by name, list a collection's items,
//! and create journal-article items.
//!
//! Item creation is a single `POST` with no retries and no write token, so
//! calling it twice creates two items.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ZoteroCredentials;
use crate::models::{BibRecord, Collection, Item, WriteFailure, WriteResponse};
use crate::utils::HttpClient;

/// Zotero API version sent with every request
pub const API_VERSION: &str = "3";

/// Largest page the API serves for multi-object requests
pub const PAGE_LIMIT: usize = 100;

/// Client for one Zotero user library
#[derive(Debug, Clone)]
pub struct ZoteroClient {
    client: Arc<HttpClient>,
    credentials: ZoteroCredentials,
    api_base: String,
}

impl ZoteroClient {
    pub fn new(
        credentials: ZoteroCredentials,
        api_base: impl Into<String>,
        client: Arc<HttpClient>,
    ) -> Self {
        Self {
            client,
            credentials,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn credentials(&self) -> &ZoteroCredentials {
        &self.credentials
    }

    fn library_url(&self, path: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.api_base,
            urlencoding::encode(&self.credentials.user_id),
            path
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Zotero-API-Key", &self.credentials.api_key)
            .header("Zotero-API-Version", API_VERSION)
    }

    async fn check(response: Response) -> Result<Response, ZoteroError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ZoteroError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }

    /// Fetch every page of a multi-object listing.
    ///
    /// Pages are requested with `limit`/`start` until the `Total-Results`
    /// count is reached or the server returns an empty page.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ZoteroError> {
        let url = self.library_url(path);
        let mut objects: Vec<T> = Vec::new();

        loop {
            let request = self.client.get(&url).query(&[
                ("limit", PAGE_LIMIT.to_string()),
                ("start", objects.len().to_string()),
            ]);
            let response = Self::check(self.authorize(request).send().await?).await?;
            let total = total_results(&response);
            let text = response.text().await?;
            let page: Vec<T> =
                serde_json::from_str(&text).map_err(|e| ZoteroError::Parse(e.to_string()))?;

            let received = page.len();
            objects.extend(page);

            match total {
                Some(total) if received > 0 && objects.len() < total => {
                    tracing::debug!("Fetched {}/{} objects from {}", objects.len(), total, path);
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    /// All collections in the library
    pub async fn list_collections(&self) -> Result<Vec<Collection>, ZoteroError> {
        let collections: Vec<Collection> = self.get_all("collections").await?;
        tracing::debug!("Zotero returned {} collections", collections.len());
        Ok(collections)
    }

    /// Find a collection by exact name.
    ///
    /// A name that matches nothing is `Ok(None)`, not an error.
    pub async fn find_collection(&self, name: &str) -> Result<Option<Collection>, ZoteroError> {
        let collections = self.list_collections().await?;
        Ok(collections.into_iter().find(|c| c.name() == name))
    }

    /// Items in the collection with the given key
    pub async fn list_collection_items(&self, collection_key: &str) -> Result<Vec<Item>, ZoteroError> {
        let path = format!("collections/{}/items", urlencoding::encode(collection_key));
        self.get_all(&path).await
    }

    /// Create one item from raw Zotero JSON.
    ///
    /// Any rejected object in an otherwise successful response is reported as
    /// [`ZoteroError::Rejected`].
    pub async fn create_item(&self, item: Value) -> Result<WriteResponse, ZoteroError> {
        let url = self.library_url("items");
        let response = self
            .authorize(self.client.post(&url))
            .json(&[item])
            .send()
            .await?;
        let response = Self::check(response).await?;
        let text = response.text().await?;
        let write: WriteResponse =
            serde_json::from_str(&text).map_err(|e| ZoteroError::Parse(e.to_string()))?;

        if write.created_key().is_none() {
            return Err(ZoteroError::Rejected(write.failed.into_values().collect()));
        }

        Ok(write)
    }

    /// Create a journal article, placing it in every named collection that exists.
    ///
    /// Names that do not resolve are skipped with a warning; if none resolve
    /// the item is created outside any collection.
    pub async fn create_journal_article(
        &self,
        record: &BibRecord,
        collection_names: &[&str],
    ) -> Result<WriteResponse, ZoteroError> {
        let mut keys = Vec::new();
        if !collection_names.is_empty() {
            let collections = self.list_collections().await?;
            for name in collection_names {
                match collections.iter().find(|c| c.name() == *name) {
                    Some(coll) => keys.push(coll.key.clone()),
                    None => tracing::warn!(
                        "Collection '{}' not found; creating item without it",
                        name
                    ),
                }
            }
        }

        self.create_item(record.to_item_payload(&keys)).await
    }

    /// Add a record to its own target collection
    pub async fn add_paper(&self, record: &BibRecord) -> Result<WriteResponse, ZoteroError> {
        tracing::info!(
            "Adding '{}' to collection '{}'",
            record.title,
            record.collection
        );
        self.create_journal_article(record, &[record.collection.as_str()])
            .await
    }
}

/// The `Total-Results` header of a multi-object response
fn total_results(response: &Response) -> Option<usize> {
    response
        .headers()
        .get("Total-Results")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Errors from the Zotero API
#[derive(Debug, thiserror::Error)]
pub enum ZoteroError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Zotero API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Failed to parse Zotero response: {0}")]
    Parse(String),

    /// The write request was accepted but the object was not created
    #[error("Zotero rejected the item: {}", describe_failures(.0))]
    Rejected(Vec<WriteFailure>),
}

fn describe_failures(failures: &[WriteFailure]) -> String {
    if failures.is_empty() {
        return "no item created".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{} ({})", f.message, f.code))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ZoteroClient {
        ZoteroClient::new(
            ZoteroCredentials::new("key", "123456"),
            "https://api.zotero.org/",
            Arc::new(HttpClient::new().unwrap()),
        )
    }

    #[test]
    fn test_library_url() {
        assert_eq!(
            client().library_url("collections"),
            "https://api.zotero.org/users/123456/collections"
        );
    }

    #[test]
    fn test_describe_failures() {
        assert_eq!(describe_failures(&[]), "no item created");
        let failures = vec![WriteFailure {
            code: 400,
            message: "Invalid property".to_string(),
        }];
        assert_eq!(describe_failures(&failures), "Invalid property (400)");
    }
}
