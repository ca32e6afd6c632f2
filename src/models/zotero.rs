//! Zotero Web API (v3) wire types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A collection in a Zotero library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    pub data: CollectionData,
    #[serde(default)]
    pub meta: CollectionMeta,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn num_items(&self) -> u64 {
        self.meta.num_items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData {
    pub name: String,
    /// `false` for top-level collections, a key otherwise
    #[serde(default)]
    pub parent_collection: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMeta {
    #[serde(default)]
    pub num_items: u64,
}

/// An item in a Zotero library.
///
/// Only the fields the tooling reads are typed; everything else is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub data: ItemData,
}

impl Item {
    pub fn title(&self) -> &str {
        self.data.title.as_deref().unwrap_or("No Title")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A per-object failure in a write response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteFailure {
    pub code: u16,
    pub message: String,
}

/// Response body of `POST /users/{id}/items`.
///
/// Maps are keyed by the index of the object in the request array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub successful: BTreeMap<String, Item>,
    #[serde(default)]
    pub success: BTreeMap<String, String>,
    #[serde(default)]
    pub unchanged: BTreeMap<String, String>,
    #[serde(default)]
    pub failed: BTreeMap<String, WriteFailure>,
}

impl WriteResponse {
    /// Key of the first created item
    pub fn created_key(&self) -> Option<&str> {
        self.successful
            .get("0")
            .map(|item| item.key.as_str())
            .or_else(|| self.success.get("0").map(String::as_str))
    }
}
