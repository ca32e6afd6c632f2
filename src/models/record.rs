//! Bibliographic record model and author-string handling.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Role of a creator on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreatorType {
    #[default]
    Author,
    Editor,
}

/// A structured author/editor entry as Zotero expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub creator_type: CreatorType,
    pub last_name: String,
    pub first_name: String,
}

impl Creator {
    /// Create an author entry
    pub fn author(last_name: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            creator_type: CreatorType::Author,
            last_name: last_name.into(),
            first_name: first_name.into(),
        }
    }

    /// Render as "Last, First" (or just "Last" when the first name is empty)
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{}, {}", self.last_name, self.first_name)
        }
    }
}

/// Parse an author string into creators.
///
/// Accepts `"Last, First; Last, First"` and `"First Last; First Last"`, mixed
/// freely per segment. A segment with a single bare token becomes a last name
/// with an empty first name.
pub fn parse_authors(authors: &str) -> Vec<Creator> {
    authors
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if let Some((last, first)) = segment.split_once(',') {
                return Creator::author(last.trim(), first.trim());
            }

            let parts: Vec<&str> = segment.split_whitespace().collect();
            match parts.split_last() {
                Some((last, rest)) if !rest.is_empty() => Creator::author(*last, rest.join(" ")),
                _ => Creator::author(segment, ""),
            }
        })
        .collect()
}

/// Render creators back into the `"Last, First; Last, First"` convention
pub fn format_authors(creators: &[Creator]) -> String {
    creators
        .iter()
        .map(Creator::display_name)
        .collect::<Vec<_>>()
        .join("; ")
}

/// External identifier of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RecordId {
    Doi(String),
    Pmid(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Doi(doi) => write!(f, "DOI {}", doi),
            RecordId::Pmid(pmid) => write!(f, "PMID {}", pmid),
        }
    }
}

/// A bibliographic record ready to be sent to Zotero.
///
/// Built transiently from a metadata lookup and/or command-line flags, sent
/// once, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibRecord {
    pub title: String,
    pub creators: Vec<Creator>,
    /// Publication date; usually just the year
    pub date: Option<String>,
    /// Journal or venue name
    pub publication_title: Option<String>,
    pub identifier: Option<RecordId>,
    pub abstract_note: Option<String>,
    pub url: Option<String>,
    /// Name of the target collection
    pub collection: String,
}

impl BibRecord {
    /// Author string in `"Last, First; …"` form
    pub fn authors(&self) -> String {
        format_authors(&self.creators)
    }

    /// Year portion of the date, if the date starts with four digits
    pub fn year(&self) -> Option<&str> {
        let date = self.date.as_deref()?;
        let year = date.get(..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }

    /// Build the Zotero item JSON for a journal article.
    ///
    /// Optional fields that are absent or blank are omitted entirely.
    pub fn to_item_payload(&self, collection_keys: &[String]) -> Value {
        let mut item = Map::new();
        item.insert("itemType".into(), json!("journalArticle"));
        item.insert("title".into(), json!(self.title));
        item.insert("creators".into(), json!(self.creators));

        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                item.insert(key.to_string(), json!(v));
            }
        };
        put("date", &self.date);
        put("publicationTitle", &self.publication_title);
        put("abstractNote", &self.abstract_note);
        put("url", &self.url);

        match &self.identifier {
            Some(RecordId::Doi(doi)) => {
                item.insert("DOI".into(), json!(doi));
            }
            Some(RecordId::Pmid(pmid)) => {
                item.insert("extra".into(), json!(format!("PMID: {}", pmid)));
            }
            None => {}
        }

        if !collection_keys.is_empty() {
            item.insert("collections".into(), json!(collection_keys));
        }

        Value::Object(item)
    }
}
