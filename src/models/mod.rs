//! Core data models for bibliographic records and Zotero objects.

mod record;
mod zotero;

pub use record::{format_authors, parse_authors, BibRecord, Creator, CreatorType, RecordId};
pub use zotero::{
    Collection, CollectionData, CollectionMeta, Item, ItemData, WriteFailure, WriteResponse,
};
