//! # Lit Review
//!
//! Tooling for maintaining a literature-review workspace backed by a Zotero
//! library.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Bibliographic records, creators and Zotero wire types
//! - [`sources`]: DOI and PMID metadata lookups behind the [`MetadataSource`] trait
//! - [`intake`]: Merging fetched metadata with manual input and validating it
//! - [`zotero`]: Authenticated Zotero Web API client
//! - [`claims`]: Splitting the claims-and-evidence document by category
//! - [`fulltext`]: Extracted-text coverage reports, filename standardization and PDF lookup
//! - [`config`]: Configuration and credentials
//! - [`utils`]: HTTP client, identifier validation and terminal helpers

pub mod claims;
pub mod config;
pub mod fulltext;
pub mod intake;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;
pub mod zotero;

// Re-export commonly used types
pub use models::{BibRecord, Creator, RecordId};
pub use sources::{FetchedMetadata, MetadataSource, SourceError};
pub use zotero::{ZoteroClient, ZoteroError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
