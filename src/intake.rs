//! Turning command-line input and fetched metadata into a [`BibRecord`].
//!
//! Manual title and authors override fetched ones before the required-field
//! check; the remaining manual fields override afterwards. Nothing here talks
//! to Zotero, so a record that fails validation never produces a request.

use crate::models::{parse_authors, BibRecord};
use crate::sources::{FetchedMetadata, MetadataSource, SourceError};

/// Fields supplied directly on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualFields {
    pub title: Option<String>,
    /// `"Last, First; …"` or `"First Last; …"`
    pub authors: Option<String>,
    pub date: Option<String>,
    pub journal: Option<String>,
    pub abstract_note: Option<String>,
    pub url: Option<String>,
    pub collection: Option<String>,
}

/// Which identifier, if any, to look up first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Doi(String),
    Pmid(String),
}

impl Lookup {
    /// A DOI wins over a PMID when both are given
    pub fn choose(doi: Option<String>, pmid: Option<String>) -> Option<Self> {
        doi.map(Lookup::Doi).or_else(|| pmid.map(Lookup::Pmid))
    }

    pub fn identifier(&self) -> &str {
        match self {
            Lookup::Doi(id) | Lookup::Pmid(id) => id,
        }
    }
}

/// Run a lookup against the matching source
pub async fn fetch_metadata(
    lookup: &Lookup,
    crossref: &dyn MetadataSource,
    pubmed: &dyn MetadataSource,
) -> Result<FetchedMetadata, SourceError> {
    let source = match lookup {
        Lookup::Doi(_) => crossref,
        Lookup::Pmid(_) => pubmed,
    };
    tracing::info!(
        source = source.id(),
        "Fetching metadata for {} from {}",
        lookup.identifier(),
        source.name()
    );
    source.fetch(lookup.identifier()).await
}

/// Fetch (when an identifier is given) and merge into a validated record.
///
/// A failed lookup or a record missing title or authors stops here, so the
/// caller never gets as far as building a Zotero request.
pub async fn prepare_record(
    lookup: Option<&Lookup>,
    manual: ManualFields,
    default_collection: &str,
    crossref: &dyn MetadataSource,
    pubmed: &dyn MetadataSource,
) -> Result<BibRecord, IntakeError> {
    let fetched = match lookup {
        Some(lookup) => Some(
            fetch_metadata(lookup, crossref, pubmed)
                .await
                .map_err(IntakeError::Lookup)?,
        ),
        None => None,
    };
    build_record(fetched, manual, default_collection)
}

/// Errors raised while assembling a record
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Title and authors are required. Provide them manually or via --doi/--pmid. (missing: {})", .0.join(", "))]
    MissingRequired(Vec<&'static str>),

    #[error("Error fetching metadata: {0}")]
    Lookup(#[source] SourceError),
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Merge fetched metadata with manual fields into a submittable record
pub fn build_record(
    fetched: Option<FetchedMetadata>,
    manual: ManualFields,
    default_collection: &str,
) -> Result<BibRecord, IntakeError> {
    let (mut title, mut authors, mut date, mut venue, mut abstract_note, identifier) =
        match fetched {
            Some(meta) => (
                non_blank(Some(meta.title)),
                non_blank(Some(meta.authors)),
                non_blank(meta.date),
                non_blank(meta.publication_title),
                non_blank(meta.abstract_note),
                Some(meta.identifier),
            ),
            None => (None, None, None, None, None, None),
        };

    if let Some(t) = non_blank(manual.title) {
        title = Some(t);
    }
    if let Some(a) = non_blank(manual.authors) {
        authors = Some(a);
    }

    let creators = authors.as_deref().map(parse_authors).unwrap_or_default();

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if creators.is_empty() {
        missing.push("authors");
    }
    let title = match title {
        Some(t) if missing.is_empty() => t,
        _ => return Err(IntakeError::MissingRequired(missing)),
    };

    if let Some(d) = non_blank(manual.date) {
        date = Some(d);
    }
    if let Some(j) = non_blank(manual.journal) {
        venue = Some(j);
    }
    if let Some(a) = non_blank(manual.abstract_note) {
        abstract_note = Some(a);
    }

    Ok(BibRecord {
        title,
        creators,
        date,
        publication_title: venue,
        identifier,
        abstract_note,
        url: non_blank(manual.url),
        collection: non_blank(manual.collection)
            .unwrap_or_else(|| default_collection.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Creator, RecordId};
    use crate::sources::mock::{make_metadata, MockSource};

    fn manual() -> ManualFields {
        ManualFields::default()
    }

    #[test]
    fn test_fetched_only() {
        let meta = make_metadata("ComBat-seq", "Zhang, Yuqing; Parmigiani, Giovanni", "10.1/x");
        let record = build_record(Some(meta), manual(), "BookChapter").unwrap();
        assert_eq!(record.title, "ComBat-seq");
        assert_eq!(
            record.creators,
            vec![
                Creator::author("Zhang", "Yuqing"),
                Creator::author("Parmigiani", "Giovanni")
            ]
        );
        assert_eq!(record.collection, "BookChapter");
        assert_eq!(record.identifier, Some(RecordId::Doi("10.1/x".to_string())));
    }

    #[test]
    fn test_manual_overrides_fetched() {
        let meta = make_metadata("Fetched", "Doe, Jane", "10.1/x");
        let fields = ManualFields {
            title: Some("Manual Title".to_string()),
            authors: Some("John Smith".to_string()),
            date: Some("2021".to_string()),
            journal: Some("Nature".to_string()),
            collection: Some("Review".to_string()),
            ..manual()
        };
        let record = build_record(Some(meta), fields, "BookChapter").unwrap();
        assert_eq!(record.title, "Manual Title");
        assert_eq!(record.creators, vec![Creator::author("Smith", "John")]);
        assert_eq!(record.date.as_deref(), Some("2021"));
        assert_eq!(record.publication_title.as_deref(), Some("Nature"));
        assert_eq!(record.collection, "Review");
    }

    #[test]
    fn test_missing_title_and_authors() {
        let err = build_record(None, manual(), "BookChapter").unwrap_err();
        assert!(matches!(err, IntakeError::MissingRequired(ref m) if m == &["title", "authors"]));
    }

    #[test]
    fn test_blank_fetched_fields_count_as_missing() {
        let meta = make_metadata("  ", "", "10.1/x");
        let err = build_record(Some(meta), manual(), "BookChapter").unwrap_err();
        assert!(matches!(err, IntakeError::MissingRequired(ref m) if m == &["title", "authors"]));
    }

    #[test]
    fn test_manual_fills_missing_authors() {
        let meta = make_metadata("Has Title", "", "10.1/x");
        let fields = ManualFields {
            authors: Some("Smith, John; Doe, Jane".to_string()),
            ..manual()
        };
        let record = build_record(Some(meta), fields, "BookChapter").unwrap();
        assert_eq!(record.creators.len(), 2);
    }

    #[test]
    fn test_lookup_prefers_doi() {
        assert_eq!(
            Lookup::choose(Some("10.1/x".into()), Some("123".into())),
            Some(Lookup::Doi("10.1/x".into()))
        );
        assert_eq!(
            Lookup::choose(None, Some("123".into())),
            Some(Lookup::Pmid("123".into()))
        );
        assert_eq!(Lookup::choose(None, None), None);
    }

    #[tokio::test]
    async fn test_fetch_metadata_routes_by_identifier() {
        let crossref = MockSource::new();
        let pubmed = MockSource::new();
        crossref.set_response(make_metadata("From CrossRef", "Doe, Jane", "10.1/x"));

        let meta = fetch_metadata(&Lookup::Doi("10.1/x".into()), &crossref, &pubmed)
            .await
            .unwrap();
        assert_eq!(meta.title, "From CrossRef");
        assert_eq!(crossref.calls(), vec!["10.1/x".to_string()]);
        assert!(pubmed.calls().is_empty());

        let err = fetch_metadata(&Lookup::Pmid("42".into()), &crossref, &pubmed).await;
        assert!(matches!(err, Err(SourceError::NotFound(_))));
        assert_eq!(pubmed.calls(), vec!["42".to_string()]);
    }

    #[tokio::test]
    async fn test_prepare_record_stops_on_missing_authors() {
        let crossref = MockSource::new();
        let pubmed = MockSource::new();
        crossref.set_response(make_metadata("Has Title", "", "10.1/x"));

        let lookup = Lookup::Doi("10.1/x".into());
        let err = prepare_record(Some(&lookup), manual(), "BookChapter", &crossref, &pubmed)
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::MissingRequired(ref m) if m == &["authors"]));
        assert_eq!(crossref.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_prepare_record_without_lookup_uses_manual_fields() {
        let crossref = MockSource::new();
        let pubmed = MockSource::new();
        let fields = ManualFields {
            title: Some("Manual".to_string()),
            authors: Some("Doe, Jane".to_string()),
            ..manual()
        };

        let record = prepare_record(None, fields, "BookChapter", &crossref, &pubmed)
            .await
            .unwrap();

        assert_eq!(record.title, "Manual");
        assert!(crossref.calls().is_empty());
        assert!(pubmed.calls().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_record_lookup_failure() {
        let crossref = MockSource::new();
        let pubmed = MockSource::new();

        let lookup = Lookup::Pmid("42".into());
        let err = prepare_record(Some(&lookup), manual(), "BookChapter", &crossref, &pubmed)
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Lookup(SourceError::NotFound(_))));
    }
}
