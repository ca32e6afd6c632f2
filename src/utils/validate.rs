//! Input validation for identifiers and filenames.
//!
//! Identifiers end up in request paths and query strings, and filenames are
//! built from remote metadata, so both are checked before use.

use std::path::{Component, Path};
use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid DOI format: {0}")]
    InvalidDoi(String),

    #[error("Invalid PMID: {0}")]
    InvalidPmid(String),

    #[error("Invalid filename: contains disallowed characters")]
    InvalidFilename,

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

/// Validate and normalize a DOI
///
/// DOIs have the format "10.xxxx/xxxxxx" where xxxx is a registrant code
/// and xxxxxx is an item ID. `doi:` and `doi.org` URL prefixes are stripped;
/// case is preserved since it is what ends up stored on the item.
pub fn validate_doi(doi: &str) -> Result<String, ValidationError> {
    let doi = doi.trim();

    if doi.is_empty() {
        return Err(ValidationError::InvalidDoi("empty DOI".to_string()));
    }

    let mut doi = doi;
    for prefix in [
        "doi:",
        "DOI:",
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
    ] {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim_start();
            break;
        }
    }

    // DOI must start with "10."
    if !doi.starts_with("10.") {
        return Err(ValidationError::InvalidDoi(
            "DOI must start with '10.'".to_string(),
        ));
    }

    // DOI must contain a slash after the prefix
    if !doi.contains('/') {
        return Err(ValidationError::InvalidDoi(
            "DOI must contain a slash".to_string(),
        ));
    }

    if doi.contains("..") {
        return Err(ValidationError::InvalidDoi(
            "path traversal detected".to_string(),
        ));
    }

    if doi.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidDoi(
            "DOI must not contain whitespace".to_string(),
        ));
    }

    Ok(doi.to_string())
}

/// Validate a PubMed identifier (ASCII digits only)
pub fn validate_pmid(pmid: &str) -> Result<String, ValidationError> {
    let pmid = pmid.trim();
    let pmid = pmid.strip_prefix("PMID:").map(str::trim).unwrap_or(pmid);

    if pmid.is_empty() {
        return Err(ValidationError::InvalidPmid("empty PMID".to_string()));
    }

    if !pmid.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPmid(format!(
            "'{}' is not numeric",
            pmid
        )));
    }

    Ok(pmid.to_string())
}

/// Strip characters that cannot appear in a filename on common filesystems.
///
/// Used for building `Author et al. - YYYY - Title.txt` names from metadata.
/// Runs of whitespace are collapsed so removed characters leave no gaps.
pub fn sanitize_filename_component(text: &str) -> String {
    const ILLEGAL: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    text.chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject names that would escape the target directory.
///
/// A name passes only when it is a single normal path component, so dots
/// inside a title (`methods..txt`, `Wait... what.txt`) are fine while `..`,
/// separators and absolute paths are not.
pub fn ensure_plain_filename(filename: &str) -> Result<&str, ValidationError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() || trimmed.contains('\0') {
        return Err(ValidationError::InvalidFilename);
    }

    // Path drops a trailing '/' and only splits on backslashes on Windows
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(ValidationError::PathTraversal(trimmed.to_string()));
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(trimmed),
        _ => Err(ValidationError::PathTraversal(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_doi_valid() {
        assert!(validate_doi("10.1234/abc123").is_ok());
        assert!(validate_doi("10.1038/nature12345").is_ok());
        // Without prefix
        assert_eq!(
            validate_doi("doi:10.1234/abc123").unwrap(),
            "10.1234/abc123"
        );
        assert_eq!(
            validate_doi("https://doi.org/10.1093/Biostatistics/kxj037").unwrap(),
            "10.1093/Biostatistics/kxj037"
        );
    }

    #[test]
    fn test_validate_doi_invalid() {
        assert!(validate_doi("").is_err());
        assert!(validate_doi("10.1234").is_err()); // No slash
        assert!(validate_doi("9.1234/abc").is_err()); // Doesn't start with 10
        assert!(validate_doi("10.1234/../abc").is_err());
        assert!(validate_doi("10.1234/a b").is_err());
    }

    #[test]
    fn test_validate_pmid() {
        assert_eq!(validate_pmid(" 17398783 ").unwrap(), "17398783");
        assert_eq!(validate_pmid("PMID: 17398783").unwrap(), "17398783");
        assert!(validate_pmid("").is_err());
        assert!(validate_pmid("PMC123").is_err());
        assert!(validate_pmid("123&db=pmc").is_err());
    }

    #[test]
    fn test_sanitize_filename_component() {
        assert_eq!(
            sanitize_filename_component("ComBat-seq: batch effect / RNA-seq?"),
            "ComBat-seq batch effect RNA-seq"
        );
        assert_eq!(sanitize_filename_component("  plain  "), "plain");
    }

    #[test]
    fn test_ensure_plain_filename() {
        assert!(ensure_plain_filename("Zhang et al. - 2020 - ComBat-seq.txt").is_ok());
        assert!(ensure_plain_filename("../etc/passwd").is_err());
        assert!(ensure_plain_filename("sub/file.txt").is_err());
        assert!(ensure_plain_filename("   ").is_err());
        assert!(ensure_plain_filename("..").is_err());
        assert!(ensure_plain_filename("/tmp/file.txt").is_err());
        assert!(ensure_plain_filename("sub\\file.txt").is_err());
    }

    #[test]
    fn test_ensure_plain_filename_allows_dots_in_titles() {
        assert!(ensure_plain_filename("Johnson et al. - 2007 - Adjusting batch effects..txt").is_ok());
        assert!(ensure_plain_filename("Smith - 2020 - Wait... what.txt").is_ok());
        assert!(ensure_plain_filename(".hidden.txt").is_ok());
    }
}
