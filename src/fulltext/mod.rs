//! Bookkeeping for extracted full texts.
//!
//! Cross-references the Source ID Registry in the claims matrix with the
//! `.txt` files in the extracted-text directory, renames files into the
//! standard `Author et al. - YYYY - Title.txt` form, and finds the Zotero
//! PDFs still waiting for extraction.

mod storage;

pub use storage::{
    find_extracted, find_pdf, locate_missing_pdfs, locate_pdfs, PdfLookup, PdfReport, PdfStatus,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::models::BibRecord;
use crate::utils::{ensure_plain_filename, sanitize_filename_component};

const REGISTRY_HEADING: &str = "## Source ID Registry";

/// One row of the Source ID Registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub source_id: String,
    pub item_key: String,
    pub authors: String,
    pub year: String,
    pub title: String,
}

/// `Last, First` or MEDLINE-style `Last Initials`
fn registry_last_name(author: &str) -> &str {
    let author = author.trim();
    match author.split_once(',') {
        Some((last, _)) => last.trim(),
        None => author.split_whitespace().next().unwrap_or_default(),
    }
}

impl RegistryEntry {
    /// Last name of the first author as written in the registry
    pub fn first_author_last_name(&self) -> &str {
        registry_last_name(self.authors.split(';').next().unwrap_or_default())
    }

    /// Standard file name built from the registry row
    pub fn standard_filename(&self) -> String {
        let last_names: Vec<&str> = self.authors.split(';').map(registry_last_name).collect();
        let year = Some(self.year.trim()).filter(|y| is_year(y));
        format_standard_name(&last_names, year, &self.title)
    }
}

/// Parse the Source ID Registry table out of a claims matrix.
///
/// Returns an empty list when the section is absent.
pub fn parse_source_registry(markdown: &str) -> Vec<RegistryEntry> {
    let Some(start) = markdown.find(REGISTRY_HEADING) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut seen_separator = false;

    for line in markdown[start + REGISTRY_HEADING.len()..].lines() {
        let line = line.trim();
        if line.starts_with("##") {
            break;
        }
        if !line.starts_with('|') {
            continue;
        }
        if !seen_separator {
            // header row, then the |---| separator
            if line.starts_with("|-") || line.starts_with("| -") {
                seen_separator = true;
            }
            continue;
        }

        let cells: Vec<&str> = line.split('|').map(str::trim).collect();
        if cells.len() < 7 {
            tracing::debug!("Skipping short registry row: {}", line);
            continue;
        }

        entries.push(RegistryEntry {
            source_id: cells[1].to_string(),
            item_key: cells[3].to_string(),
            authors: cells[4].to_string(),
            year: cells[5].to_string(),
            title: cells[6].to_string(),
        });
    }

    entries
}

/// All `*.txt` files directly inside `dir`, sorted by name
pub fn list_extracted_texts(dir: &Path) -> Result<Vec<PathBuf>, FulltextError> {
    let read = std::fs::read_dir(dir).map_err(|e| FulltextError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in read {
        let path = entry.map_err(|e| FulltextError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// First file whose name contains the entry's first-author last name
/// (case-insensitive) and its year
pub fn find_matching_file<'a>(entry: &RegistryEntry, files: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let last_name = entry.first_author_last_name().to_lowercase();
    let year = entry.year.trim();
    if last_name.is_empty() || year.is_empty() {
        return None;
    }

    files.iter().find(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        name.contains(&last_name) && name.contains(year)
    })
}

/// A registry entry with its matching file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundText {
    pub entry: RegistryEntry,
    pub file: PathBuf,
}

/// Which registry entries have extracted text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub total_files: usize,
    pub found: Vec<FoundText>,
    pub missing: Vec<RegistryEntry>,
}

impl StatusReport {
    pub fn total_sources(&self) -> usize {
        self.found.len() + self.missing.len()
    }

    /// Percentage of registry entries with text, rounded down
    pub fn coverage_percent(&self) -> usize {
        match self.total_sources() {
            0 => 0,
            total => self.found.len() * 100 / total,
        }
    }
}

/// Partition registry entries into found and missing
pub fn status_report(entries: &[RegistryEntry], files: &[PathBuf]) -> StatusReport {
    let mut report = StatusReport {
        total_files: files.len(),
        ..Default::default()
    };

    for entry in entries {
        match find_matching_file(entry, files) {
            Some(file) => report.found.push(FoundText {
                entry: entry.clone(),
                file: file.clone(),
            }),
            None => report.missing.push(entry.clone()),
        }
    }

    report
}

/// Read the claims matrix and scan the text directory
pub fn check_status(matrix: &Path, text_dir: &Path) -> Result<StatusReport, FulltextError> {
    let markdown = std::fs::read_to_string(matrix).map_err(|e| FulltextError::io(matrix, e))?;
    let entries = parse_source_registry(&markdown);
    if entries.is_empty() {
        return Err(FulltextError::NoRegistry(matrix.to_path_buf()));
    }

    let files = list_extracted_texts(text_dir)?;
    Ok(status_report(&entries, &files))
}

/// Standard file name for a record's extracted text.
///
/// One author gives `Last`, two give `A and B`, more give `A et al.`.
/// A record without a four-digit year uses `n.d.`.
pub fn standard_filename(record: &BibRecord) -> String {
    let last_names: Vec<&str> = record
        .creators
        .iter()
        .map(|c| c.last_name.as_str())
        .collect();
    format_standard_name(&last_names, record.year(), &record.title)
}

fn is_year(text: &str) -> bool {
    text.len() == 4 && text.chars().all(|c| c.is_ascii_digit())
}

fn format_standard_name(last_names: &[&str], year: Option<&str>, title: &str) -> String {
    let last_names: Vec<&str> = last_names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();

    let authors = match last_names.as_slice() {
        [] => "Unknown".to_string(),
        [one] => one.to_string(),
        [a, b] => format!("{} and {}", a, b),
        [a, ..] => format!("{} et al.", a),
    };

    // titles from PubMed end with a period
    let title = title.trim().trim_end_matches('.');
    let name = format!("{} - {} - {}", authors, year.unwrap_or("n.d."), title);
    format!("{}.txt", sanitize_filename_component(&name))
}

static STANDARD_NAME: OnceLock<Option<Regex>> = OnceLock::new();

/// Split a standard file name into `(authors, year, title)`
pub fn parse_standard_filename(name: &str) -> Option<(String, String, String)> {
    let re = STANDARD_NAME
        .get_or_init(|| Regex::new(r"^(.+?) - (\d{4}) - (.+)\.txt$").ok())
        .as_ref()?;
    let caps = re.captures(name)?;
    Some((
        caps[1].to_string(),
        caps[2].to_string(),
        caps[3].to_string(),
    ))
}

/// A set of renames loaded from TOML:
///
/// ```toml
/// [renames]
/// "Source02_SY5YRHHX_ComBat-seq.txt" = "Zhang et al. - 2020 - ComBat-seq.txt"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RenamePlan {
    #[serde(default)]
    pub renames: BTreeMap<String, String>,
}

/// Why a rename was not performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    SourceMissing,
    TargetExists,
}

/// Result of applying a [`RenamePlan`]
#[derive(Debug, Default, Serialize)]
pub struct RenameOutcome {
    pub renamed: Vec<(String, String)>,
    pub skipped: Vec<(String, SkipReason)>,
    pub errors: Vec<(String, String)>,
    /// Targets that are not in `Author - YYYY - Title.txt` form
    pub nonstandard: Vec<String>,
}

/// Result of [`RenamePlan::remove_superseded`]
#[derive(Debug, Default, Serialize)]
pub struct CleanupOutcome {
    pub removed: Vec<String>,
    /// Old files that are already gone
    pub absent: Vec<String>,
    /// Old files kept because their replacement does not exist
    pub kept: Vec<String>,
    pub errors: Vec<(String, String)>,
}

impl RenamePlan {
    pub fn from_toml(text: &str) -> Result<Self, FulltextError> {
        toml::from_str(text).map_err(|e| FulltextError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, FulltextError> {
        let text = std::fs::read_to_string(path).map_err(|e| FulltextError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Propose standard names for every found text that is not already in
    /// standard form, using the registry row it matched
    pub fn from_report(report: &StatusReport) -> Self {
        let mut renames = BTreeMap::new();
        for found in &report.found {
            let Some(current) = found.file.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            if parse_standard_filename(&current).is_some() {
                continue;
            }
            renames.insert(current, found.entry.standard_filename());
        }
        Self { renames }
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Rename every entry inside `dir`.
    ///
    /// With `dry_run` nothing is touched, but the outcome reports what would
    /// have been renamed.
    pub fn apply(&self, dir: &Path, dry_run: bool) -> RenameOutcome {
        let mut outcome = RenameOutcome::default();

        for (old_name, new_name) in &self.renames {
            let names = ensure_plain_filename(old_name).and_then(|old| {
                ensure_plain_filename(new_name).map(|new| (old, new))
            });
            let (old, new) = match names {
                Ok(pair) => pair,
                Err(e) => {
                    outcome.errors.push((old_name.clone(), e.to_string()));
                    continue;
                }
            };

            if parse_standard_filename(new).is_none() {
                tracing::warn!("Target {} is not in 'Author - YYYY - Title.txt' form", new);
                outcome.nonstandard.push(new.to_string());
            }

            let old_path = dir.join(old);
            let new_path = dir.join(new);

            if !old_path.exists() {
                tracing::warn!("Skipping {} (file not found)", old);
                outcome
                    .skipped
                    .push((old.to_string(), SkipReason::SourceMissing));
                continue;
            }
            if new_path.exists() {
                tracing::warn!("Skipping {} (target already exists: {})", old, new);
                outcome
                    .skipped
                    .push((old.to_string(), SkipReason::TargetExists));
                continue;
            }

            if !dry_run {
                if let Err(e) = std::fs::rename(&old_path, &new_path) {
                    outcome.errors.push((old.to_string(), e.to_string()));
                    continue;
                }
            }
            if dry_run {
                tracing::info!("Would rename {} -> {}", old, new);
            } else {
                tracing::info!("Renamed {} -> {}", old, new);
            }
            outcome.renamed.push((old.to_string(), new.to_string()));
        }

        outcome
    }

    /// Delete old-format files whose renamed counterpart already exists.
    ///
    /// A file whose target is missing is kept, so nothing is lost when a
    /// rename never happened.
    pub fn remove_superseded(&self, dir: &Path, dry_run: bool) -> CleanupOutcome {
        let mut outcome = CleanupOutcome::default();

        for (old_name, new_name) in &self.renames {
            let names = ensure_plain_filename(old_name).and_then(|old| {
                ensure_plain_filename(new_name).map(|new| (old, new))
            });
            let (old, new) = match names {
                Ok(pair) => pair,
                Err(e) => {
                    outcome.errors.push((old_name.clone(), e.to_string()));
                    continue;
                }
            };

            let old_path = dir.join(old);
            if !old_path.exists() {
                outcome.absent.push(old.to_string());
                continue;
            }
            if !dir.join(new).is_file() {
                tracing::warn!("Keeping {} ({} does not exist)", old, new);
                outcome.kept.push(old.to_string());
                continue;
            }

            if dry_run {
                tracing::info!("Would remove {}", old);
            } else if let Err(e) = std::fs::remove_file(&old_path) {
                outcome.errors.push((old.to_string(), e.to_string()));
                continue;
            } else {
                tracing::info!("Removed {}", old);
            }
            outcome.removed.push(old.to_string());
        }

        outcome
    }
}

/// Errors from full-text bookkeeping
#[derive(Debug, thiserror::Error)]
pub enum FulltextError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find a Source ID Registry in {0}")]
    NoRegistry(PathBuf),

    #[error("Zotero storage directory not found: {0}")]
    StorageMissing(PathBuf),

    #[error("Invalid rename map: {0}")]
    Parse(String),
}

impl FulltextError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        FulltextError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Creator;
    use tempfile::tempdir;

    const MATRIX: &str = "# Claims Matrix\n\n\
## Source ID Registry\n\n\
| ID | Type | Zotero Key | Authors | Year | Title |\n\
|----|------|------------|---------|------|-------|\n\
| 1 | Article | ABCD1234 | Johnson, W. Evan; Li, Cheng | 2007 | Adjusting batch effects |\n\
| 2 | Article | SY5YRHHX | Zhang Y | 2020 | ComBat-seq |\n\
| 3 | Review | Z35ZGFFP | Alharbi, Fadi | 2023 | ML for cancer |\n\
| broken row |\n\
\n## Claims\n\n| 9 | x | y | z | 2000 | not a source |\n";

    fn entries() -> Vec<RegistryEntry> {
        parse_source_registry(MATRIX)
    }

    #[test]
    fn test_parse_source_registry() {
        let entries = entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].source_id, "1");
        assert_eq!(entries[0].item_key, "ABCD1234");
        assert_eq!(entries[1].authors, "Zhang Y");
        assert_eq!(entries[2].title, "ML for cancer");
    }

    #[test]
    fn test_parse_source_registry_missing_section() {
        assert!(parse_source_registry("# Nothing here\n").is_empty());
    }

    #[test]
    fn test_first_author_last_name() {
        let entries = entries();
        assert_eq!(entries[0].first_author_last_name(), "Johnson");
        assert_eq!(entries[1].first_author_last_name(), "Zhang");
    }

    #[test]
    fn test_status_report() {
        let files = vec![
            PathBuf::from("texts/Johnson et al. - 2007 - Adjusting batch effects.txt"),
            PathBuf::from("texts/zhang - 2019 - wrong year.txt"),
        ];
        let report = status_report(&entries(), &files);
        assert_eq!(report.found.len(), 1);
        assert_eq!(report.found[0].entry.source_id, "1");
        assert_eq!(report.missing.len(), 2);
        assert_eq!(report.coverage_percent(), 33);
        assert_eq!(report.total_files, 2);
    }

    #[test]
    fn test_coverage_empty_registry() {
        let report = status_report(&[], &[]);
        assert_eq!(report.coverage_percent(), 0);
    }

    #[test]
    fn test_list_extracted_texts_filters_and_sorts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "").unwrap();
        std::fs::create_dir(dir.path().join("d.txt")).unwrap();

        let files = list_extracted_texts(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_check_status_without_registry() {
        let dir = tempdir().unwrap();
        let matrix = dir.path().join("claims_matrix.md");
        std::fs::write(&matrix, "# Empty\n").unwrap();
        assert!(matches!(
            check_status(&matrix, dir.path()),
            Err(FulltextError::NoRegistry(_))
        ));
    }

    fn record(authors: &[(&str, &str)], title: &str) -> BibRecord {
        BibRecord {
            title: title.to_string(),
            creators: authors
                .iter()
                .map(|(last, first)| Creator::author(*last, *first))
                .collect(),
            date: Some("2020-05-01".to_string()),
            publication_title: None,
            identifier: None,
            abstract_note: None,
            url: None,
            collection: "BookChapter".to_string(),
        }
    }

    #[test]
    fn test_standard_filename() {
        assert_eq!(
            standard_filename(&record(&[("Zhang", "Yuqing")], "ComBat-seq")),
            "Zhang - 2020 - ComBat-seq.txt"
        );
        assert_eq!(
            standard_filename(&record(&[("Alharbi", "F"), ("Vakanski", "A")], "ML: A Review")),
            "Alharbi and Vakanski - 2020 - ML A Review.txt"
        );
        assert_eq!(
            standard_filename(&record(&[("Tran", "H"), ("Ang", "K"), ("Chevrier", "M")], "Benchmark?")),
            "Tran et al. - 2020 - Benchmark.txt"
        );
    }

    #[test]
    fn test_parse_standard_filename() {
        assert_eq!(
            parse_standard_filename("Zhang et al. - 2020 - ComBat-seq - revised.txt"),
            Some((
                "Zhang et al.".to_string(),
                "2020".to_string(),
                "ComBat-seq - revised".to_string()
            ))
        );
        assert_eq!(parse_standard_filename("Source02_SY5YRHHX.txt"), None);
    }

    #[test]
    fn test_rename_plan_apply() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Source02.txt"), "text").unwrap();
        std::fs::write(dir.path().join("Source03.txt"), "text").unwrap();
        std::fs::write(dir.path().join("Taken.txt"), "text").unwrap();

        let plan = RenamePlan::from_toml(
            r#"
[renames]
"Source02.txt" = "Zhang et al. - 2020 - ComBat-seq.txt"
"Source03.txt" = "Taken.txt"
"Source99.txt" = "Nobody - 2000 - Missing.txt"
"Source04.txt" = "../escape.txt"
"#,
        )
        .unwrap();

        let outcome = plan.apply(dir.path(), false);
        assert_eq!(outcome.renamed.len(), 1);
        assert!(dir.path().join("Zhang et al. - 2020 - ComBat-seq.txt").is_file());
        assert!(outcome
            .skipped
            .contains(&("Source03.txt".to_string(), SkipReason::TargetExists)));
        assert!(outcome
            .skipped
            .contains(&("Source99.txt".to_string(), SkipReason::SourceMissing)));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_rename_plan_dry_run() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.txt"), "text").unwrap();
        let mut plan = RenamePlan::default();
        plan.renames.insert("old.txt".into(), "new.txt".into());

        let outcome = plan.apply(dir.path(), true);
        assert_eq!(outcome.renamed.len(), 1);
        assert!(dir.path().join("old.txt").is_file());
        assert!(!dir.path().join("new.txt").exists());
    }

    #[test]
    fn test_standard_filename_drops_trailing_period() {
        let name = standard_filename(&record(
            &[("Johnson", "W"), ("Li", "C"), ("Rabinovic", "A")],
            "Adjusting batch effects using empirical Bayes methods.",
        ));
        assert_eq!(
            name,
            "Johnson et al. - 2020 - Adjusting batch effects using empirical Bayes methods.txt"
        );
        assert!(parse_standard_filename(&name).is_some());
    }

    #[test]
    fn test_registry_entry_standard_filename() {
        let entries = entries();
        assert_eq!(
            entries[0].standard_filename(),
            "Johnson and Li - 2007 - Adjusting batch effects.txt"
        );
        assert_eq!(entries[1].standard_filename(), "Zhang - 2020 - ComBat-seq.txt");
    }

    #[test]
    fn test_rename_accepts_dotted_titles() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Source01.txt"), "text").unwrap();
        std::fs::write(dir.path().join("Source02.txt"), "text").unwrap();

        let mut plan = RenamePlan::default();
        plan.renames.insert(
            "Source01.txt".into(),
            "Johnson et al. - 2007 - Adjusting batch effects methods..txt".into(),
        );
        plan.renames
            .insert("Source02.txt".into(), "Smith - 2020 - Wait... what.txt".into());

        let outcome = plan.apply(dir.path(), false);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(outcome.renamed.len(), 2);
        assert!(dir.path().join("Smith - 2020 - Wait... what.txt").is_file());
    }

    #[test]
    fn test_rename_flags_nonstandard_targets() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.txt"), "text").unwrap();
        let mut plan = RenamePlan::default();
        plan.renames.insert("old.txt".into(), "notes.txt".into());

        let outcome = plan.apply(dir.path(), false);
        assert_eq!(outcome.renamed.len(), 1);
        assert_eq!(outcome.nonstandard, vec!["notes.txt".to_string()]);
    }

    #[test]
    fn test_rename_plan_from_report() {
        let files = vec![
            PathBuf::from("texts/Source01_ABCD1234_Johnson2007.txt"),
            PathBuf::from("texts/Zhang - 2020 - ComBat-seq.txt"),
        ];
        let report = status_report(&entries(), &files);
        assert_eq!(report.found.len(), 2);

        let plan = RenamePlan::from_report(&report);
        assert_eq!(plan.renames.len(), 1);
        assert_eq!(
            plan.renames.get("Source01_ABCD1234_Johnson2007.txt").map(String::as_str),
            Some("Johnson and Li - 2007 - Adjusting batch effects.txt")
        );
    }

    #[test]
    fn test_remove_superseded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Source02.txt"), "old").unwrap();
        std::fs::write(dir.path().join("Zhang - 2020 - ComBat-seq.txt"), "new").unwrap();
        std::fs::write(dir.path().join("Source03.txt"), "only copy").unwrap();

        let plan = RenamePlan::from_toml(
            r#"
[renames]
"Source02.txt" = "Zhang - 2020 - ComBat-seq.txt"
"Source03.txt" = "Leek - 2010 - Confounding.txt"
"Source04.txt" = "Alharbi - 2023 - ML.txt"
"#,
        )
        .unwrap();

        let preview = plan.remove_superseded(dir.path(), true);
        assert_eq!(preview.removed, vec!["Source02.txt".to_string()]);
        assert!(dir.path().join("Source02.txt").is_file());

        let outcome = plan.remove_superseded(dir.path(), false);
        assert_eq!(outcome.removed, vec!["Source02.txt".to_string()]);
        assert_eq!(outcome.kept, vec!["Source03.txt".to_string()]);
        assert_eq!(outcome.absent, vec!["Source04.txt".to_string()]);
        assert!(!dir.path().join("Source02.txt").exists());
        assert!(dir.path().join("Source03.txt").is_file());
    }

    #[test]
    fn test_rename_plan_invalid_toml() {
        assert!(matches!(
            RenamePlan::from_toml("renames = 5"),
            Err(FulltextError::Parse(_))
        ));
    }
}
