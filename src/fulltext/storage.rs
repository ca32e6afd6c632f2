//! Locating PDF attachments in the local Zotero storage directory.
//!
//! Zotero keeps each attachment in `storage/<KEY>/file.pdf`. The key is the
//! attachment's, not the parent item's, so a direct hit on the item key is
//! tried first and any PDF whose directory path contains the key is the
//! fallback. Converting the PDF to text is left to external tools.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{check_status, list_extracted_texts, FulltextError, RegistryEntry};

/// Outcome of looking up one Zotero item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum PdfStatus {
    /// A text file mentioning the item key already exists
    AlreadyExtracted(PathBuf),
    /// A PDF is ready for extraction
    Found(PathBuf),
    NotFound,
}

/// One looked-up item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfLookup {
    pub item_key: String,
    /// Registry source ID, when the key came from the registry
    pub source_id: Option<String>,
    pub status: PdfStatus,
}

/// Results of [`locate_pdfs`], in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PdfReport {
    pub items: Vec<PdfLookup>,
}

impl PdfReport {
    pub fn found(&self) -> impl Iterator<Item = (&PdfLookup, &Path)> {
        self.items.iter().filter_map(|item| match &item.status {
            PdfStatus::Found(path) => Some((item, path.as_path())),
            _ => None,
        })
    }

    pub fn count(&self, wanted: fn(&PdfStatus) -> bool) -> usize {
        self.items.iter().filter(|item| wanted(&item.status)).count()
    }
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, FulltextError> {
    let read = std::fs::read_dir(dir).map_err(|e| FulltextError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in read {
        paths.push(entry.map_err(|e| FulltextError::io(dir, e))?.path());
    }
    paths.sort();
    Ok(paths)
}

/// Every PDF under `dir`, depth first, sorted within each directory
fn collect_pdfs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), FulltextError> {
    for path in read_dir_sorted(dir)? {
        if path.is_dir() {
            collect_pdfs(&path, out)?;
        } else if is_pdf(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Find the PDF for a Zotero key in `storage`
pub fn find_pdf(storage: &Path, key: &str) -> Result<Option<PathBuf>, FulltextError> {
    let key = key.trim();
    if key.is_empty() {
        return Ok(None);
    }

    let direct = storage.join(key);
    if direct.is_dir() {
        if let Some(pdf) = read_dir_sorted(&direct)?.into_iter().find(|p| is_pdf(p)) {
            return Ok(Some(pdf));
        }
    }

    let mut pdfs = Vec::new();
    collect_pdfs(storage, &mut pdfs)?;
    Ok(pdfs.into_iter().find(|pdf| {
        pdf.parent()
            .and_then(|parent| parent.strip_prefix(storage).ok())
            .is_some_and(|relative| relative.to_string_lossy().contains(key))
    }))
}

/// First extracted text whose name contains the key
pub fn find_extracted<'a>(key: &str, texts: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    texts.iter().find(|path| {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().contains(key))
    })
}

/// Look up each `(item_key, source_id)` pair.
///
/// Items with a text file already are not searched for.
pub fn locate_pdfs(
    keys: &[(String, Option<String>)],
    storage: &Path,
    text_dir: &Path,
) -> Result<PdfReport, FulltextError> {
    if !storage.is_dir() {
        return Err(FulltextError::StorageMissing(storage.to_path_buf()));
    }

    let texts = if text_dir.is_dir() {
        list_extracted_texts(text_dir)?
    } else {
        Vec::new()
    };

    let mut report = PdfReport::default();
    for (key, source_id) in keys {
        let status = match find_extracted(key, &texts) {
            Some(text) => PdfStatus::AlreadyExtracted(text.clone()),
            None => match find_pdf(storage, key)? {
                Some(pdf) => PdfStatus::Found(pdf),
                None => PdfStatus::NotFound,
            },
        };
        tracing::debug!("{}: {:?}", key, status);
        report.items.push(PdfLookup {
            item_key: key.clone(),
            source_id: source_id.clone(),
            status,
        });
    }

    Ok(report)
}

/// Look up PDFs for the registry entries that have no extracted text
pub fn locate_missing_pdfs(
    matrix: &Path,
    text_dir: &Path,
    storage: &Path,
) -> Result<PdfReport, FulltextError> {
    let status = check_status(matrix, text_dir)?;
    let keys: Vec<(String, Option<String>)> = status
        .missing
        .iter()
        .filter(|entry| !entry.item_key.is_empty())
        .map(|entry: &RegistryEntry| (entry.item_key.clone(), Some(entry.source_id.clone())))
        .collect();
    locate_pdfs(&keys, storage, text_dir)
}
