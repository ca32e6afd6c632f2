//! Splitting a claims-and-evidence markdown document by category.
//!
//! Claims start with a `## C_<n>:` heading and carry a
//! `**Category**: <name>` line. Each category is written to its own file and
//! the source document is replaced by a master index pointing at them.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CLAIM_HEADING: OnceLock<Option<Regex>> = OnceLock::new();
static CATEGORY_LINE: OnceLock<Option<Regex>> = OnceLock::new();

fn claim_heading() -> Option<&'static Regex> {
    CLAIM_HEADING
        .get_or_init(|| Regex::new(r"(?m)^## (C_\d+):").ok())
        .as_ref()
}

fn category_line() -> Option<&'static Regex> {
    CATEGORY_LINE
        .get_or_init(|| Regex::new(r"\*\*Category\*\*:\s*(.+?)\s*\n").ok())
        .as_ref()
}

/// A single claim, including its heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub id: String,
    pub content: String,
}

impl Claim {
    /// Numeric part of `C_<n>`; unparsable IDs sort last
    pub fn number(&self) -> u64 {
        claim_number(&self.id)
    }
}

fn claim_number(id: &str) -> u64 {
    id.strip_prefix("C_")
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

/// A parsed claims document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimsDocument {
    /// Everything before the first claim heading
    pub header: String,
    /// Claims grouped by category, in document order within each group
    pub by_category: BTreeMap<String, Vec<Claim>>,
    /// IDs of claims without a category line; these are not written anywhere
    pub uncategorized: Vec<String>,
}

impl ClaimsDocument {
    pub fn claim_count(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }
}

/// Parse a claims document
pub fn parse_claims(content: &str) -> ClaimsDocument {
    let headings: Vec<_> = match claim_heading() {
        Some(re) => re.captures_iter(content).collect(),
        None => Vec::new(),
    };

    let header_end = headings
        .first()
        .and_then(|c| c.get(0))
        .map_or(content.len(), |m| m.start());

    let mut doc = ClaimsDocument {
        header: content[..header_end].to_string(),
        ..Default::default()
    };

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body_end = headings
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map_or(content.len(), |m| m.start());
        let body = &content[whole.end()..body_end];

        match category_line()
            .and_then(|re| re.captures(body))
            .and_then(|c| c.get(1))
        {
            Some(category) => {
                doc.by_category
                    .entry(category.as_str().trim().to_string())
                    .or_default()
                    .push(Claim {
                        id: id.as_str().to_string(),
                        content: format!("## {}:{}", id.as_str(), body),
                    });
            }
            None => {
                tracing::warn!("Claim {} has no category; skipping", id.as_str());
                doc.uncategorized.push(id.as_str().to_string());
            }
        }
    }

    doc
}

/// File name used for a category
pub fn category_filename(category: &str) -> String {
    let known = match category {
        "Method" => Some("methods.md"),
        "Result" => Some("results.md"),
        "Challenge" => Some("challenges.md"),
        "Data Source" => Some("data_sources.md"),
        "Data Trend" => Some("data_trends.md"),
        "Application" => Some("applications.md"),
        "Impact" => Some("impacts.md"),
        "Phenomenon" => Some("phenomena.md"),
        _ => None,
    };

    known
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.md", category.to_lowercase().replace(' ', "_")))
}

/// A category file produced by the split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFile {
    pub category: String,
    pub filename: String,
    /// Claim IDs in numeric order
    pub claim_ids: Vec<String>,
}

fn sorted_claims(claims: &[Claim]) -> Vec<&Claim> {
    let mut sorted: Vec<&Claim> = claims.iter().collect();
    sorted.sort_by(|a, b| a.number().cmp(&b.number()).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Render the body of one category file
pub fn render_category_file(category: &str, claims: &[Claim]) -> String {
    let mut out = format!("# Claims and Evidence: {}\n\n", category);
    out.push_str(&format!(
        "This file contains all **{}** claims with their supporting evidence.\n\n",
        category
    ));
    out.push_str("---\n\n");

    for claim in sorted_claims(claims) {
        out.push_str(&claim.content);
        out.push_str("\n---\n\n");
    }

    out
}

/// Write one file per category into `out_dir`, creating it if needed
pub fn write_category_files(
    doc: &ClaimsDocument,
    out_dir: &Path,
) -> Result<Vec<CategoryFile>, ClaimsError> {
    std::fs::create_dir_all(out_dir).map_err(|e| ClaimsError::io(out_dir, e))?;

    let mut files = Vec::new();
    for (category, claims) in &doc.by_category {
        let filename = category_filename(category);
        let path = out_dir.join(&filename);
        std::fs::write(&path, render_category_file(category, claims))
            .map_err(|e| ClaimsError::io(&path, e))?;

        tracing::info!("Created {} with {} claims", filename, claims.len());
        files.push(CategoryFile {
            category: category.clone(),
            filename,
            claim_ids: sorted_claims(claims).into_iter().map(|c| c.id.clone()).collect(),
        });
    }

    Ok(files)
}

/// Render the master index that replaces the original document.
///
/// `link_prefix` is the path from the index to the category files, e.g. `claims/`.
pub fn render_master_index(header: &str, files: &[CategoryFile], link_prefix: &str) -> String {
    let mut out = header.to_string();
    out.push_str("\n## Claim Categories and Files\n\n");
    out.push_str("Claims have been organized into separate files by category for easier navigation and maintenance.\n\n");
    out.push_str("| Category | File | Claim Count | Claim IDs |\n");
    out.push_str("|----------|------|-------------|----------|\n");

    for file in files {
        let range = match (file.claim_ids.first(), file.claim_ids.last()) {
            (Some(first), Some(last)) => format!("{} - {}", first, last),
            _ => String::new(),
        };
        out.push_str(&format!(
            "| {} | [`{}`]({}{}) | {} | {} |\n",
            file.category,
            file.filename,
            link_prefix,
            file.filename,
            file.claim_ids.len(),
            range
        ));
    }

    out.push_str("\n## Quick Reference: Claim ID to File Mapping\n\n");

    let mut all: Vec<(&str, &str, &str)> = files
        .iter()
        .flat_map(|f| {
            f.claim_ids
                .iter()
                .map(move |id| (id.as_str(), f.category.as_str(), f.filename.as_str()))
        })
        .collect();
    all.sort_by_key(|(id, _, _)| claim_number(id));

    out.push_str("| Claim ID | Category | File |\n");
    out.push_str("|----------|----------|------|\n");
    for (id, category, filename) in all {
        out.push_str(&format!(
            "| {} | {} | [`{}`]({}{}) |\n",
            id, category, filename, link_prefix, filename
        ));
    }

    out.push_str("\n---\n\n");
    out.push_str("## Notes\n\n");
    out.push_str("- Each category file contains complete claim information including primary quotes and supporting quotes\n");
    out.push_str("- The citation hover extension will automatically locate claims across these files\n");
    out.push_str("- See `sources.md` for complete bibliographic information for all source IDs\n");
    out
}

/// Outcome of [`split_claims_file`]
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSummary {
    pub files: Vec<CategoryFile>,
    pub index_path: PathBuf,
    pub uncategorized: Vec<String>,
}

/// Read `input`, write category files to `out_dir` and the master index to `index_path`.
///
/// `index_path` may be `input` itself; the document is fully read first.
pub fn split_claims_file(
    input: &Path,
    out_dir: &Path,
    index_path: &Path,
) -> Result<SplitSummary, ClaimsError> {
    let content = std::fs::read_to_string(input).map_err(|e| ClaimsError::io(input, e))?;
    let doc = parse_claims(&content);

    if doc.by_category.is_empty() {
        return Err(ClaimsError::NoClaims(input.to_path_buf()));
    }

    let files = write_category_files(&doc, out_dir)?;

    let link_prefix = relative_link_prefix(index_path, out_dir);
    let index = render_master_index(&doc.header, &files, &link_prefix);
    std::fs::write(index_path, index).map_err(|e| ClaimsError::io(index_path, e))?;

    Ok(SplitSummary {
        files,
        index_path: index_path.to_path_buf(),
        uncategorized: doc.uncategorized,
    })
}

/// Link prefix from the index file's directory to `out_dir`
fn relative_link_prefix(index_path: &Path, out_dir: &Path) -> String {
    let index_dir = index_path.parent().unwrap_or_else(|| Path::new(""));
    let rel = out_dir.strip_prefix(index_dir).unwrap_or(out_dir);
    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.is_empty() {
        String::new()
    } else {
        format!("{}/", rel.trim_end_matches('/'))
    }
}

/// Errors from splitting claims
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No categorized claims found in {0}")]
    NoClaims(PathBuf),
}

impl ClaimsError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ClaimsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
