//! Terminal output helpers: status lines, section headers and record blocks.
//!
//! Colors are only applied when stdout is a terminal so piped output stays
//! plain.

use owo_colors::OwoColorize;

use crate::models::BibRecord;
use crate::sources::FetchedMetadata;
use crate::utils::{is_terminal, terminal_width, truncate_with_ellipsis};

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Skip,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Skip => "⏭",
    }
}

/// Icon for a metadata source or the library
pub fn source_icon(source: &str) -> &'static str {
    match source.to_lowercase().as_str() {
        "crossref" => "🔗",
        "pubmed" => "🏥",
        "zotero" => "📚",
        _ => "📄",
    }
}

/// Render a status line without printing it
pub fn status_line(status: Status, msg: &str) -> String {
    let icon = status_icon(status);
    if !is_terminal() {
        return format!("{} {}", icon, msg);
    }

    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Skip => format!("{} {}", icon.white().dimmed(), msg),
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    println!("{}", status_line(status, msg));
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    let header = format!("━━━ {} ━━━", title);
    if is_terminal() {
        println!("{}", header.bold().cyan());
    } else {
        println!("{}", header);
    }
}

/// Print a divider line.
pub fn print_divider() {
    let line = "─".repeat(terminal_width().min(80));
    if is_terminal() {
        println!("{}", line.dimmed());
    } else {
        println!("{}", line);
    }
}

fn print_field(label: &str, value: &str, width: usize) {
    if is_terminal() {
        println!("  {:<10} {}", label.bold(), truncate_with_ellipsis(value, width));
    } else {
        println!("  {:<10} {}", label, truncate_with_ellipsis(value, width));
    }
}

fn value_width() -> usize {
    terminal_width().saturating_sub(14).max(20)
}

/// Print fetched metadata as a labelled block
pub fn print_metadata(meta: &FetchedMetadata, source: &str) {
    let width = value_width();
    println!("{} {}", source_icon(source), meta.identifier);
    print_field("Title:", &meta.title, width);
    print_field("Authors:", &meta.authors, width);
    if let Some(date) = &meta.date {
        print_field("Date:", date, width);
    }
    if let Some(venue) = &meta.publication_title {
        print_field("Journal:", venue, width);
    }
    if let Some(abstract_note) = &meta.abstract_note {
        print_field("Abstract:", abstract_note, width);
    }
}

/// Print the record that is about to be sent
pub fn print_record(record: &BibRecord) {
    let width = value_width();
    print_field("Title:", &record.title, width);
    print_field("Authors:", &record.authors(), width);
    if let Some(date) = &record.date {
        print_field("Date:", date, width);
    }
    if let Some(venue) = &record.publication_title {
        print_field("Journal:", venue, width);
    }
    if let Some(id) = &record.identifier {
        print_field("ID:", &id.to_string(), width);
    }
    if let Some(url) = &record.url {
        print_field("URL:", url, width);
    }
    print_field("Collection:", &record.collection, width);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Error), "✗");
        assert_eq!(status_icon(Status::Skip), "⏭");
    }

    #[test]
    fn test_source_icon() {
        assert_eq!(source_icon("CrossRef"), "🔗");
        assert_eq!(source_icon("pubmed"), "🏥");
        assert_eq!(source_icon("unknown"), "📄");
    }

    #[test]
    fn test_status_line_contains_message() {
        let line = status_line(Status::Success, "Successfully added paper!");
        assert!(line.contains("✓"));
        assert!(line.ends_with("Successfully added paper!"));
    }
}
