//! Utility modules shared by the commands.
//!
//! - [`HttpClient`]: reqwest client with timeouts and a crate user agent
//! - [`validate_doi`] / [`validate_pmid`]: identifier checks before any request is built
//! - [`sanitize_filename_component`]: strip characters illegal in filenames
//! - [`truncate_with_ellipsis`]: unicode-aware truncation for terminal output
//!
//! ```rust
//! use lit_review::utils::{validate_doi, validate_pmid};
//!
//! assert_eq!(validate_doi("doi:10.1038/nbt.4314").unwrap(), "10.1038/nbt.4314");
//! assert!(validate_pmid("PMC123").is_err());
//! ```

mod display;
mod http;
mod validate;

pub use display::{fit_width, is_terminal, terminal_width, title_column_width, truncate_with_ellipsis};
pub use http::{default_user_agent, polite_user_agent, HttpClient, DEFAULT_TIMEOUT};
pub use validate::{
    ensure_plain_filename, sanitize_filename_component, validate_doi, validate_pmid,
    ValidationError,
};
