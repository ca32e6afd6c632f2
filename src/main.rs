use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use comfy_table::{Attribute, Cell, Table};
use lit_review::claims::split_claims_file;
use lit_review::config::{
    credentials_help, find_config_file, load_config, Config, ConfigError, ZoteroCredentials,
    API_KEY_VAR, USER_ID_VAR,
};
use lit_review::fulltext::{
    check_status, locate_missing_pdfs, locate_pdfs, PdfReport, PdfStatus, RenamePlan, SkipReason,
    StatusReport,
};
use lit_review::intake::{fetch_metadata, prepare_record, Lookup, ManualFields};
use lit_review::models::{Collection, Item};
use lit_review::sources::{CrossRefSource, PubMedSource};
use lit_review::ui::{
    print_divider, print_metadata, print_record, print_section, print_status, status_line, Status,
};
use lit_review::utils::{fit_width, is_terminal, polite_user_agent, title_column_width, HttpClient};
use lit_review::zotero::ZoteroClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lit Review - Manage a Zotero-backed literature review from the command line
#[derive(Parser, Debug)]
#[command(name = "lit-review")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Add papers to Zotero and maintain literature-review files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a journal article to Zotero
    #[command(alias = "a")]
    Add {
        /// DOI to look up on CrossRef (wins over --pmid)
        #[arg(long)]
        doi: Option<String>,

        /// PubMed ID to look up on PubMed
        #[arg(long)]
        pmid: Option<String>,

        /// Paper title (overrides fetched title)
        #[arg(long)]
        title: Option<String>,

        /// Authors as "Last, First; Last, First" (overrides fetched authors)
        #[arg(long)]
        authors: Option<String>,

        /// Publication date or year
        #[arg(long)]
        date: Option<String>,

        /// Journal name
        #[arg(long)]
        journal: Option<String>,

        /// Abstract
        #[arg(long = "abstract")]
        abstract_note: Option<String>,

        /// URL
        #[arg(long)]
        url: Option<String>,

        /// Target collection (default from config)
        #[arg(long, short)]
        collection: Option<String>,

        /// Show the item that would be created without sending it
        #[arg(long, short = 'n')]
        dry_run: bool,
    },

    /// List collections in the library
    #[command(alias = "ls")]
    Collections,

    /// List items in a collection
    Items {
        /// Collection key (or name with --by-name)
        collection: String,

        /// Treat COLLECTION as a collection name
        #[arg(long)]
        by_name: bool,
    },

    /// Fetch and print metadata for a DOI or PMID without touching Zotero
    Lookup {
        /// Digital Object Identifier
        #[arg(long, required_unless_present = "pmid", conflicts_with = "pmid")]
        doi: Option<String>,

        /// PubMed ID
        #[arg(long)]
        pmid: Option<String>,
    },

    /// Split the claims document into one file per category
    SplitClaims {
        /// Claims document (default: <knowledge_base>/claims_and_evidence.md)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Directory for category files (default: <knowledge_base>/claims)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Where to write the master index (default: overwrite the input)
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Report which registry sources have extracted full text
    #[command(alias = "status")]
    FulltextStatus {
        /// Claims matrix containing the Source ID Registry
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// Directory of extracted .txt files
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Rename extracted texts to "Author et al. - YYYY - Title.txt"
    Standardize {
        /// TOML file with a [renames] table
        #[arg(long, short, required_unless_present = "from_registry")]
        map: Option<PathBuf>,

        /// Derive renames from the Source ID Registry instead of a map
        #[arg(long, conflicts_with = "map")]
        from_registry: bool,

        /// Claims matrix used with --from-registry
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// Directory of extracted .txt files
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Delete old files whose renamed copy already exists
        #[arg(long)]
        remove_superseded: bool,

        /// Preview renames without changing anything
        #[arg(long, short = 'n')]
        dry_run: bool,
    },

    /// Find Zotero PDFs for sources that still need text extraction
    #[command(alias = "pdfs")]
    FindPdfs {
        /// Zotero item keys (default: registry sources without text)
        #[arg(long, num_args = 1..)]
        items: Vec<String>,

        /// Claims matrix containing the Source ID Registry
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// Directory of extracted .txt files
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Zotero storage directory
        #[arg(long)]
        storage: Option<PathBuf>,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Lit Review - Environment Variables");
    println!();
    println!("Zotero Credentials (required for add, collections, items):");
    println!("  {:<40} Zotero API key with write access", API_KEY_VAR);
    println!("  {:<40} Numeric Zotero user ID", USER_ID_VAR);
    println!();
    println!("Configuration Overrides:");
    println!("  LIT_REVIEW_ZOTERO__API_BASE              Zotero API base URL");
    println!("  LIT_REVIEW_ZOTERO__WEB_BASE              Zotero web base URL for item links");
    println!("  LIT_REVIEW_ZOTERO__LIBRARY_SLUG          Library slug used in item links");
    println!("  LIT_REVIEW_ZOTERO__DEFAULT_COLLECTION    Collection used when --collection is absent");
    println!("  LIT_REVIEW_SOURCES__CROSSREF_BASE        CrossRef API base URL");
    println!("  LIT_REVIEW_SOURCES__PUBMED_BASE          NCBI E-utilities base URL");
    println!("  LIT_REVIEW_SOURCES__MAILTO               Contact email sent in the User-Agent");
    println!("  LIT_REVIEW_PATHS__KNOWLEDGE_BASE         Knowledge base directory");
    println!("  LIT_REVIEW_PATHS__EXTRACTED_TEXT_DIR     Extracted text directory");
    println!("  LIT_REVIEW_PATHS__ZOTERO_STORAGE         Zotero attachment storage directory");
    println!("  LIT_REVIEW_HTTP__TIMEOUT_SECS            Request timeout in seconds");
    println!("  LIT_REVIEW_LOGGING__LEVEL                Default log level");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                                 Rust logging filter (e.g., lit_review=debug)");
    println!();
    println!("A .env file in the working directory is loaded automatically.");
}

fn init_tracing(verbose: u8, quiet: bool, default_level: &str) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => default_level,
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lit_review={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Shared state for subcommands
struct App {
    config: Config,
    http: Arc<HttpClient>,
    format: OutputFormat,
    quiet: bool,
}

impl App {
    fn crossref(&self) -> CrossRefSource {
        CrossRefSource::with_client(self.http.clone(), &self.config.sources.crossref_base)
    }

    fn pubmed(&self) -> PubMedSource {
        PubMedSource::with_client(self.http.clone(), &self.config.sources.pubmed_base)
    }

    fn zotero(&self, credentials: ZoteroCredentials) -> ZoteroClient {
        ZoteroClient::new(credentials, &self.config.zotero.api_base, self.http.clone())
    }

    /// Progress line; JSON output keeps stdout to the document alone
    fn info(&self, msg: &str) {
        if !self.quiet && self.format != OutputFormat::Json {
            print_status(Status::Info, msg);
        }
    }
}

/// Credentials from the environment; `main` turns a miss into remediation text
fn require_credentials() -> Result<ZoteroCredentials, ConfigError> {
    ZoteroCredentials::from_env()
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env is fine; real environment variables still apply
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return;
    }

    let config = match &cli.config {
        Some(path) => load_config(Some(path)),
        None => load_config(find_config_file().as_deref()),
    };

    let default_level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(cli.verbose, cli.quiet, &default_level);

    if let Err(e) = run(cli, config).await {
        match e.downcast_ref::<ConfigError>() {
            Some(ConfigError::MissingCredentials) => println!("{}", credentials_help()),
            _ => eprintln!("{}", status_line(Status::Error, &format!("{:#}", e))),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Result<Config, lit_review::config::ConfigError>) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut config = config.context("Failed to load configuration")?;
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    let http = HttpClient::with_user_agent(
        &polite_user_agent(config.sources.mailto.as_deref()),
        config.http.timeout(),
    )
    .context("Failed to build HTTP client")?;

    let app = App {
        config,
        http: Arc::new(http),
        format: cli.output.resolve(),
        quiet: cli.quiet,
    };

    match command {
        Commands::Add {
            doi,
            pmid,
            title,
            authors,
            date,
            journal,
            abstract_note,
            url,
            collection,
            dry_run,
        } => {
            let manual = ManualFields {
                title,
                authors,
                date,
                journal,
                abstract_note,
                url,
                collection,
            };
            cmd_add(&app, Lookup::choose(doi, pmid), manual, dry_run).await
        }
        Commands::Collections => cmd_collections(&app).await,
        Commands::Items {
            collection,
            by_name,
        } => cmd_items(&app, &collection, by_name).await,
        Commands::Lookup { doi, pmid } => {
            let lookup = Lookup::choose(doi, pmid).context("Either --doi or --pmid is required")?;
            cmd_lookup(&app, &lookup).await
        }
        Commands::SplitClaims {
            input,
            output_dir,
            index,
        } => cmd_split_claims(&app, input, output_dir, index),
        Commands::FulltextStatus { matrix, dir } => cmd_fulltext_status(&app, matrix, dir),
        Commands::Standardize {
            map,
            from_registry: _,
            matrix,
            dir,
            remove_superseded,
            dry_run,
        } => cmd_standardize(&app, map, matrix, dir, remove_superseded, dry_run),
        Commands::FindPdfs {
            items,
            matrix,
            dir,
            storage,
        } => cmd_find_pdfs(&app, items, matrix, dir, storage),
    }
}

fn source_name(lookup: &Lookup) -> &'static str {
    match lookup {
        Lookup::Doi(_) => "CrossRef",
        Lookup::Pmid(_) => "PubMed",
    }
}

async fn cmd_add(
    app: &App,
    lookup: Option<Lookup>,
    manual: ManualFields,
    dry_run: bool,
) -> Result<()> {
    // before any request goes out
    let credentials = if dry_run {
        None
    } else {
        Some(require_credentials()?)
    };

    if let Some(lookup) = &lookup {
        app.info(&format!(
            "Fetching metadata for {} from {}...",
            lookup.identifier(),
            source_name(lookup)
        ));
    }
    let record = prepare_record(
        lookup.as_ref(),
        manual,
        &app.config.zotero.default_collection,
        &app.crossref(),
        &app.pubmed(),
    )
    .await?;

    if !app.quiet && app.format != OutputFormat::Json {
        print_section(&format!("Adding paper to {} collection", record.collection));
        print_record(&record);
    }

    let Some(credentials) = credentials else {
        if app.format == OutputFormat::Json {
            print_json(&record.to_item_payload(&[]))?;
        } else {
            println!();
            print_status(Status::Skip, "Dry run: nothing was sent to Zotero");
        }
        return Ok(());
    };

    let zotero = app.zotero(credentials);
    let write = zotero.add_paper(&record).await.context("Error adding paper")?;
    let key = write.created_key().unwrap_or_default();
    let link = app.config.item_url(zotero.credentials(), key);

    match app.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "key": key, "url": link }))?,
        _ => {
            println!();
            print_status(Status::Success, "Successfully added paper!");
            println!("  Key: {}", key);
            println!("  View at: {}", link);
        }
    }

    Ok(())
}

async fn cmd_collections(app: &App) -> Result<()> {
    let zotero = app.zotero(require_credentials()?);
    let collections = zotero
        .list_collections()
        .await
        .context("Error listing collections")?;
    output_collections(&collections, app.format)
}

fn output_collections(collections: &[Collection], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&collections)?,
        OutputFormat::Plain => {
            for coll in collections {
                println!("{}\t{}\t{}", coll.name(), coll.key, coll.num_items());
            }
        }
        _ => {
            let mut table = new_table(vec!["Name", "Key", "Items"]);
            for coll in collections {
                table.add_row(vec![
                    Cell::new(coll.name()).add_attribute(Attribute::Bold),
                    Cell::new(&coll.key),
                    Cell::new(coll.num_items()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

async fn cmd_items(app: &App, collection: &str, by_name: bool) -> Result<()> {
    let zotero = app.zotero(require_credentials()?);

    let key = if by_name {
        match zotero
            .find_collection(collection)
            .await
            .context("Error listing collections")?
        {
            Some(found) => found.key,
            None => bail!("Collection '{}' not found", collection),
        }
    } else {
        collection.to_string()
    };

    let items = zotero
        .list_collection_items(&key)
        .await
        .with_context(|| format!("Error listing items in collection {}", key))?;
    output_items(&items, app.format)
}

fn output_items(items: &[Item], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Plain => {
            for item in items {
                println!(
                    "{}\t{}\t{}",
                    item.key,
                    item.title(),
                    item.data.date.as_deref().unwrap_or_default()
                );
            }
        }
        _ => {
            let width = title_column_width();
            let mut table = new_table(vec!["Key", "Type", "Title", "Date"]);
            for item in items {
                table.add_row(vec![
                    Cell::new(&item.key),
                    Cell::new(&item.data.item_type),
                    Cell::new(fit_width(item.title(), width)).add_attribute(Attribute::Bold),
                    Cell::new(item.data.date.as_deref().unwrap_or_default()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

async fn cmd_lookup(app: &App, lookup: &Lookup) -> Result<()> {
    let source = source_name(lookup);
    let meta = fetch_metadata(lookup, &app.crossref(), &app.pubmed())
        .await
        .with_context(|| format!("Error fetching metadata from {}", source))?;

    match app.format {
        OutputFormat::Json => print_json(&meta)?,
        _ => print_metadata(&meta, source),
    }
    Ok(())
}

fn cmd_split_claims(
    app: &App,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    index: Option<PathBuf>,
) -> Result<()> {
    let input = input.unwrap_or_else(|| app.config.paths.claims_file());
    let output_dir = output_dir.unwrap_or_else(|| app.config.paths.claims_dir());
    let index = index.unwrap_or_else(|| input.clone());

    app.info(&format!("Reading {}", input.display()));
    let summary = split_claims_file(&input, &output_dir, &index)?;

    if app.format == OutputFormat::Json {
        let files: Vec<_> = summary
            .files
            .iter()
            .map(|f| {
                serde_json::json!({
                    "category": f.category,
                    "file": output_dir.join(&f.filename),
                    "claims": f.claim_ids,
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "files": files,
            "index": summary.index_path,
            "uncategorized": summary.uncategorized,
        }));
    }

    for file in &summary.files {
        print_status(
            Status::Success,
            &format!("Created {} with {} claims", file.filename, file.claim_ids.len()),
        );
    }
    if !summary.uncategorized.is_empty() {
        print_status(
            Status::Warning,
            &format!(
                "{} claims had no category and were skipped: {}",
                summary.uncategorized.len(),
                summary.uncategorized.join(", ")
            ),
        );
    }
    print_status(
        Status::Success,
        &format!("Master index written to {}", summary.index_path.display()),
    );
    Ok(())
}

fn cmd_fulltext_status(app: &App, matrix: Option<PathBuf>, dir: Option<PathBuf>) -> Result<()> {
    let matrix = matrix.unwrap_or_else(|| app.config.paths.claims_matrix());
    let dir = dir.unwrap_or_else(|| app.config.paths.extracted_text_dir.clone());

    let report = check_status(&matrix, &dir)?;
    match app.format {
        OutputFormat::Json => print_json(&report),
        format => {
            output_status_report(&report, format);
            Ok(())
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn output_status_report(report: &StatusReport, format: OutputFormat) {
    print_section("Full Text Extraction Status Report");
    println!("Total sources in registry: {}", report.total_sources());
    println!("Total extracted text files: {}", report.total_files);
    println!();
    print_status(
        Status::Success,
        &format!("Sources with extracted texts: {}", report.found.len()),
    );
    print_status(
        Status::Error,
        &format!("Sources without extracted texts: {}", report.missing.len()),
    );

    if format == OutputFormat::Plain {
        for found in &report.found {
            println!(
                "found\t{}\t{}\t{}\t{}",
                found.entry.source_id,
                found.entry.authors,
                found.entry.year,
                file_name(&found.file)
            );
        }
        for entry in &report.missing {
            println!(
                "missing\t{}\t{}\t{}\t{}",
                entry.source_id, entry.authors, entry.year, entry.item_key
            );
        }
    } else {
        let width = title_column_width();
        if !report.found.is_empty() {
            print_section("Sources With Extracted Texts");
            let mut table = new_table(vec!["ID", "Authors", "Year", "File"]);
            for found in &report.found {
                table.add_row(vec![
                    Cell::new(&found.entry.source_id),
                    Cell::new(fit_width(&found.entry.authors, 40)),
                    Cell::new(&found.entry.year),
                    Cell::new(fit_width(&file_name(&found.file), width)),
                ]);
            }
            println!("{table}");
        }
        if !report.missing.is_empty() {
            print_section("Sources Needing Extraction");
            let mut table = new_table(vec!["ID", "Authors", "Year", "Zotero Key", "Title"]);
            for entry in &report.missing {
                table.add_row(vec![
                    Cell::new(&entry.source_id),
                    Cell::new(fit_width(&entry.authors, 40)),
                    Cell::new(&entry.year),
                    Cell::new(&entry.item_key),
                    Cell::new(fit_width(&entry.title, width)),
                ]);
            }
            println!("{table}");
        }
    }

    println!();
    print_divider();
    println!(
        "Extraction coverage: {}/{} ({}%)",
        report.found.len(),
        report.total_sources(),
        report.coverage_percent()
    );
}

fn cmd_standardize(
    app: &App,
    map: Option<PathBuf>,
    matrix: Option<PathBuf>,
    dir: Option<PathBuf>,
    remove_superseded: bool,
    dry_run: bool,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| app.config.paths.extracted_text_dir.clone());
    if !dir.is_dir() {
        bail!("Directory not found: {}", dir.display());
    }

    let plan = match map {
        Some(map) => RenamePlan::load(&map)?,
        None => {
            let matrix = matrix.unwrap_or_else(|| app.config.paths.claims_matrix());
            RenamePlan::from_report(&check_status(&matrix, &dir)?)
        }
    };

    app.info(&format!("Standardizing filenames in: {}", dir.display()));
    if plan.is_empty() {
        app.info("All matched texts already use standard names");
    }
    let outcome = plan.apply(&dir, dry_run);
    let cleanup = remove_superseded.then(|| plan.remove_superseded(&dir, dry_run));

    if app.format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "renamed": outcome.renamed,
            "skipped": outcome.skipped,
            "errors": outcome.errors,
            "nonstandard": outcome.nonstandard,
            "cleanup": cleanup,
        }))?;
    } else {
        let verb = if dry_run { "Would rename" } else { "Renamed" };
        for (old, new) in &outcome.renamed {
            print_status(Status::Success, &format!("{}:", verb));
            println!("  From: {}", old);
            println!("  To:   {}", new);
        }
        for (old, reason) in &outcome.skipped {
            let why = match reason {
                SkipReason::SourceMissing => "file not found",
                SkipReason::TargetExists => "target already exists",
            };
            print_status(Status::Skip, &format!("Skipping {} ({})", old, why));
        }
        for name in &outcome.nonstandard {
            print_status(
                Status::Warning,
                &format!("{} is not in 'Author - YYYY - Title.txt' form", name),
            );
        }
        for (old, err) in &outcome.errors {
            print_status(Status::Error, &format!("Error renaming {}: {}", old, err));
        }

        if let Some(cleanup) = &cleanup {
            let verb = if dry_run { "Would remove" } else { "Removed" };
            for name in &cleanup.removed {
                print_status(Status::Success, &format!("{}: {}", verb, name));
            }
            for name in &cleanup.kept {
                print_status(
                    Status::Skip,
                    &format!("Keeping {} (no standardized copy yet)", name),
                );
            }
            for (name, err) in &cleanup.errors {
                print_status(Status::Error, &format!("Error removing {}: {}", name, err));
            }
        }

        print_section("Summary");
        println!("  Renamed: {}", outcome.renamed.len());
        println!("  Skipped: {}", outcome.skipped.len());
        println!("  Errors:  {}", outcome.errors.len());
        if let Some(cleanup) = &cleanup {
            println!("  Removed: {}", cleanup.removed.len());
            println!("  Already removed: {}", cleanup.absent.len());
        }
    }

    let failures =
        outcome.errors.len() + cleanup.as_ref().map_or(0, |c| c.errors.len());
    if failures > 0 {
        bail!("{} file operations failed", failures);
    }
    Ok(())
}

fn cmd_find_pdfs(
    app: &App,
    items: Vec<String>,
    matrix: Option<PathBuf>,
    dir: Option<PathBuf>,
    storage: Option<PathBuf>,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| app.config.paths.extracted_text_dir.clone());
    let storage = storage.unwrap_or_else(|| app.config.paths.zotero_storage.clone());

    app.info(&format!("Zotero storage: {}", storage.display()));
    let report = if items.is_empty() {
        let matrix = matrix.unwrap_or_else(|| app.config.paths.claims_matrix());
        locate_missing_pdfs(&matrix, &dir, &storage)?
    } else {
        let keys: Vec<(String, Option<String>)> =
            items.into_iter().map(|key| (key, None)).collect();
        locate_pdfs(&keys, &storage, &dir)?
    };

    match app.format {
        OutputFormat::Json => print_json(&report),
        format => {
            output_pdf_report(&report, format);
            Ok(())
        }
    }
}

fn output_pdf_report(report: &PdfReport, format: OutputFormat) {
    if format == OutputFormat::Plain {
        for item in &report.items {
            let (state, path) = match &item.status {
                PdfStatus::Found(path) => ("found", path.display().to_string()),
                PdfStatus::AlreadyExtracted(path) => ("extracted", path.display().to_string()),
                PdfStatus::NotFound => ("not_found", String::new()),
            };
            println!(
                "{}\t{}\t{}\t{}",
                state,
                item.item_key,
                item.source_id.as_deref().unwrap_or_default(),
                path
            );
        }
        return;
    }

    let width = title_column_width();
    let mut table = new_table(vec!["Key", "ID", "Status", "File"]);
    for item in &report.items {
        let (status, file) = match &item.status {
            PdfStatus::Found(path) => ("PDF found", file_name(path)),
            PdfStatus::AlreadyExtracted(path) => ("Already extracted", file_name(path)),
            PdfStatus::NotFound => ("Not found", String::new()),
        };
        table.add_row(vec![
            Cell::new(&item.item_key),
            Cell::new(item.source_id.as_deref().unwrap_or_default()),
            Cell::new(status),
            Cell::new(fit_width(&file, width)),
        ]);
    }
    println!("{table}");

    print_section("Summary");
    println!("  Found PDFs: {}", report.found().count());
    println!(
        "  Already extracted: {}",
        report.count(|s| matches!(s, PdfStatus::AlreadyExtracted(_)))
    );
    println!(
        "  Not found: {}",
        report.count(|s| *s == PdfStatus::NotFound)
    );

    if report.found().next().is_some() {
        println!();
        print_status(Status::Info, "PDFs ready for text extraction:");
        for (item, pdf) in report.found() {
            println!("  {}: {}", item.item_key, pdf.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["lit-review"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.timeout, None);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["lit-review", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["lit-review", "-o", "json", "collections"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Some(Commands::Collections)));
    }

    #[test]
    fn test_output_format_resolve_keeps_explicit() {
        assert_eq!(OutputFormat::Plain.resolve(), OutputFormat::Plain);
        assert_eq!(OutputFormat::Json.resolve(), OutputFormat::Json);
    }

    #[test]
    fn test_cli_add_command() {
        let cli = Cli::parse_from([
            "lit-review",
            "add",
            "--doi",
            "10.1093/biostatistics/kxj037",
            "--collection",
            "Review",
            "--abstract",
            "Batch effects...",
        ]);
        match cli.command {
            Some(Commands::Add {
                doi,
                collection,
                abstract_note,
                dry_run,
                ..
            }) => {
                assert_eq!(doi.as_deref(), Some("10.1093/biostatistics/kxj037"));
                assert_eq!(collection.as_deref(), Some("Review"));
                assert_eq!(abstract_note.as_deref(), Some("Batch effects..."));
                assert!(!dry_run);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_lookup_requires_identifier() {
        assert!(Cli::try_parse_from(["lit-review", "lookup"]).is_err());
        assert!(Cli::try_parse_from(["lit-review", "lookup", "--doi", "10.1/x", "--pmid", "1"]).is_err());
        assert!(Cli::try_parse_from(["lit-review", "lookup", "--pmid", "17135301"]).is_ok());
    }

    #[test]
    fn test_cli_items_by_name() {
        let cli = Cli::parse_from(["lit-review", "items", "BookChapter", "--by-name"]);
        match cli.command {
            Some(Commands::Items {
                collection,
                by_name,
            }) => {
                assert_eq!(collection, "BookChapter");
                assert!(by_name);
            }
            _ => panic!("Expected Items command"),
        }
    }

    #[test]
    fn test_cli_standardize_requires_map() {
        assert!(Cli::try_parse_from(["lit-review", "standardize"]).is_err());
        let cli = Cli::parse_from(["lit-review", "standardize", "--map", "renames.toml", "-n"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Standardize { dry_run: true, .. })
        ));
    }

    #[test]
    fn test_cli_standardize_from_registry() {
        let cli = Cli::parse_from(["lit-review", "standardize", "--from-registry", "--remove-superseded"]);
        match cli.command {
            Some(Commands::Standardize {
                map,
                from_registry,
                remove_superseded,
                ..
            }) => {
                assert!(map.is_none());
                assert!(from_registry);
                assert!(remove_superseded);
            }
            _ => panic!("Expected Standardize command"),
        }
        assert!(Cli::try_parse_from([
            "lit-review",
            "standardize",
            "--from-registry",
            "--map",
            "m.toml"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_find_pdfs_items() {
        let cli = Cli::parse_from(["lit-review", "pdfs", "--items", "N27S4JWC", "67VRP96X"]);
        match cli.command {
            Some(Commands::FindPdfs { items, storage, .. }) => {
                assert_eq!(items, vec!["N27S4JWC", "67VRP96X"]);
                assert!(storage.is_none());
            }
            _ => panic!("Expected FindPdfs command"),
        }
    }

    #[test]
    fn test_cli_global_timeout_after_subcommand() {
        let cli = Cli::parse_from(["lit-review", "collections", "--timeout", "5"]);
        assert_eq!(cli.timeout, Some(5));
    }
}
