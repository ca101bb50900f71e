mod config;
mod context;
mod db;
mod document;
mod error;
mod extractor;
mod normalize;
mod pacing;
mod query;
mod raw;
mod session;
mod sink;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Settings;
use crate::context::RunContext;
use crate::extractor::{HttpPageSource, PaginatedExtractor};
use crate::session::{FileSessionStore, FingerprintPools, SessionConfig, SessionManager, SessionStore};

#[derive(Parser)]
#[command(name = "cb_extract", about = "Crunchbase organization extractor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, page through the saved search and write one JSON artifact
    Extract {
        /// Connect directly instead of through CB_PROXY_URL
        #[arg(long)]
        no_proxy: bool,
        /// Reuse cookies from CB_COOKIES_FILE and save fresh ones there
        #[arg(long)]
        persist_session: bool,
        /// Where to write the artifact (default: CB_OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Load an extraction artifact into the local database
    Insert {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Companies stamped after a date that have a LinkedIn page
    List {
        /// YYYY-MM-DD
        #[arg(short, long)]
        since: NaiveDate,
        /// Max rows to display
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print one stored document as JSON
    Show { uuid: String },
    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Extract {
            no_proxy,
            persist_session,
            output_dir,
        } => run_extract(&settings, !no_proxy, persist_session, output_dir).await,
        Commands::Insert { file } => {
            let docs = db::read_artifact(&file)?;
            if docs.is_empty() {
                println!("{} holds no documents.", file.display());
                return Ok(());
            }
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let written = db::insert_documents(&conn, &docs)?;
            println!("Loaded {} organizations from {}.", written, file.display());
            Ok(())
        }
        Commands::List { since, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_after(&conn, since, limit)?;
            if rows.is_empty() {
                println!("No companies stamped after {}.", since);
                return Ok(());
            }

            println!(
                "{:>4} | {:<36} | {:<32} | {:<20} | {}",
                "#", "UUID", "Company", "Stamped", "LinkedIn"
            );
            println!("{}", "-".repeat(140));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>4} | {:<36} | {:<32} | {:<20} | {}",
                    i + 1,
                    r.uuid,
                    truncate(&r.organization_name, 32),
                    truncate(&r.stamped_at, 19),
                    r.linkedin
                );
            }
            println!("\n{} companies", rows.len());
            Ok(())
        }
        Commands::Show { uuid } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            match db::fetch_document(&conn, &uuid)? {
                Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                None => println!("No organization with uuid {}.", uuid),
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Organizations: {}", db::count(&conn)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_extract(
    settings: &Settings,
    use_proxy: bool,
    persist_session: bool,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Everything that can be wrong with the setup fails here, before any request.
    let credentials = settings.credentials()?;
    let session_config = SessionConfig::from_settings(settings)?;
    let extract_delay = settings.extract_delay()?;
    let search_url = settings.search_url()?;
    let pools = FingerprintPools::load(&settings.headers_file)?;
    let mut ctx = RunContext::new(settings, use_proxy)?;

    let store: Option<Box<dyn SessionStore>> = if persist_session {
        Some(Box::new(FileSessionStore::new(&settings.cookies_file)))
    } else {
        None
    };
    let mut sessions = SessionManager::new(credentials, &pools, session_config, store, &mut ctx)?;
    sessions.establish(&mut ctx).await.context("establishing session")?;

    let fingerprint = sessions.session().fingerprint.clone();
    let endpoint = match search_url {
        Some(url) => url,
        None => config::parse_url(&fingerprint.referer)?,
    };
    info!("Searching {}", endpoint);

    let source = HttpPageSource::new(ctx.http.clone(), endpoint, fingerprint, settings.page_timeout());
    let extractor = PaginatedExtractor::new(source, settings.page_size, extract_delay, settings.on_parse_error);

    let total = extractor.probe().await?;
    if total == 0 {
        println!("Search matched no organizations.");
        return Ok(());
    }
    println!("Extracting {} organizations...", total);

    let outcome = extractor.run(total, &mut ctx).await?;
    if let Some(e) = &outcome.aborted {
        warn!("Run ended early at cursor '{}': {}", outcome.cursor, e);
    }

    let dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let path = outcome.sink.persist(&dir)?;
    println!(
        "Saved {} organizations from {} pages to {} ({} skipped{}).",
        outcome.sink.len(),
        outcome.pages,
        path.display(),
        outcome.skipped,
        if outcome.aborted.is_some() { ", stopped early" } else { "" }
    );
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
