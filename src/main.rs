use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use mongodb::bson::Bson;
use mongodb::bson::Document;
use mongodb::sync::Client;
use slog::info;

use odm_cursor::logging::LogLevel;
use odm_cursor::Conf;
use odm_cursor::CursorAdapter;
use odm_cursor::FindQuery;
use odm_cursor::QueryCache;

/// Print documents from a MongoDB collection as relaxed extended JSON.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Collection to read documents from.
    #[arg(long)]
    collection: String,

    /// Path to the YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extended JSON filter documents must match.
    #[arg(long)]
    filter: Option<String>,

    /// Maximum number of documents to print.
    #[arg(long)]
    limit: Option<usize>,

    /// Emit logs from a background thread.
    #[arg(long)]
    log_async: bool,

    /// Verbosity level for logs emitted to standard error.
    #[arg(long, value_enum, default_value_t)]
    log_level: LogLevel,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{:?}", error);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let conf = match &cli.config {
        None => Conf::default(),
        Some(path) => Conf::from_file(path)?,
    };
    let logger = odm_cursor::logging::configure(cli.log_level, cli.log_async);
    let filter = match &cli.filter {
        None => Document::new(),
        Some(filter) => parse_filter(filter)?,
    };

    info!(logger, "Connecting to MongoDB"; "db" => %conf.mongodb.db);
    let client = Client::with_uri_str(&conf.mongodb.uri)
        .with_context(|| format!("failed to connect to MongoDB URI '{}'", conf.mongodb.uri))?;
    let collection = client
        .database(&conf.mongodb.db)
        .collection::<Document>(&cli.collection);
    let query = FindQuery::with_conf(collection, filter, &conf, logger.clone());
    let mut adapter = CursorAdapter::new(query, logger.clone());
    if conf.cache.enabled {
        adapter = adapter.with_cache(QueryCache::new(&conf.cache)?);
    }

    for document in adapter.materialize(cli.limit)? {
        let document = Bson::Document(document).into_relaxed_extjson();
        println!("{}", document);
    }
    Ok(())
}

/// Decode an extended JSON filter into a BSON document.
fn parse_filter(filter: &str) -> Result<Document> {
    let filter: serde_json::Value =
        serde_json::from_str(filter).context("the filter is not valid JSON")?;
    let filter = Bson::try_from(filter).context("the filter is not valid extended JSON")?;
    match filter {
        Bson::Document(filter) => Ok(filter),
        other => anyhow::bail!(
            "the filter must be a document, found {:?}",
            other.element_type()
        ),
    }
}
