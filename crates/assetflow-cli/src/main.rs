//! assetflow: ingest and manage media assets from the command line.
//!
//! Backends are chosen from `ASSETFLOW_*` variables (a `.env` file is read
//! if present). Local disk storage and the JSON metadata file are the defaults.

use std::path::PathBuf;

use anyhow::Context;
use assetflow_core::{AssetKind, ListQuery, SearchFilters, SortBy};
use assetflow_infra::{init_telemetry, TelemetryConfig};
use assetflow_services::IngestItem;
use assetflow_cli::{build_context, print_json, record_line};
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "assetflow", about = "Media asset ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one or more files into a category
    Ingest {
        files: Vec<PathBuf>,
        #[arg(long, short)]
        category: String,
        /// Mime type for every file (guessed from the extension otherwise)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Full-text search over names, tags and categories
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        category: Option<String>,
        /// Mime major type: image, video, application, text
        #[arg(long)]
        r#type: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// List records of a category
    List {
        #[arg(long)]
        category: Option<String>,
        /// image, video or document
        #[arg(long)]
        kind: Option<AssetKind>,
        #[arg(long)]
        featured: bool,
        /// newest, oldest, name, size or manual
        #[arg(long, default_value = "newest")]
        sort: SortBy,
        /// Hide records with the same name, size and upload time
        #[arg(long)]
        dedupe: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one record
    Get { id: Uuid },
    /// Upload analytics
    Stats,
    /// Add tags to records
    Tag {
        ids: Vec<Uuid>,
        #[arg(long = "tag", short, required = true)]
        tags: Vec<String>,
    },
    /// Delete records with their stored objects
    Delete { ids: Vec<Uuid> },
    /// Mark a record as featured
    Feature {
        id: Uuid,
        /// Clear the flag instead
        #[arg(long)]
        off: bool,
    },
    /// Rebuild the search index from the store, or drain the reconcile queue
    Reindex {
        #[arg(long)]
        reconcile: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry(&TelemetryConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let cli = Cli::parse();
    let ctx = build_context().await?;

    match cli.command {
        Commands::Ingest {
            files,
            category,
            mime,
        } => {
            let mut batch = Vec::with_capacity(files.len());
            for file in &files {
                let item = IngestItem::from_path(file, mime.clone(), category.clone())
                    .await
                    .with_context(|| format!("Cannot read {}", file.display()))?;
                batch.push(item);
            }
            let result = ctx.pipeline().ingest(batch).await;
            print_json(&result)?;
            if !result.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Search {
            query,
            category,
            r#type,
            limit,
            json,
        } => {
            let filters = SearchFilters {
                category,
                major_type: r#type,
                ..Default::default()
            };
            let mut records = ctx.search(&query, &filters).await?;
            records.truncate(limit);
            if json {
                print_json(&records)?;
            } else {
                records.iter().for_each(|r| println!("{}", record_line(r)));
            }
        }
        Commands::List {
            category,
            kind,
            featured,
            sort,
            dedupe,
            json,
        } => {
            let query = ListQuery {
                category,
                kind,
                featured_only: featured,
                sort,
                dedupe,
            };
            let records = ctx.list(&query).await?;
            if json {
                print_json(&records)?;
            } else {
                records.iter().for_each(|r| println!("{}", record_line(r)));
            }
        }
        Commands::Get { id } => {
            let record = ctx
                .get(id)
                .await?
                .with_context(|| format!("Asset {} not found", id))?;
            print_json(&record)?;
        }
        Commands::Stats => {
            print_json(&ctx.stats().await)?;
        }
        Commands::Tag { ids, tags } => {
            let mut selection = ctx.selection();
            selection.select_all(ids);
            print_json(&selection.tag_selected(tags.as_slice()).await)?;
        }
        Commands::Delete { ids } => {
            let mut selection = ctx.selection();
            selection.select_all(ids);
            let report = selection.delete_selected().await;
            print_json(&report)?;
        }
        Commands::Feature { id, off } => {
            let record = ctx.set_featured(id, !off).await?;
            print_json(&record)?;
        }
        Commands::Reindex { reconcile } => {
            if reconcile {
                print_json(&ctx.reconcile_index().await)?;
            } else {
                let records = ctx.rebuild_index().await?;
                print_json(&serde_json::json!({ "indexed": records.len() }))?;
            }
        }
    }

    Ok(())
}
