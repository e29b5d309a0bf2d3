use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use comanda_core::{load_app_config, LineItem, ReceiptData, ScrapeStatus};
use comanda_pos::{ArtifactSink, HttpArtifactSink, SessionController, SyncClient};

#[derive(Debug, Parser)]
#[command(name = "comanda-cli")]
#[command(about = "Comanda POS automation command line interface")]
struct Cli {
    /// Run the browser with a visible window instead of headless.
    #[arg(long, global = true)]
    headed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the table list and print it as JSON.
    Tables,
    /// Scrape every product category and print the result as JSON.
    Products,
    /// Insert an order described by a JSON file into a table.
    InsertOrder {
        /// Path to a JSON file with the table name, line items and
        /// optional receipt data.
        #[arg(long)]
        file: PathBuf,
    },
    /// Scrape the table list and push it to the sync target.
    SyncTables,
    /// Scrape every product category and push the result to the sync target.
    SyncProducts,
}

/// On-disk shape of the `insert-order` input file.
#[derive(Debug, Deserialize)]
struct OrderFile {
    table: String,
    items: Vec<LineItem>,
    #[serde(default)]
    receipt: Option<ReceiptData>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    let headless = !cli.headed;
    let controller = SessionController::new(config.clone());

    match cli.command {
        Commands::Tables => {
            let tables = controller.scrape_tables(headless).await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
        Commands::Products => {
            let scrape = controller.scrape_products(headless).await?;
            println!("{}", serde_json::to_string_pretty(&scrape)?);
        }
        Commands::InsertOrder { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;
            let order: OrderFile = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid order file {}: {e}", file.display()))?;

            let result = controller
                .insert_order(&order.table, &order.items, order.receipt.as_ref(), headless)
                .await;

            if let (Some(url), Some(png)) = (&config.artifact_sink_url, &result.screenshot) {
                match HttpArtifactSink::new(url) {
                    Ok(sink) => {
                        if let Err(e) = sink.store_screenshot(chrono::Utc::now(), png).await {
                            tracing::warn!(error = %e, "failed to store confirmation screenshot");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to build artifact sink"),
                }
            }

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::SyncTables => {
            let sync = sync_client(&config)?;
            let tables = controller.scrape_tables(headless).await?;
            sync.push_tables(&tables).await?;
            println!("pushed {} tables", tables.len());
        }
        Commands::SyncProducts => {
            let sync = sync_client(&config)?;
            let scrape = controller.scrape_products(headless).await?;
            if let ScrapeStatus::Aborted { category_index, .. } = &scrape.status {
                tracing::warn!(
                    category_index,
                    "scrape aborted early, pushing partial results"
                );
            }
            sync.push_products(&scrape.products).await?;
            println!("pushed {} products", scrape.products.len());
        }
    }

    Ok(())
}

fn sync_client(config: &comanda_core::AppConfig) -> anyhow::Result<SyncClient> {
    let base_url = config
        .sync_base_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("COMANDA_SYNC_BASE_URL is not set"))?;
    Ok(SyncClient::new(
        base_url,
        Duration::from_secs(config.sync_timeout_secs),
    )?)
}
