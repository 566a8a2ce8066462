//! CLI commands and output formatting for the listing.

use super::files::FileCatalogSource;
use super::listing::MarketplaceListing;
use super::query::{QueryPage, QueryParams, SortDirection, SortKey, query};
use super::reconcile::Reconciler;
use super::record::AppRecord;
use crate::config::MarketviewConfig;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use marketview_client::{NotificationHub, PushNotification};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

/// Listing subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum MarketplaceCommand {
    /// Print one page of the reconciled listing
    List(QueryArgs),

    /// Print the listing and reprint it as push notifications arrive
    Watch {
        #[command(flatten)]
        query: QueryArgs,

        /// File of JSON-line notifications (default: stdin)
        #[arg(short, long, value_name = "FILE")]
        events: Option<PathBuf>,
    },
}

/// Options shared by the listing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Only show apps whose name contains TEXT (case-insensitive)
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Sort by name descending
    #[arg(long)]
    pub desc: bool,

    /// Index of the first row to show
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Rows per page (default: from config)
    #[arg(long, value_name = "N")]
    pub page_size: Option<NonZeroUsize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryArgs {
    /// Query parameters, falling back to `defaults` for anything not given.
    pub fn params(&self, defaults: QueryParams) -> QueryParams {
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            defaults.sort_direction
        };
        let page_size = self.page_size.unwrap_or(defaults.page_size);
        defaults
            .with_filter(self.filter.clone().unwrap_or_default())
            .with_sort(SortKey::Name, direction)
            .with_offset(self.offset)
            .with_page_size(page_size)
    }
}

/// Execute a listing command.
pub async fn execute(command: MarketplaceCommand, config: &MarketviewConfig) -> Result<()> {
    match command {
        MarketplaceCommand::List(args) => handle_list(args, config).await,
        MarketplaceCommand::Watch { query, events } => handle_watch(query, events, config).await,
    }
}

async fn handle_list(args: QueryArgs, config: &MarketviewConfig) -> Result<()> {
    let source = Arc::new(FileCatalogSource::from_config(&config.sources));
    let collection = Reconciler::new(source, config.sync.fetch_timeout())
        .load()
        .await
        .context("Failed to load marketplace listing")?;

    let page = query(&collection, &args.params(config.query_params()));
    print_page(&page, args.json)
}

async fn handle_watch(
    args: QueryArgs,
    events: Option<PathBuf>,
    config: &MarketviewConfig,
) -> Result<()> {
    let reader: Box<dyn AsyncBufRead + Send + Unpin> = match &events {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let source = Arc::new(FileCatalogSource::from_config(&config.sources));
    let hub = NotificationHub::new(config.sync.event_buffer);
    let listing = Arc::new(MarketplaceListing::new(source, &config.sync));
    let subscription = listing
        .mount(&hub)
        .await
        .context("Failed to mount marketplace listing")?;

    let mut live = listing.live_query(args.params(config.query_params()));
    let json = args.json;
    let printer = tokio::spawn(async move {
        loop {
            print_page(live.page(), json)?;
            if !live.changed().await {
                return Ok::<(), anyhow::Error>(());
            }
        }
    });

    let (shutdown_tx, shutdown) = watch::channel(false);
    let runner = {
        let listing = Arc::clone(&listing);
        tokio::spawn(async move { listing.run(subscription, shutdown).await })
    };

    tokio::select! {
        fed = feed_notifications(&hub, reader) => {
            let count = fed?;
            info!("Published {count} notifications");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping listing");
            let _ = shutdown_tx.send(true);
        }
    }
    hub.close();

    let stats = runner.await.context("Listing task failed")?;
    drop(listing);
    printer.await.context("Printer task failed")??;

    eprintln!(
        "{} applied, {} ignored, {} malformed, {} failed",
        stats.applied, stats.ignored, stats.malformed, stats.failed
    );
    Ok(())
}

/// Publish every JSON line read from `reader`. Lines that are not
/// notifications are skipped.
async fn feed_notifications(
    hub: &NotificationHub,
    reader: impl AsyncBufRead + Unpin,
) -> Result<usize> {
    let mut lines = reader.lines();
    let mut published = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match PushNotification::from_json(line) {
            Ok(notification) => {
                hub.publish(notification).await?;
                published += 1;
            }
            Err(e) => warn!("Skipping unreadable notification line: {e}"),
        }
    }
    Ok(published)
}

fn print_page(page: &QueryPage, json: bool) -> Result<()> {
    if json {
        println!("{}", format_json(page)?);
        return Ok(());
    }

    if page.items.is_empty() {
        eprintln!("No apps found");
        return Ok(());
    }
    print!("{}", format_table(&HEADERS, page.items.iter().map(|r| row(r.as_ref())).collect()));
    eprintln!(
        "Showing {}-{} of {}",
        page.offset + 1,
        page.offset + page.items.len(),
        page.total
    );
    Ok(())
}

const HEADERS: [&str; 5] = ["NAME", "AUTHOR", "VERSION", "MARKETPLACE", "STATUS"];

fn row(record: &AppRecord) -> Vec<String> {
    let status = match record.status() {
        Some(status) if record.has_update() => format!("{status} (update)"),
        Some(status) => status.to_string(),
        None => "-".to_string(),
    };
    vec![
        record.name.clone(),
        record.author.name.clone(),
        record.version().to_string(),
        record.marketplace_version().to_string(),
        status,
    ]
}

/// Render rows as aligned columns under a dashed header.
fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.iter().map(ToString::to_string).collect());
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}

fn format_json<T: serde::Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}
