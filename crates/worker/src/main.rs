use anyhow::Context;
use clap::Parser;
use stockfeed_core::domain::analytics::Symbol;
use stockfeed_core::ingest::provider::{AnalyticsProvider, RapidApiAnalyticsClient};
use stockfeed_core::storage::PgWarehouse;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stockfeed_worker")]
struct Args {
    /// Comma-separated ticker symbols. Defaults to the built-in set.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Fetch and print records, but do not touch the warehouse.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockfeed_core::config::Settings::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let symbols = resolve_symbols(&args.symbols)?;

    let provider = RapidApiAnalyticsClient::from_env()?;
    tracing::info!(
        provider = provider.provider_name(),
        symbols = symbols.len(),
        "fetching stock analytics"
    );

    let batch = stockfeed_core::ingest::collect_batch(
        &provider,
        &symbols,
        settings.rapidapi_key.as_deref(),
    )
    .await;

    if args.dry_run {
        for record in &batch {
            println!(
                "{}",
                serde_json::to_string(record).context("serialize analytics record failed")?
            );
        }
        tracing::info!(dry_run = true, records = batch.len(), "skipping warehouse load");
        return Ok(());
    }

    let warehouse = PgWarehouse::new(&settings);
    let summary = stockfeed_core::storage::load_batch(&warehouse, &batch).await?;

    tracing::info!(
        attempted = summary.attempted,
        inserted = summary.inserted,
        failed = summary.failed,
        "run complete"
    );
    Ok(())
}

fn resolve_symbols(args: &[String]) -> anyhow::Result<Vec<Symbol>> {
    let given: Vec<&str> = args
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if given.is_empty() {
        return Ok(Symbol::defaults());
    }

    given
        .into_iter()
        .map(|s| Symbol::parse(s).with_context(|| format!("invalid --symbols entry {s:?}")))
        .collect()
}
