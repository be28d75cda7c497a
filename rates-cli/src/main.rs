//! Rates CLI
//!
//! Operator tool working directly against the rate store. `update` and
//! `schedule` write through the same update cycle as the server, so they can
//! run next to it as a second producer on a shared database.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rates_feed::{DEFAULT_FEED_URL, FileFeed, HttpFeedClient};
use rates_hex::{QueryService, Scheduler, UpdateCycle, inbound::commands};
use rates_repo::{Store, build_store};
use rates_types::{CurrencyCode, FeedSource, FetchError, UpdateResult, parse_decimal};

#[derive(Parser)]
#[command(name = "rates")]
#[command(author, version, about = "Exchange rate cache CLI", long_about = None)]
struct Cli {
    /// Store URL (sqlite://..., postgres://..., memory://)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://rates.db?mode=rwc")]
    database_url: String,

    /// URL of the daily rates feed
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// Read the feed from a saved file instead of the network (wins over --feed-url)
    #[arg(long)]
    feed_file: Option<PathBuf>,

    /// Feed request timeout in seconds
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value_t = 5)]
    timeout: u64,

    /// Currency every rate is expressed in
    #[arg(long, env = "BASE_CURRENCY", default_value = "RUB")]
    base: String,

    /// Codes shown by `rates` when none are given
    #[arg(long, env = "LISTED_CURRENCIES", default_value = "USD,EUR,GBP")]
    listed: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one update pass and exit
    Update,
    /// Run the update pass now and then on a fixed interval, without the HTTP server
    Schedule {
        /// Seconds between passes
        #[arg(long, env = "UPDATE_INTERVAL_SECS", default_value_t = 600)]
        interval: u64,
    },
    /// Show cached rates
    Rates {
        /// Codes to show; the configured list when empty
        codes: Vec<String>,

        /// Show every code with a stored rate
        #[arg(long)]
        all: bool,
    },
    /// Convert an amount between two currencies
    Convert {
        from: String,
        to: String,
        amount: String,
    },
    /// Dump every stored key and value
    Debug,
    /// Answer a chat command, e.g. "/exchange USD RUB 10"
    Command {
        /// Command text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

/// Network or file feed, picked from the flags.
enum Feed {
    Http(HttpFeedClient),
    File(FileFeed),
}

#[async_trait]
impl FeedSource for Feed {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        match self {
            Feed::Http(client) => client.fetch().await,
            Feed::File(file) => file.fetch().await,
        }
    }
}

impl Cli {
    fn feed(&self) -> Result<Feed> {
        Ok(match &self.feed_file {
            Some(path) => Feed::File(FileFeed::new(path)),
            None => Feed::Http(HttpFeedClient::new(
                &self.feed_url,
                Duration::from_secs(self.timeout),
            )?),
        })
    }

    fn query(&self, store: Arc<Store>) -> Result<QueryService<Arc<Store>>> {
        let base = CurrencyCode::new(&self.base)?;
        let listed = CurrencyCode::parse_list(&self.listed)?;
        Ok(QueryService::new(store, base).with_listed(listed))
    }
}

fn print_result(result: &UpdateResult) -> ExitCode {
    match result {
        UpdateResult::Succeeded(report) => {
            println!(
                "✓ Rates as of {}: {} written, {} skipped",
                report.as_of,
                report.written_count(),
                report.skipped_count()
            );
            for skipped in &report.skipped {
                println!("  skipped {}", skipped);
            }
            ExitCode::SUCCESS
        }
        UpdateResult::Failed(reason) => {
            eprintln!("✗ Update failed, cached rates kept: {}", reason);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,rates_hex=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(build_store(&cli.database_url).await?);

    match &cli.command {
        Commands::Update => {
            let cycle = UpdateCycle::new(cli.feed()?, store);
            return Ok(print_result(&cycle.run().await));
        }

        Commands::Schedule { interval } => {
            if *interval == 0 {
                anyhow::bail!("--interval must be greater than zero");
            }
            let cycle = UpdateCycle::new(cli.feed()?, store);
            let scheduler = Scheduler::new(cycle, Duration::from_secs(*interval));
            println!("Updating every {}s, Ctrl+C to stop", scheduler.period().as_secs());

            tokio::select! {
                _ = scheduler.run() => {},
                _ = tokio::signal::ctrl_c() => println!("Stopped"),
            }
        }

        Commands::Rates { codes, all } => {
            let query = cli.query(store)?;
            let listing = if *all {
                let codes: Vec<_> = query.known_codes().await?.into_iter().collect();
                query.listing(&codes).await?
            } else if codes.is_empty() {
                query.default_listing().await?
            } else {
                let codes = codes
                    .iter()
                    .map(|c| CurrencyCode::new(c))
                    .collect::<Result<Vec<_>, _>>()?;
                query.listing(&codes).await?
            };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }

        Commands::Convert { from, to, amount } => {
            let query = cli.query(store)?;
            let amount = parse_decimal(amount)?;
            let conversion = query
                .convert(amount, &CurrencyCode::new(from)?, &CurrencyCode::new(to)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&conversion)?);
        }

        Commands::Debug => {
            let query = cli.query(store)?;
            println!("{}", serde_json::to_string_pretty(&query.snapshot_dump().await?)?);
        }

        Commands::Command { text } => {
            let query = cli.query(store)?;
            println!("{}", commands::respond(&query, &text.join(" ")).await);
        }
    }

    Ok(ExitCode::SUCCESS)
}
