//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use rates_types::CurrencyCode;

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub feed_url: String,
    pub feed_timeout: Duration,
    pub update_interval: Duration,
    pub base_currency: CurrencyCode,
    pub listed_currencies: Vec<CurrencyCode>,
    pub rate_limit_per_minute: u32,
    /// `LOG_FORMAT=json` switches to JSON log lines
    pub json_logs: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = var_or("PORT", "3000").parse()?;
        let database_url = var_or("DATABASE_URL", "sqlite://rates.db?mode=rwc");
        let feed_url = var_or("FEED_URL", rates_feed::DEFAULT_FEED_URL);

        let feed_timeout = Duration::from_secs(var_or("FEED_TIMEOUT_SECS", "5").parse()?);
        let update_interval = Duration::from_secs(var_or("UPDATE_INTERVAL_SECS", "600").parse()?);
        if update_interval.is_zero() {
            anyhow::bail!("UPDATE_INTERVAL_SECS must be greater than zero");
        }

        let base_currency = CurrencyCode::new(&var_or("BASE_CURRENCY", "RUB"))?;
        let listed_currencies = CurrencyCode::parse_list(&var_or("LISTED_CURRENCIES", "USD,EUR,GBP"))?;
        let rate_limit_per_minute = var_or("RATE_LIMIT_PER_MINUTE", "100").parse()?;
        let json_logs = var_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json");

        Ok(Self {
            port,
            database_url,
            feed_url,
            feed_timeout,
            update_interval,
            base_currency,
            listed_currencies,
            rate_limit_per_minute,
            json_logs,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
