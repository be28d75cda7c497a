//! Chat command surface.
//!
//! Transport-independent: a line of text comes in, a reply text goes out.
//! Replies are built only from `QueryService`; nothing here writes to the store.

use rust_decimal::Decimal;
use tracing::{info, warn};

use rates_types::{CurrencyCode, QueryError, RateStore, parse_decimal};

use crate::QueryService;

pub const GREETING: &str = "Hello! I show currency exchange rates. \
Use /exchange to convert an amount or /rates to see the latest rates.";
pub const EXCHANGE_USAGE: &str = "Usage: /exchange USD RUB 10";
pub const INVALID_AMOUNT: &str = "Invalid amount format";
pub const UNKNOWN_COMMAND: &str =
    "Unknown command. Try /exchange USD RUB 10, /rates or /help.";
pub const STORE_UNAVAILABLE: &str = "Rates are temporarily unavailable, please try again later.";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Help,
    /// `/exchange FROM TO AMOUNT`, arguments still raw
    Exchange {
        from: String,
        to: String,
        amount: String,
    },
    /// `/exchange` with the wrong number of arguments
    ExchangeUsage,
    Rates,
    Debug,
    Unknown(String),
}

impl Command {
    /// Parses one message. Never fails: anything unrecognised is `Unknown`.
    ///
    /// The command name is case-insensitive and may carry a `@botname` suffix.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split_whitespace();
        let Some(head) = parts.next() else {
            return Command::Unknown(String::new());
        };
        let Some(name) = head.strip_prefix('/') else {
            return Command::Unknown(head.to_string());
        };
        let name = name.split('@').next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        match name.as_str() {
            "start" | "help" => Command::Help,
            "exchange" | "convert" => match args.as_slice() {
                [from, to, amount] => Command::Exchange {
                    from: from.to_string(),
                    to: to.to_string(),
                    amount: amount.to_string(),
                },
                _ => Command::ExchangeUsage,
            },
            "rates" => Command::Rates,
            "debug" => Command::Debug,
            _ => Command::Unknown(name),
        }
    }
}

/// Parses `text` and answers it against `query`.
#[tracing::instrument(skip(query))]
pub async fn respond<S: RateStore>(query: &QueryService<S>, text: &str) -> String {
    let command = Command::parse(text);
    info!(?command, "Received command");

    match command {
        Command::Help => GREETING.to_string(),
        Command::ExchangeUsage => EXCHANGE_USAGE.to_string(),
        Command::Exchange { from, to, amount } => exchange(query, &from, &to, &amount).await,
        Command::Rates => rates(query).await,
        Command::Debug => debug(query).await,
        Command::Unknown(_) => UNKNOWN_COMMAND.to_string(),
    }
}

async fn exchange<S: RateStore>(
    query: &QueryService<S>,
    from: &str,
    to: &str,
    amount: &str,
) -> String {
    let amount: Decimal = match parse_decimal(amount) {
        Ok(amount) => amount,
        Err(_) => return INVALID_AMOUNT.to_string(),
    };
    let from = match CurrencyCode::new(from) {
        Ok(code) => code,
        Err(_) => return format!("Unknown currency: {}", from.trim().to_uppercase()),
    };
    let to = match CurrencyCode::new(to) {
        Ok(code) => code,
        Err(_) => return format!("Unknown currency: {}", to.trim().to_uppercase()),
    };

    match query.convert(amount, &from, &to).await {
        Ok(conversion) => format!(
            "{} {} = {:.2} {}",
            conversion.amount.normalize(),
            conversion.from,
            conversion.rounded(),
            conversion.to
        ),
        Err(QueryError::UnknownCurrency(code)) => format!("Unknown currency: {}", code),
        Err(QueryError::InvalidAmount(_)) => INVALID_AMOUNT.to_string(),
        Err(QueryError::Store(e)) => {
            warn!("Store read failed: {}", e);
            STORE_UNAVAILABLE.to_string()
        }
    }
}

async fn rates<S: RateStore>(query: &QueryService<S>) -> String {
    let listing = match query.default_listing().await {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Store read failed: {}", e);
            return STORE_UNAVAILABLE.to_string();
        }
    };

    let mut reply = String::from("Exchange rates:");
    if listing.rates.is_empty() {
        reply.push_str("\nNo rates cached yet");
    }
    for rate in &listing.rates {
        reply.push_str(&format!("\n{}: {:.2}", rate.code, rate.rounded()));
    }
    if let Some(as_of) = listing.as_of {
        reply.push_str(&format!("\n\nLast update: {}", as_of.format("%d.%m.%Y")));
    }
    reply
}

async fn debug<S: RateStore>(query: &QueryService<S>) -> String {
    let entries = match query.snapshot_dump().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Store read failed: {}", e);
            return STORE_UNAVAILABLE.to_string();
        }
    };

    let mut reply = String::from("Debug info:\n");
    for entry in entries {
        reply.push_str(&format!("{}: {}\n", entry.key, entry.value));
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help_aliases() {
        assert_eq!(Command::parse("/start"), Command::Help);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("  /HELP  "), Command::Help);
        assert_eq!(Command::parse("/help@rates_bot"), Command::Help);
    }

    #[test]
    fn test_parse_exchange() {
        assert_eq!(
            Command::parse("/exchange usd JPY 100"),
            Command::Exchange {
                from: "usd".into(),
                to: "JPY".into(),
                amount: "100".into(),
            }
        );
        assert!(matches!(
            Command::parse("/convert USD EUR 1,5"),
            Command::Exchange { .. }
        ));
    }

    #[test]
    fn test_parse_exchange_wrong_arity() {
        assert_eq!(Command::parse("/exchange"), Command::ExchangeUsage);
        assert_eq!(Command::parse("/exchange USD RUB"), Command::ExchangeUsage);
        assert_eq!(
            Command::parse("/exchange USD RUB 10 extra"),
            Command::ExchangeUsage
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse(""), Command::Unknown(String::new()));
        assert_eq!(Command::parse("hello"), Command::Unknown("hello".into()));
        assert_eq!(Command::parse("/weather"), Command::Unknown("weather".into()));
        assert_eq!(Command::parse("/"), Command::Unknown(String::new()));
    }
}
