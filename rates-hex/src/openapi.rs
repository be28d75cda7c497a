//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use rates_types::dto::{
    CommandReply, Conversion, ConvertQuery, ListingQuery, RateListing, RefreshResponse,
    StoreEntry,
};
use rates_types::{CurrencyCode, Rate};
use utoipa::OpenApi;

// Dummy functions to generate path documentation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Cached rates for a set of codes
#[utoipa::path(
    get,
    path = "/api/rates",
    tag = "rates",
    params(
        ("codes" = Option<String>, Query, description = "Comma-separated codes; the configured list when absent")
    ),
    responses(
        (status = 200, description = "Known rates plus the as-of date", body = RateListing),
        (status = 400, description = "Malformed currency code")
    )
)]
async fn list_rates() {}

/// Per-unit rate of one currency
#[utoipa::path(
    get,
    path = "/api/rates/{code}",
    tag = "rates",
    params(
        ("code" = String, Path, description = "Three-letter currency code")
    ),
    responses(
        (status = 200, description = "Rate found", body = Rate),
        (status = 400, description = "Malformed currency code"),
        (status = 404, description = "No rate cached for this currency")
    )
)]
async fn get_rate() {}

/// Convert an amount between two currencies
#[utoipa::path(
    get,
    path = "/api/convert",
    tag = "rates",
    params(
        ("from" = String, Query, description = "Source currency"),
        ("to" = String, Query, description = "Target currency"),
        ("amount" = String, Query, description = "Non-negative decimal amount")
    ),
    responses(
        (status = 200, description = "Unrounded conversion result", body = Conversion),
        (status = 400, description = "Invalid amount or code"),
        (status = 404, description = "Unknown currency")
    )
)]
async fn convert() {}

/// Raw store contents
#[utoipa::path(
    get,
    path = "/api/debug",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Every stored key and value", body = Vec<StoreEntry>)
    )
)]
async fn debug() {}

/// Answer a chat command
#[utoipa::path(
    post,
    path = "/api/command",
    tag = "commands",
    request_body(content = String, content_type = "text/plain", description = "Command text, e.g. `/exchange USD RUB 10`"),
    responses(
        (status = 200, description = "Reply text", body = CommandReply)
    )
)]
async fn command() {}

/// Run one update pass now
#[utoipa::path(
    post,
    path = "/api/refresh",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Pass completed", body = RefreshResponse),
        (status = 409, description = "A pass is already running"),
        (status = 502, description = "Feed could not be fetched or parsed")
    )
)]
async fn refresh() {}

/// OpenAPI documentation for the exchange rate API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Exchange Rate Cache API",
        version = "1.0.0",
        description = "Cached central bank exchange rates, currency conversion and a chat-style command endpoint.\n\nAll rates are expressed in the base currency. Results are read from a cache refreshed on a fixed interval; `as_of` tells which feed date they belong to.",
        license(name = "MIT"),
    ),
    paths(health, list_rates, get_rate, convert, debug, command, refresh),
    components(
        schemas(
            CurrencyCode,
            Rate,
            RateListing,
            Conversion,
            ConvertQuery,
            ListingQuery,
            StoreEntry,
            CommandReply,
            RefreshResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rates", description = "Rate lookups and conversions"),
        (name = "commands", description = "Chat command surface"),
        (name = "diagnostics", description = "Store dump and manual refresh"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/rates",
            "/api/rates/{code}",
            "/api/convert",
            "/api/debug",
            "/api/command",
            "/api/refresh",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
