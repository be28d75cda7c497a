//! Query Application Service
//!
//! Read-only view of the rate store. Contains NO write path.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use rates_types::{
    Conversion, CurrencyCode, QueryError, Rate, RateListing, RateStore, StoreEntry,
};

/// Codes shown by a listing when none are requested.
pub const DEFAULT_LISTED: [&str; 3] = ["USD", "EUR", "GBP"];

/// Application service answering rate, conversion and listing requests.
///
/// Generic over `S: RateStore` - the adapter is injected at construction.
pub struct QueryService<S: RateStore> {
    store: S,
    base: CurrencyCode,
    listed: Vec<CurrencyCode>,
}

impl<S: RateStore> QueryService<S> {
    /// Creates a query service over `store`, with `base` as the currency all
    /// stored rates are expressed in.
    pub fn new(store: S, base: CurrencyCode) -> Self {
        let listed = DEFAULT_LISTED
            .iter()
            .filter_map(|c| CurrencyCode::new(c).ok())
            .collect();
        Self {
            store,
            base,
            listed,
        }
    }

    /// Replaces the codes used by `default_listing`.
    pub fn with_listed(mut self, listed: Vec<CurrencyCode>) -> Self {
        self.listed = listed;
        self
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn listed(&self) -> &[CurrencyCode] {
        &self.listed
    }

    /// Looks up the per-unit rate of `code`.
    ///
    /// The base currency is never stored. Resolving it to exactly 1 here is
    /// the only place a rate is substituted; every other miss is reported as
    /// `UnknownCurrency`.
    pub async fn rate(&self, code: &CurrencyCode) -> Result<Rate, QueryError> {
        if *code == self.base {
            return Ok(Rate::base(code.clone()));
        }
        self.store
            .get(code)
            .await?
            .ok_or_else(|| QueryError::UnknownCurrency(code.clone()))
    }

    /// Converts `amount` units of `from` into `to`.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Conversion, QueryError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(QueryError::InvalidAmount("Amount cannot be negative".into()));
        }

        let from_rate = self.rate(from).await?;
        let to_rate = self.rate(to).await?;

        let result = if from == to {
            amount
        } else {
            amount
                .checked_mul(from_rate.per_unit_value)
                .and_then(|v| v.checked_div(to_rate.per_unit_value))
                .ok_or_else(|| QueryError::InvalidAmount("Amount is out of range".into()))?
        };

        Ok(Conversion {
            amount,
            from: from.clone(),
            to: to.clone(),
            result,
            as_of: self.store.get_as_of().await?,
        })
    }

    /// Rates for `codes`, omitting codes the store does not know.
    pub async fn listing(&self, codes: &[CurrencyCode]) -> Result<RateListing, QueryError> {
        let mut rates = Vec::with_capacity(codes.len());
        for code in codes {
            match self.rate(code).await {
                Ok(rate) => rates.push(rate),
                Err(QueryError::UnknownCurrency(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(RateListing {
            rates,
            as_of: self.store.get_as_of().await?,
        })
    }

    /// Listing of the configured codes.
    pub async fn default_listing(&self) -> Result<RateListing, QueryError> {
        self.listing(&self.listed).await
    }

    /// Every code with a stored rate.
    pub async fn known_codes(&self) -> Result<BTreeSet<CurrencyCode>, QueryError> {
        Ok(self.store.list_codes().await?)
    }

    /// Every stored key and value, verbatim.
    pub async fn snapshot_dump(&self) -> Result<Vec<StoreEntry>, QueryError> {
        Ok(self.store.entries().await?)
    }
}
