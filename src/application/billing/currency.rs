//! Currency conversion over a cached USD-basis rate table
//!
//! The converter owns the only cross-request state in the billing path: a
//! rate table that expires after `ttl`. Readers share it through an
//! `RwLock`; a miss takes `refresh_lock` so at most one provider call is in
//! flight, and callers that queued behind it reuse its result.
//!
//! Conversion rounds twice, once after the USD leg and once after the
//! target leg. Round trips can drift by a unit in the last place.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::money::{normalize_currency, round_money};
use crate::domain::RateProvider;

/// Approximate USD value of one unit of each currency.
const FALLBACK_USD_PER_UNIT: &[(&str, i64, u32)] = &[
    ("USD", 1, 0),
    ("EGP", 205, 4),
    ("EUR", 108, 2),
    ("GBP", 127, 2),
    ("SAR", 2667, 4),
    ("AED", 2723, 4),
    ("KWD", 325, 2),
    ("QAR", 2747, 4),
    ("CAD", 74, 2),
    ("AUD", 66, 2),
];

/// Immutable snapshot: currency code → USD per unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    usd_per_unit: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn fallback() -> Self {
        let usd_per_unit = FALLBACK_USD_PER_UNIT
            .iter()
            .map(|(code, mantissa, scale)| (code.to_string(), Decimal::new(*mantissa, *scale)))
            .collect();
        Self { usd_per_unit }
    }

    /// Build from a provider payload of units per 1 USD. Entries that are
    /// zero, negative or too small to invert are dropped; currencies the
    /// provider omits keep their fallback value.
    pub fn from_units_per_usd(units_per_usd: &HashMap<String, Decimal>) -> Self {
        let mut table = Self::fallback();
        for (code, units) in units_per_usd {
            if *units <= Decimal::ZERO {
                continue;
            }
            match Decimal::ONE.checked_div(*units) {
                Some(rate) if !rate.is_zero() => {
                    table.usd_per_unit.insert(normalize_currency(code), rate);
                }
                _ => warn!(currency = %code, %units, "provider rate out of range, ignored"),
            }
        }
        table.usd_per_unit.insert("USD".to_string(), Decimal::ONE);
        table
    }

    pub fn usd_per_unit(&self, code: &str) -> Option<Decimal> {
        self.usd_per_unit.get(&normalize_currency(code)).copied()
    }

    /// Convert `amount` from one currency to another through USD.
    ///
    /// Same currency returns the rounded input. An unknown currency on
    /// either side also returns the rounded input, unconverted.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        let from = normalize_currency(from);
        let to = normalize_currency(to);
        if from == to {
            return round_money(amount);
        }

        let (Some(from_rate), Some(to_rate)) = (self.usd_per_unit(&from), self.usd_per_unit(&to))
        else {
            debug!(%from, %to, "unknown currency, amount left unconverted");
            return round_money(amount);
        };

        let converted = amount
            .checked_mul(from_rate)
            .map(round_money)
            .and_then(|usd| usd.checked_div(to_rate));
        match converted {
            Some(value) => round_money(value),
            None => {
                warn!(%from, %to, %amount, "conversion overflowed, amount left unconverted");
                round_money(amount)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.usd_per_unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usd_per_unit.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConverterSettings {
    /// How long a fetched table stays fresh.
    pub ttl: Duration,
    /// Upper bound on a single provider call.
    pub request_timeout: Duration,
    /// How long the fallback table is served after a failed fetch.
    pub failure_backoff: Duration,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(5),
            failure_backoff: Duration::from_secs(60),
        }
    }
}

struct CachedRates {
    table: Arc<RateTable>,
    expires_at: Instant,
}

impl CachedRates {
    fn fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

pub struct CurrencyConverter {
    provider: Arc<dyn RateProvider>,
    settings: ConverterSettings,
    cache: RwLock<Option<CachedRates>>,
    refresh_lock: Mutex<()>,
}

impl CurrencyConverter {
    pub fn new(provider: Arc<dyn RateProvider>, settings: ConverterSettings) -> Self {
        Self {
            provider,
            settings,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current rate table, refreshing it first if it has expired. Never
    /// fails: provider errors and timeouts degrade to the fallback table.
    pub async fn rates(&self) -> Arc<RateTable> {
        if let Some(table) = self.cached(Instant::now()).await {
            return table;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(table) = self.cached(Instant::now()).await {
            return table;
        }

        let (table, lifetime) = self.fetch().await;
        let table = Arc::new(table);
        *self.cache.write().await = Some(CachedRates {
            table: table.clone(),
            expires_at: Instant::now() + lifetime,
        });
        table
    }

    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        if normalize_currency(from) == normalize_currency(to) {
            return round_money(amount);
        }
        self.rates().await.convert(amount, from, to)
    }

    /// Size and remaining lifetime of the cached table, without fetching.
    /// `None` until the first conversion or after expiry.
    pub async fn cache_status(&self) -> Option<(usize, Duration)> {
        let now = Instant::now();
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.fresh(now))
            .map(|cached| (cached.table.len(), cached.expires_at - now))
    }

    async fn cached(&self, now: Instant) -> Option<Arc<RateTable>> {
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.fresh(now))
            .map(|cached| cached.table.clone())
    }

    async fn fetch(&self) -> (RateTable, Duration) {
        let outcome =
            tokio::time::timeout(self.settings.request_timeout, self.provider.fetch_units_per_usd())
                .await;

        match outcome {
            Ok(Ok(units)) if !units.is_empty() => {
                metrics::counter!("currency_rate_refresh_total", "outcome" => "ok").increment(1);
                debug!(currencies = units.len(), "exchange rates refreshed");
                (RateTable::from_units_per_usd(&units), self.settings.ttl)
            }
            Ok(Ok(_)) => {
                metrics::counter!("currency_rate_refresh_total", "outcome" => "empty").increment(1);
                warn!("rate provider returned no rates, using fallback table");
                (RateTable::fallback(), self.settings.failure_backoff)
            }
            Ok(Err(e)) => {
                metrics::counter!("currency_rate_refresh_total", "outcome" => "error").increment(1);
                warn!(error = %e, "rate provider failed, using fallback table");
                (RateTable::fallback(), self.settings.failure_backoff)
            }
            Err(_) => {
                metrics::counter!("currency_rate_refresh_total", "outcome" => "timeout")
                    .increment(1);
                warn!(
                    timeout_ms = self.settings.request_timeout.as_millis() as u64,
                    "rate provider timed out, using fallback table"
                );
                (RateTable::fallback(), self.settings.failure_backoff)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::RateProviderError;
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// Provider that serves a fixed payload, optionally after a delay, and
    /// counts how often it was asked.
    pub(crate) struct ScriptedProvider {
        rates: Option<HashMap<String, Decimal>>,
        delay: Duration,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub(crate) fn serving(pairs: &[(&str, &str)]) -> Self {
            Self {
                rates: Some(pairs.iter().map(|(c, r)| (c.to_string(), dec(r))).collect()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                rates: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl RateProvider for ScriptedProvider {
        async fn fetch_units_per_usd(&self) -> Result<HashMap<String, Decimal>, RateProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.rates
                .clone()
                .ok_or_else(|| RateProviderError::Request("connection refused".into()))
        }
    }

    #[test]
    fn same_currency_only_rounds() {
        let table = RateTable::fallback();
        assert_eq!(table.convert(dec("10.12345"), "EGP", "egp"), dec("10.123"));
    }

    #[test]
    fn converts_through_usd_rounding_each_leg() {
        let table = RateTable::fallback();
        // 1000 EGP → 20.5 USD → 18.981 EUR
        assert_eq!(table.convert(dec("1000"), "EGP", "USD"), dec("20.5"));
        assert_eq!(table.convert(dec("1000"), "EGP", "EUR"), dec("18.981"));
        // 0.01 EGP is 0.000205 USD, which rounds to 0 on the first leg
        assert_eq!(table.convert(dec("0.01"), "EGP", "EUR"), dec("0"));
    }

    #[test]
    fn unknown_currency_is_returned_unconverted() {
        let table = RateTable::fallback();
        assert_eq!(table.convert(dec("12.3456"), "XYZ", "USD"), dec("12.346"));
        assert_eq!(table.convert(dec("5"), "USD", "XYZ"), dec("5"));
    }

    #[test]
    fn provider_units_are_inverted_and_merged_with_fallback() {
        let units: HashMap<String, Decimal> =
            [("egp".to_string(), dec("50")), ("JPY".to_string(), dec("0"))].into();
        let table = RateTable::from_units_per_usd(&units);
        assert_eq!(table.usd_per_unit("EGP"), Some(dec("0.02")));
        assert_eq!(table.usd_per_unit("GBP"), Some(dec("1.27")));
        assert_eq!(table.usd_per_unit("JPY"), None);
        assert_eq!(table.usd_per_unit("USD"), Some(Decimal::ONE));
    }

    #[test]
    fn extreme_provider_rates_never_panic() {
        let units: HashMap<String, Decimal> = [
            ("XTS".to_string(), dec("0.00000000000000000001")),
            ("XAG".to_string(), Decimal::MAX),
        ]
        .into();
        let table = RateTable::from_units_per_usd(&units);
        // 1 / 1e-20 is still representable, the product below is not.
        assert_eq!(table.usd_per_unit("XTS"), Some(dec("100000000000000000000")));
        // 1 / MAX rounds to zero and is dropped.
        assert_eq!(table.usd_per_unit("XAG"), None);

        assert_eq!(
            table.convert(dec("1000000000"), "XTS", "USD"),
            dec("1000000000.000")
        );
        assert_eq!(table.convert(Decimal::MAX, "USD", "EGP"), round_money(Decimal::MAX));
    }

    #[test]
    fn round_trip_stays_within_rounding_tolerance() {
        let table = RateTable::fallback();
        for amount in ["1", "125", "999.999", "0.5"] {
            let x = dec(amount);
            for (a, b) in [("EGP", "USD"), ("USD", "EUR"), ("GBP", "SAR")] {
                let ra = table.usd_per_unit(a).unwrap();
                let rb = table.usd_per_unit(b).unwrap();
                // Four half-unit roundings, expressed in units of `a`.
                let tolerance = dec("0.0005") * ((rb + dec("3")) / ra + Decimal::ONE);
                let back = table.convert(table.convert(x, a, b), b, a);
                assert!((back - x).abs() <= tolerance, "{} {}→{}: got {}", x, a, b, back);
            }
        }
    }

    #[tokio::test]
    async fn fresh_table_is_reused() {
        let provider = Arc::new(ScriptedProvider::serving(&[("EGP", "50")]));
        let converter = CurrencyConverter::new(provider.clone(), ConverterSettings::default());
        assert!(converter.cache_status().await.is_none());

        assert_eq!(converter.convert(dec("100"), "EGP", "USD").await, dec("2"));
        let (currencies, remaining) = converter.cache_status().await.unwrap();
        assert_eq!(currencies, RateTable::fallback().len());
        assert!(remaining <= Duration::from_secs(3600));
        assert_eq!(converter.convert(dec("200"), "EGP", "USD").await, dec("4"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_table_is_refetched() {
        let provider = Arc::new(ScriptedProvider::serving(&[("EGP", "50")]));
        let settings = ConverterSettings {
            ttl: Duration::ZERO,
            ..Default::default()
        };
        let converter = CurrencyConverter::new(provider.clone(), settings);

        converter.rates().await;
        converter.rates().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let provider = Arc::new(
            ScriptedProvider::serving(&[("EGP", "50")]).delayed(Duration::from_millis(50)),
        );
        let converter = Arc::new(CurrencyConverter::new(
            provider.clone(),
            ConverterSettings::default(),
        ));

        let readers: Vec<_> = (0..16)
            .map(|_| {
                let converter = converter.clone();
                tokio::spawn(async move { converter.rates().await })
            })
            .collect();
        for reader in readers {
            let table = reader.await.unwrap();
            assert_eq!(table.usd_per_unit("EGP"), Some(dec("0.02")));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback() {
        let provider = Arc::new(ScriptedProvider::failing());
        let converter = CurrencyConverter::new(provider.clone(), ConverterSettings::default());

        assert_eq!(converter.convert(dec("1000"), "EGP", "USD").await, dec("20.5"));
        // The fallback is cached for the backoff window, no retry storm.
        converter.convert(dec("1"), "EGP", "USD").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_provider_is_cut_off() {
        let provider = Arc::new(
            ScriptedProvider::serving(&[("EGP", "50")]).delayed(Duration::from_secs(5)),
        );
        let settings = ConverterSettings {
            request_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let converter = CurrencyConverter::new(provider, settings);

        let table = converter.rates().await;
        assert_eq!(*table, RateTable::fallback());
    }

    #[tokio::test]
    async fn same_currency_skips_the_provider() {
        let provider = Arc::new(ScriptedProvider::failing());
        let converter = CurrencyConverter::new(provider.clone(), ConverterSettings::default());
        assert_eq!(converter.convert(dec("7.0004"), "USD", "USD").await, dec("7.000"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
