//! Thin asynchronous client for the pricing proxy's bundle endpoint.
//!
//! - Fetches the screen print bundle (`tiersR`, `allScreenprintCostsR`, `rulesR`).
//! - Keeps an in-memory copy for the configured TTL.
//! - Retries transport failures; a bundle that fails validation is never retried or served.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::ApiConfig;
use crate::domain::{normalize, DataValidationError, PricingTables, RawPricingBundle};

const BUNDLE_PATH: &str = "api/pricing-bundle";
const SCREEN_PRINT_METHOD: &str = "ScreenPrint";
const USER_AGENT: &str = concat!("screenprint-pricing/", env!("CARGO_PKG_VERSION"));
const RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum PricingApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid pricing data: {0}")]
    Validation(#[from] DataValidationError),
}

impl PricingApiError {
    /// Message for the person using the calculator.
    pub fn user_message(&self) -> &'static str {
        crate::domain::LOAD_FAILURE_MESSAGE
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CachedPayload<U> {
        CachedPayload {
            data: f(self.data),
            fetched_at: self.fetched_at,
            status: self.status,
        }
    }
}

#[derive(Clone)]
pub struct PricingApiClient {
    http: Client,
    base_url: Url,
    cache: Arc<Mutex<Option<Cached<ValidatedBundle>>>>,
    ttl: Duration,
    max_attempts: u32,
}

impl PricingApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, PricingApiError> {
        Ok(Self::with_base_url(&config.base_url, config.timeout())?
            .with_ttl(config.cache_ttl())
            .with_max_attempts(config.max_attempts))
    }

    pub fn with_base_url(base: &str, timeout: Duration) -> Result<Self, PricingApiError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            cache: Arc::new(Mutex::new(None)),
            ttl: Duration::from_secs(60 * 60),
            max_attempts: 1,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Raw bundle, validated before it is cached.
    pub async fn get_pricing_bundle(&self) -> Result<CachedPayload<RawPricingBundle>, PricingApiError> {
        Ok(self.get_validated().await?.map(|entry| entry.bundle))
    }

    pub async fn get_pricing_tables(&self) -> Result<CachedPayload<PricingTables>, PricingApiError> {
        Ok(self.get_validated().await?.map(|entry| entry.tables))
    }

    async fn get_validated(&self) -> Result<CachedPayload<ValidatedBundle>, PricingApiError> {
        if let Some(payload) = self.cached_bundle().await {
            log::debug!("Serving cached pricing bundle");
            return Ok(payload);
        }

        let bundle = self.fetch_bundle().await?;
        let tables = normalize(&bundle)?;
        Ok(self.store_bundle(ValidatedBundle { bundle, tables }).await)
    }

    pub async fn clear_cache(&self) {
        *self.cache.lock().await = None;
    }

    async fn fetch_bundle(&self) -> Result<RawPricingBundle, PricingApiError> {
        let mut url = self.url(BUNDLE_PATH)?;
        url.query_pairs_mut()
            .append_pair("method", SCREEN_PRINT_METHOD);

        let mut attempt = 1;
        loop {
            log::info!("Requesting pricing bundle from {url} (attempt {attempt})");
            match self.fetch_json(url.clone()).await {
                Ok(bundle) => {
                    log::info!(
                        "Pricing bundle loaded: {} tiers, {} print costs",
                        bundle.tiers.as_ref().map_or(0, Vec::len),
                        bundle.print_costs.as_ref().map_or(0, Vec::len)
                    );
                    return Ok(bundle);
                }
                Err(error) if attempt < self.max_attempts => {
                    log::warn!("Pricing bundle request failed: {error}; retrying");
                    attempt += 1;
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(error) => {
                    log::error!("Pricing bundle request failed after {attempt} attempts: {error}");
                    return Err(error);
                }
            }
        }
    }

    async fn fetch_json(&self, url: Url) -> Result<RawPricingBundle, PricingApiError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<RawPricingBundle>().await?)
    }

    async fn cached_bundle(&self) -> Option<CachedPayload<ValidatedBundle>> {
        let cache = self.cache.lock().await;
        cache.as_ref().and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn store_bundle(&self, data: ValidatedBundle) -> CachedPayload<ValidatedBundle> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(data.clone(), fetched_at, CacheStatus::Fresh);
        *self.cache.lock().await = Some(Cached::new(data, fetched_at));
        payload
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

/// A fetched bundle with the tables built from it; both are served from one cache entry.
#[derive(Clone)]
struct ValidatedBundle {
    bundle: RawPricingBundle,
    tables: PricingTables,
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
        {
            Some(CachedPayload::new(
                self.value.clone(),
                self.fetched_at,
                CacheStatus::Cached,
            ))
        } else {
            None
        }
    }
}
