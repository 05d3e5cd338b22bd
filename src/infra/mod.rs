//! Pricing API access and the local bundle snapshot.

pub mod cache;
pub mod pricing_api;

pub use cache::{BundleSnapshot, SnapshotError};
pub use pricing_api::{CacheStatus, CachedPayload, PricingApiClient, PricingApiError};
