//! On-disk snapshot of the last pricing bundle fetched from the API.
//!
//! Only read when explicitly asked for (offline quoting); a failed live fetch
//! never falls back to it.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::domain::RawPricingBundle;

const SNAPSHOT_DIR: &str = "screenprint-pricing";
const SNAPSHOT_FILENAME: &str = "pricing_bundle.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("data directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Raw bundle plus the moment it was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSnapshot {
    /// RFC 3339 timestamp.
    pub saved_at: String,
    pub bundle: RawPricingBundle,
}

impl BundleSnapshot {
    pub fn new(bundle: RawPricingBundle) -> Result<Self, SnapshotError> {
        Ok(Self {
            saved_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            bundle,
        })
    }

    pub fn age(&self) -> Option<Duration> {
        let saved = OffsetDateTime::parse(&self.saved_at, &Rfc3339).ok()?;
        let elapsed = OffsetDateTime::now_utc() - saved;
        Some(Duration::from_secs(elapsed.whole_seconds().max(0) as u64))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let Some(age) = self.age() else {
            return "unknown".to_string();
        };
        let secs = age.as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

/// Default snapshot location in the platform data directory.
pub fn snapshot_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|base| base.join(SNAPSHOT_DIR).join(SNAPSHOT_FILENAME))
}

pub fn save_snapshot(path: &Path, snapshot: &BundleSnapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content)?;
    log::info!("Saved pricing bundle snapshot to {}", path.display());
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<BundleSnapshot, SnapshotError> {
    let content = fs::read_to_string(path)?;
    let snapshot: BundleSnapshot = serde_json::from_str(&content)?;
    log::info!(
        "Loaded pricing bundle snapshot from {} (age: {})",
        path.display(),
        snapshot.age_string()
    );
    Ok(snapshot)
}

/// Read a bundle exported straight from the API (no snapshot wrapper).
pub fn load_bundle_file(path: &Path) -> Result<RawPricingBundle, SnapshotError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_default_snapshot(bundle: RawPricingBundle) -> Result<PathBuf, SnapshotError> {
    let path = snapshot_path().ok_or(SnapshotError::StorageUnavailable)?;
    save_snapshot(&path, &BundleSnapshot::new(bundle)?)?;
    Ok(path)
}

pub fn load_default_snapshot() -> Result<BundleSnapshot, SnapshotError> {
    let path = snapshot_path().ok_or(SnapshotError::StorageUnavailable)?;
    load_snapshot(&path)
}
