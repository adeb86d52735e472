//! On-disk cache for the tree catalog.
//!
//! The file holds the catalog together with the time it was fetched and the
//! source it came from; it is considered fresh for `cache_ttl_hours`, and only
//! for that same source.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;

use super::model::Catalog;

// A century is plenty and keeps `TimeDelta::hours` in range.
const MAX_TTL_HOURS: u64 = 24 * 365 * 100;

#[derive(Debug, Serialize, Deserialize)]
struct CachedCatalog {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    source: String,
    catalog: Catalog,
}

#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
    ttl: TimeDelta,
}

impl CatalogCache {
    pub fn new(path: PathBuf, ttl_hours: u64) -> Self {
        Self {
            path,
            ttl: TimeDelta::hours(ttl_hours.min(MAX_TTL_HOURS) as i64),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached catalog, if one exists for `source` and is younger than the
    /// TTL at `now`.
    pub fn read_fresh(&self, source: &str, now: DateTime<Utc>) -> Option<Catalog> {
        let body = fs::read_to_string(&self.path).ok()?;
        let cached: CachedCatalog = match serde_json::from_str(&body) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring unreadable catalog cache");
                return None;
            }
        };
        if cached.source != source {
            debug!(
                path = %self.path.display(),
                cached = %cached.source,
                wanted = %source,
                "catalog cache belongs to another source"
            );
            return None;
        }
        let age = now.signed_duration_since(cached.timestamp);
        if age < TimeDelta::zero() || age >= self.ttl {
            debug!(path = %self.path.display(), age_secs = age.num_seconds(), "catalog cache expired");
            return None;
        }
        Some(cached.catalog)
    }

    /// Persist `catalog` for `source`, stamped with `now`.
    pub fn write(
        &self,
        source: &str,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| CatalogError::Cache(format!("{}: {e}", dir.display())))?;
        }
        let cached = CachedCatalog {
            timestamp: now,
            source: source.to_string(),
            catalog: catalog.clone(),
        };
        let body = serde_json::to_string(&cached)
            .map_err(|e| CatalogError::Cache(e.to_string()))?;
        fs::write(&self.path, body)
            .map_err(|e| CatalogError::Cache(format!("{}: {e}", self.path.display())))
    }
}
