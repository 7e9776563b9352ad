//! Environment-backed settings.

use std::env;
use std::str::FromStr;

use crate::ImportError;

/// Default destination server URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default destination index prefix.
const DEFAULT_INDEX_PREFIX: &str = "georequetes";

/// Default index holding the raw query logs to scan.
const DEFAULT_SCAN_INDEX: &str = "syn_es_data_geo";

const DEFAULT_BULK_SIZE: usize = 500;
const DEFAULT_BULK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCAN_BATCH_SIZE: usize = 200;
const DEFAULT_SHARDS: u32 = 1;
const DEFAULT_REPLICAS: u32 = 0;

/// Runtime settings, read from the environment with defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Destination server URL (`OPENSEARCH_URL`).
    pub opensearch_url: String,
    /// Destination index prefix (`GEO_INDEX`).
    pub index_prefix: String,
    /// Source index for the query-log scan (`GEO_SCAN_INDEX`).
    pub scan_index: String,
    /// Bulk batch size (`GEO_BULK_SIZE`).
    pub bulk_size: usize,
    /// Per-submission timeout in seconds (`GEO_BULK_TIMEOUT_SECS`).
    pub bulk_timeout_secs: u64,
    /// Scan page size (`GEO_SCAN_BATCH_SIZE`).
    pub scan_batch_size: usize,
    /// Primary shard count for created indices (`GEO_SHARDS`).
    pub shards: u32,
    /// Replica count for created indices (`GEO_REPLICAS`).
    pub replicas: u32,
}

impl Settings {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ImportError> {
        Ok(Self {
            opensearch_url: string_var("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            index_prefix: string_var("GEO_INDEX", DEFAULT_INDEX_PREFIX),
            scan_index: string_var("GEO_SCAN_INDEX", DEFAULT_SCAN_INDEX),
            bulk_size: parsed_var("GEO_BULK_SIZE", DEFAULT_BULK_SIZE)?,
            bulk_timeout_secs: parsed_var("GEO_BULK_TIMEOUT_SECS", DEFAULT_BULK_TIMEOUT_SECS)?,
            scan_batch_size: parsed_var("GEO_SCAN_BATCH_SIZE", DEFAULT_SCAN_BATCH_SIZE)?,
            shards: parsed_var("GEO_SHARDS", DEFAULT_SHARDS)?,
            replicas: parsed_var("GEO_REPLICAS", DEFAULT_REPLICAS)?,
        })
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, ImportError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ImportError::config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
