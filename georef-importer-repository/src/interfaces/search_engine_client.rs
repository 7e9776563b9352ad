//! Search engine client trait definition.
//!
//! This module defines the abstract interface for the destination search
//! engine, allowing for different backend implementations (OpenSearch, mock).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::types::{BulkSummary, ScanPage};
use georef_importer_shared::{DocumentType, OutputDocument};

/// Abstract interface for the destination search engine.
///
/// Each document type owns a physical index derived from the configured
/// prefix; all type-addressed methods resolve the index name internally.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is reachable
    /// * `Ok(false)` - If the search engine answered but is unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;

    /// Check whether the index for a document type exists.
    async fn index_exists(&self, doc_type: DocumentType) -> Result<bool, SearchError>;

    /// Create the index for a document type with its settings and mapping.
    ///
    /// Settings carry the configured shard and replica counts and the
    /// `lower_keyword` analyzer; the mapping is the static definition for
    /// that type.
    async fn create_index(&self, doc_type: DocumentType) -> Result<(), SearchError>;

    /// Delete the index for a document type, with its data.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index existed and was deleted
    /// * `Ok(false)` - If the index did not exist (a schema-absence case,
    ///   left to the caller to log)
    /// * `Err(SearchError)` - If the deletion fails
    async fn drop_index(&self, doc_type: DocumentType) -> Result<bool, SearchError>;

    /// Replace the mapping definition for a document type, data untouched.
    async fn put_mapping(&self, doc_type: DocumentType) -> Result<(), SearchError>;

    /// Point lookup of one document by id.
    ///
    /// "Not found" is a valid, expected outcome distinguished from a
    /// transport failure.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(source))` - The document's `_source`
    /// * `Ok(None)` - No document with that id
    /// * `Err(SearchError)` - On a transport failure
    async fn get_document(
        &self,
        doc_type: DocumentType,
        id: &str,
    ) -> Result<Option<Value>, SearchError>;

    /// Submit one batch of documents in a single bulk operation.
    ///
    /// The submission is bounded by `timeout`; a timeout surfaces as an
    /// error for the whole batch. Per-document rejections inside an accepted
    /// submission are reported in the summary.
    async fn bulk_index(
        &self,
        documents: &[OutputDocument],
        timeout: Duration,
    ) -> Result<BulkSummary, SearchError>;

    /// Fetch one page of hits from an existing index.
    ///
    /// Pass `cursor: None` to start a scan, then the returned cursor to
    /// continue it. An exhausted scan returns an empty page.
    async fn scan(
        &self,
        index: &str,
        cursor: Option<&str>,
        size: usize,
    ) -> Result<ScanPage, SearchError>;
}
