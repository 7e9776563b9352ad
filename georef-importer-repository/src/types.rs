//! Result types for search engine operations.

use serde_json::Value;

/// The outcome of one bulk submission.
///
/// A submission either reaches the engine or fails as a whole; within an
/// accepted submission, individual documents can still be rejected. Those
/// rejections are reported here per document, not as an all-or-nothing fault.
#[derive(Debug, Clone, Default)]
pub struct BulkSummary {
    /// Number of documents accepted by the destination.
    pub accepted: usize,
    /// Number of documents rejected by the destination.
    pub rejected: usize,
    /// One entry per rejected document.
    pub errors: Vec<BulkItemError>,
}

/// A single rejected document within a bulk submission.
#[derive(Debug, Clone)]
pub struct BulkItemError {
    /// The document id, if one was assigned.
    pub id: Option<String>,
    /// The rejection reason reported by the destination.
    pub reason: String,
}

/// One page of hits from scanning an existing index.
#[derive(Debug, Clone)]
pub struct ScanPage {
    /// The hits in this page, each carrying its `_source`.
    pub hits: Vec<Value>,
    /// Cursor for the next page; `None` when the scan is exhausted.
    pub cursor: Option<String>,
}
