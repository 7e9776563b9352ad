//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::http::request::JsonBody;
use opensearch::http::response::Response;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesPutMappingParts,
};
use opensearch::{BulkParts, GetParts, OpenSearch, ScrollParts, SearchParts};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::{mapping_for, IndexConfig};
use crate::types::{BulkItemError, BulkSummary, ScanPage};
use georef_importer_shared::{DocumentType, OutputDocument};

/// How long a scroll cursor stays alive between pages.
const SCROLL_KEEPALIVE: &str = "2m";

/// OpenSearch implementation of the destination client.
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The server URL (e.g., "http://localhost:9200")
    /// * `index_config` - Index naming and topology
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            prefix = %index_config.prefix,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// The bulk action line for one document.
    fn bulk_action(&self, doc: &OutputDocument) -> Value {
        let index = self.index_config.index_for(doc.doc_type);
        match &doc.id {
            Some(id) => json!({ "index": { "_index": index, "_id": id } }),
            None => json!({ "index": { "_index": index } }),
        }
    }

    /// Parse a `_bulk` response body into per-document results.
    fn parse_bulk_response(requested: usize, body: &Value) -> BulkSummary {
        let items = match body["items"].as_array() {
            Some(items) => items,
            // No per-item detail; the submission succeeded as a whole.
            None => {
                return BulkSummary {
                    accepted: requested,
                    rejected: 0,
                    errors: vec![],
                }
            }
        };

        let mut summary = BulkSummary::default();
        for item in items {
            // Each item wraps its result under the action name.
            let result = item
                .as_object()
                .and_then(|obj| obj.values().next())
                .cloned()
                .unwrap_or(Value::Null);

            if let Some(err) = result.get("error") {
                let reason = match (err["type"].as_str(), err["reason"].as_str()) {
                    (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
                    _ => err.to_string(),
                };
                summary.rejected += 1;
                summary.errors.push(BulkItemError {
                    id: result["_id"].as_str().map(str::to_string),
                    reason,
                });
            } else {
                summary.accepted += 1;
            }
        }
        summary
    }

    /// Parse a search/scroll response into a scan page.
    fn parse_scan_response(body: &Value) -> Result<ScanPage, SearchError> {
        let hits = body["hits"]["hits"]
            .as_array()
            .ok_or_else(|| SearchError::parse("scan response has no hits array"))?
            .clone();

        // An empty page means the scan is exhausted; drop the cursor so the
        // caller stops paging.
        let cursor = if hits.is_empty() {
            None
        } else {
            body["_scroll_id"].as_str().map(str::to_string)
        };

        Ok(ScanPage { hits, cursor })
    }

    /// Extract the response body of a failed request for diagnostics.
    async fn failure_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn index_exists(&self, doc_type: DocumentType) -> Result<bool, SearchError> {
        let index = self.index_config.index_for(doc_type);
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn create_index(&self, doc_type: DocumentType) -> Result<(), SearchError> {
        let index = self.index_config.index_for(doc_type);
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index))
            .body(self.index_config.creation_body(doc_type))
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::failure_body(response).await;
            error!(index = %index, status = %status, body = %body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "creating {} failed with status {}: {}",
                index, status, body
            )));
        }

        debug!(index = %index, "Index created");
        Ok(())
    }

    async fn drop_index(&self, doc_type: DocumentType) -> Result<bool, SearchError> {
        let index = self.index_config.index_for(doc_type);
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[&index]))
            .send()
            .await
            .map_err(|e| SearchError::index_deletion(e.to_string()))?;

        let status = response.status_code();

        // 404 is a schema-absence case, not a failure.
        if status.as_u16() == 404 {
            return Ok(false);
        }

        if !status.is_success() {
            let body = Self::failure_body(response).await;
            error!(index = %index, status = %status, body = %body, "Index deletion failed");
            return Err(SearchError::index_deletion(format!(
                "deleting {} failed with status {}: {}",
                index, status, body
            )));
        }

        debug!(index = %index, "Index deleted");
        Ok(true)
    }

    async fn put_mapping(&self, doc_type: DocumentType) -> Result<(), SearchError> {
        let index = self.index_config.index_for(doc_type);
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[&index]))
            .body(mapping_for(doc_type))
            .send()
            .await
            .map_err(|e| SearchError::mapping(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::failure_body(response).await;
            error!(index = %index, status = %status, body = %body, "Mapping update failed");
            return Err(SearchError::mapping(format!(
                "mapping update on {} failed with status {}: {}",
                index, status, body
            )));
        }

        debug!(index = %index, "Mapping replaced");
        Ok(())
    }

    async fn get_document(
        &self,
        doc_type: DocumentType,
        id: &str,
    ) -> Result<Option<Value>, SearchError> {
        let index = self.index_config.index_for(doc_type);
        let response = self
            .client
            .get(GetParts::IndexId(&index, id))
            .send()
            .await
            .map_err(|e| SearchError::get(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            let body = Self::failure_body(response).await;
            return Err(SearchError::get(format!(
                "get {}/{} failed with status {}: {}",
                index, id, status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        if body["found"].as_bool() != Some(true) {
            return Ok(None);
        }

        Ok(Some(body["_source"].clone()))
    }

    async fn bulk_index(
        &self,
        documents: &[OutputDocument],
        timeout: Duration,
    ) -> Result<BulkSummary, SearchError> {
        if documents.is_empty() {
            return Ok(BulkSummary::default());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            body.push(self.bulk_action(doc).into());
            body.push(doc.body.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(body)
            .request_timeout(timeout)
            .send()
            .await
            .map_err(|e| SearchError::bulk(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::failure_body(response).await;
            error!(status = %status, body = %body, "Bulk submission failed");
            return Err(SearchError::bulk(format!(
                "bulk submission failed with status {}: {}",
                status, body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(Self::parse_bulk_response(documents.len(), &response_body))
    }

    async fn scan(
        &self,
        index: &str,
        cursor: Option<&str>,
        size: usize,
    ) -> Result<ScanPage, SearchError> {
        let response = match cursor {
            None => self
                .client
                .search(SearchParts::Index(&[index]))
                .scroll(SCROLL_KEEPALIVE)
                .size(size as i64)
                .body(json!({ "query": { "match_all": {} }, "sort": ["_doc"] }))
                .send()
                .await
                .map_err(|e| SearchError::scan(e.to_string()))?,
            Some(scroll_id) => self
                .client
                .scroll(ScrollParts::ScrollId(scroll_id))
                .scroll(SCROLL_KEEPALIVE)
                .send()
                .await
                .map_err(|e| SearchError::scan(e.to_string()))?,
        };

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::failure_body(response).await;
            error!(index = %index, status = %status, body = %body, "Scan request failed");
            return Err(SearchError::scan(format!(
                "scan of {} failed with status {}: {}",
                index, status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Self::parse_scan_response(&body)
    }
}
