//! Per-type document handlers.
//!
//! Field semantics follow the upstream reference exports: directory
//! cross-reference rows are positional, geographic types are GeoJSON feature
//! collections, query logs are scanned hits.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::processor::lookup::EnrichmentLookup;
use crate::processor::{DocumentHandler, HandlerOutcome};
use georef_importer_shared::{DocumentType, OutputDocument, RawRecord};

/// Run a lookup, degrading a transport failure to "not found".
///
/// Misses are left to the caller to log (at `info`); transport failures log
/// here at `warn` so the two stay distinguishable in the output.
async fn lookup_degraded(
    lookup: &dyn EnrichmentLookup,
    doc_type: DocumentType,
    key: &str,
) -> Option<Value> {
    match lookup.lookup(doc_type, key).await {
        Ok(found) => found,
        Err(e) => {
            warn!(
                target_type = %doc_type,
                key = %key,
                error = %e,
                "Enrichment lookup transport failure, treating as not found"
            );
            None
        }
    }
}

/// Extract the `features` array of a feature-collection record.
fn feature_array(doc_type: DocumentType, record: &RawRecord) -> Result<&Vec<Value>, PipelineError> {
    let document = match record {
        RawRecord::Json(document) => document,
        RawRecord::Row(_) => {
            return Err(PipelineError::malformed(
                doc_type,
                "expected a JSON feature collection, got a delimited row",
            ))
        }
    };

    document["features"]
        .as_array()
        .ok_or_else(|| PipelineError::malformed(doc_type, "document has no features array"))
}

/// The code of a feature, required for every geographic type.
fn feature_code(doc_type: DocumentType, feature: &Value) -> Result<&str, PipelineError> {
    feature["properties"]["code"]
        .as_str()
        .ok_or_else(|| PipelineError::malformed(doc_type, "feature missing properties.code"))
}

/// One directory cross-reference entry.
#[derive(Debug, Serialize)]
struct CommunePjEntry {
    code_localite_pj: String,
    code_localite_insee: String,
    code_localite_insee_pj: String,
    libelle: String,
    principale: bool,
}

/// Handler for directory cross-reference rows.
///
/// Maps the positional fields to named attributes and keys the document by
/// the national code. `principale` is true iff field 4 is exactly `"1"`.
pub struct CommunesPjHandler;

#[async_trait]
impl DocumentHandler for CommunesPjHandler {
    fn document_type(&self) -> DocumentType {
        DocumentType::CommunesPj
    }

    async fn handle(
        &self,
        record: &RawRecord,
        _lookup: &dyn EnrichmentLookup,
    ) -> Result<HandlerOutcome, PipelineError> {
        let row = match record {
            RawRecord::Row(row) => row,
            RawRecord::Json(_) => {
                return Err(PipelineError::malformed(
                    DocumentType::CommunesPj,
                    "expected a delimited row, got a JSON document",
                ))
            }
        };

        if row.len() < 4 {
            return Err(PipelineError::malformed(
                DocumentType::CommunesPj,
                format!("expected at least 4 fields, got {}", row.len()),
            ));
        }

        let entry = CommunePjEntry {
            code_localite_pj: row[0].clone(),
            code_localite_insee: row[1].clone(),
            code_localite_insee_pj: row[2].clone(),
            libelle: row[3].clone(),
            principale: row.get(4).map(|field| field == "1").unwrap_or(false),
        };

        let id = entry.code_localite_insee.clone();
        let body = serde_json::to_value(&entry)
            .map_err(|e| PipelineError::malformed(DocumentType::CommunesPj, e.to_string()))?;

        Ok(HandlerOutcome::single(OutputDocument::new(
            DocumentType::CommunesPj,
            id,
            body,
        )))
    }
}

/// Handler for commune features.
///
/// Each feature is enriched with its directory code looked up by national
/// code; features without a directory entry are skipped with a diagnostic
/// (fail-closed).
pub struct CommunesHandler;

#[async_trait]
impl DocumentHandler for CommunesHandler {
    fn document_type(&self) -> DocumentType {
        DocumentType::Communes
    }

    async fn handle(
        &self,
        record: &RawRecord,
        lookup: &dyn EnrichmentLookup,
    ) -> Result<HandlerOutcome, PipelineError> {
        let features = feature_array(DocumentType::Communes, record)?;
        let mut outcome = HandlerOutcome::default();

        for feature in features {
            let code = feature_code(DocumentType::Communes, feature)?;

            let entry = match lookup_degraded(lookup, DocumentType::CommunesPj, code).await {
                Some(entry) => entry,
                None => {
                    info!(
                        code = %code,
                        "Commune absent from the directory cross-reference, skipping"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let code_pj = match entry["code_localite_pj"].as_str() {
                Some(code_pj) => code_pj.to_string(),
                None => {
                    info!(
                        code = %code,
                        "Directory entry has no usable locality code, skipping"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let mut feature = feature.clone();
            feature["properties"]["code_pj"] = Value::String(code_pj.clone());
            outcome
                .documents
                .push(OutputDocument::new(DocumentType::Communes, code_pj, feature));
        }

        Ok(outcome)
    }
}

/// Handler for region and department features.
///
/// Features are emitted unconditionally, keyed by a type-specific prefix
/// concatenated with the feature code. Stable ids make reruns safe
/// overwrites.
pub struct PrefixedFeatureHandler {
    doc_type: DocumentType,
    prefix: &'static str,
}

impl PrefixedFeatureHandler {
    pub fn regions() -> Self {
        Self {
            doc_type: DocumentType::Regions,
            prefix: "R",
        }
    }

    pub fn departements() -> Self {
        Self {
            doc_type: DocumentType::Departements,
            prefix: "D",
        }
    }
}

#[async_trait]
impl DocumentHandler for PrefixedFeatureHandler {
    fn document_type(&self) -> DocumentType {
        self.doc_type
    }

    async fn handle(
        &self,
        record: &RawRecord,
        _lookup: &dyn EnrichmentLookup,
    ) -> Result<HandlerOutcome, PipelineError> {
        let features = feature_array(self.doc_type, record)?;
        let mut outcome = HandlerOutcome::default();

        for feature in features {
            let code = feature_code(self.doc_type, feature)?;
            outcome.documents.push(OutputDocument::new(
                self.doc_type,
                format!("{}{}", self.prefix, code),
                feature.clone(),
            ));
        }

        Ok(outcome)
    }
}

/// Handler for query-log records.
///
/// The record body is passed through. Locality queries are enriched with the
/// resolved commune centroid; an unresolvable locality leaves the body
/// unchanged (fail-open).
pub struct RequetesHandler;

impl RequetesHandler {
    async fn enrich_position(body: &mut Value, lookup: &dyn EnrichmentLookup) {
        let locality_id = match body.get("idlocalite").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                debug!("Locality query record has no idlocalite, importing as-is");
                return;
            }
        };

        let commune = match lookup_degraded(lookup, DocumentType::Communes, &locality_id).await {
            Some(commune) => commune,
            None => {
                info!(
                    idlocalite = %locality_id,
                    "Locality absent from the communes referential, importing without position"
                );
                return;
            }
        };

        let lat = commune["properties"]["centroide_y"].as_f64();
        let lng = commune["properties"]["centroide_x"].as_f64();
        match (lat, lng) {
            (Some(lat), Some(lng)) => {
                body["position"] = json!({ "lat": lat, "lng": lng });
            }
            _ => {
                warn!(
                    idlocalite = %locality_id,
                    "Commune centroid is malformed, importing without position"
                );
            }
        }
    }
}

#[async_trait]
impl DocumentHandler for RequetesHandler {
    fn document_type(&self) -> DocumentType {
        DocumentType::Requetes
    }

    async fn handle(
        &self,
        record: &RawRecord,
        lookup: &dyn EnrichmentLookup,
    ) -> Result<HandlerOutcome, PipelineError> {
        let hit = match record {
            RawRecord::Json(hit) => hit,
            RawRecord::Row(_) => {
                return Err(PipelineError::malformed(
                    DocumentType::Requetes,
                    "expected a scanned hit, got a delimited row",
                ))
            }
        };

        let mut body = hit
            .get("_source")
            .cloned()
            .ok_or_else(|| {
                PipelineError::malformed(DocumentType::Requetes, "scanned hit missing _source")
            })?;

        let is_locality = body.get("typegeosimple").and_then(Value::as_str) == Some("L");
        if is_locality {
            Self::enrich_position(&mut body, lookup).await;
        }

        Ok(HandlerOutcome::single(OutputDocument::without_id(
            DocumentType::Requetes,
            body,
        )))
    }
}
