//! Index configuration and per-type mapping definitions.
//!
//! Mapping definitions are static: built once from these `json!` blocks and
//! immutable for the process lifetime. Each document type owns a physical
//! index named `{prefix}_{type_tag}`.

use serde_json::{json, Value};

use georef_importer_shared::DocumentType;

/// Default destination index prefix.
pub const DEFAULT_INDEX_PREFIX: &str = "georequetes";

/// Naming and topology for the destination indices.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Prefix of every physical index name.
    pub prefix: String,
    /// Primary shard count, applied once at index creation.
    pub shards: u32,
    /// Replica count, applied once at index creation.
    pub replicas: u32,
}

impl IndexConfig {
    /// Create a config with the given prefix and a single-shard topology.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            shards: 1,
            replicas: 0,
        }
    }

    /// Override the shard and replica counts.
    pub fn with_topology(mut self, shards: u32, replicas: u32) -> Self {
        self.shards = shards;
        self.replicas = replicas;
        self
    }

    /// The physical index name for a document type.
    pub fn index_for(&self, doc_type: DocumentType) -> String {
        format!("{}_{}", self.prefix, doc_type.as_str())
    }

    /// Index settings: topology plus the `lower_keyword` analyzer
    /// (keyword tokenizer, lowercase filter).
    pub fn settings(&self) -> Value {
        json!({
            "index": {
                "number_of_shards": self.shards,
                "number_of_replicas": self.replicas
            },
            "analysis": {
                "analyzer": {
                    "lower_keyword": {
                        "type": "custom",
                        "tokenizer": "keyword",
                        "filter": "lowercase"
                    }
                }
            }
        })
    }

    /// The full index-creation body for a document type.
    pub fn creation_body(&self, doc_type: DocumentType) -> Value {
        json!({
            "settings": self.settings(),
            "mappings": mapping_for(doc_type)
        })
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_PREFIX)
    }
}

/// The static mapping definition for a document type.
pub fn mapping_for(doc_type: DocumentType) -> Value {
    match doc_type {
        DocumentType::CommunesPj => json!({
            "properties": {
                "code_localite_pj": { "type": "keyword" },
                "code_localite_insee": { "type": "keyword" },
                "code_localite_insee_pj": { "type": "keyword" },
                "libelle": { "type": "text", "analyzer": "lower_keyword" },
                "principale": { "type": "boolean" }
            }
        }),
        DocumentType::Communes => feature_mapping(true),
        DocumentType::Regions | DocumentType::Departements => feature_mapping(false),
        DocumentType::Requetes => json!({
            "properties": {
                "typegeosimple": { "type": "keyword" },
                "idlocalite": { "type": "keyword" },
                "position": { "type": "geo_point" }
            }
        }),
    }
}

/// Mapping for a geographic feature document.
///
/// Communes additionally carry the directory code injected by enrichment.
fn feature_mapping(with_directory_code: bool) -> Value {
    let mut properties = json!({
        "code": { "type": "keyword" },
        "nom": { "type": "text", "analyzer": "lower_keyword" },
        "centroide_x": { "type": "double" },
        "centroide_y": { "type": "double" }
    });

    if with_directory_code {
        properties["code_pj"] = json!({ "type": "keyword" });
    }

    json!({
        "properties": {
            "type": { "type": "keyword" },
            "properties": { "properties": properties },
            // Geometries are carried verbatim but not indexed.
            "geometry": { "type": "object", "enabled": false }
        }
    })
}
