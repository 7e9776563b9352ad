//! # Georef Importer Shared
//!
//! Shared types and data structures for the georef importer system.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// The document types recognized by the importer.
///
/// Each variant carries a stable string tag used as the destination type tag,
/// the CLI spelling, and the suffix of the physical index name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// Directory cross-reference rows (national code to directory code).
    CommunesPj,
    /// Commune features, enriched with their directory code.
    Communes,
    /// Region features.
    Regions,
    /// Department features.
    Departements,
    /// Search-query log records.
    Requetes,
}

impl DocumentType {
    /// All recognized document types, in mapping-registration order.
    pub const ALL: [DocumentType; 5] = [
        DocumentType::CommunesPj,
        DocumentType::Communes,
        DocumentType::Regions,
        DocumentType::Departements,
        DocumentType::Requetes,
    ];

    /// The stable string tag for this document type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::CommunesPj => "communes_pj",
            DocumentType::Communes => "communes",
            DocumentType::Regions => "regions",
            DocumentType::Departements => "departements",
            DocumentType::Requetes => "requetes",
        }
    }

    /// Parse a string tag back into a document type.
    pub fn parse(tag: &str) -> Option<DocumentType> {
        DocumentType::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::parse(s).ok_or_else(|| {
            let known: Vec<&str> = DocumentType::ALL.iter().map(|t| t.as_str()).collect();
            format!(
                "unknown document type '{}', expected one of: {}",
                s,
                known.join(", ")
            )
        })
    }
}

/// One raw input record, as produced by a record source.
///
/// Raw records are ephemeral: created on each pull, consumed once by the
/// transformer.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// A parsed JSON document: a whole feature collection for file sources,
    /// or one scanned hit (carrying `_source`) for the index-scan source.
    Json(Value),
    /// One delimited text row, split into positional fields.
    Row(Vec<String>),
}

/// One transformed document, ready for submission to the destination index.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    /// The destination document id. `None` lets the destination assign one.
    pub id: Option<String>,
    /// Which document type this belongs to.
    pub doc_type: DocumentType,
    /// The document body, a serializable JSON tree.
    pub body: Value,
}

impl OutputDocument {
    /// Create a document with an explicit id.
    pub fn new(doc_type: DocumentType, id: impl Into<String>, body: Value) -> Self {
        Self {
            id: Some(id.into()),
            doc_type,
            body,
        }
    }

    /// Create a document whose id is assigned by the destination.
    pub fn without_id(doc_type: DocumentType, body: Value) -> Self {
        Self {
            id: None,
            doc_type,
            body,
        }
    }
}
