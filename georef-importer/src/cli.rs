//! Command-line surface of the importer.

use std::path::PathBuf;

use clap::Parser;

use georef_importer_pipeline::orchestrator::Operation;
use georef_importer_shared::DocumentType;

/// Imports geographic and business reference data into the search index.
#[derive(Parser, Debug)]
#[command(name = "georef-importer")]
#[command(about = "Imports geographic reference data into the search index", long_about = None)]
pub struct Cli {
    /// Document type to process
    #[arg(long = "type-doc")]
    pub type_doc: DocumentType,

    /// File containing the data to import (required for file-backed types)
    #[arg(long = "source-file")]
    pub source_file: Option<PathBuf>,

    /// Reinitialize this document type before streaming (drops its data)
    #[arg(long, conflicts_with = "update")]
    pub init: bool,

    /// Replace only the mapping definition before streaming
    #[arg(long)]
    pub update: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// The requested operation, if one was selected.
    ///
    /// Selecting neither flag is a user error the caller reports as a
    /// diagnostic, not a crash.
    pub fn operation(&self) -> Option<Operation> {
        if self.init {
            Some(Operation::Init)
        } else if self.update {
            Some(Operation::Update)
        } else {
            None
        }
    }
}
