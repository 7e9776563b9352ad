//! # Georef Importer
//!
//! Main library for the georef data importer.
//!
//! This crate provides the command surface, configuration, and dependency
//! wiring for running one import against the destination search index.

pub mod cli;
pub mod config;

pub use cli::Cli;
pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during importer initialization or execution.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] georef_importer_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] georef_importer_repository::SearchError),
}

impl ImportError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
