//! Error types for the georef importer repository.

mod search_error;

pub use search_error::SearchError;
