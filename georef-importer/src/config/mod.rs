//! Configuration and dependency wiring for the importer.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::Settings;
