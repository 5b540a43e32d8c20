//! Prompt templates and prompt builders

mod description;
mod job;

pub use description::JobDescription;
pub use job::{DataLoader, JobTemplate, SECTION_SEPARATOR};

use thiserror::Error;

/// Errors raised while loading or rendering a template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Key '{key}' not found in template (section: {section} in {source_name})")]
    MissingKey {
        key: String,
        section: String,
        source_name: String,
    },

    #[error("Template {source_name} has no section '{section}'")]
    MissingSection { section: String, source_name: String },

    #[error("Failed to read template '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
