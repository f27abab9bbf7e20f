use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("RDF subject has unknown type: {node}\nObserved types:{types_fmt}\nFix the source ontology so every subject is an owl:Class, owl:ObjectProperty, owl:DatatypeProperty or owl:Ontology.",
        types_fmt = format_types(types))]
    Unclassified { node: String, types: Vec<String> },

    #[error("No WikiBase ID recorded for RDF reference {node}\nThe entity pass must complete before claims can be created.")]
    MappingNotFound { node: String },

    #[error("More than one WikiBase ID recorded for RDF reference {node}: {}\nThe link file is inconsistent; remove the stale entries.", ids.join(", "))]
    AmbiguousMapping { node: String, ids: Vec<String> },

    #[error("RDF reference {node} is already linked to {existing}, refusing to link it to {new}")]
    MappingConflict {
        node: String,
        existing: String,
        new: String,
    },

    #[error("Invalid WikiBase entity ID: {0:?} (expected Q<number> or P<number>)")]
    InvalidEntityId(String),

    #[error("Entity {id} still collides with an existing entity after clearing it")]
    RemoteCollision { id: String },

    #[error("WikiBase API error: {code} - {info}")]
    Remote { code: String, info: String },

    #[error("Unexpected WikiBase API response: {0}")]
    InvalidResponse(String),

    #[error("Failed to log into WikiBase at {api_url}: {reason}")]
    Login { api_url: String, reason: String },

    #[error("HTTP error: {0}\nCheck your network connection and the API URL.")]
    Http(#[from] reqwest::Error),

    #[error("Failed to write link file: {path}\nCause: {source}")]
    LinkFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

fn format_types(types: &[String]) -> String {
    if types.is_empty() {
        return " (none)".to_string();
    }
    types.iter().map(|t| format!("\n\t{}", t)).collect()
}
