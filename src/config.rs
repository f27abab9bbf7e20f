use crate::error::{Result, SyncError};
use crate::vocab;
use crate::wikibase::{http::DEFAULT_API_URL, ValueKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URI: &str = "http://purl.org/oseg/ontologies/osh-metadata/0.1/base";
pub const DEFAULT_SOURCE_LOCAL: &str = "../OSHI/osh-metadata.ttl";
pub const DEFAULT_SOURCE_REMOTE: &str =
    "https://raw.githubusercontent.com/OPEN-NEXT/LOSH/master/osh-metadata.ttl";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SEPARATOR: &str = "\n\n";
/// Wikibase's default limit for descriptions
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 250;

/// A well-known predicate that gets a wiki property before the first sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedMapping {
    /// IRI of the source predicate
    pub node: String,
    /// Matching Wikidata property, for reference
    #[serde(default)]
    pub wikidata: Option<String>,
    /// Label of the created property (default language)
    pub label: String,
    #[serde(default = "default_value_kind")]
    pub value_kind: ValueKind,
    /// Never write claims with this property; the wiki handles it natively
    #[serde(default)]
    pub skip_claims: bool,
}

fn default_value_kind() -> ValueKind {
    ValueKind::String
}

impl SeedMapping {
    pub fn new(node: impl Into<String>, wikidata: &str, label: &str, value_kind: ValueKind) -> Self {
        Self {
            node: node.into(),
            wikidata: Some(wikidata.to_string()),
            label: label.to_string(),
            value_kind,
            skip_claims: false,
        }
    }

    pub fn skip_claims(mut self) -> Self {
        self.skip_claims = true;
        self
    }
}

/// Cross-ontology predicates with a counterpart on Wikidata
pub fn default_seeds() -> Vec<SeedMapping> {
    let schema = |local: &str| format!("{}{}", vocab::SCHEMA, local);
    vec![
        SeedMapping::new(vocab::RDFS_SUB_CLASS_OF, "P279", "subclass of", ValueKind::Item),
        SeedMapping::new(vocab::RDFS_SUB_PROPERTY_OF, "P1647", "subproperty of", ValueKind::Property)
            .skip_claims(),
        SeedMapping::new(schema("inLanguage"), "P305", "language", ValueKind::String),
        SeedMapping::new(schema("version"), "P348", "software version identifier", ValueKind::String),
        SeedMapping::new(schema("isBasedOn"), "P144", "based on", ValueKind::Item),
        SeedMapping::new(schema("copyrightHolder"), "P3931", "copyright holder", ValueKind::Item),
        SeedMapping::new(schema("licenseDeclared"), "P2479", "license declared", ValueKind::String),
        SeedMapping::new(schema("creativeWorkStatus"), "P548", "version type", ValueKind::Item),
        SeedMapping::new(schema("image"), "P4765", "image URL", ValueKind::String),
        SeedMapping::new(schema("hasPart"), "P527", "has part", ValueKind::Item),
        SeedMapping::new(schema("codeRepository"), "P1324", "source code repository", ValueKind::String),
        SeedMapping::new(schema("value"), "P8203", "supported metadata", ValueKind::String),
        SeedMapping::new(format!("{}BFO_0000016", vocab::OBO), "P7535", "function", ValueKind::String),
        SeedMapping::new(schema("amount"), "P1114", "quantity", ValueKind::String),
        SeedMapping::new(schema("URL"), "P2699", "URL", ValueKind::String),
    ]
}

/// Contents of `config.toml`; every field is optional
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_url: Option<String>,
    pub source: Option<String>,
    pub link_file: Option<PathBuf>,
    pub base_uri: Option<String>,
    pub default_language: Option<String>,
    pub label_separator: Option<String>,
    pub description_separator: Option<String>,
    pub description_limit: Option<usize>,
    pub seeds: Option<Vec<SeedMapping>>,
}

impl Config {
    /// Default config location: `<config dir>/ont2wb/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("ont2wb").join("config.toml"))
            .ok_or_else(|| SyncError::Config("Cannot determine config directory".to_string()))
    }

    /// Load from `path`, or from the default location if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        tracing::debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn base_uri(&self) -> &str {
        self.base_uri.as_deref().unwrap_or(DEFAULT_BASE_URI)
    }

    /// Ontology to sync: configured, else the local OSHI checkout, else upstream
    pub fn source(&self) -> String {
        match &self.source {
            Some(source) => source.clone(),
            None if Path::new(DEFAULT_SOURCE_LOCAL).exists() => DEFAULT_SOURCE_LOCAL.to_string(),
            None => DEFAULT_SOURCE_REMOTE.to_string(),
        }
    }

    pub fn link_file(&self) -> PathBuf {
        self.link_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::mapping::DEFAULT_LINK_FILE))
    }

    pub fn seeds(&self) -> Vec<SeedMapping> {
        self.seeds.clone().unwrap_or_else(default_seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.base_uri(), DEFAULT_BASE_URI);
        assert_eq!(config.link_file(), PathBuf::from("tmp_ont2wb_links.ttl"));
        assert_eq!(config.seeds(), default_seeds());
    }

    #[test]
    fn test_parse_config_with_seeds() {
        let config = Config::parse(
            r#"
api_url = "http://localhost:8181/w/api.php"
source = "ontology.ttl"
default_language = "de"
description_limit = 100

[[seeds]]
node = "http://www.w3.org/2000/01/rdf-schema#subClassOf"
wikidata = "P279"
label = "subclass of"
value_kind = "item"

[[seeds]]
node = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf"
label = "subproperty of"
value_kind = "property"
skip_claims = true
"#,
        )
        .unwrap();

        assert_eq!(config.api_url(), "http://localhost:8181/w/api.php");
        assert_eq!(config.source(), "ontology.ttl");
        assert_eq!(config.default_language.as_deref(), Some("de"));
        assert_eq!(config.description_limit, Some(100));

        let seeds = config.seeds();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].value_kind, ValueKind::Item);
        assert!(!seeds[0].skip_claims);
        assert!(seeds[1].skip_claims);
        assert_eq!(seeds[1].wikidata, None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::parse("api_uri = \"typo\"").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "link_file = \"links.ttl\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.link_file(), PathBuf::from("links.ttl"));

        let missing = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(missing, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_default_seeds_exclude_subproperty_claims() {
        let seeds = default_seeds();
        let skipped: Vec<_> = seeds.iter().filter(|s| s.skip_claims).collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].node, vocab::RDFS_SUB_PROPERTY_OF);
        assert_eq!(skipped[0].wikidata.as_deref(), Some("P1647"));
    }
}
